use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A document is an arbitrary mapping from field name to value. The schema of
/// the index it lands in decides which fields participate in search, filter,
/// sort and facets.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: BTreeMap<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Dot-path lookup through nested objects. Missing segments yield `None`,
    /// never an error.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.fields.get(segments.next()?)?;
        for segment in segments {
            match current {
                Value::Object(map) => current = map.get(segment)?,
                _ => return None,
            }
        }
        Some(current)
    }

    /// The document's key value, if present and non-null
    pub fn key_value(&self, key_field: &str) -> Option<&Value> {
        self.fields.get(key_field).filter(|v| !v.is_null())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build a document from a JSON object. Non-object JSON yields an empty
    /// document.
    pub fn from_json(json: serde_json::Value) -> Self {
        match Value::from_json(json) {
            Value::Object(map) => Self { fields: map },
            _ => Self::default(),
        }
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_path_lookup() {
        let doc = Document::from_json(serde_json::json!({
            "listing": {"address": {"city": "Lisbon"}},
            "price": 120,
        }));

        assert_eq!(
            doc.get_path("listing.address.city"),
            Some(&Value::from("Lisbon"))
        );
        assert_eq!(doc.get_path("listing.address.zip"), None);
        assert_eq!(doc.get_path("price.amount"), None);
        assert_eq!(doc.get_path("price"), Some(&Value::Integer(120)));
    }

    #[test]
    fn test_key_value_ignores_null() {
        let doc = Document::new()
            .with_field("id", Value::Null)
            .with_field("title", "Bike");
        assert!(doc.key_value("id").is_none());
        assert!(doc.key_value("missing").is_none());
        assert!(doc.key_value("title").is_some());
    }
}
