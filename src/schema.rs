use serde::{Deserialize, Serialize};

/// Declared type of a search field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    String,
    Integer,
    Double,
    Boolean,
    DateTime,
    GeoPoint,
    StringCollection,
    NestedCollection,
}

/// One field of an index schema. Capability flags are declarative: the engine
/// refuses to search, filter, sort or facet on a field lacking the flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchField {
    pub name: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub key: bool,
    #[serde(default)]
    pub searchable: bool,
    #[serde(default)]
    pub filterable: bool,
    #[serde(default)]
    pub sortable: bool,
    #[serde(default)]
    pub facetable: bool,
    #[serde(default = "default_true")]
    pub retrievable: bool,
}

fn default_true() -> bool {
    true
}

impl SearchField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            key: false,
            searchable: false,
            filterable: false,
            sortable: false,
            facetable: false,
            retrievable: true,
        }
    }

    /// Key fields double as exact-match filterable identifiers
    pub fn key(name: impl Into<String>) -> Self {
        let mut field = Self::new(name, FieldType::String);
        field.key = true;
        field.filterable = true;
        field
    }

    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn facetable(mut self) -> Self {
        self.facetable = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.retrievable = false;
        self
    }
}

/// A named index schema: ordered field list with exactly one key field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchIndex {
    pub name: String,
    pub fields: Vec<SearchField>,
}

impl SearchIndex {
    pub fn new(name: impl Into<String>, fields: Vec<SearchField>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// The single field flagged `key`, if the spec is well formed
    pub fn key_field(&self) -> Option<&SearchField> {
        self.fields.iter().find(|f| f.key)
    }

    pub fn field(&self, name: &str) -> Option<&SearchField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_filterable(&self, name: &str) -> bool {
        self.field(name).map_or(false, |f| f.filterable)
    }

    pub fn is_sortable(&self, name: &str) -> bool {
        self.field(name).map_or(false, |f| f.sortable)
    }

    pub fn is_facetable(&self, name: &str) -> bool {
        self.field(name).map_or(false, |f| f.facetable)
    }

    pub fn searchable_fields(&self) -> Vec<&SearchField> {
        self.fields.iter().filter(|f| f.searchable).collect()
    }

    /// Field names declared non-retrievable; stripped from result documents
    pub fn hidden_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| !f.retrievable)
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Schema invariant: exactly one key field
    pub fn validate(&self) -> Result<(), String> {
        let key_count = self.fields.iter().filter(|f| f.key).count();
        match key_count {
            1 => Ok(()),
            0 => Err("no field is flagged as key".to_string()),
            n => Err(format!("{} fields are flagged as key, expected one", n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing_index() -> SearchIndex {
        SearchIndex::new(
            "listings",
            vec![
                SearchField::key("id"),
                SearchField::new("title", FieldType::String).searchable(),
                SearchField::new("category", FieldType::String)
                    .filterable()
                    .facetable(),
                SearchField::new("price", FieldType::Double)
                    .filterable()
                    .sortable(),
            ],
        )
    }

    #[test]
    fn test_key_field() {
        let index = listing_index();
        assert_eq!(index.key_field().map(|f| f.name.as_str()), Some("id"));
        assert!(index.validate().is_ok());
    }

    #[test]
    fn test_capability_flags() {
        let index = listing_index();
        assert!(index.is_filterable("category"));
        assert!(!index.is_filterable("title"));
        assert!(index.is_sortable("price"));
        assert!(!index.is_sortable("category"));
        assert!(index.is_facetable("category"));
        assert!(!index.is_facetable("unknown"));
        assert_eq!(index.searchable_fields().len(), 1);
    }

    #[test]
    fn test_validate_rejects_bad_specs() {
        let no_key = SearchIndex::new(
            "broken",
            vec![SearchField::new("title", FieldType::String)],
        );
        assert!(no_key.validate().is_err());

        let two_keys = SearchIndex::new(
            "broken",
            vec![SearchField::key("a"), SearchField::key("b")],
        );
        assert!(two_keys.validate().is_err());
    }

    #[test]
    fn test_retrievable_defaults_true_in_serde() {
        let field: SearchField =
            serde_json::from_str(r#"{"name": "title", "fieldType": "string"}"#).unwrap();
        assert!(field.retrievable);
        assert!(!field.searchable);
    }
}
