use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A single field value inside a document.
///
/// Documents are duck-typed maps, so values carry their own type tag. Variant
/// order matters for untagged deserialization: whole numbers become `Integer`,
/// RFC 3339 strings become `DateTime`, everything else falls through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    DateTime(DateTime<Utc>),
    String(String),
    Strings(Vec<String>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view, coercing integers to doubles
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }

    /// Chronological view; strings are parsed as RFC 3339 on demand
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Text fragments to feed the tokenizer. String collections contribute
    /// every element.
    pub fn text_fragments(&self) -> Vec<&str> {
        match self {
            Value::String(s) => vec![s.as_str()],
            Value::Strings(items) => items.iter().map(|s| s.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    /// Scalar rendering used for facet buckets and substring tests.
    /// Collections and objects have no single rendering.
    pub fn render(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Integer(n) => Some(n.to_string()),
            Value::Double(n) => Some(n.to_string()),
            Value::DateTime(dt) => Some(dt.to_rfc3339()),
            Value::String(s) => Some(s.clone()),
            Value::Strings(_) | Value::Object(_) => None,
        }
    }

    /// Exact-match equality with numeric and datetime coercion.
    /// `1 eq 1.0` holds; `"active" eq "act"` never does.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Strings(a), Value::Strings(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => {
                if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
                    return a == b;
                }
                if let (Some(a), Some(b)) = (self.as_datetime(), other.as_datetime()) {
                    return a == b;
                }
                false
            }
        }
    }

    /// Ordering with the same coercion rules as `loose_eq`. `None` when the
    /// two values have no common ordering (mixed kinds, objects, collections).
    pub fn partial_cmp_coerced(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            _ => {
                if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
                    return a.partial_cmp(&b);
                }
                if let (Some(a), Some(b)) = (self.as_datetime(), other.as_datetime()) {
                    return Some(a.cmp(&b));
                }
                None
            }
        }
    }

    /// Convert a JSON value. Numbers become `Integer` when they fit in i64,
    /// arrays become string collections (scalar elements are stringified),
    /// objects stay nested for dot-path access.
    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else {
                    Value::Double(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::Strings(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        serde_json::Value::String(s) => Some(s),
                        serde_json::Value::Number(n) => Some(n.to_string()),
                        serde_json::Value::Bool(b) => Some(b.to_string()),
                        _ => None,
                    })
                    .collect(),
            ),
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::Strings(items)
    }
}
