use thiserror::Error;

/// Result type for search service operations
pub type SearchServiceResult<T> = std::result::Result<T, SearchError>;

/// Errors surfaced by the search service
#[derive(Debug, Error)]
pub enum SearchError {
    /// The named index has no registered schema
    #[error("index '{name}' does not exist")]
    IndexNotFound { name: String },

    /// The document carries no value for the index's key field
    #[error("document for index '{index}' is missing key field '{key_field}'")]
    DocumentKeyMissing { index: String, key_field: String },

    /// The index spec violates a schema invariant
    #[error("invalid index spec '{name}': {reason}")]
    InvalidIndexSpec { name: String, reason: String },

    /// Service used outside its started window
    #[error("lifecycle error: {reason}")]
    Lifecycle { reason: String },
}

impl SearchError {
    pub(crate) fn index_not_found(name: impl Into<String>) -> Self {
        Self::IndexNotFound { name: name.into() }
    }

    pub(crate) fn key_missing(index: impl Into<String>, key_field: impl Into<String>) -> Self {
        Self::DocumentKeyMissing {
            index: index.into(),
            key_field: key_field.into(),
        }
    }

    pub(crate) fn lifecycle(reason: impl Into<String>) -> Self {
        Self::Lifecycle {
            reason: reason.into(),
        }
    }
}
