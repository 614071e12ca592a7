//! In-memory emulation of a managed cloud search service.
//!
//! Collaborators register index schemas, push flat documents, and run
//! text + filter + sort + facet queries against a volatile inverted index.
//! Everything lives behind [`SearchService`]; no external search dependency,
//! no persistence.

pub mod document;
pub mod engine;
pub mod error;
pub mod filter;
pub mod index;
pub mod manager;
pub mod query;
pub mod ranking;
pub mod schema;
pub mod service;
pub mod tokenizer;
pub mod value;

// Re-export commonly used types
pub use document::Document;
pub use engine::TextSearchEngine;
pub use error::{SearchError, SearchServiceResult};
pub use filter::{is_filter_supported, MAX_FILTER_LEN};
pub use manager::IndexManager;
pub use query::{
    FacetValue, IndexStats, OrderBy, SearchDocumentsResult, SearchOptions, SearchResult,
    SortDirection,
};
pub use schema::{FieldType, SearchField, SearchIndex};
pub use service::SearchService;
pub use value::Value;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_workflow() -> anyhow::Result<()> {
        let service = SearchService::new();
        service.start_up()?;

        service.create_index_if_not_exists(SearchIndex::new(
            "articles",
            vec![
                SearchField::key("id"),
                SearchField::new("body", FieldType::String).searchable(),
            ],
        ))?;

        service.index_document(
            "articles",
            Document::new()
                .with_field("id", "1")
                .with_field("body", "Rust is a blazingly fast systems language"),
        )?;

        let result = service.search("articles", "rust", &SearchOptions::default())?;
        assert_eq!(result.results.len(), 1);

        service.shut_down()?;
        Ok(())
    }
}
