use crate::document::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Page size applied when the caller gives none
pub const DEFAULT_TOP: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One sort key: field name plus direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Parse `"price asc"` / `"price desc"`; a bare field name sorts
    /// ascending.
    pub fn parse(spec: &str) -> Option<Self> {
        let mut parts = spec.split_whitespace();
        let field = parts.next()?;
        let direction = match parts.next().map(|d| d.to_lowercase()) {
            Some(d) if d == "desc" => SortDirection::Desc,
            _ => SortDirection::Asc,
        };
        Some(Self {
            field: field.to_string(),
            direction,
        })
    }
}

/// Facet spec: `"field"` or `"field,count:N"` to cap the bucket list
#[derive(Debug, Clone, PartialEq)]
pub struct FacetSpec {
    pub field: String,
    pub count: Option<usize>,
}

impl FacetSpec {
    pub fn parse(spec: &str) -> Option<Self> {
        let mut parts = spec.split(',');
        let field = parts.next()?.trim();
        if field.is_empty() {
            return None;
        }
        let mut count = None;
        for modifier in parts {
            if let Some(raw) = modifier.trim().strip_prefix("count:") {
                count = raw.trim().parse::<usize>().ok();
            }
            // unknown modifiers are ignored
        }
        Some(Self {
            field: field.to_string(),
            count,
        })
    }
}

/// Options for one search call
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Page size; `None` means [`DEFAULT_TOP`]
    pub top: Option<usize>,
    pub skip: usize,
    /// Filter expression, evaluated by the filter engine
    pub filter: Option<String>,
    /// Sort keys; overrides relevance ordering when non-empty
    pub order_by: Vec<OrderBy>,
    /// Facet specs (`"field"` or `"field,count:N"`)
    pub facets: Vec<String>,
    pub include_total_count: bool,
}

impl SearchOptions {
    pub fn with_top(mut self, top: usize) -> Self {
        self.top = Some(top);
        self
    }

    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by.push(order_by);
        self
    }

    pub fn with_facet(mut self, facet: impl Into<String>) -> Self {
        self.facets.push(facet.into());
        self
    }

    pub fn with_total_count(mut self) -> Self {
        self.include_total_count = true;
        self
    }
}

/// One hit: the stored document (minus non-retrievable fields) and its
/// relative relevance score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub document: Document,
    pub score: f64,
}

/// One facet bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetValue {
    pub value: String,
    pub count: u64,
}

/// Full response for one search call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchDocumentsResult {
    pub results: Vec<SearchResult>,
    /// Post-filter, pre-pagination candidate count; present when requested
    /// (and always `Some(0)` for an unknown index)
    pub count: Option<u64>,
    pub facets: BTreeMap<String, Vec<FacetValue>>,
}

impl SearchDocumentsResult {
    /// The resilient answer for a search against a missing index
    pub(crate) fn empty() -> Self {
        Self {
            results: Vec::new(),
            count: Some(0),
            facets: BTreeMap::new(),
        }
    }
}

/// Counters surfaced per text index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub document_count: usize,
    pub field_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_by_parse() {
        assert_eq!(OrderBy::parse("price asc"), Some(OrderBy::asc("price")));
        assert_eq!(OrderBy::parse("price desc"), Some(OrderBy::desc("price")));
        assert_eq!(OrderBy::parse("price"), Some(OrderBy::asc("price")));
        assert_eq!(OrderBy::parse("  "), None);
    }

    #[test]
    fn test_facet_spec_parse() {
        assert_eq!(
            FacetSpec::parse("category"),
            Some(FacetSpec {
                field: "category".to_string(),
                count: None
            })
        );
        assert_eq!(
            FacetSpec::parse("category,count:5"),
            Some(FacetSpec {
                field: "category".to_string(),
                count: Some(5)
            })
        );
        assert_eq!(
            FacetSpec::parse("category,sort:value"),
            Some(FacetSpec {
                field: "category".to_string(),
                count: None
            })
        );
        assert_eq!(FacetSpec::parse(""), None);
    }

    #[test]
    fn test_options_builder() {
        let options = SearchOptions::default()
            .with_top(10)
            .with_skip(5)
            .with_filter("price gt 100")
            .with_order_by(OrderBy::desc("price"))
            .with_facet("category")
            .with_total_count();

        assert_eq!(options.top, Some(10));
        assert_eq!(options.skip, 5);
        assert!(options.include_total_count);
        assert_eq!(options.order_by.len(), 1);
        assert_eq!(options.facets, vec!["category"]);
    }
}
