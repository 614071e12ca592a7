use crate::document::Document;
use crate::filter;
use crate::index::InvertedIndex;
use crate::query::{
    FacetSpec, FacetValue, IndexStats, OrderBy, SearchDocumentsResult, SearchOptions,
    SearchResult, SortDirection, DEFAULT_TOP,
};
use crate::ranking::{rank_documents, ScoredDocument};
use crate::schema::SearchIndex;
use crate::tokenizer::tokenize;
use crate::value::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Wildcard query text: match every stored document
const MATCH_ALL: &str = "*";

/// One text index: the schema captured at build time plus the postings
#[derive(Debug)]
struct TextIndex {
    schema: SearchIndex,
    inverted: InvertedIndex,
}

/// Owns one inverted index per named search index and answers text queries:
/// tokenize, score, filter, sort, paginate, facet.
#[derive(Debug, Default)]
pub struct TextSearchEngine {
    indexes: HashMap<String, TextIndex>,
}

impl TextSearchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.indexes.contains_key(name)
    }

    /// Register an empty text index for the schema, replacing any prior one
    pub fn create(&mut self, schema: SearchIndex) {
        self.indexes.insert(
            schema.name.clone(),
            TextIndex {
                schema,
                inverted: InvertedIndex::new(),
            },
        );
    }

    /// Full build from a document set, replacing any prior index of the same
    /// name. Documents are ingested in key order so rebuilds are
    /// deterministic.
    pub fn build(&mut self, schema: SearchIndex, documents: &HashMap<String, Document>) {
        let mut inverted = InvertedIndex::new();
        let mut ids: Vec<&String> = documents.keys().collect();
        ids.sort();
        for id in ids {
            let tokens = searchable_tokens(&schema, &documents[id]);
            inverted.add_document(id, &tokens);
        }
        self.indexes
            .insert(schema.name.clone(), TextIndex { schema, inverted });
    }

    /// Incremental add/overwrite of a single document. O(tokens in the
    /// document). Returns false when the index does not exist.
    pub fn add(&mut self, name: &str, id: &str, document: &Document) -> bool {
        match self.indexes.get_mut(name) {
            Some(index) => {
                let tokens = searchable_tokens(&index.schema, document);
                index.inverted.add_document(id, &tokens);
                true
            }
            None => false,
        }
    }

    /// Drop one document's postings. Unknown index or id is a no-op.
    pub fn remove(&mut self, name: &str, id: &str) {
        if let Some(index) = self.indexes.get_mut(name) {
            index.inverted.remove_document(id);
        }
    }

    pub fn delete_index(&mut self, name: &str) {
        self.indexes.remove(name);
    }

    pub fn get_stats(&self, name: &str) -> Option<IndexStats> {
        self.indexes.get(name).map(|index| IndexStats {
            document_count: index.inverted.total_documents(),
            field_count: index.schema.fields.len(),
        })
    }

    /// Execute a search. An unknown index name degrades to an empty result
    /// set rather than an error: search stays resilient to races with index
    /// lifecycle.
    pub fn search(
        &self,
        name: &str,
        query_text: &str,
        options: &SearchOptions,
        documents: &HashMap<String, Document>,
    ) -> SearchDocumentsResult {
        let index = match self.indexes.get(name) {
            Some(index) => index,
            None => return SearchDocumentsResult::empty(),
        };
        let schema = &index.schema;

        // 1-2. candidate set with relevance scores
        let mut candidates = self.candidates(index, query_text);

        // 3. filter survivors
        if let Some(filter_text) = options.filter.as_deref() {
            let compiled = filter::compile(filter_text);
            candidates.retain(|scored| {
                documents
                    .get(&scored.doc_id)
                    .map_or(false, |doc| compiled.matches(doc, schema))
            });
        }

        let total = candidates.len();

        // 4. explicit ordering overrides relevance; the sort is stable so
        // equal keys keep relevance/insertion order
        let order_by = usable_sort_keys(schema, &options.order_by);
        if !order_by.is_empty() {
            candidates.sort_by(|a, b| {
                let da = documents.get(&a.doc_id);
                let db = documents.get(&b.doc_id);
                match (da, db) {
                    (Some(da), Some(db)) => compare_documents(da, db, &order_by),
                    _ => Ordering::Equal,
                }
            });
        }

        // 6. facets over the post-filter, pre-pagination candidate set
        let facets = compute_facets(schema, &candidates, &options.facets, documents);

        // 5. pagination
        let top = options.top.unwrap_or(DEFAULT_TOP);
        let hidden = schema.hidden_fields();
        let results: Vec<SearchResult> = candidates
            .into_iter()
            .skip(options.skip)
            .take(top)
            .filter_map(|scored| {
                documents.get(&scored.doc_id).map(|doc| SearchResult {
                    document: strip_hidden(doc, &hidden),
                    score: scored.score,
                })
            })
            .collect();

        // 7. total candidate count on request
        let count = options.include_total_count.then_some(total as u64);

        SearchDocumentsResult {
            results,
            count,
            facets,
        }
    }

    /// Match-all for empty/wildcard queries, otherwise union over query
    /// tokens ranked by relevance
    fn candidates(&self, index: &TextIndex, query_text: &str) -> Vec<ScoredDocument> {
        let trimmed = query_text.trim();
        if trimmed.is_empty() || trimmed == MATCH_ALL {
            return index
                .inverted
                .all_documents()
                .into_iter()
                .map(|doc_id| ScoredDocument { doc_id, score: 1.0 })
                .collect();
        }

        let query_tokens = tokenize(trimmed);
        if query_tokens.is_empty() {
            return Vec::new();
        }
        let matched = index.inverted.match_any(&query_tokens);
        rank_documents(&query_tokens, &matched, &index.inverted)
    }
}

/// Tokens from every searchable field of the document
fn searchable_tokens(schema: &SearchIndex, document: &Document) -> Vec<String> {
    let mut tokens = Vec::new();
    for field in schema.searchable_fields() {
        if let Some(value) = document.get(&field.name) {
            for fragment in value.text_fragments() {
                tokens.extend(tokenize(fragment));
            }
        }
    }
    tokens
}

/// Keep only sort keys naming sortable fields
fn usable_sort_keys(schema: &SearchIndex, order_by: &[OrderBy]) -> Vec<OrderBy> {
    order_by
        .iter()
        .filter(|key| {
            let usable = schema.is_sortable(&key.field);
            if !usable {
                warn!(field = %key.field, "orderBy on non-sortable field, skipping");
            }
            usable
        })
        .cloned()
        .collect()
}

/// Multi-key comparison. Documents missing the sort value order after all
/// documents that have it, regardless of direction.
fn compare_documents(a: &Document, b: &Document, keys: &[OrderBy]) -> Ordering {
    for key in keys {
        let va = a.get_path(&key.field).filter(|v| !v.is_null());
        let vb = b.get_path(&key.field).filter(|v| !v.is_null());
        let ordering = match (va, vb) {
            (Some(va), Some(vb)) => {
                let ordering = va.partial_cmp_coerced(vb).unwrap_or(Ordering::Equal);
                match key.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Value-frequency buckets per requested facet field, counted over the
/// pre-pagination candidate set. Buckets order by count descending, value
/// ascending on ties.
fn compute_facets(
    schema: &SearchIndex,
    candidates: &[ScoredDocument],
    facet_specs: &[String],
    documents: &HashMap<String, Document>,
) -> BTreeMap<String, Vec<FacetValue>> {
    let mut facets = BTreeMap::new();
    for raw_spec in facet_specs {
        let spec = match FacetSpec::parse(raw_spec) {
            Some(spec) => spec,
            None => continue,
        };
        if !schema.is_facetable(&spec.field) {
            warn!(field = %spec.field, "facet on non-facetable field");
            facets.insert(spec.field.clone(), Vec::new());
            continue;
        }

        let mut counts: HashMap<String, u64> = HashMap::new();
        for scored in candidates {
            let value = match documents.get(&scored.doc_id).and_then(|d| d.get(&spec.field)) {
                Some(value) => value,
                None => continue,
            };
            match value {
                Value::Strings(items) => {
                    for item in items {
                        *counts.entry(item.clone()).or_insert(0) += 1;
                    }
                }
                other => {
                    if let Some(rendered) = other.render() {
                        *counts.entry(rendered).or_insert(0) += 1;
                    }
                }
            }
        }

        let mut buckets: Vec<FacetValue> = counts
            .into_iter()
            .map(|(value, count)| FacetValue { value, count })
            .collect();
        buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
        if let Some(cap) = spec.count {
            buckets.truncate(cap);
        }
        facets.insert(spec.field.clone(), buckets);
    }
    facets
}

/// Copy of the document without its non-retrievable fields
fn strip_hidden(document: &Document, hidden: &[&str]) -> Document {
    if hidden.is_empty() {
        return document.clone();
    }
    let mut stripped = document.clone();
    for name in hidden {
        stripped.remove(name);
    }
    stripped
}
