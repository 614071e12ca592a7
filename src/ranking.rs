use crate::index::InvertedIndex;

/// BM25 parameters. The exact formula is an implementation choice; what the
/// engine guarantees is monotonicity: every per-term contribution is
/// non-negative, so matching a strict superset of query terms never scores
/// lower.
pub struct Bm25 {
    k1: f64,
    b: f64,
}

impl Default for Bm25 {
    fn default() -> Self {
        Self {
            k1: 1.5, // Term frequency saturation parameter
            b: 0.75, // Length normalization parameter
        }
    }
}

impl Bm25 {
    pub fn new(k1: f64, b: f64) -> Self {
        Self { k1, b }
    }

    /// Score one candidate against the query terms
    pub fn score(&self, query_terms: &[String], doc_id: &str, index: &InvertedIndex) -> f64 {
        let mut score = 0.0;
        let doc_length = index.doc_length(doc_id) as f64;
        let total_docs = index.total_documents() as f64;
        let avg_doc_length = index.avg_doc_length();

        for term in query_terms {
            let tf = index.term_frequency(term, doc_id) as f64;
            if tf == 0.0 {
                continue;
            }

            let doc_freq = index.doc_frequency(term) as f64;
            // The +1 inside the log keeps the IDF non-negative
            let idf = ((total_docs - doc_freq + 0.5) / (doc_freq + 0.5) + 1.0).ln();

            let length_norm = if avg_doc_length > 0.0 {
                doc_length / avg_doc_length
            } else {
                1.0
            };
            let normalized_tf =
                (tf * (self.k1 + 1.0)) / (tf + self.k1 * (1.0 - self.b + self.b * length_norm));

            score += idf * normalized_tf;
        }

        score
    }
}

/// Document id with its relevance score
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub doc_id: String,
    pub score: f64,
}

/// Score candidates and order them by descending relevance, ties broken by
/// original insertion order.
pub fn rank_documents(
    query_terms: &[String],
    candidates: &[String],
    index: &InvertedIndex,
) -> Vec<ScoredDocument> {
    let bm25 = Bm25::default();
    let mut scored: Vec<ScoredDocument> = candidates
        .iter()
        .map(|doc_id| ScoredDocument {
            doc_id: doc_id.clone(),
            score: bm25.score(query_terms, doc_id, index),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| index.insertion_rank(&a.doc_id).cmp(&index.insertion_rank(&b.doc_id)))
    });

    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_matching_document_scores_positive() {
        let mut index = InvertedIndex::new();
        index.add_document("1", &tokens(&["bike", "red"]));
        index.add_document("2", &tokens(&["helmet"]));

        let bm25 = Bm25::default();
        assert!(bm25.score(&tokens(&["bike"]), "1", &index) > 0.0);
        assert_eq!(bm25.score(&tokens(&["bike"]), "2", &index), 0.0);
    }

    #[test]
    fn test_superset_of_terms_never_scores_lower() {
        let mut index = InvertedIndex::new();
        index.add_document("both", &tokens(&["bike", "red"]));
        index.add_document("one", &tokens(&["bike", "blue"]));

        let query = tokens(&["bike", "red"]);
        let bm25 = Bm25::default();
        let superset = bm25.score(&query, "both", &index);
        let subset = bm25.score(&query, "one", &index);
        assert!(superset >= subset);
    }

    #[test]
    fn test_rank_breaks_ties_by_insertion_order() {
        let mut index = InvertedIndex::new();
        index.add_document("b", &tokens(&["bike"]));
        index.add_document("a", &tokens(&["bike"]));

        let ranked = rank_documents(
            &tokens(&["bike"]),
            &["a".to_string(), "b".to_string()],
            &index,
        );
        assert_eq!(ranked[0].doc_id, "b");
        assert_eq!(ranked[1].doc_id, "a");
    }
}
