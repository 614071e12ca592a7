use std::collections::{HashMap, HashSet};

/// Inverted index for one named search index: term -> document id -> term
/// frequency, plus the per-document statistics the scorer needs.
///
/// Document ids carry an insertion sequence number so ties in relevance break
/// by original indexing order.
#[derive(Debug, Clone, Default)]
pub struct InvertedIndex {
    postings: HashMap<String, HashMap<String, usize>>,
    doc_lengths: HashMap<String, usize>,
    insertion_seq: HashMap<String, u64>,
    next_seq: u64,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one document into the postings. Re-adding an id replaces its
    /// previous postings but keeps its original insertion rank.
    pub fn add_document(&mut self, doc_id: &str, tokens: &[String]) {
        let kept_seq = self.insertion_seq.get(doc_id).copied();
        self.remove_document(doc_id);

        for token in tokens {
            *self
                .postings
                .entry(token.clone())
                .or_default()
                .entry(doc_id.to_string())
                .or_insert(0) += 1;
        }
        self.doc_lengths.insert(doc_id.to_string(), tokens.len());

        let seq = kept_seq.unwrap_or_else(|| {
            let seq = self.next_seq;
            self.next_seq += 1;
            seq
        });
        self.insertion_seq.insert(doc_id.to_string(), seq);
    }

    /// Drop the document's postings; unknown ids are a no-op
    pub fn remove_document(&mut self, doc_id: &str) {
        if self.doc_lengths.remove(doc_id).is_none() {
            return;
        }
        for doc_map in self.postings.values_mut() {
            doc_map.remove(doc_id);
        }
        self.postings.retain(|_, docs| !docs.is_empty());
        self.insertion_seq.remove(doc_id);
    }

    pub fn contains(&self, doc_id: &str) -> bool {
        self.doc_lengths.contains_key(doc_id)
    }

    /// Number of documents containing the term (IDF input)
    pub fn doc_frequency(&self, token: &str) -> usize {
        self.postings.get(token).map_or(0, |docs| docs.len())
    }

    /// Occurrences of the term within one document
    pub fn term_frequency(&self, token: &str, doc_id: &str) -> usize {
        self.postings
            .get(token)
            .and_then(|docs| docs.get(doc_id))
            .copied()
            .unwrap_or(0)
    }

    pub fn doc_length(&self, doc_id: &str) -> usize {
        self.doc_lengths.get(doc_id).copied().unwrap_or(0)
    }

    pub fn total_documents(&self) -> usize {
        self.doc_lengths.len()
    }

    pub fn avg_doc_length(&self) -> f64 {
        if self.doc_lengths.is_empty() {
            0.0
        } else {
            self.doc_lengths.values().sum::<usize>() as f64 / self.doc_lengths.len() as f64
        }
    }

    /// Rank a document took when it was first indexed; unknown ids sort last
    pub fn insertion_rank(&self, doc_id: &str) -> u64 {
        self.insertion_seq.get(doc_id).copied().unwrap_or(u64::MAX)
    }

    /// Documents containing at least one of the tokens, in insertion order
    pub fn match_any(&self, tokens: &[String]) -> Vec<String> {
        let mut matched: HashSet<&str> = HashSet::new();
        for token in tokens {
            if let Some(docs) = self.postings.get(token) {
                matched.extend(docs.keys().map(|s| s.as_str()));
            }
        }
        let mut ids: Vec<String> = matched.into_iter().map(|s| s.to_string()).collect();
        ids.sort_by_key(|id| self.insertion_rank(id));
        ids
    }

    /// Every indexed document id, in insertion order (match-all queries)
    pub fn all_documents(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.doc_lengths.keys().cloned().collect();
        ids.sort_by_key(|id| self.insertion_rank(id));
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_add_and_match() {
        let mut index = InvertedIndex::new();
        index.add_document("1", &tokens(&["red", "bike"]));
        index.add_document("2", &tokens(&["blue", "bike"]));

        assert_eq!(index.total_documents(), 2);
        assert_eq!(index.doc_frequency("bike"), 2);
        assert_eq!(index.doc_frequency("red"), 1);
        assert_eq!(index.match_any(&tokens(&["red"])), vec!["1"]);
        assert_eq!(index.match_any(&tokens(&["bike"])), vec!["1", "2"]);
        assert!(index.match_any(&tokens(&["green"])).is_empty());
    }

    #[test]
    fn test_remove_document() {
        let mut index = InvertedIndex::new();
        index.add_document("1", &tokens(&["red", "bike"]));
        index.add_document("2", &tokens(&["blue", "bike"]));
        index.remove_document("1");

        assert_eq!(index.total_documents(), 1);
        assert_eq!(index.doc_frequency("red"), 0);
        assert_eq!(index.match_any(&tokens(&["bike"])), vec!["2"]);

        index.remove_document("missing"); // no-op
        assert_eq!(index.total_documents(), 1);
    }

    #[test]
    fn test_readd_keeps_insertion_rank() {
        let mut index = InvertedIndex::new();
        index.add_document("1", &tokens(&["red"]));
        index.add_document("2", &tokens(&["red"]));
        index.add_document("1", &tokens(&["green"]));

        assert!(index.insertion_rank("1") < index.insertion_rank("2"));
        assert_eq!(index.term_frequency("red", "1"), 0);
        assert_eq!(index.term_frequency("green", "1"), 1);
    }

    #[test]
    fn test_term_frequencies_and_lengths() {
        let mut index = InvertedIndex::new();
        index.add_document("1", &tokens(&["bike", "bike", "red"]));

        assert_eq!(index.term_frequency("bike", "1"), 2);
        assert_eq!(index.doc_length("1"), 3);
        assert!((index.avg_doc_length() - 3.0).abs() < f64::EPSILON);
    }
}
