use crate::schema::SearchIndex;
use std::collections::HashMap;

/// Bookkeeping for named index schemas. Holds nothing but the schema map;
/// documents live with the service and the text engine.
#[derive(Debug, Default)]
pub struct IndexManager {
    indexes: HashMap<String, SearchIndex>,
}

impl IndexManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, name: &str) -> bool {
        self.indexes.contains_key(name)
    }

    /// Store or overwrite the schema under `spec.name`. Overwriting does not
    /// migrate already-indexed documents; callers re-index when the shape
    /// changes.
    pub fn create(&mut self, spec: SearchIndex) {
        self.indexes.insert(spec.name.clone(), spec);
    }

    pub fn get(&self, name: &str) -> Option<&SearchIndex> {
        self.indexes.get(name)
    }

    /// No-op when the name is absent
    pub fn delete(&mut self, name: &str) {
        self.indexes.remove(name);
    }

    pub fn list_indexes(&self) -> Vec<String> {
        let mut names: Vec<String> = self.indexes.keys().cloned().collect();
        names.sort();
        names
    }

    /// Defensive copy of the full map; callers can never mutate manager-owned
    /// state through the return value.
    pub fn get_all(&self) -> HashMap<String, SearchIndex> {
        self.indexes.clone()
    }

    pub fn clear(&mut self) {
        self.indexes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldType, SearchField};

    fn spec(name: &str) -> SearchIndex {
        SearchIndex::new(
            name,
            vec![
                SearchField::key("id"),
                SearchField::new("title", FieldType::String).searchable(),
            ],
        )
    }

    #[test]
    fn test_create_get_delete() {
        let mut manager = IndexManager::new();
        assert!(!manager.has("listings"));

        manager.create(spec("listings"));
        assert!(manager.has("listings"));
        assert_eq!(manager.get("listings").map(|s| s.fields.len()), Some(2));

        manager.delete("listings");
        assert!(!manager.has("listings"));
        manager.delete("listings"); // absent: no-op
    }

    #[test]
    fn test_list_is_sorted() {
        let mut manager = IndexManager::new();
        manager.create(spec("zebra"));
        manager.create(spec("alpha"));
        assert_eq!(manager.list_indexes(), vec!["alpha", "zebra"]);
    }

    #[test]
    fn test_get_all_is_a_copy() {
        let mut manager = IndexManager::new();
        manager.create(spec("listings"));

        let mut copy = manager.get_all();
        copy.remove("listings");
        copy.insert("rogue".to_string(), spec("rogue"));

        assert!(manager.has("listings"));
        assert!(!manager.has("rogue"));
    }

    #[test]
    fn test_create_overwrites() {
        let mut manager = IndexManager::new();
        manager.create(spec("listings"));

        let mut replacement = spec("listings");
        replacement.fields.push(SearchField::new("price", FieldType::Double).sortable());
        manager.create(replacement);

        assert_eq!(manager.get("listings").map(|s| s.fields.len()), Some(3));
        assert_eq!(manager.list_indexes().len(), 1);
    }
}
