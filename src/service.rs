use crate::document::Document;
use crate::engine::TextSearchEngine;
use crate::error::{SearchError, SearchServiceResult};
use crate::manager::IndexManager;
use crate::query::{IndexStats, SearchDocumentsResult, SearchOptions};
use crate::schema::SearchIndex;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct ServiceState {
    started: bool,
    manager: IndexManager,
    stores: HashMap<String, HashMap<String, Document>>,
    text: TextSearchEngine,
}

/// The one surface the rest of the system talks to. Owns the schema
/// bookkeeping, the per-index document stores and the text indexes, and keeps
/// them consistent under a single reader/writer lock: mutations take the
/// write half, searches the read half, so a search never observes a document
/// store and a text index that disagree.
///
/// All state is volatile; `shut_down` drops everything.
#[derive(Debug, Default)]
pub struct SearchService {
    state: RwLock<ServiceState>,
}

impl SearchService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects when already started: silently restarting would orphan
    /// in-flight state.
    pub fn start_up(&self) -> SearchServiceResult<()> {
        let mut state = self.state.write().unwrap();
        if state.started {
            return Err(SearchError::lifecycle("service is already started"));
        }
        state.started = true;
        info!("search service started");
        Ok(())
    }

    /// Clears all indexes and documents. Rejects before `start_up`.
    pub fn shut_down(&self) -> SearchServiceResult<()> {
        let mut state = self.state.write().unwrap();
        if !state.started {
            return Err(SearchError::lifecycle("service is not started"));
        }
        *state = ServiceState::default();
        info!("search service stopped, volatile state dropped");
        Ok(())
    }

    /// No-op when the name is already registered; otherwise installs the
    /// schema with an empty document store and text index.
    pub fn create_index_if_not_exists(&self, spec: SearchIndex) -> SearchServiceResult<()> {
        let mut state = self.state.write().unwrap();
        ensure_started(&state)?;
        validate_spec(&spec)?;

        if state.manager.has(&spec.name) {
            debug!(index = %spec.name, "index already exists, create is a no-op");
            return Ok(());
        }

        debug!(index = %spec.name, fields = spec.fields.len(), "creating index");
        state.stores.insert(spec.name.clone(), HashMap::new());
        state.text.create(spec.clone());
        state.manager.create(spec);
        Ok(())
    }

    /// Unconditional schema replacement. Documents already in the store are
    /// kept as-is and the text index is rebuilt under the new field
    /// capabilities; re-shaping documents is the caller's re-indexing job.
    pub fn create_or_update_index_definition(
        &self,
        name: &str,
        mut spec: SearchIndex,
    ) -> SearchServiceResult<()> {
        spec.name = name.to_string();
        let mut state = self.state.write().unwrap();
        ensure_started(&state)?;
        validate_spec(&spec)?;

        debug!(index = %name, "replacing index definition");
        let documents = state.stores.entry(name.to_string()).or_default().clone();
        state.text.build(spec.clone(), &documents);
        state.manager.create(spec);
        Ok(())
    }

    /// Drops schema, documents and text index. No-op when absent.
    pub fn delete_index(&self, name: &str) -> SearchServiceResult<()> {
        let mut state = self.state.write().unwrap();
        ensure_started(&state)?;

        debug!(index = %name, "deleting index");
        state.manager.delete(name);
        state.stores.remove(name);
        state.text.delete_index(name);
        Ok(())
    }

    pub fn index_exists(&self, name: &str) -> SearchServiceResult<bool> {
        let state = self.state.read().unwrap();
        ensure_started(&state)?;
        Ok(state.manager.has(name))
    }

    /// Store/overwrite a document by its key value and merge it into the
    /// text index.
    pub fn index_document(&self, name: &str, document: Document) -> SearchServiceResult<()> {
        let mut state = self.state.write().unwrap();
        ensure_started(&state)?;

        let key = document_key(&state.manager, name, &document)?;
        state.text.add(name, &key, &document);
        state
            .stores
            .entry(name.to_string())
            .or_default()
            .insert(key, document);
        Ok(())
    }

    /// Remove a document by its key value. A key the index never saw is a
    /// no-op.
    pub fn delete_document(&self, name: &str, document: &Document) -> SearchServiceResult<()> {
        let mut state = self.state.write().unwrap();
        ensure_started(&state)?;

        let key = document_key(&state.manager, name, document)?;
        state.text.remove(name, &key);
        if let Some(store) = state.stores.get_mut(name) {
            store.remove(&key);
        }
        Ok(())
    }

    /// Execute a search. An unknown index name yields the empty result set
    /// rather than an error: search is expected to tolerate races with index
    /// creation and deletion.
    pub fn search(
        &self,
        name: &str,
        query_text: &str,
        options: &SearchOptions,
    ) -> SearchServiceResult<SearchDocumentsResult> {
        let state = self.state.read().unwrap();
        ensure_started(&state)?;

        Ok(match state.stores.get(name) {
            Some(documents) => state.text.search(name, query_text, options, documents),
            None => SearchDocumentsResult::empty(),
        })
    }

    pub fn get_stats(&self, name: &str) -> SearchServiceResult<Option<IndexStats>> {
        let state = self.state.read().unwrap();
        ensure_started(&state)?;
        Ok(state.text.get_stats(name))
    }

    pub fn list_indexes(&self) -> SearchServiceResult<Vec<String>> {
        let state = self.state.read().unwrap();
        ensure_started(&state)?;
        Ok(state.manager.list_indexes())
    }

    /// Defensive copy of every registered schema
    pub fn index_definitions(&self) -> SearchServiceResult<HashMap<String, SearchIndex>> {
        let state = self.state.read().unwrap();
        ensure_started(&state)?;
        Ok(state.manager.get_all())
    }
}

fn ensure_started(state: &ServiceState) -> SearchServiceResult<()> {
    if state.started {
        Ok(())
    } else {
        Err(SearchError::lifecycle(
            "service is not started; call start_up first",
        ))
    }
}

fn validate_spec(spec: &SearchIndex) -> SearchServiceResult<()> {
    spec.validate().map_err(|reason| SearchError::InvalidIndexSpec {
        name: spec.name.clone(),
        reason,
    })
}

/// Resolve the document's key value against the index schema. Fails when the
/// index is unknown or the document has no usable key value.
fn document_key(
    manager: &IndexManager,
    name: &str,
    document: &Document,
) -> SearchServiceResult<String> {
    let schema = manager
        .get(name)
        .ok_or_else(|| SearchError::index_not_found(name))?;
    let key_field = schema.key_field().ok_or_else(|| SearchError::InvalidIndexSpec {
        name: name.to_string(),
        reason: "no key field".to_string(),
    })?;
    document
        .key_value(&key_field.name)
        .and_then(|value| value.render())
        .ok_or_else(|| SearchError::key_missing(name, &key_field.name))
}
