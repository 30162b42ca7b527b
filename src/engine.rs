use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::EngineConfig;
use crate::history::SearchHistory;
use crate::index::SearchIndex;
use crate::provider::EntityProvider;
use crate::store::PersistentStore;
use crate::types::{
    EntityData, Folder, IndexEntry, IndexStats, ItemKind, PopularSearch, SearchQuery, SearchResult,
    StudySet,
};

/// An isolated search engine instance.
///
/// Owns the index and the history; callers only see copies. Every mutation
/// writes a full snapshot of the affected state to the store. Store and
/// provider failures are logged and absorbed: the in-memory state stays
/// authoritative.
///
/// Not internally synchronized. Wrap it in [`crate::SharedSearchEngine`] when
/// more than one caller can mutate it.
pub struct SearchEngine<P, S> {
    provider: P,
    store: S,
    config: EngineConfig,
    index: SearchIndex,
    history: SearchHistory,
    /// Wall-clock time of the last successful rebuild (Unix ms).
    last_built_at: Option<i64>,
}

impl<P: EntityProvider, S: PersistentStore> SearchEngine<P, S> {
    /// Create an engine with default settings, restoring persisted state.
    pub fn new(provider: P, store: S) -> Self {
        Self::with_config(provider, store, EngineConfig::default())
    }

    /// Create an engine, restoring any persisted index and history.
    /// Missing or corrupt snapshots start out empty.
    pub fn with_config(provider: P, store: S, config: EngineConfig) -> Self {
        let index = load_index(&store, &config.index_key);
        let history = load_history(&store, &config.history_key, config.history_limit);
        tracing::debug!(
            entries = index.len(),
            history = history.queries().len(),
            "search engine opened"
        );
        Self {
            provider,
            store,
            config,
            index,
            history,
            last_built_at: None,
        }
    }

    /// Active settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ─── Index maintenance ────────────────────────────────────────────────────

    /// Rebuild the whole index from the provider. If the provider fails the
    /// previous index is kept. Returns the number of entries indexed.
    pub fn build_index(&mut self) -> usize {
        let (folders, sets) = match self.read_sources() {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Index rebuild skipped, failed to read entities: {e:#}");
                return self.index.len();
            }
        };

        self.index = SearchIndex::build(&folders, &sets);
        self.last_built_at = Some(now_ms());
        tracing::info!(
            folders = folders.len(),
            sets = sets.len(),
            entries = self.index.len(),
            "search index rebuilt"
        );
        self.persist_index();
        self.index.len()
    }

    fn read_sources(&self) -> anyhow::Result<(Vec<Folder>, Vec<StudySet>)> {
        Ok((self.provider.get_folders()?, self.provider.get_sets()?))
    }

    /// Replace (or insert) the entry for `id` of `kind` with one computed from
    /// `data`. Returns false, changing nothing, when `data` is for another kind.
    pub fn update_item(&mut self, id: &str, kind: ItemKind, data: &EntityData) -> bool {
        if data.kind() != kind {
            tracing::warn!(%id, expected = %kind, got = %data.kind(), "Rejected index update with mismatched kind");
            return false;
        }
        self.index.upsert(id, data);
        tracing::debug!(%id, %kind, "index entry updated");
        self.persist_index();
        true
    }

    /// Remove entries with `id`, of `kind` only when given.
    /// Returns how many entries were removed.
    pub fn remove_item(&mut self, id: &str, kind: Option<ItemKind>) -> usize {
        let removed = self.index.remove(id, kind);
        tracing::debug!(%id, removed, "index entries removed");
        self.persist_index();
        removed
    }

    // ─── Queries ──────────────────────────────────────────────────────────────

    /// Run a query against the current index.
    pub fn search(&self, query: &SearchQuery) -> Vec<SearchResult> {
        let results = crate::query::search(self.index.entries(), query, self.config.snippet_len);
        tracing::debug!(query = %query.free_text, hits = results.len(), "search");
        results
    }

    /// Autocomplete with the configured default limit.
    pub fn get_suggestions(&self, partial: &str) -> Vec<String> {
        self.get_suggestions_with_limit(partial, self.config.suggestion_limit)
    }

    /// Autocomplete with an explicit limit.
    pub fn get_suggestions_with_limit(&self, partial: &str, limit: usize) -> Vec<String> {
        crate::suggest::suggestions(self.index.entries(), partial, limit)
    }

    /// Copy of one index entry.
    pub fn entry(&self, id: &str, kind: ItemKind) -> Option<IndexEntry> {
        self.index.get(id, kind).cloned()
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True when nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Per-kind counts and the time of the last rebuild.
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            last_built_at: self.last_built_at,
            ..self.index.stats()
        }
    }

    // ─── History ──────────────────────────────────────────────────────────────

    /// Record a query. Blank input is ignored and not persisted.
    pub fn save_search_query(&mut self, query: &str) {
        if self.history.push(query) {
            self.persist_history();
        }
    }

    /// Recent queries, newest first.
    pub fn get_search_history(&self) -> Vec<String> {
        self.history.queries().to_vec()
    }

    /// Empty the history and persist the empty list.
    pub fn clear_search_history(&mut self) {
        self.history.clear();
        self.persist_history();
    }

    /// Most frequent recent queries.
    pub fn get_popular_searches(&self) -> Vec<PopularSearch> {
        self.history.popular(self.config.popular_limit)
    }

    /// Distinct words from the most recent queries.
    pub fn get_trending_terms(&self) -> Vec<String> {
        self.history.trending(
            self.config.trending_window,
            self.config.trending_min_len,
            self.config.trending_limit,
        )
    }

    // ─── Persistence ──────────────────────────────────────────────────────────

    fn persist_index(&self) {
        let result = self
            .index
            .to_json()
            .and_then(|json| self.store.set(&self.config.index_key, &json));
        if let Err(e) = result {
            tracing::warn!("Failed to persist search index: {e:#}");
        }
    }

    fn persist_history(&self) {
        let result = self
            .history
            .to_json()
            .and_then(|json| self.store.set(&self.config.history_key, &json));
        if let Err(e) = result {
            tracing::warn!("Failed to persist search history: {e:#}");
        }
    }
}

fn load_index<S: PersistentStore>(store: &S, key: &str) -> SearchIndex {
    match store.get(key) {
        Ok(Some(json)) => SearchIndex::from_json(&json).unwrap_or_else(|e| {
            tracing::warn!("Discarding corrupt search index: {e:#}");
            SearchIndex::new()
        }),
        Ok(None) => SearchIndex::new(),
        Err(e) => {
            tracing::warn!("Failed to read search index: {e:#}");
            SearchIndex::new()
        }
    }
}

fn load_history<S: PersistentStore>(store: &S, key: &str, limit: usize) -> SearchHistory {
    match store.get(key) {
        Ok(Some(json)) => SearchHistory::from_json(&json, limit).unwrap_or_else(|e| {
            tracing::warn!("Discarding corrupt search history: {e:#}");
            SearchHistory::new(limit)
        }),
        Ok(None) => SearchHistory::new(limit),
        Err(e) => {
            tracing::warn!("Failed to read search history: {e:#}");
            SearchHistory::new(limit)
        }
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
