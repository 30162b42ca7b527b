use std::sync::Arc;

use tokio::sync::Mutex;

use crate::engine::SearchEngine;
use crate::provider::EntityProvider;
use crate::store::PersistentStore;
use crate::types::{EntityData, IndexStats, ItemKind, PopularSearch, SearchQuery, SearchResult};

/// Cloneable handle that serializes every operation on one engine.
///
/// A rebuild and an incremental update can never interleave, so the update is
/// never lost under a concurrent rebuild: whichever acquires the lock second
/// sees the first one's result.
pub struct SharedSearchEngine<P, S> {
    inner: Arc<Mutex<SearchEngine<P, S>>>,
}

impl<P, S> Clone for SharedSearchEngine<P, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: EntityProvider, S: PersistentStore> SharedSearchEngine<P, S> {
    /// Wrap an engine so callers share it behind one lock.
    pub fn new(engine: SearchEngine<P, S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    pub async fn build_index(&self) -> usize {
        self.inner.lock().await.build_index()
    }

    pub async fn update_item(&self, id: &str, kind: ItemKind, data: &EntityData) -> bool {
        self.inner.lock().await.update_item(id, kind, data)
    }

    pub async fn remove_item(&self, id: &str, kind: Option<ItemKind>) -> usize {
        self.inner.lock().await.remove_item(id, kind)
    }

    pub async fn search(&self, query: &SearchQuery) -> Vec<SearchResult> {
        self.inner.lock().await.search(query)
    }

    pub async fn get_suggestions(&self, partial: &str, limit: Option<usize>) -> Vec<String> {
        let engine = self.inner.lock().await;
        match limit {
            Some(limit) => engine.get_suggestions_with_limit(partial, limit),
            None => engine.get_suggestions(partial),
        }
    }

    pub async fn save_search_query(&self, query: &str) {
        self.inner.lock().await.save_search_query(query)
    }

    pub async fn get_search_history(&self) -> Vec<String> {
        self.inner.lock().await.get_search_history()
    }

    pub async fn clear_search_history(&self) {
        self.inner.lock().await.clear_search_history()
    }

    pub async fn get_popular_searches(&self) -> Vec<PopularSearch> {
        self.inner.lock().await.get_popular_searches()
    }

    pub async fn get_trending_terms(&self) -> Vec<String> {
        self.inner.lock().await.get_trending_terms()
    }

    pub async fn stats(&self) -> IndexStats {
        self.inner.lock().await.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StaticProvider;
    use crate::store::MemoryStore;
    use crate::types::{Card, StudySet};

    fn engine() -> SharedSearchEngine<StaticProvider, MemoryStore> {
        let set = StudySet {
            id: "s1".into(),
            title: "Colors".into(),
            description: None,
            cards: vec![Card { id: "c1".into(), term: "rojo".into(), definition: "red".into() }],
            created_at: 1,
            updated_at: 1,
        };
        SharedSearchEngine::new(SearchEngine::new(
            StaticProvider::new(Vec::new(), vec![set]),
            MemoryStore::new(),
        ))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_history_saves_are_all_kept() {
        let shared = engine();
        let mut handles = Vec::new();
        for i in 0..10 {
            let shared = shared.clone();
            handles.push(tokio::spawn(async move {
                shared.save_search_query(&format!("query {i}")).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(shared.get_search_history().await.len(), 10);
    }

    #[tokio::test]
    async fn update_after_rebuild_is_visible() {
        let shared = engine();
        shared.build_index().await;
        let card = EntityData::Card {
            card: Card { id: "c2".into(), term: "azul".into(), definition: "blue".into() },
            set_title: "Colors".into(),
            created_at: 2,
            updated_at: 2,
        };
        assert!(shared.update_item("c2", ItemKind::Card, &card).await);
        let hits = shared.search(&SearchQuery::new("azul")).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].parent_name.as_deref(), Some("Colors"));
        assert_eq!(shared.stats().await.cards, 2);
        assert_eq!(shared.get_suggestions("az", None).await, vec!["azul"]);
    }
}
