//! Snapshots written by one engine are picked up by the next.

use rusqlite::Connection;
use study_search::db::STUDY_SCHEMA;
use study_search::{
    EngineConfig, FileStore, ItemKind, MemoryStore, PersistentStore, SearchEngine, SearchQuery,
    SortBy, SqliteProvider, SqliteStore, StaticProvider,
};

#[test]
fn persisted_single_entry_scores_five() {
    let store = MemoryStore::new();
    store
        .set(
            "search_index",
            r#"[{"id":"c1","kind":"card","content":"hola","tokens":["hola","title:hola"],
                "metadata":{"title":"hola","createdAt":1,"updatedAt":2}}]"#,
        )
        .unwrap();

    let engine = SearchEngine::new(StaticProvider::default(), store);
    let mut query = SearchQuery::new("hola");
    query.sort_by = SortBy::Relevance;
    let results = engine.search(&query);

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "c1");
    assert_eq!(results[0].kind, ItemKind::Card);
    assert!((results[0].relevance_score - 5.0).abs() < 1e-9);
    assert_eq!(results[0].last_modified, 2);
}

#[test]
fn file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mut engine = SearchEngine::new(StaticProvider::default(), FileStore::new(dir.path()));
        let data = study_search::EntityData::Folder(study_search::Folder {
            id: "f1".into(),
            name: "Chemistry Notes".into(),
            description: None,
            parent_id: None,
            created_at: 1,
            updated_at: 1,
        });
        engine.update_item("f1", ItemKind::Folder, &data);
        engine.save_search_query("chemistry");
    }

    let engine = SearchEngine::new(StaticProvider::default(), FileStore::new(dir.path()));
    assert_eq!(engine.len(), 1);
    assert_eq!(engine.search(&SearchQuery::new("chemistry"))[0].id, "f1");
    assert_eq!(engine.get_search_history(), vec!["chemistry"]);
}

#[test]
fn removals_and_cleared_history_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let folder = |id: &str, name: &str| {
        study_search::EntityData::Folder(study_search::Folder {
            id: id.into(),
            name: name.into(),
            description: None,
            parent_id: None,
            created_at: 1,
            updated_at: 1,
        })
    };

    {
        let mut engine = SearchEngine::new(StaticProvider::default(), FileStore::new(dir.path()));
        engine.update_item("f1", ItemKind::Folder, &folder("f1", "Chemistry"));
        engine.update_item("f2", ItemKind::Folder, &folder("f2", "Physics"));
        engine.save_search_query("chemistry");
    }
    {
        let mut engine = SearchEngine::new(StaticProvider::default(), FileStore::new(dir.path()));
        assert_eq!(engine.len(), 2);
        assert_eq!(engine.get_search_history(), vec!["chemistry"]);
        assert_eq!(engine.remove_item("f1", None), 1);
        engine.clear_search_history();
    }

    let engine = SearchEngine::new(StaticProvider::default(), FileStore::new(dir.path()));
    assert_eq!(engine.len(), 1);
    assert!(engine.entry("f1", ItemKind::Folder).is_none());
    assert!(engine.search(&SearchQuery::new("chemistry")).is_empty());
    assert!(engine.get_search_history().is_empty());
}

#[test]
fn persisted_index_round_trips_exactly() {
    let store = MemoryStore::new();
    let provider = StaticProvider::new(
        Vec::new(),
        vec![study_search::StudySet {
            id: "s1".into(),
            title: "Capitals".into(),
            description: Some("Europe".into()),
            cards: vec![study_search::Card {
                id: "c1".into(),
                term: "Paris".into(),
                definition: "France".into(),
            }],
            created_at: 5,
            updated_at: 6,
        }],
    );
    let mut engine = SearchEngine::new(provider, store);
    engine.build_index();
    let original = engine.entry("c1", ItemKind::Card).unwrap();
    let json = serde_json::to_string(&original).unwrap();
    let back: study_search::IndexEntry = serde_json::from_str(&json).unwrap();
    assert_eq!(back, original);
}

#[test]
fn sqlite_source_and_store_share_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("study.sqlite");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(STUDY_SCHEMA).unwrap();
        conn.execute_batch(
            "INSERT INTO folders VALUES ('f1', 'Geography', 'Maps and places', NULL, 1, 1);
             INSERT INTO sets VALUES ('s1', 'Rivers', NULL, 2, 3);
             INSERT INTO cards VALUES ('c1', 's1', 'Danube', 'Flows through Vienna', 0);",
        )
        .unwrap();
    }

    let config = EngineConfig::default();
    {
        let store = SqliteStore::open(&path).unwrap();
        let mut engine =
            SearchEngine::with_config(SqliteProvider::new(&path), store, config.clone());
        assert_eq!(engine.build_index(), 3);
        engine.save_search_query("danube");
    }

    let store = SqliteStore::open(&path).unwrap();
    assert!(store.get(&config.index_key).unwrap().is_some());
    let engine = SearchEngine::with_config(SqliteProvider::new(&path), store, config);
    let results = engine.search(&SearchQuery::new("vienna"));
    let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["s1", "c1"]);
    assert_eq!(results[1].parent_name.as_deref(), Some("Rivers"));
    assert_eq!(engine.get_search_history(), vec!["danube"]);
}
