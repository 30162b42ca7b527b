//! Embeddable search over study folders, sets, and cards.
//!
//! Builds a token index from entity snapshots supplied by an
//! [`EntityProvider`], answers ranked free-text + filtered queries, offers
//! prefix suggestions, and keeps a capped query history. Index and history
//! are written wholesale to a [`PersistentStore`] after every mutation.

pub mod config;
pub mod db;
pub mod engine;
pub mod history;
pub mod index;
pub mod provider;
pub mod query;
pub mod shared;
pub mod store;
pub mod suggest;
pub mod tokenizer;
pub mod types;

pub use config::EngineConfig;
pub use db::{SqliteProvider, SqliteStore};
pub use engine::SearchEngine;
pub use provider::{EntityProvider, StaticProvider};
pub use shared::SharedSearchEngine;
pub use store::{FileStore, MemoryStore, PersistentStore};
pub use tokenizer::{create_tokens, tokenize};
pub use types::{
    Card, DateRange, EntityData, EntryMetadata, Folder, IndexEntry, IndexStats, ItemKind,
    PopularSearch, SearchFilter, SearchQuery, SearchResult, SortBy, SortOrder, StudySet,
};

/// Install the fmt subscriber used by the CLI.
/// Only WARN and above in release builds to avoid leaking study content.
pub fn init_tracing(verbose: bool) {
    let level = if verbose || cfg!(debug_assertions) {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}
