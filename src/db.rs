use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};

use crate::provider::EntityProvider;
use crate::store::PersistentStore;
use crate::types::{Card, Folder, StudySet};

/// Tables the provider reads. Applications own this schema; it is exposed so
/// fixtures and tools can create a compatible database.
pub const STUDY_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS folders (
        id          TEXT PRIMARY KEY,
        name        TEXT NOT NULL,
        description TEXT,
        parent_id   TEXT,
        created_at  INTEGER NOT NULL,
        updated_at  INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS sets (
        id          TEXT PRIMARY KEY,
        title       TEXT NOT NULL,
        description TEXT,
        created_at  INTEGER NOT NULL,
        updated_at  INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS cards (
        id          TEXT PRIMARY KEY,
        set_id      TEXT NOT NULL,
        term        TEXT NOT NULL,
        definition  TEXT NOT NULL,
        position    INTEGER NOT NULL DEFAULT 0
    );";

/// Open a study database in read-only mode.
/// WAL must be set before query_only — journal_mode writes a flag; query_only
/// blocks all writes including pragma writes, so the order matters.
pub fn open_study_db(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("opening study database {}", path.display()))?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA query_only = ON;
         PRAGMA busy_timeout = 5000;",
    )?;
    Ok(conn)
}

/// Fetch every folder, skipping rows that fail to decode.
pub fn get_all_folders(conn: &Connection) -> Result<Vec<Folder>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, parent_id, created_at, updated_at
         FROM folders
         ORDER BY created_at, id",
    )?;

    let folders = stmt
        .query_map([], |row| {
            Ok(Folder {
                id: row.get::<_, String>(0)?,
                name: row.get::<_, String>(1).unwrap_or_default(),
                description: row.get::<_, Option<String>>(2).unwrap_or_default(),
                parent_id: row.get::<_, Option<String>>(3).unwrap_or_default(),
                created_at: row.get::<_, i64>(4)?,
                updated_at: row.get::<_, i64>(5)?,
            })
        })?
        .filter_map(|r| {
            r.map_err(|e| tracing::warn!("Skipping malformed folder row: {e}"))
                .ok()
        })
        .collect();

    Ok(folders)
}

/// Fetch every set with its cards, cards in `position` order.
pub fn get_all_sets(conn: &Connection) -> Result<Vec<StudySet>> {
    let mut cards_by_set: HashMap<String, Vec<Card>> = HashMap::new();
    {
        let mut stmt = conn.prepare(
            "SELECT set_id, id, term, definition
             FROM cards
             ORDER BY set_id, position, rowid",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    Card {
                        id: row.get::<_, String>(1)?,
                        term: row.get::<_, String>(2).unwrap_or_default(),
                        definition: row.get::<_, String>(3).unwrap_or_default(),
                    },
                ))
            })?
            .filter_map(|r| {
                r.map_err(|e| tracing::warn!("Skipping malformed card row: {e}"))
                    .ok()
            });
        for (set_id, card) in rows {
            cards_by_set.entry(set_id).or_default().push(card);
        }
    }

    let mut stmt = conn.prepare(
        "SELECT id, title, description, created_at, updated_at
         FROM sets
         ORDER BY created_at, id",
    )?;
    let sets = stmt
        .query_map([], |row| {
            Ok(StudySet {
                id: row.get::<_, String>(0)?,
                title: row.get::<_, String>(1).unwrap_or_default(),
                description: row.get::<_, Option<String>>(2).unwrap_or_default(),
                cards: Vec::new(),
                created_at: row.get::<_, i64>(3)?,
                updated_at: row.get::<_, i64>(4)?,
            })
        })?
        .filter_map(|r| {
            r.map_err(|e| tracing::warn!("Skipping malformed set row: {e}"))
                .ok()
        })
        .map(|mut set| {
            set.cards = cards_by_set.remove(&set.id).unwrap_or_default();
            set
        })
        .collect();

    Ok(sets)
}

/// Reads folders and sets from a study database. A connection is opened per
/// call so the provider never holds the file open between rebuilds.
#[derive(Debug, Clone)]
pub struct SqliteProvider {
    path: PathBuf,
}

impl SqliteProvider {
    /// Provider reading the database at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl EntityProvider for SqliteProvider {
    fn get_folders(&self) -> Result<Vec<Folder>> {
        let conn = open_study_db(&self.path)?;
        get_all_folders(&conn)
    }

    fn get_sets(&self) -> Result<Vec<StudySet>> {
        let conn = open_study_db(&self.path)?;
        get_all_sets(&conn)
    }
}

/// Key/value blobs in a `kv` table.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store database, creating the `kv` table.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("opening store {}", path.display()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        Self::with_connection(conn)
    }

    /// Store that lives only as long as this value.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                 key   TEXT PRIMARY KEY,
                 value TEXT NOT NULL
             );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| anyhow::anyhow!("store connection lock poisoned: {e}"))
    }
}

impl PersistentStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(path: &Path) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(STUDY_SCHEMA).unwrap();
        conn.execute_batch(
            "INSERT INTO folders VALUES ('f1', 'Languages', NULL, NULL, 1, 2);
             INSERT INTO sets VALUES ('s1', 'Spanish', 'Basics', 10, 20);
             INSERT INTO sets VALUES ('s2', 'Empty', NULL, 11, 21);
             INSERT INTO cards VALUES ('c2', 's1', 'adios', 'goodbye', 2);
             INSERT INTO cards VALUES ('c1', 's1', 'hola', 'hello', 1);",
        )
        .unwrap();
    }

    #[test]
    fn provider_reads_sets_with_ordered_cards() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("study.sqlite");
        seed(&path);

        let provider = SqliteProvider::new(&path);
        let folders = provider.get_folders().unwrap();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].description, None);

        let sets = provider.get_sets().unwrap();
        assert_eq!(sets.len(), 2);
        let card_ids: Vec<&str> = sets[0].cards.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(card_ids, vec!["c1", "c2"]);
        assert!(sets[1].cards.is_empty());
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("study.sqlite");
        seed(&path);
        {
            let conn = Connection::open(&path).unwrap();
            // INTEGER affinity keeps non-numeric text as TEXT, which fails the i64 read.
            conn.execute_batch(
                "INSERT INTO folders VALUES ('f-bad', 'Broken', NULL, NULL, 'not-a-date', 2);
                 INSERT INTO sets VALUES ('s-bad', 'Broken', NULL, 12, 'yesterday');",
            )
            .unwrap();
        }

        let provider = SqliteProvider::new(&path);
        let folders = provider.get_folders().unwrap();
        let folder_ids: Vec<&str> = folders.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(folder_ids, vec!["f1"]);

        let sets = provider.get_sets().unwrap();
        let set_ids: Vec<&str> = sets.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(set_ids, vec!["s1", "s2"]);
        assert_eq!(sets[0].cards.len(), 2);
    }

    #[test]
    fn provider_connection_is_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("study.sqlite");
        seed(&path);
        let conn = open_study_db(&path).unwrap();
        assert!(conn.execute("DELETE FROM folders", []).is_err());
    }

    #[test]
    fn missing_tables_surface_as_errors() {
        let dir = tempfile::tempdir().unwrap();
        let provider = SqliteProvider::new(dir.path().join("empty.sqlite"));
        assert!(provider.get_sets().is_err());
    }

    #[test]
    fn store_upserts() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "one").unwrap();
        store.set("k", "two").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.sqlite");
        SqliteStore::open(&path).unwrap().set("search_history", "[\"a\"]").unwrap();
        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.get("search_history").unwrap().as_deref(), Some("[\"a\"]"));
    }
}
