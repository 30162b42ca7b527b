use anyhow::{Context, Result};

use crate::tokenizer::create_tokens;
use crate::types::{Card, EntityData, EntryMetadata, Folder, IndexEntry, IndexStats, ItemKind, StudySet};

/// In-memory token index over folders, sets, and cards.
///
/// Entries are kept in insertion order: a rebuild lays out folders first, then
/// each set followed by its cards; incremental updates append. Equal-score
/// search results come back in this order.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    entries: Vec<IndexEntry>,
}

impl SearchIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh index from entity snapshots.
    pub fn build(folders: &[Folder], sets: &[StudySet]) -> Self {
        let card_count: usize = sets.iter().map(|s| s.cards.len()).sum();
        let mut entries = Vec::with_capacity(folders.len() + sets.len() + card_count);

        entries.extend(folders.iter().map(folder_entry));
        for set in sets {
            entries.push(set_entry(set));
            entries.extend(
                set.cards
                    .iter()
                    .map(|card| card_entry(card, &set.title, set.created_at, set.updated_at)),
            );
        }

        Self { entries }
    }

    /// Replace the entry with matching id and kind (if any) with one computed
    /// from `data`. The new entry goes to the end of the index.
    pub fn upsert(&mut self, id: &str, data: &EntityData) {
        let kind = data.kind();
        self.entries.retain(|e| !(e.id == id && e.kind == kind));
        let mut entry = entry_from_data(data);
        entry.id = id.to_string();
        self.entries.push(entry);
    }

    /// Remove every entry with this id, restricted to `kind` when given.
    /// Returns how many entries were removed.
    pub fn remove(&mut self, id: &str, kind: Option<ItemKind>) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|e| !(e.id == id && kind.map_or(true, |k| e.kind == k)));
        before - self.entries.len()
    }

    /// Entry with this id and kind, if indexed.
    pub fn get(&self, id: &str, kind: ItemKind) -> Option<&IndexEntry> {
        self.entries.iter().find(|e| e.id == id && e.kind == kind)
    }

    /// All entries in index order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Number of entries currently in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Per-kind entry counts.
    pub fn stats(&self) -> IndexStats {
        let mut stats = IndexStats {
            total_entries: self.entries.len(),
            ..IndexStats::default()
        };
        for entry in &self.entries {
            match entry.kind {
                ItemKind::Folder => stats.folders += 1,
                ItemKind::Set => stats.sets += 1,
                ItemKind::Card => stats.cards += 1,
            }
        }
        stats
    }

    /// Serialize the whole index as a JSON array of entries.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.entries).context("Index serialize failed")
    }

    /// Load a previously serialized index.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<IndexEntry> =
            serde_json::from_str(json).context("Index deserialize failed")?;
        Ok(Self { entries })
    }
}

fn join_text<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Index entry for a folder: name, description.
pub fn folder_entry(folder: &Folder) -> IndexEntry {
    let description = folder.description.as_deref();
    IndexEntry {
        id: folder.id.clone(),
        kind: ItemKind::Folder,
        content: join_text([Some(folder.name.as_str()), description].into_iter().flatten()),
        tokens: create_tokens(&folder.name, None, description, &[]),
        metadata: EntryMetadata {
            title: folder.name.clone(),
            description: folder.description.clone(),
            parent_name: None,
            created_at: folder.created_at,
            updated_at: folder.updated_at,
        },
    }
}

/// A set entry also carries the text of every card so the set is found
/// through its cards.
pub fn set_entry(set: &StudySet) -> IndexEntry {
    let description = set.description.as_deref();
    let card_text = join_text(
        set.cards
            .iter()
            .flat_map(|c| [c.term.as_str(), c.definition.as_str()]),
    );
    IndexEntry {
        id: set.id.clone(),
        kind: ItemKind::Set,
        content: join_text(
            [Some(set.title.as_str()), description, Some(card_text.as_str())]
                .into_iter()
                .flatten(),
        ),
        tokens: create_tokens(&set.title, Some(card_text.as_str()), description, &[]),
        metadata: EntryMetadata {
            title: set.title.clone(),
            description: set.description.clone(),
            parent_name: None,
            created_at: set.created_at,
            updated_at: set.updated_at,
        },
    }
}

/// Index entry for a card; its parent is the owning set.
pub fn card_entry(card: &Card, set_title: &str, created_at: i64, updated_at: i64) -> IndexEntry {
    let content = join_text([card.term.as_str(), card.definition.as_str()]);
    IndexEntry {
        id: card.id.clone(),
        kind: ItemKind::Card,
        tokens: create_tokens(&card.term, Some(card.definition.as_str()), None, &[]),
        content,
        metadata: EntryMetadata {
            title: card.term.clone(),
            description: Some(card.definition.clone()),
            parent_name: Some(set_title.to_string()),
            created_at,
            updated_at,
        },
    }
}

/// Build the entry for one incremental update.
pub fn entry_from_data(data: &EntityData) -> IndexEntry {
    match data {
        EntityData::Folder(folder) => folder_entry(folder),
        EntityData::Set(set) => set_entry(set),
        EntityData::Card {
            card,
            set_title,
            created_at,
            updated_at,
        } => card_entry(card, set_title, *created_at, *updated_at),
    }
}
