use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The three entity kinds that end up in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Folder,
    Set,
    Card,
}

impl ItemKind {
    /// Lowercase name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Folder => "folder",
            ItemKind::Set => "set",
            ItemKind::Card => "card",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "folder" => Ok(ItemKind::Folder),
            "set" => Ok(ItemKind::Set),
            "card" => Ok(ItemKind::Card),
            other => Err(anyhow::anyhow!("unknown item kind: {other}")),
        }
    }
}

// ─── Entity snapshots ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<String>,
    pub created_at: i64, // Unix timestamp in ms
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub term: String,
    pub definition: String,
}

/// A study set together with all of its cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySet {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub cards: Vec<Card>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Replacement data for a single incremental index update.
/// One variant per kind so every kind is handled at every match site.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityData {
    Folder(Folder),
    Set(StudySet),
    /// Cards carry no timestamps of their own; they inherit the owning set's.
    Card {
        card: Card,
        set_title: String,
        created_at: i64,
        updated_at: i64,
    },
}

impl EntityData {
    /// Kind this data updates.
    pub fn kind(&self) -> ItemKind {
        match self {
            EntityData::Folder(_) => ItemKind::Folder,
            EntityData::Set(_) => ItemKind::Set,
            EntityData::Card { .. } => ItemKind::Card,
        }
    }
}

// ─── Index ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryMetadata {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One searchable unit derived from a folder, set, or card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub kind: ItemKind,
    pub content: String,
    /// Includes `title:` / `tag:` field-scoped copies. Ordered only so that
    /// serialized snapshots are stable.
    pub tokens: BTreeSet<String>,
    pub metadata: EntryMetadata,
}

/// Index status reported to callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub total_entries: usize,
    pub folders: usize,
    pub sets: usize,
    pub cards: usize,
    /// Wall-clock time of the last full rebuild (Unix ms), if one ran in this process.
    pub last_built_at: Option<i64>,
}

// ─── Queries ───────────────────────────────────────────────────────────────────

/// Inclusive `[start, end]` range over `updated_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: i64,
    pub end: i64,
}

impl DateRange {
    /// Inclusive on both ends.
    pub fn contains(&self, ts: i64) -> bool {
        self.start <= ts && ts <= self.end
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    #[serde(rename = "type")]
    pub kinds: Option<BTreeSet<ItemKind>>,
    pub date_range: Option<DateRange>,
    pub tags: Option<Vec<String>>,
    pub has_bookmark: Option<bool>,
    pub color: Option<String>,
}

impl SearchFilter {
    /// True when any filter field is set, even one that is not applied.
    pub fn is_active(&self) -> bool {
        self.kinds.is_some()
            || self.date_range.is_some()
            || self.tags.is_some()
            || self.has_bookmark.is_some()
            || self.color.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Relevance,
    Date,
    Name,
    Type,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub free_text: String,
    #[serde(default)]
    pub filter: SearchFilter,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub sort_order: SortOrder,
    pub limit: Option<usize>,
}

impl SearchQuery {
    /// Query for `free_text` with no filters and default sort.
    pub fn new(free_text: impl Into<String>) -> Self {
        Self {
            free_text: free_text.into(),
            ..Self::default()
        }
    }

    /// Restrict results to the given kinds.
    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = ItemKind>) -> Self {
        self.filter.kinds = Some(kinds.into_iter().collect());
        self
    }

    /// Restrict results to `updated_at` within `[start, end]`.
    pub fn with_date_range(mut self, start: i64, end: i64) -> Self {
        self.filter.date_range = Some(DateRange { start, end });
        self
    }

    pub fn with_sort(mut self, sort_by: SortBy, sort_order: SortOrder) -> Self {
        self.sort_by = sort_by;
        self.sort_order = sort_order;
        self
    }

    /// Keep at most `limit` results.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    pub kind: ItemKind,
    pub title: String,
    pub description: Option<String>,
    /// Only set for cards.
    pub snippet: Option<String>,
    pub parent_name: Option<String>,
    pub relevance_score: f64,
    pub matched_terms: Vec<String>,
    pub last_modified: i64,
}

/// A history query with its occurrence count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularSearch {
    pub query: String,
    pub count: usize,
}
