use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::history::MAX_HISTORY;
use crate::query::DEFAULT_SNIPPET_LEN;

/// Tunables for a [`crate::SearchEngine`]. Missing keys in a config file
/// fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Store key holding the serialized index.
    pub index_key: String,
    /// Store key holding the serialized history.
    pub history_key: String,
    pub history_limit: usize,
    pub popular_limit: usize,
    /// How many recent queries feed the trending terms.
    pub trending_window: usize,
    pub trending_limit: usize,
    pub trending_min_len: usize,
    pub suggestion_limit: usize,
    pub snippet_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            index_key: "search_index".to_string(),
            history_key: "search_history".to_string(),
            history_limit: MAX_HISTORY,
            popular_limit: 10,
            trending_window: 10,
            trending_limit: 8,
            trending_min_len: 3,
            suggestion_limit: 5,
            snippet_len: DEFAULT_SNIPPET_LEN,
        }
    }
}

impl EngineConfig {
    /// Load overrides from a JSON file.
    pub fn from_json(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }
}

/// Where the CLI keeps its data when no path is given.
/// `$STUDY_SEARCH_HOME` wins; otherwise the platform data directory.
pub fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("STUDY_SEARCH_HOME") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }

    #[cfg(not(target_os = "windows"))]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".local/share/study-search");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(app_data) = std::env::var("APPDATA") {
            return PathBuf::from(app_data).join("study-search");
        }
    }

    PathBuf::from(".")
}
