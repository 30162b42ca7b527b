use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};

use crate::tokenizer::token_stream;
use crate::types::PopularSearch;

/// Default cap on stored queries.
pub const MAX_HISTORY: usize = 20;

/// Past free-text queries, most recent first, unique by exact string.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHistory {
    queries: Vec<String>,
    limit: usize,
}

impl Default for SearchHistory {
    fn default() -> Self {
        Self::new(MAX_HISTORY)
    }
}

impl SearchHistory {
    /// Empty history keeping at most `limit` queries.
    pub fn new(limit: usize) -> Self {
        Self {
            queries: Vec::new(),
            limit,
        }
    }

    /// Record `query`, moving an earlier identical entry to the front.
    /// Returns false when the query was blank and nothing changed.
    pub fn push(&mut self, query: &str) -> bool {
        if query.trim().is_empty() {
            return false;
        }
        self.queries.retain(|q| q != query);
        self.queries.insert(0, query.to_string());
        self.queries.truncate(self.limit);
        true
    }

    /// Queries, newest first.
    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    /// Drop every query.
    pub fn clear(&mut self) {
        self.queries.clear();
    }

    /// True when no query is recorded.
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Most frequent stored queries, ties in recency order.
    pub fn popular(&self, limit: usize) -> Vec<PopularSearch> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();
        for q in &self.queries {
            let count = counts.entry(q.as_str()).or_insert(0);
            if *count == 0 {
                order.push(q.as_str());
            }
            *count += 1;
        }

        let mut popular: Vec<PopularSearch> = order
            .into_iter()
            .map(|q| PopularSearch {
                query: q.to_string(),
                count: counts[q],
            })
            .collect();
        popular.sort_by(|a, b| b.count.cmp(&a.count));
        popular.truncate(limit);
        popular
    }

    /// Unique words of the `window` most recent queries, first-seen order.
    pub fn trending(&self, window: usize, min_len: usize, limit: usize) -> Vec<String> {
        let mut seen = HashSet::new();
        self.queries
            .iter()
            .take(window)
            .flat_map(|q| token_stream(q))
            .filter(|t| t.chars().count() >= min_len)
            .filter(|t| seen.insert(t.clone()))
            .take(limit)
            .collect()
    }

    /// Serialize as a JSON array of strings.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.queries).context("History serialize failed")
    }

    /// Load a serialized history, re-applying dedupe and the cap.
    pub fn from_json(json: &str, limit: usize) -> Result<Self> {
        let stored: Vec<String> =
            serde_json::from_str(json).context("History deserialize failed")?;
        let mut seen = HashSet::new();
        let mut queries: Vec<String> = stored
            .into_iter()
            .filter(|q| !q.trim().is_empty() && seen.insert(q.clone()))
            .collect();
        queries.truncate(limit);
        Ok(Self { queries, limit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupe_and_promote() {
        let mut history = SearchHistory::default();
        history.push("spanish");
        history.push("spanish");
        history.push("french");
        assert_eq!(history.queries(), ["french", "spanish"]);
        history.push("spanish");
        assert_eq!(history.queries(), ["spanish", "french"]);
    }

    #[test]
    fn blank_queries_are_ignored() {
        let mut history = SearchHistory::default();
        assert!(!history.push(""));
        assert!(!history.push("   "));
        assert!(history.is_empty());
    }

    #[test]
    fn exact_string_dedupe_is_case_sensitive() {
        let mut history = SearchHistory::default();
        history.push("Spanish");
        history.push("spanish");
        assert_eq!(history.queries().len(), 2);
    }

    #[test]
    fn capped_at_limit() {
        let mut history = SearchHistory::default();
        for i in 0..25 {
            history.push(&format!("query {i}"));
        }
        assert_eq!(history.queries().len(), MAX_HISTORY);
        assert_eq!(history.queries()[0], "query 24");
        assert_eq!(history.queries()[MAX_HISTORY - 1], "query 5");
    }

    #[test]
    fn popular_keeps_recency_for_ties() {
        let mut history = SearchHistory::default();
        for q in ["a1", "b2", "c3"] {
            history.push(q);
        }
        let popular = history.popular(2);
        assert_eq!(
            popular,
            vec![
                PopularSearch { query: "c3".into(), count: 1 },
                PopularSearch { query: "b2".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn trending_terms_first_seen_order() {
        let mut history = SearchHistory::default();
        history.push("old spanish verbs");
        history.push("french verbs to go");
        // most recent first: "french verbs to go", "old spanish verbs"
        assert_eq!(
            history.trending(10, 3, 8),
            vec!["french", "verbs", "old", "spanish"]
        );
        assert_eq!(history.trending(1, 3, 8), vec!["french", "verbs"]);
        assert_eq!(history.trending(10, 3, 2), vec!["french", "verbs"]);
    }

    #[test]
    fn json_round_trip_and_sanitize() {
        let mut history = SearchHistory::default();
        history.push("one");
        history.push("two");
        let back = SearchHistory::from_json(&history.to_json().unwrap(), MAX_HISTORY).unwrap();
        assert_eq!(back, history);

        let messy = SearchHistory::from_json(r#"["a","a","","b","c"]"#, 2).unwrap();
        assert_eq!(messy.queries(), ["a", "b"]);
        assert!(SearchHistory::from_json("{", MAX_HISTORY).is_err());
    }
}
