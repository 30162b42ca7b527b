use std::collections::BTreeSet;

use crate::tokenizer::{is_field_scoped, tokenize};
use crate::types::IndexEntry;

/// Shortest accepted prefix.
pub const MIN_PREFIX_LEN: usize = 2;

/// Completions of `partial` drawn from index tokens and title words.
///
/// Shorter completions come first; equal lengths are ordered lexicographically.
pub fn suggestions(entries: &[IndexEntry], partial: &str, limit: usize) -> Vec<String> {
    let prefix = partial.trim().to_lowercase();
    if prefix.chars().count() < MIN_PREFIX_LEN {
        return Vec::new();
    }

    let completes = |candidate: &str| candidate.starts_with(&prefix) && candidate.len() > prefix.len();

    let mut pool: BTreeSet<String> = BTreeSet::new();
    for entry in entries {
        pool.extend(
            entry
                .tokens
                .iter()
                .filter(|t| !is_field_scoped(t))
                .map(|t| t.to_lowercase())
                .filter(|t| completes(t)),
        );
        pool.extend(
            tokenize(&entry.metadata.title)
                .into_iter()
                .filter(|t| completes(t)),
        );
    }

    let mut ranked: Vec<String> = pool.into_iter().collect();
    ranked.sort_by_key(|s| s.chars().count());
    ranked.truncate(limit);
    ranked
}
