//! Filtering, scoring, and ranking of index entries.
//!
//! Per query token an entry earns:
//!
//! | Match                         | Score              | Counts as matched |
//! |-------------------------------|--------------------|-------------------|
//! | exact bare token              | 2.0                | yes               |
//! | `title:` scoped token         | 3.0                | no                |
//! | `tag:` scoped token           | 2.5                | no                |
//! | bare token containing it      | 0.5 per token      | yes (once)        |
//!
//! The raw sum is normalized by query length and then multiplied by the
//! coverage ratio (matched query tokens / query tokens), so an entry that
//! covers half the query scores a quarter of one that covers all of it with the
//! same raw total.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::tokenizer::{is_field_scoped, tokenize, TAG_PREFIX, TITLE_PREFIX};
use crate::types::{IndexEntry, ItemKind, SearchQuery, SearchResult, SortBy, SortOrder};

pub const EXACT_MATCH_SCORE: f64 = 2.0;
pub const TITLE_MATCH_SCORE: f64 = 3.0;
pub const TAG_MATCH_SCORE: f64 = 2.5;
pub const PARTIAL_MATCH_SCORE: f64 = 0.5;

/// Score given to every entry of a filters-only query.
pub const FILTER_ONLY_SCORE: f64 = 1.0;

/// Default length of card snippets, in characters.
pub const DEFAULT_SNIPPET_LEN: usize = 150;

/// Relevance of one entry against the query tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryScore {
    pub score: f64,
    pub matched_terms: Vec<String>,
}

/// Score `entry` against `query_tokens`. `None` when no query token matched.
pub fn score_entry(entry: &IndexEntry, query_tokens: &BTreeSet<String>) -> Option<EntryScore> {
    if query_tokens.is_empty() {
        return None;
    }

    let mut raw = 0.0;
    let mut matched_terms: Vec<String> = Vec::new();

    for query_token in query_tokens {
        let mut matched = false;

        if entry.tokens.contains(query_token) {
            matched = true;
            raw += EXACT_MATCH_SCORE;
        }
        if entry.tokens.contains(&format!("{TITLE_PREFIX}{query_token}")) {
            raw += TITLE_MATCH_SCORE;
        }
        if entry.tokens.contains(&format!("{TAG_PREFIX}{query_token}")) {
            raw += TAG_MATCH_SCORE;
        }

        let partials = entry
            .tokens
            .iter()
            .filter(|t| !is_field_scoped(t) && *t != query_token && t.contains(query_token.as_str()))
            .count();
        if partials > 0 {
            matched = true;
            raw += PARTIAL_MATCH_SCORE * partials as f64;
        }

        if matched {
            matched_terms.push(query_token.clone());
        }
    }

    if matched_terms.is_empty() {
        return None;
    }

    let n = query_tokens.len() as f64;
    let coverage = matched_terms.len() as f64 / n;
    Some(EntryScore {
        score: (raw / n) * coverage,
        matched_terms,
    })
}

/// Run `query` over `entries` and return ranked results.
pub fn search(entries: &[IndexEntry], query: &SearchQuery, snippet_len: usize) -> Vec<SearchResult> {
    if query.free_text.trim().is_empty() && !query.filter.is_active() {
        return Vec::new();
    }

    if query.filter.tags.is_some() || query.filter.has_bookmark.is_some() || query.filter.color.is_some() {
        tracing::debug!("tags/bookmark/color filters are not indexed; ignoring them");
    }

    let query_tokens = tokenize(&query.free_text);
    // Text that tokenizes to nothing ("a", "!!") carries no intent on its own.
    if query_tokens.is_empty() && !query.filter.is_active() {
        return Vec::new();
    }

    let candidates = entries.iter().filter(|entry| {
        let kind_ok = query
            .filter
            .kinds
            .as_ref()
            .map_or(true, |kinds| kinds.contains(&entry.kind));
        let date_ok = query
            .filter
            .date_range
            .map_or(true, |range| range.contains(entry.metadata.updated_at));
        kind_ok && date_ok
    });

    let mut results: Vec<SearchResult> = if query_tokens.is_empty() {
        candidates
            .map(|entry| to_result(entry, FILTER_ONLY_SCORE, Vec::new(), snippet_len))
            .collect()
    } else {
        candidates
            .filter_map(|entry| {
                score_entry(entry, &query_tokens)
                    .map(|s| to_result(entry, s.score, s.matched_terms, snippet_len))
            })
            .collect()
    };

    sort_results(&mut results, query.sort_by, query.sort_order);

    if let Some(limit) = query.limit {
        results.truncate(limit);
    }
    results
}

/// Stable sort, so equal keys keep index order.
pub fn sort_results(results: &mut [SearchResult], sort_by: SortBy, order: SortOrder) {
    let directed = |ord: Ordering| match order {
        SortOrder::Asc => ord,
        SortOrder::Desc => ord.reverse(),
    };
    match sort_by {
        SortBy::Relevance => results.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap_or(Ordering::Equal)
        }),
        SortBy::Date => results.sort_by(|a, b| directed(a.last_modified.cmp(&b.last_modified))),
        SortBy::Name => results.sort_by(|a, b| directed(a.title.cmp(&b.title))),
        SortBy::Type => results.sort_by(|a, b| directed(a.kind.as_str().cmp(b.kind.as_str()))),
    }
}

fn to_result(entry: &IndexEntry, score: f64, matched_terms: Vec<String>, snippet_len: usize) -> SearchResult {
    let snippet = match entry.kind {
        ItemKind::Card => Some(make_snippet(&entry.content, snippet_len)),
        ItemKind::Folder | ItemKind::Set => None,
    };
    SearchResult {
        id: entry.id.clone(),
        kind: entry.kind,
        title: entry.metadata.title.clone(),
        description: entry.metadata.description.clone(),
        snippet,
        parent_name: entry.metadata.parent_name.clone(),
        relevance_score: score,
        matched_terms,
        last_modified: entry.metadata.updated_at,
    }
}

/// Truncate on a char boundary, marking the cut with an ellipsis.
fn make_snippet(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", content[..cut].trim_end()),
        None => content.to_string(),
    }
}
