//! Text normalization into index tokens.
//!
//! Rules: lowercase, every non-word character (anything other than an
//! alphanumeric or `_`) becomes a separator, tokens of one character or less
//! are dropped. Field-scoped copies (`title:foo`, `tag:foo`) let the scorer
//! weight title and tag hits without a separate index per field.

use std::collections::BTreeSet;

pub const TITLE_PREFIX: &str = "title:";
pub const TAG_PREFIX: &str = "tag:";

/// Tokens in order of appearance, duplicates kept.
pub fn token_stream(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|word| word.chars().count() > 1)
        .map(String::from)
        .collect()
}

/// Unique tokens of `text`.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    token_stream(text).into_iter().collect()
}

/// True for synthetic `title:` / `tag:` tokens.
pub fn is_field_scoped(token: &str) -> bool {
    token.starts_with(TITLE_PREFIX) || token.starts_with(TAG_PREFIX)
}

/// Build the token set of an entry from its fields.
pub fn create_tokens(
    title: &str,
    content: Option<&str>,
    description: Option<&str>,
    tags: &[String],
) -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();

    for token in tokenize(title) {
        tokens.insert(format!("{TITLE_PREFIX}{token}"));
        tokens.insert(token);
    }
    if let Some(content) = content {
        tokens.extend(tokenize(content));
    }
    if let Some(description) = description {
        tokens.extend(tokenize(description));
    }
    for tag in tags {
        for token in tokenize(tag) {
            tokens.insert(format!("{TAG_PREFIX}{token}"));
            tokens.insert(token);
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn tokenize_basic() {
        assert_eq!(tokenize("Hello, World!"), set(&["hello", "world"]));
    }

    #[test]
    fn tokenize_drops_single_chars() {
        assert_eq!(tokenize("I am a test"), set(&["am", "test"]));
    }

    #[test]
    fn tokenize_keeps_digits_and_underscores() {
        assert_eq!(tokenize("snake_case v2 x"), set(&["snake_case", "v2"]));
    }

    #[test]
    fn tokenize_handles_non_ascii() {
        assert_eq!(tokenize("¿Dónde ESTÁ?"), set(&["dónde", "está"]));
    }

    #[test]
    fn tokenize_empty_and_punctuation() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("...---...").is_empty());
    }

    #[test]
    fn token_stream_keeps_order() {
        let tokens = token_stream("zeta alpha zeta");
        assert_eq!(tokens, vec!["zeta", "alpha", "zeta"]);
    }

    #[test]
    fn create_tokens_title_and_tag() {
        let tokens = create_tokens("Hello World", None, None, &["greeting".to_string()]);
        assert_eq!(
            tokens,
            set(&["hello", "world", "title:hello", "title:world", "greeting", "tag:greeting"])
        );
    }

    #[test]
    fn create_tokens_content_and_description_are_bare() {
        let tokens = create_tokens("Verbs", Some("comer beber"), Some("Irregular"), &[]);
        assert_eq!(
            tokens,
            set(&["verbs", "title:verbs", "comer", "beber", "irregular"])
        );
    }

    #[test]
    fn field_scoped_detection() {
        assert!(is_field_scoped("title:hola"));
        assert!(is_field_scoped("tag:hola"));
        assert!(!is_field_scoped("hola"));
    }

    proptest! {
        #[test]
        fn prop_tokens_are_normalized(text in "[a-zA-Z0-9àéñÜ_ ,.!?:;'-]{0,64}") {
            for token in tokenize(&text) {
                prop_assert!(token.chars().count() > 1);
                prop_assert!(token.chars().all(|c| c.is_alphanumeric() || c == '_'));
                prop_assert!(!token.chars().any(char::is_uppercase));
            }
        }

        #[test]
        fn prop_tokenize_is_idempotent(text in "[a-zA-Z ,.!?]{0,64}") {
            let once = tokenize(&text);
            let again = tokenize(&once.iter().cloned().collect::<Vec<_>>().join(" "));
            prop_assert_eq!(once, again);
        }
    }
}
