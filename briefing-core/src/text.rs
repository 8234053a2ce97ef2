//! Text normalization
//!
//! Similarity and fingerprinting both operate on the same normalized form:
//! lower-cased, punctuation folded to spaces, whitespace collapsed.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

// Anything that is not a letter or a digit separates tokens
static NON_WORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}]+").unwrap());

/// Normalize text for comparison
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    NON_WORD_REGEX
        .replace_all(&lowered, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tokens of already-normalized text
pub fn tokens(normalized: &str) -> impl Iterator<Item = &str> {
    normalized.split(' ').filter(|t| !t.is_empty())
}

/// Sorted, de-duplicated token set of already-normalized text
pub fn token_set(normalized: &str) -> BTreeSet<&str> {
    tokens(normalized).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_folds_punctuation() {
        assert_eq!(normalize("  OpenAI's  GPT-5:\tlaunch!! "), "openai s gpt 5 launch");
    }

    #[test]
    fn test_normalize_keeps_cjk() {
        assert_eq!(normalize("AI 工具，效率提升"), "ai 工具 效率提升");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("!!! ..."), "");
    }

    #[test]
    fn test_token_set_sorted_unique() {
        let normalized = normalize("b a b c");
        let set: Vec<_> = token_set(&normalized).into_iter().collect();
        assert_eq!(set, vec!["a", "b", "c"]);
    }
}
