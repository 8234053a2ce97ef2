//! Token-set similarity
//!
//! Compares the shared tokens of two texts against each side's extra tokens
//! using a character-level edit ratio. Word order and repeated words do not
//! matter, and a title that is a token subset of another scores 100.

use briefing_core::{normalize, token_set, MAX_SIMILARITY};

use crate::SimilarityMetric;

/// Token-set ratio metric
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSetRatio;

impl SimilarityMetric for TokenSetRatio {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        token_set_ratio(a, b)
    }

    fn name(&self) -> &str {
        "token_set_ratio"
    }
}

/// Normalize both texts, then score them with [`token_set_ratio`]
pub fn similarity(a: &str, b: &str) -> f64 {
    token_set_ratio(&normalize(a), &normalize(b))
}

/// Token-set ratio of two normalized strings
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let set_a = token_set(a);
    let set_b = token_set(b);

    match (set_a.is_empty(), set_b.is_empty()) {
        (true, true) => return MAX_SIMILARITY,
        (true, false) | (false, true) => return 0.0,
        _ => {}
    }

    let shared: Vec<&str> = set_a.intersection(&set_b).copied().collect();
    let only_a: Vec<&str> = set_a.difference(&set_b).copied().collect();
    let only_b: Vec<&str> = set_b.difference(&set_a).copied().collect();

    // One side is a subset of the other
    if !shared.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return MAX_SIMILARITY;
    }

    let shared_text = shared.join(" ");
    let with_a = join_nonempty(&shared_text, &only_a.join(" "));
    let with_b = join_nonempty(&shared_text, &only_b.join(" "));

    let mut best = edit_ratio(&with_a, &with_b);
    if !shared_text.is_empty() {
        best = best
            .max(edit_ratio(&shared_text, &with_a))
            .max(edit_ratio(&shared_text, &with_b));
    }
    best.clamp(0.0, MAX_SIMILARITY)
}

fn join_nonempty(head: &str, tail: &str) -> String {
    match (head.is_empty(), tail.is_empty()) {
        (true, _) => tail.to_string(),
        (_, true) => head.to_string(),
        _ => format!("{} {}", head, tail),
    }
}

/// Normalized edit similarity over chars, scaled to 0-100
pub fn edit_ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b) * MAX_SIMILARITY
}
