//! Common traits for ranking stages

use briefing_core::{Fingerprint, TopicKind};

/// Pairwise text closeness on a 0-100 scale.
///
/// Implementations receive text that is already normalized and must be pure
/// and symmetric, so clustering stays reproducible.
pub trait SimilarityMetric: Send + Sync {
    /// Score in [0, 100]; 100 means token-identical
    fn similarity(&self, a: &str, b: &str) -> f64;

    /// Metric name for traces
    fn name(&self) -> &str;
}

/// Anything that can be matched against the publication record
pub trait Fingerprinted {
    fn fingerprint(&self) -> &Fingerprint;

    fn kind(&self) -> TopicKind;

    /// Human-readable name for traces
    fn label(&self) -> &str;
}
