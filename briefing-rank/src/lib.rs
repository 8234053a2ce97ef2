//! Briefing Rank
//!
//! The stages of a ranking pass, each a pure function of its inputs:
//! - **Similarity**: token-set ratio over normalized titles
//! - **ClusterBuilder**: single-linkage grouping inside a time window
//! - **LinkSelector**: one representative link per cluster, plus evidence
//! - **ValueScorer**: category priority, size, recency and diversity, adjusted by feedback
//! - **Deduplicator**: suppresses recently published fingerprints
//! - **RepoScorer**: the repository counterpart of the value scorer

pub mod traits;
pub mod similarity;
pub mod builder;
pub mod link;
pub mod topic;
pub mod scorer;
pub mod dedup;
pub mod repo;

pub use traits::*;
pub use similarity::*;
pub use builder::*;
pub use link::*;
pub use topic::*;
pub use scorer::*;
pub use dedup::*;
pub use repo::*;
