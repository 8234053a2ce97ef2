//! Briefing Core - Domain model for content clustering and ranking
//!
//! This crate provides the foundational primitives:
//! - Items as fetched by the collection stage, and their validation
//! - Text normalization shared by similarity and fingerprinting
//! - Clusters (topics) with deterministic identifiers
//! - The value-priority category taxonomy
//! - Read-only feedback and publication snapshots
//! - Engine configuration and its validation

pub mod item;
pub mod text;
pub mod fingerprint;
pub mod cluster;
pub mod category;
pub mod feedback;
pub mod publication;
pub mod config;

pub use item::*;
pub use text::*;
pub use fingerprint::*;
pub use cluster::*;
pub use category::*;
pub use feedback::*;
pub use publication::*;
pub use config::*;

/// Default clustering window in hours
pub const DEFAULT_WINDOW_HOURS: i64 = 72;

/// Default similarity threshold (0-100)
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 70.0;

/// Threshold below which backfill never relaxes
pub const DEFAULT_THRESHOLD_FLOOR: f64 = 30.0;

/// Default cross-run dedup window in hours
pub const DEFAULT_DEDUP_HOURS: i64 = 24;

/// Default feedback lookback in days
pub const DEFAULT_FEEDBACK_LOOKBACK_DAYS: i64 = 30;

/// Default number of topics handed to generation
pub const DEFAULT_TOP_N: usize = 10;

/// Maximum similarity score
pub const MAX_SIMILARITY: f64 = 100.0;
