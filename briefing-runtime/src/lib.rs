//! Briefing Runtime
//!
//! Drives a full ranking pass over one snapshot:
//! - **BackfillController**: relaxes window and threshold until enough clusters qualify
//! - **RankingEngine**: validation, clustering, link selection, scoring and dedup,
//!   with a structured trace of every decision

pub mod backfill;
pub mod pass;

pub use backfill::*;
pub use pass::*;

pub use briefing_rank::{RankedRepo, RepoSnapshot, Topic};
