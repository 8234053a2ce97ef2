//! Cross-Run Deduplicator
//!
//! Drops ranked topics whose fingerprint was published inside the trailing
//! dedup window, and repeated fingerprints inside one pass (the higher-ranked
//! copy survives). Input order is preserved. Never writes publication records.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

use briefing_core::{Fingerprint, PublicationSnapshot};

use crate::Fingerprinted;

/// Why a topic was removed from the output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SuppressReason {
    /// Published inside the dedup window
    Published { at: DateTime<Utc> },
    /// Same fingerprint as a higher-ranked topic in this pass
    Duplicate,
    /// Reader asked to skip this topic
    Skipped,
}

/// A removed topic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suppressed {
    pub fingerprint: Fingerprint,
    pub title: String,
    #[serde(flatten)]
    pub reason: SuppressReason,
}

/// Survivors, in input order, plus what was removed
#[derive(Debug, Clone)]
pub struct DedupOutcome<T> {
    pub kept: Vec<T>,
    pub suppressed: Vec<Suppressed>,
}

/// Filters ranked topics against the publication record
#[derive(Debug, Clone, Copy)]
pub struct Deduplicator {
    window: Duration,
}

impl Deduplicator {
    /// A zero window disables cross-run suppression
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn filter<T: Fingerprinted>(
        &self,
        ranked: Vec<T>,
        publications: &PublicationSnapshot,
        now: DateTime<Utc>,
    ) -> DedupOutcome<T> {
        let Some(kind) = ranked.first().map(|t| t.kind()) else {
            return DedupOutcome {
                kept: Vec::new(),
                suppressed: Vec::new(),
            };
        };
        let recent = publications.recent(kind, now, self.window);

        let mut seen: BTreeSet<Fingerprint> = BTreeSet::new();
        let mut kept = Vec::with_capacity(ranked.len());
        let mut suppressed = Vec::new();

        for topic in ranked {
            let fingerprint = topic.fingerprint().clone();

            let reason = if let Some(at) = recent.get(&fingerprint) {
                Some(SuppressReason::Published { at: *at })
            } else if seen.contains(&fingerprint) {
                Some(SuppressReason::Duplicate)
            } else {
                None
            };

            match reason {
                Some(reason) => {
                    debug!("Suppressed {} ({:?})", fingerprint, reason);
                    suppressed.push(Suppressed {
                        title: topic.label().to_string(),
                        fingerprint,
                        reason,
                    });
                }
                None => {
                    seen.insert(fingerprint);
                    kept.push(topic);
                }
            }
        }

        DedupOutcome { kept, suppressed }
    }
}
