//! Ranking Engine
//!
//! One pass over an immutable snapshot:
//! 1. Validate items (malformed ones are skipped and traced)
//! 2. Cluster with backfill
//! 3. Pick a link per qualifying cluster
//! 4. Score and order
//! 5. Drop skipped and recently published topics
//! 6. Keep the top N
//!
//! Nothing here reads the wall clock or writes anywhere.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use briefing_core::{
    ConfigError, EngineConfig, FeedbackSnapshot, InputError, Item, PublicationSnapshot, RawItem,
};
use briefing_rank::{
    Deduplicator, Fingerprinted, LinkSelector, RankedRepo, RepoScorer, RepoSnapshot, ScoreContext,
    SuppressReason, Suppressed, Topic, ValueScorer, Window,
};

use crate::{BackfillController, BackfillStep};

/// Errors that stop a pass before it starts
#[derive(Debug, Error)]
pub enum PassError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Everything a news pass reads
#[derive(Debug, Clone, Default)]
pub struct PassInput {
    pub now: DateTime<Utc>,
    pub items: Vec<RawItem>,
    pub feedback: FeedbackSnapshot,
    pub publications: PublicationSnapshot,
}

/// Everything a repository pass reads
#[derive(Debug, Clone, Default)]
pub struct RepoPassInput {
    pub now: DateTime<Utc>,
    pub repos: Vec<RepoSnapshot>,
    pub feedback: FeedbackSnapshot,
    pub publications: PublicationSnapshot,
}

/// Whether the pass met its qualifying-cluster target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PassStatus {
    Full,
    Degraded { qualifying: usize, required: usize },
}

impl PassStatus {
    pub fn is_degraded(&self) -> bool {
        matches!(self, PassStatus::Degraded { .. })
    }
}

/// An input item that was not used
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedItem {
    /// Position in the input sequence
    pub index: usize,
    pub id: Option<String>,
    pub error: String,
}

/// Structured record of how a news pass went
#[derive(Debug, Clone, Serialize)]
pub struct PassTrace {
    pub run_id: Uuid,
    pub now: DateTime<Utc>,
    pub items_received: usize,
    pub items_accepted: usize,
    pub skipped: Vec<SkippedItem>,
    pub backfill: Vec<BackfillStep>,
    pub selected_step: u32,
    pub window: Window,
    pub threshold: f64,
    pub clusters_formed: usize,
    pub qualifying: usize,
    pub feedback_topics: usize,
    pub suppressed: Vec<Suppressed>,
    /// Ranked topics cut by the top-N limit
    pub truncated: usize,
}

/// Output of a news pass
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub status: PassStatus,
    pub topics: Vec<Topic>,
    pub trace: PassTrace,
}

/// Structured record of a repository pass
#[derive(Debug, Clone, Serialize)]
pub struct RepoTrace {
    pub run_id: Uuid,
    pub now: DateTime<Utc>,
    pub repos_received: usize,
    pub feedback_topics: usize,
    pub suppressed: Vec<Suppressed>,
    pub truncated: usize,
}

/// Output of a repository pass
#[derive(Debug, Clone, Serialize)]
pub struct RepoReport {
    pub repos: Vec<RankedRepo>,
    pub trace: RepoTrace,
}

/// Runs ranking passes under one validated configuration
pub struct RankingEngine {
    config: EngineConfig,
    links: LinkSelector,
    scorer: ValueScorer,
    repos: RepoScorer,
    dedup: Deduplicator,
}

impl RankingEngine {
    /// Validate `config` and build the stages; fails before any work on bad input
    pub fn new(config: EngineConfig) -> Result<Self, PassError> {
        config.validate()?;

        Ok(Self {
            links: LinkSelector::new(&config.low_priority_domains),
            scorer: ValueScorer::new(config.scoring.clone()),
            repos: RepoScorer::new(config.repo.clone(), config.scoring.clone()),
            dedup: Deduplicator::new(config.dedup_window()),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run a news pass
    pub fn run(&self, input: &PassInput) -> PassReport {
        let now = input.now;
        let (items, skipped) = ingest(&input.items);
        let run_id = run_id("news", now, items.iter().map(|i| i.id.as_str()));
        info!(
            "Starting ranking pass {} over {} items at {}",
            run_id,
            input.items.len(),
            now
        );

        let controller = BackfillController::new(
            self.config.window(),
            self.config.similarity_threshold,
            self.config.backfill.clone(),
        );
        let backfill = controller.run(&items, now);

        let topics: Vec<Topic> = backfill
            .qualifying_clusters(&self.config.backfill)
            .filter_map(|cluster| {
                let link = self.links.select(cluster)?;
                Some(Topic::new(cluster.clone(), link))
            })
            .collect();

        let feedback = input
            .feedback
            .active(now, self.config.feedback_lookback());
        let ctx = ScoreContext {
            now,
            window: backfill.window.span(),
            feedback: &feedback,
        };
        let ranked = self.scorer.rank(topics, &ctx);

        let (ranked, mut suppressed) = self.drop_skipped(ranked);
        let outcome = self.dedup.filter(ranked, &input.publications, now);
        suppressed.extend(outcome.suppressed);

        let mut topics = outcome.kept;
        let truncated = topics.len().saturating_sub(self.config.top_n);
        topics.truncate(self.config.top_n);

        let status = if backfill.degraded {
            PassStatus::Degraded {
                qualifying: backfill.qualifying,
                required: backfill.required,
            }
        } else {
            PassStatus::Full
        };

        info!(
            "Pass {} finished: {} topics, {} suppressed, {:?}",
            run_id,
            topics.len(),
            suppressed.len(),
            status
        );

        PassReport {
            status,
            topics,
            trace: PassTrace {
                run_id,
                now,
                items_received: input.items.len(),
                items_accepted: items.len(),
                skipped,
                backfill: backfill.steps,
                selected_step: backfill.selected_step,
                window: backfill.window,
                threshold: backfill.threshold,
                clusters_formed: backfill.clusters.len(),
                qualifying: backfill.qualifying,
                feedback_topics: feedback.topic_count(),
                suppressed,
                truncated,
            },
        }
    }

    /// Run a repository pass
    pub fn run_repos(&self, input: &RepoPassInput) -> RepoReport {
        let now = input.now;
        let run_id = run_id("repo", now, input.repos.iter().map(|r| r.full_name.as_str()));
        info!(
            "Starting repository pass {} over {} repositories",
            run_id,
            input.repos.len()
        );

        let feedback = input
            .feedback
            .active(now, self.config.feedback_lookback());
        let ranked = self.repos.rank(input.repos.clone(), now, &feedback);

        let (ranked, mut suppressed) = self.drop_skipped(ranked);
        let outcome = self.dedup.filter(ranked, &input.publications, now);
        suppressed.extend(outcome.suppressed);

        let mut repos = outcome.kept;
        let truncated = repos.len().saturating_sub(self.config.top_repos);
        repos.truncate(self.config.top_repos);

        info!("Repository pass {} finished: {} repositories", run_id, repos.len());

        RepoReport {
            repos,
            trace: RepoTrace {
                run_id,
                now,
                repos_received: input.repos.len(),
                feedback_topics: feedback.topic_count(),
                suppressed,
                truncated,
            },
        }
    }

    /// Remove entries with active skip feedback when configured to honor it
    fn drop_skipped<T>(&self, ranked: Vec<T>) -> (Vec<T>, Vec<Suppressed>)
    where
        T: Fingerprinted + HasFeedback,
    {
        if !self.config.honor_skip_feedback {
            return (ranked, Vec::new());
        }

        let mut suppressed = Vec::new();
        let kept = ranked
            .into_iter()
            .filter(|entry| {
                if entry.skip_count() == 0 {
                    return true;
                }
                debug!("Skipping '{}' on reader request", entry.label());
                suppressed.push(Suppressed {
                    fingerprint: entry.fingerprint().clone(),
                    title: entry.label().to_string(),
                    reason: SuppressReason::Skipped,
                });
                false
            })
            .collect();
        (kept, suppressed)
    }
}

/// Access to the active skip count of a scored entry
trait HasFeedback {
    fn skip_count(&self) -> u32;
}

impl HasFeedback for Topic {
    fn skip_count(&self) -> u32 {
        self.breakdown.feedback.skip
    }
}

impl HasFeedback for RankedRepo {
    fn skip_count(&self) -> u32 {
        self.feedback.skip
    }
}

/// Name-based id over the pass clock and the sorted input keys, so the same
/// snapshot always reports the same run
fn run_id<'a>(kind: &str, now: DateTime<Utc>, keys: impl Iterator<Item = &'a str>) -> Uuid {
    let keys: BTreeSet<&str> = keys.collect();
    let mut name = format!("{}|{}", kind, now.to_rfc3339());
    for key in keys {
        name.push('|');
        name.push_str(key);
    }
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

/// Validate raw items, skipping malformed entries and repeated ids
fn ingest(raw: &[RawItem]) -> (Vec<Arc<Item>>, Vec<SkippedItem>) {
    let mut items = Vec::with_capacity(raw.len());
    let mut skipped = Vec::new();
    let mut seen = BTreeSet::new();

    for (index, entry) in raw.iter().enumerate() {
        let result = Item::try_from(entry.clone()).and_then(|item| {
            if seen.insert(item.id.clone()) {
                Ok(item)
            } else {
                Err(InputError::DuplicateId(item.id.to_string()))
            }
        });

        match result {
            Ok(item) => items.push(Arc::new(item)),
            Err(e) => {
                warn!("Skipping item #{}: {}", index, e);
                skipped.push(SkippedItem {
                    index,
                    id: entry.id.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    (items, skipped)
}
