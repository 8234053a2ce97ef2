//! Repository ranking
//!
//! Star growth and total stars decay with time since the last push; open
//! issues add a small capped activity bonus. Feedback scales the result the
//! same way it does for news topics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

use briefing_core::{
    ActiveFeedback, FeedbackTally, Fingerprint, RepoWeights, ScoringWeights, TopicKind,
};

use crate::{feedback_multiplier, Fingerprinted};

/// A repository as captured by the collection stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoSnapshot {
    /// `owner/name`
    pub full_name: String,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    pub stars: u64,
    #[serde(default)]
    pub forks: u64,
    #[serde(default)]
    pub open_issues: u32,
    pub last_pushed_at: DateTime<Utc>,
    #[serde(default)]
    pub language: Option<String>,
    /// Stars at the previous capture (about a day earlier); none means no growth known
    #[serde(default)]
    pub stars_previous: Option<u64>,
}

impl RepoSnapshot {
    pub fn star_delta(&self) -> i64 {
        match self.stars_previous {
            Some(prev) => self.stars as i64 - prev as i64,
            None => 0,
        }
    }
}

/// A scored repository
#[derive(Debug, Clone, Serialize)]
pub struct RankedRepo {
    pub repo: RepoSnapshot,
    pub fingerprint: Fingerprint,
    pub star_delta: i64,
    pub days_since_push: i64,
    pub base: f64,
    pub feedback: FeedbackTally,
    pub feedback_multiplier: f64,
    pub score: f64,
}

impl Fingerprinted for RankedRepo {
    fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    fn kind(&self) -> TopicKind {
        TopicKind::Repo
    }

    fn label(&self) -> &str {
        &self.repo.full_name
    }
}

/// Score descending, then full name ascending
pub fn repo_order(a: &RankedRepo, b: &RankedRepo) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.repo.full_name.cmp(&b.repo.full_name))
}

/// Scores and orders repositories
#[derive(Debug, Clone, Default)]
pub struct RepoScorer {
    weights: RepoWeights,
    feedback: ScoringWeights,
}

impl RepoScorer {
    /// `feedback` supplies the per-record step and cap of the feedback multiplier
    pub fn new(weights: RepoWeights, feedback: ScoringWeights) -> Self {
        Self { weights, feedback }
    }

    /// Score before feedback
    pub fn base_score(&self, repo: &RepoSnapshot, now: DateTime<Utc>) -> f64 {
        let w = &self.weights;
        let days = (now - repo.last_pushed_at).num_days().max(1) as f64;
        let growth = repo.star_delta() as f64 * w.star_delta + repo.stars as f64 * w.stars;
        let issues = repo.open_issues.min(w.open_issues_cap) as f64 * w.open_issues;
        growth / days.sqrt() + issues
    }

    pub fn score(
        &self,
        repo: RepoSnapshot,
        now: DateTime<Utc>,
        feedback: &ActiveFeedback,
    ) -> RankedRepo {
        let fingerprint = Fingerprint::for_repo(&repo.full_name);
        let refs = [fingerprint.as_str(), repo.full_name.as_str()];
        let tally = feedback.tally(TopicKind::Repo, &refs);
        let multiplier = feedback_multiplier(&tally, &self.feedback);
        let base = self.base_score(&repo, now);

        RankedRepo {
            fingerprint,
            star_delta: repo.star_delta(),
            days_since_push: (now - repo.last_pushed_at).num_days(),
            base,
            feedback: tally,
            feedback_multiplier: multiplier,
            score: base * multiplier,
            repo,
        }
    }

    pub fn rank(
        &self,
        repos: Vec<RepoSnapshot>,
        now: DateTime<Utc>,
        feedback: &ActiveFeedback,
    ) -> Vec<RankedRepo> {
        let mut ranked: Vec<RankedRepo> = repos
            .into_iter()
            .map(|repo| self.score(repo, now, feedback))
            .collect();
        ranked.sort_by(repo_order);

        debug!("Ranked {} repositories", ranked.len());
        ranked
    }
}
