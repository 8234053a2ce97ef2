//! Topics: finalized clusters carrying their link, fingerprint and score

use serde::Serialize;
use std::cmp::Ordering;

use briefing_core::{Category, Cluster, FeedbackTally, Fingerprint, TopicKind};

use crate::{Fingerprinted, LinkSelection};

/// Where a topic's sources come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceQuality {
    /// Every source is an official vendor domain
    Official,
    /// Official and non-official sources
    Mixed,
    #[default]
    Community,
}

/// How a topic's score was assembled
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub category: Option<Category>,
    /// Every category signalled by any member
    pub signals: Vec<Category>,
    pub category_score: f64,
    pub size_score: f64,
    pub recency_score: f64,
    pub diversity_score: f64,
    pub base: f64,
    pub feedback: FeedbackTally,
    pub feedback_multiplier: f64,
    pub distinct_domains: usize,
    pub source_quality: SourceQuality,
}

/// A cluster ready for ranking and handoff
#[derive(Debug, Clone, Serialize)]
pub struct Topic {
    pub cluster: Cluster,
    pub link: LinkSelection,
    /// Run-independent identity: normalized title + domain of the member the
    /// title came from
    pub fingerprint: Fingerprint,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

impl Topic {
    pub fn new(cluster: Cluster, link: LinkSelection) -> Self {
        let domain = cluster
            .members
            .first()
            .map_or(link.domain.as_str(), |m| m.domain.as_str());
        let fingerprint = Fingerprint::for_topic(&cluster.title, domain);
        Self {
            cluster,
            link,
            fingerprint,
            score: 0.0,
            breakdown: ScoreBreakdown::default(),
        }
    }

    pub fn title(&self) -> &str {
        &self.cluster.title
    }

    pub fn member_count(&self) -> usize {
        self.cluster.len()
    }

    /// References feedback may use for this topic
    pub fn feedback_refs(&self) -> [&str; 2] {
        [self.fingerprint.as_str(), self.cluster.id.as_str()]
    }
}

impl Fingerprinted for Topic {
    fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    fn kind(&self) -> TopicKind {
        TopicKind::News
    }

    fn label(&self) -> &str {
        &self.cluster.title
    }
}

/// Ranking order: score descending, then cluster id ascending
pub fn rank_order(a: &Topic, b: &Topic) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.cluster.id.cmp(&b.cluster.id))
}
