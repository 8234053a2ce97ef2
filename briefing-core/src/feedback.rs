//! User feedback on previously delivered topics
//!
//! Records are written by the external feedback channel and read here as an
//! immutable snapshot. Only records inside the lookback window are active.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What kind of topic a record refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicKind {
    News,
    Repo,
}

/// Feedback label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackLabel {
    Useful,
    #[serde(alias = "not_useful")]
    Useless,
    /// Reader asked not to see this topic again
    Skip,
}

impl FeedbackLabel {
    /// +1 for positive feedback, -1 for negative
    pub fn polarity(self) -> i64 {
        match self {
            FeedbackLabel::Useful => 1,
            FeedbackLabel::Useless | FeedbackLabel::Skip => -1,
        }
    }
}

/// One feedback event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub topic_kind: TopicKind,
    /// Topic fingerprint (or a cluster id from the run that delivered it)
    pub topic_ref: String,
    pub label: FeedbackLabel,
    #[serde(default)]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user_id: String,
}

/// Per-label counts for one topic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeedbackTally {
    pub useful: u32,
    pub useless: u32,
    pub skip: u32,
}

impl FeedbackTally {
    fn add(&mut self, label: FeedbackLabel) {
        match label {
            FeedbackLabel::Useful => self.useful += 1,
            FeedbackLabel::Useless => self.useless += 1,
            FeedbackLabel::Skip => self.skip += 1,
        }
    }

    fn merge(&mut self, other: &FeedbackTally) {
        self.useful += other.useful;
        self.useless += other.useless;
        self.skip += other.skip;
    }

    /// Sum of record polarities
    pub fn net(&self) -> i64 {
        self.useful as i64 - self.useless as i64 - self.skip as i64
    }

    pub fn total(&self) -> u32 {
        self.useful + self.useless + self.skip
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Immutable feedback snapshot taken at pass start
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedbackSnapshot {
    records: Vec<FeedbackRecord>,
}

impl FeedbackSnapshot {
    pub fn new(records: Vec<FeedbackRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[FeedbackRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index the records active in `(now - lookback, now]`
    pub fn active(&self, now: DateTime<Utc>, lookback: Duration) -> ActiveFeedback {
        let since = now - lookback;
        let mut tallies: BTreeMap<(TopicKind, String), FeedbackTally> = BTreeMap::new();

        for record in &self.records {
            if record.created_at <= since || record.created_at > now {
                continue;
            }
            tallies
                .entry((record.topic_kind, record.topic_ref.clone()))
                .or_default()
                .add(record.label);
        }

        ActiveFeedback { tallies }
    }
}

/// Active feedback indexed by topic
#[derive(Debug, Clone, Default)]
pub struct ActiveFeedback {
    tallies: BTreeMap<(TopicKind, String), FeedbackTally>,
}

impl ActiveFeedback {
    /// Combined tally over every reference a topic may be known by
    pub fn tally(&self, kind: TopicKind, refs: &[&str]) -> FeedbackTally {
        let mut total = FeedbackTally::default();
        let mut seen: Vec<&str> = Vec::with_capacity(refs.len());

        for reference in refs {
            if seen.contains(reference) {
                continue;
            }
            seen.push(reference);
            if let Some(tally) = self.tallies.get(&(kind, reference.to_string())) {
                total.merge(tally);
            }
        }
        total
    }

    /// Number of distinct topics with active feedback
    pub fn topic_count(&self) -> usize {
        self.tallies.len()
    }
}
