//! Record of previously published topics
//!
//! Append-only and owned by the delivery stage; this crate only reads it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Fingerprint, TopicKind};

/// One emitted topic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicationRecord {
    pub fingerprint: Fingerprint,
    #[serde(default = "default_kind")]
    pub kind: TopicKind,
    pub published_at: DateTime<Utc>,
}

fn default_kind() -> TopicKind {
    TopicKind::News
}

/// Immutable publication snapshot taken at pass start
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicationSnapshot {
    records: Vec<PublicationRecord>,
}

impl PublicationSnapshot {
    pub fn new(records: Vec<PublicationRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[PublicationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Latest publication time per fingerprint inside `(now - window, now]`
    pub fn recent(
        &self,
        kind: TopicKind,
        now: DateTime<Utc>,
        window: Duration,
    ) -> BTreeMap<&Fingerprint, DateTime<Utc>> {
        let since = now - window;
        let mut recent: BTreeMap<&Fingerprint, DateTime<Utc>> = BTreeMap::new();

        for record in &self.records {
            if record.kind != kind || record.published_at <= since || record.published_at > now {
                continue;
            }
            recent
                .entry(&record.fingerprint)
                .and_modify(|at| *at = (*at).max(record.published_at))
                .or_insert(record.published_at);
        }
        recent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_recent_window_is_half_open() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let snapshot = PublicationSnapshot::new(vec![
            PublicationRecord {
                fingerprint: Fingerprint::from("in"),
                kind: TopicKind::News,
                published_at: now - Duration::hours(10),
            },
            PublicationRecord {
                fingerprint: Fingerprint::from("edge"),
                kind: TopicKind::News,
                published_at: now - Duration::hours(24),
            },
            PublicationRecord {
                fingerprint: Fingerprint::from("repo"),
                kind: TopicKind::Repo,
                published_at: now - Duration::hours(1),
            },
        ]);

        let recent = snapshot.recent(TopicKind::News, now, Duration::hours(24));
        assert!(recent.contains_key(&Fingerprint::from("in")));
        assert!(!recent.contains_key(&Fingerprint::from("edge")));
        assert!(!recent.contains_key(&Fingerprint::from("repo")));
    }

    #[test]
    fn test_deserialize_without_kind() {
        let json = r#"[{"fingerprint":"abc","published_at":"2026-03-01T00:00:00Z"}]"#;
        let snapshot: PublicationSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.records()[0].kind, TopicKind::News);
    }
}
