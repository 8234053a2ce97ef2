//! Clusters (topics) of items that cover the same subject

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::{ClusterId, Item, ItemId, MAX_SIMILARITY};

/// Recency order: newest first, ties broken by item id
pub fn by_recency(a: &Item, b: &Item) -> Ordering {
    b.timestamp
        .cmp(&a.timestamp)
        .then_with(|| a.id.cmp(&b.id))
}

/// A group of items judged to represent one topic within a window
#[derive(Debug, Clone, Serialize)]
pub struct Cluster {
    /// Derived from member ids
    pub id: ClusterId,
    /// Shared references into the item snapshot, newest first
    pub members: Vec<Arc<Item>>,
    /// Title of the newest member
    pub title: String,
    /// Minimum pairwise similarity among members (100 for singletons)
    pub cohesion: f64,
    /// Similarity threshold in force when the cluster formed
    pub threshold: f64,
}

impl Cluster {
    /// Build a cluster from its members; returns `None` for an empty member set
    pub fn new(mut members: Vec<Arc<Item>>, cohesion: f64, threshold: f64) -> Option<Self> {
        members.sort_by(|a, b| by_recency(a, b));
        let title = members.first()?.title.clone();
        let id = ClusterId::from_members(members.iter().map(|m| &m.id));

        Some(Self {
            id,
            members,
            title,
            cohesion: cohesion.clamp(0.0, MAX_SIMILARITY),
            threshold,
        })
    }

    /// Number of member items
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Clusters are never empty; provided for API symmetry
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }

    /// Timestamp of the newest member
    pub fn newest_at(&self) -> Option<DateTime<Utc>> {
        self.members.first().map(|m| m.timestamp)
    }

    /// Distinct member domains, sorted
    pub fn domains(&self) -> BTreeSet<&str> {
        self.members.iter().map(|m| m.domain.as_str()).collect()
    }

    pub fn member_ids(&self) -> impl Iterator<Item = &ItemId> {
        self.members.iter().map(|m| &m.id)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.members.iter().any(|m| &m.id == id)
    }

    /// Whether this cluster counts toward the backfill floor
    pub fn qualifies(&self, min_cohesion: f64, min_members: usize) -> bool {
        self.cohesion >= min_cohesion && self.len() >= min_members
    }
}
