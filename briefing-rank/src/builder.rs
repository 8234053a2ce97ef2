//! Cluster Builder
//!
//! Single-linkage grouping of items inside a time window:
//! - Items are visited newest first (ties by id)
//! - Each unassigned item seeds a cluster
//! - Unassigned items join when they meet the threshold against the seed or
//!   any member already attached, until the cluster stops growing
//!
//! Similarity is computed once per pair per pass over normalized titles.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use briefing_core::{by_recency, normalize, Cluster, Item, MAX_SIMILARITY};

use crate::{SimilarityMetric, TokenSetRatio};

/// Closed time window `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    /// The window `[now - span, now]`
    pub fn trailing(now: DateTime<Utc>, span: Duration) -> Self {
        Self {
            start: now - span,
            end: now,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }

    pub fn span(&self) -> Duration {
        self.end - self.start
    }
}

/// Pairwise similarities of one pass, row-major
struct SimilarityMatrix {
    n: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    fn compute<M: SimilarityMetric>(metric: &M, texts: &[String]) -> Self {
        let n = texts.len();
        let mut values = vec![MAX_SIMILARITY; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let score = metric.similarity(&texts[i], &texts[j]).clamp(0.0, MAX_SIMILARITY);
                values[i * n + j] = score;
                values[j * n + i] = score;
            }
        }
        Self { n, values }
    }

    fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }

    /// Minimum pairwise similarity among `members` (100 for a singleton)
    fn cohesion(&self, members: &[usize]) -> f64 {
        let mut min = MAX_SIMILARITY;
        for (k, &i) in members.iter().enumerate() {
            for &j in &members[k + 1..] {
                min = min.min(self.get(i, j));
            }
        }
        min
    }
}

/// Groups items into clusters for one threshold
pub struct ClusterBuilder<M = TokenSetRatio> {
    metric: M,
    threshold: f64,
}

impl ClusterBuilder<TokenSetRatio> {
    /// Builder with the default token-set metric
    pub fn with_threshold(threshold: f64) -> Self {
        Self::new(TokenSetRatio, threshold)
    }
}

impl<M: SimilarityMetric> ClusterBuilder<M> {
    pub fn new(metric: M, threshold: f64) -> Self {
        Self {
            metric,
            threshold: threshold.clamp(0.0, MAX_SIMILARITY),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn metric(&self) -> &M {
        &self.metric
    }

    /// Cluster the items whose timestamps fall inside `window`.
    ///
    /// Clusters come out in seed order (newest seed first); every in-window
    /// item lands in exactly one cluster.
    pub fn build(&self, items: &[Arc<Item>], window: &Window) -> Vec<Cluster> {
        self.build_at(items, window, self.threshold)
    }

    /// Same as [`build`](Self::build) with a one-off threshold
    pub fn build_at(&self, items: &[Arc<Item>], window: &Window, threshold: f64) -> Vec<Cluster> {
        let threshold = threshold.clamp(0.0, MAX_SIMILARITY);
        let mut pool: Vec<&Arc<Item>> = items
            .iter()
            .filter(|item| window.contains(item.timestamp))
            .collect();
        pool.sort_by(|a, b| by_recency(a, b));

        let texts: Vec<String> = pool.iter().map(|item| normalize(&item.title)).collect();
        let matrix = SimilarityMatrix::compute(&self.metric, &texts);

        let mut assigned = vec![false; pool.len()];
        let mut clusters = Vec::new();

        for seed in 0..pool.len() {
            if assigned[seed] {
                continue;
            }
            assigned[seed] = true;
            let mut members = vec![seed];

            loop {
                let mut grew = false;
                for candidate in 0..pool.len() {
                    if assigned[candidate] {
                        continue;
                    }
                    let linked = members
                        .iter()
                        .any(|&m| matrix.get(m, candidate) >= threshold);
                    if linked {
                        assigned[candidate] = true;
                        members.push(candidate);
                        grew = true;
                    }
                }
                if !grew {
                    break;
                }
            }

            let cohesion = matrix.cohesion(&members);
            let member_items = members.iter().map(|&i| Arc::clone(pool[i])).collect();
            if let Some(cluster) = Cluster::new(member_items, cohesion, threshold) {
                clusters.push(cluster);
            }
        }

        debug!(
            "Clustered {} items into {} clusters (threshold {:.1}, metric {})",
            pool.len(),
            clusters.len(),
            threshold,
            self.metric.name()
        );

        clusters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashMap;

    /// Similarity looked up from a fixed table keyed by normalized title
    struct TableMetric {
        scores: HashMap<(String, String), f64>,
    }

    impl TableMetric {
        fn new(pairs: &[(&str, &str, f64)]) -> Self {
            let mut scores = HashMap::new();
            for (a, b, s) in pairs {
                scores.insert((a.to_string(), b.to_string()), *s);
                scores.insert((b.to_string(), a.to_string()), *s);
            }
            Self { scores }
        }
    }

    impl SimilarityMetric for TableMetric {
        fn similarity(&self, a: &str, b: &str) -> f64 {
            if a == b {
                return 100.0;
            }
            self.scores
                .get(&(a.to_string(), b.to_string()))
                .copied()
                .unwrap_or(0.0)
        }

        fn name(&self) -> &str {
            "table"
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn item(id: &str, hours_ago: i64) -> Arc<Item> {
        Arc::new(
            Item::builder(id, id)
                .published_at(now() - Duration::hours(hours_ago))
                .build()
                .unwrap(),
        )
    }

    fn ids(cluster: &Cluster) -> Vec<&str> {
        cluster.member_ids().map(|id| id.as_str()).collect()
    }

    #[test]
    fn test_three_item_scenario() {
        let metric = TableMetric::new(&[("a", "b", 90.0), ("a", "c", 10.0), ("b", "c", 10.0)]);
        let builder = ClusterBuilder::new(metric, 80.0);
        let items = vec![item("a", 1), item("b", 2), item("c", 3)];

        let clusters = builder.build(&items, &Window::trailing(now(), Duration::hours(24)));

        assert_eq!(clusters.len(), 2);
        assert_eq!(ids(&clusters[0]), vec!["a", "b"]);
        assert!(clusters[0].cohesion >= 80.0);
        assert_eq!(ids(&clusters[1]), vec!["c"]);
        assert!(clusters[1].is_singleton());
    }

    #[test]
    fn test_chain_links_through_members() {
        // c only matches b, b only matches a: single linkage joins all three
        let metric = TableMetric::new(&[("a", "b", 85.0), ("b", "c", 85.0), ("a", "c", 20.0)]);
        let builder = ClusterBuilder::new(metric, 80.0);
        let items = vec![item("c", 3), item("a", 1), item("b", 2)];

        let clusters = builder.build(&items, &Window::trailing(now(), Duration::hours(24)));

        assert_eq!(clusters.len(), 1);
        assert_eq!(ids(&clusters[0]), vec!["a", "b", "c"]);
        assert_eq!(clusters[0].cohesion, 20.0);
    }

    #[test]
    fn test_window_excludes_old_and_future_items() {
        let builder = ClusterBuilder::with_threshold(70.0);
        let items = vec![item("fresh", 1), item("old", 48), item("future", -2)];

        let clusters = builder.build(&items, &Window::trailing(now(), Duration::hours(24)));

        assert_eq!(clusters.len(), 1);
        assert_eq!(ids(&clusters[0]), vec!["fresh"]);
    }

    #[test]
    fn test_seed_order_is_recency_then_id() {
        let builder = ClusterBuilder::new(TableMetric::new(&[]), 80.0);
        let items = vec![item("z", 1), item("y", 1), item("x", 5)];

        let clusters = builder.build(&items, &Window::trailing(now(), Duration::hours(24)));

        let seeds: Vec<_> = clusters.iter().map(|c| ids(c)[0]).collect();
        assert_eq!(seeds, vec!["y", "z", "x"]);
    }

    #[test]
    fn test_real_metric_groups_related_titles() {
        let titles = [
            ("1", "OpenAI releases GPT-5 model", 1),
            ("2", "GPT-5 model released by OpenAI", 2),
            ("3", "Banana bread recipe for beginners", 3),
        ];
        let items: Vec<Arc<Item>> = titles
            .iter()
            .map(|(id, title, h)| {
                Arc::new(
                    Item::builder(id, title)
                        .published_at(now() - Duration::hours(*h))
                        .build()
                        .unwrap(),
                )
            })
            .collect();

        let clusters = ClusterBuilder::with_threshold(70.0)
            .build(&items, &Window::trailing(now(), Duration::hours(24)));

        assert_eq!(clusters.len(), 2);
        assert_eq!(ids(&clusters[0]), vec!["1", "2"]);
    }

    #[test]
    fn test_empty_input() {
        let clusters = ClusterBuilder::with_threshold(70.0)
            .build(&[], &Window::trailing(now(), Duration::hours(24)));
        assert!(clusters.is_empty());
    }
}
