//! Value Scorer
//!
//! Base score = category priority + ln(size + 1) + recency + source diversity,
//! each under its own coefficient. Active feedback then scales everything but
//! the category term by a bounded multiplier, so it can reorder topics inside
//! a category tier but never lift one over a higher tier on its own.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use briefing_core::{
    classify, dominant, signals, ActiveFeedback, Category, Cluster, FeedbackTally, ScoringWeights,
    TopicKind,
};

use crate::{rank_order, ScoreBreakdown, SourceQuality, SourceTier, Topic};

/// `1 + clamp(net * step, -cap, +cap)`
pub fn feedback_multiplier(tally: &FeedbackTally, weights: &ScoringWeights) -> f64 {
    let cap = weights.feedback_cap.abs();
    1.0 + (tally.net() as f64 * weights.feedback_step).clamp(-cap, cap)
}

/// Inputs shared by every topic in one ranking pass
pub struct ScoreContext<'a> {
    pub now: DateTime<Utc>,
    /// The window the clusters were formed in
    pub window: Duration,
    pub feedback: &'a ActiveFeedback,
}

/// Scores and orders topics
#[derive(Debug, Clone, Default)]
pub struct ValueScorer {
    weights: ScoringWeights,
}

impl ValueScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Majority category over members
    pub fn category_of(cluster: &Cluster) -> Option<Category> {
        dominant(
            cluster
                .members
                .iter()
                .map(|m| classify(&m.tags, &m.text_blob())),
        )
    }

    /// Linear decay from 1 (just now) to 0 (at the far edge of the window)
    pub fn recency(cluster: &Cluster, now: DateTime<Utc>, window: Duration) -> f64 {
        let Some(newest) = cluster.newest_at() else {
            return 0.0;
        };
        let window_secs = window.num_seconds();
        if window_secs <= 0 {
            return 0.0;
        }
        let age_secs = (now - newest).num_seconds().max(0);
        (1.0 - age_secs as f64 / window_secs as f64).clamp(0.0, 1.0)
    }

    /// Bounded multiplicative feedback adjustment
    pub fn feedback_multiplier(&self, tally: &FeedbackTally) -> f64 {
        feedback_multiplier(tally, &self.weights)
    }

    fn source_quality(cluster: &Cluster) -> SourceQuality {
        let domains = cluster.domains();
        let official = domains
            .iter()
            .filter(|d| SourceTier::of(d) == SourceTier::Official)
            .count();
        match official {
            0 => SourceQuality::Community,
            n if n == domains.len() => SourceQuality::Official,
            _ => SourceQuality::Mixed,
        }
    }

    /// Compute a topic's score and breakdown in place
    pub fn score(&self, topic: &mut Topic, ctx: &ScoreContext<'_>) {
        let cluster = &topic.cluster;
        let w = &self.weights;

        let category = Self::category_of(cluster);
        let mut all_signals: Vec<Category> = cluster
            .members
            .iter()
            .flat_map(|m| signals(&m.tags, &m.text_blob()))
            .collect();
        all_signals.sort();
        all_signals.dedup();

        let distinct_domains = cluster.domains().len();
        let category_score = w.category * category.map_or(0.0, |c| c.priority() as f64);
        let size_score = w.size * ((cluster.len() + 1) as f64).ln();
        let recency_score = w.recency * Self::recency(cluster, ctx.now, ctx.window);
        let diversity_score = w.diversity * ((distinct_domains + 1) as f64).ln();
        let base = category_score + size_score + recency_score + diversity_score;

        let feedback = ctx.feedback.tally(TopicKind::News, &topic.feedback_refs());
        let feedback_multiplier = self.feedback_multiplier(&feedback);

        // Category priority is never scaled by feedback
        topic.score = category_score + (base - category_score) * feedback_multiplier;
        topic.breakdown = ScoreBreakdown {
            category,
            signals: all_signals,
            category_score,
            size_score,
            recency_score,
            diversity_score,
            base,
            feedback,
            feedback_multiplier,
            distinct_domains,
            source_quality: Self::source_quality(cluster),
        };
    }

    /// Score every topic and return them in rank order
    pub fn rank(&self, mut topics: Vec<Topic>, ctx: &ScoreContext<'_>) -> Vec<Topic> {
        for topic in &mut topics {
            self.score(topic, ctx);
        }
        topics.sort_by(rank_order);

        if let Some(top) = topics.first() {
            debug!(
                "Ranked {} topics; top '{}' scored {:.2}",
                topics.len(),
                top.title(),
                top.score
            );
        }
        topics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LinkSelector;
    use briefing_core::{FeedbackLabel, FeedbackRecord, FeedbackSnapshot, Item};
    use chrono::TimeZone;
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn topic(prefix: &str, title: &str, size: usize, hours_ago: i64) -> Topic {
        let members: Vec<Arc<Item>> = (0..size)
            .map(|i| {
                Arc::new(
                    Item::builder(&format!("{}-{}", prefix, i), title)
                        .url(&format!("https://site{}.example/{}", i, prefix))
                        .published_at(now() - Duration::hours(hours_ago))
                        .build()
                        .unwrap(),
                )
            })
            .collect();
        let cluster = Cluster::new(members, 90.0, 70.0).unwrap();
        let link = LinkSelector::default().select(&cluster).unwrap();
        Topic::new(cluster, link)
    }

    fn feedback_for(topic: &Topic, label: FeedbackLabel) -> FeedbackRecord {
        FeedbackRecord {
            topic_kind: TopicKind::News,
            topic_ref: topic.fingerprint.to_string(),
            label,
            reason: None,
            created_at: now() - Duration::days(1),
            user_id: "u1".to_string(),
        }
    }

    fn feedback_from(topic: &Topic, label: FeedbackLabel, readers: usize) -> Vec<FeedbackRecord> {
        (0..readers)
            .map(|n| FeedbackRecord {
                user_id: format!("u{}", n),
                ..feedback_for(topic, label)
            })
            .collect()
    }

    fn rank(topics: Vec<Topic>, feedback: &FeedbackSnapshot) -> Vec<Topic> {
        let active = feedback.active(now(), Duration::days(30));
        let ctx = ScoreContext {
            now: now(),
            window: Duration::hours(72),
            feedback: &active,
        };
        ValueScorer::default().rank(topics, &ctx)
    }

    #[test]
    fn test_category_priority_drives_order() {
        let ranked = rank(
            vec![
                topic("s", "New privacy compliance rules", 2, 1),
                topic("m", "Startup revenue doubles with new pricing", 2, 1),
                topic("l", "A tutorial for new users", 2, 1),
            ],
            &FeedbackSnapshot::default(),
        );
        let categories: Vec<_> = ranked.iter().map(|t| t.breakdown.category).collect();
        assert_eq!(
            categories,
            vec![
                Some(Category::Monetization),
                Some(Category::Learning),
                Some(Category::SafetyCompliance)
            ]
        );
    }

    #[test]
    fn test_size_has_diminishing_returns() {
        let ranked = rank(
            vec![topic("a", "Workflow automation", 1, 1), topic("b", "Workflow automation", 8, 1)],
            &FeedbackSnapshot::default(),
        );
        assert_eq!(ranked[0].member_count(), 8);
        let gain_small = ranked[1].breakdown.size_score;
        let gain_large = ranked[0].breakdown.size_score;
        assert!(gain_large < gain_small * 8.0);
    }

    #[test]
    fn test_recency_decays_over_window() {
        let fresh = topic("f", "x", 1, 0);
        let old = topic("o", "x", 1, 36);
        let stale = topic("s", "x", 1, 100);
        let window = Duration::hours(72);
        assert_eq!(ValueScorer::recency(&fresh.cluster, now(), window), 1.0);
        assert!((ValueScorer::recency(&old.cluster, now(), window) - 0.5).abs() < 1e-9);
        assert_eq!(ValueScorer::recency(&stale.cluster, now(), window), 0.0);
    }

    #[test]
    fn test_feedback_multiplier_is_bounded() {
        let scorer = ValueScorer::default();
        let many_useful = FeedbackTally { useful: 100, useless: 0, skip: 0 };
        let many_useless = FeedbackTally { useful: 0, useless: 100, skip: 0 };
        assert!((scorer.feedback_multiplier(&many_useful) - 1.15).abs() < 1e-9);
        assert!((scorer.feedback_multiplier(&many_useless) - 0.85).abs() < 1e-9);
        assert_eq!(scorer.feedback_multiplier(&FeedbackTally::default()), 1.0);
    }

    #[test]
    fn test_feedback_reorders_within_tier() {
        let a = topic("a", "Agent workflow release", 2, 1);
        let b = topic("b", "Copilot automation release", 2, 1);
        let baseline = rank(vec![a.clone(), b.clone()], &FeedbackSnapshot::default());
        let loser = baseline[1].cluster.id.clone();

        let boost_target = if a.cluster.id == loser { &a } else { &b };
        let feedback = FeedbackSnapshot::new(vec![feedback_for(boost_target, FeedbackLabel::Useful)]);
        let ranked = rank(vec![a.clone(), b.clone()], &feedback);

        assert_eq!(ranked[0].cluster.id, loser);
        assert!(ranked[0].breakdown.feedback_multiplier > 1.0);
    }

    #[test]
    fn test_single_feedback_record_cannot_invert_taxonomy() {
        let money = topic("m", "Pricing and revenue update", 2, 1);
        let efficiency = topic("e", "Workflow automation update", 2, 1);
        let feedback = FeedbackSnapshot::new(vec![
            feedback_for(&money, FeedbackLabel::Useless),
            feedback_for(&efficiency, FeedbackLabel::Useful),
        ]);

        let ranked = rank(vec![efficiency, money], &feedback);
        assert_eq!(ranked[0].breakdown.category, Some(Category::Monetization));
    }

    #[test]
    fn test_capped_feedback_cannot_invert_taxonomy() {
        let money = topic("m", "Pricing and revenue update", 2, 1);
        let efficiency = topic("e", "Workflow automation update", 2, 1);
        let mut records = feedback_from(&money, FeedbackLabel::Useless, 10);
        records.extend(feedback_from(&efficiency, FeedbackLabel::Useful, 10));

        let ranked = rank(vec![efficiency, money], &FeedbackSnapshot::new(records));

        assert_eq!(ranked[0].breakdown.category, Some(Category::Monetization));
        assert!((ranked[0].breakdown.feedback_multiplier - 0.85).abs() < 1e-9);
        assert!((ranked[1].breakdown.feedback_multiplier - 1.15).abs() < 1e-9);
        assert!(ranked[0].score > ranked[1].score);
    }

    #[test]
    fn test_feedback_leaves_category_term_unscaled() {
        let money = topic("m", "Pricing and revenue update", 2, 1);
        let records = feedback_from(&money, FeedbackLabel::Useful, 10);
        let ranked = rank(vec![money], &FeedbackSnapshot::new(records));

        let b = &ranked[0].breakdown;
        let expected = b.category_score + (b.base - b.category_score) * 1.15;
        assert!((ranked[0].score - expected).abs() < 1e-9);
        assert!(ranked[0].score < b.base * 1.15);
    }

    #[test]
    fn test_ties_broken_by_cluster_id() {
        let a = topic("a", "Same title", 1, 1);
        let b = topic("b", "Same title", 1, 1);
        let first = rank(vec![a.clone(), b.clone()], &FeedbackSnapshot::default());
        let second = rank(vec![b, a], &FeedbackSnapshot::default());

        assert_eq!(first[0].score, first[1].score);
        assert!(first[0].cluster.id < first[1].cluster.id);
        let order = |ts: &[Topic]| ts.iter().map(|t| t.cluster.id.clone()).collect::<Vec<_>>();
        assert_eq!(order(&first), order(&second));
    }

    #[test]
    fn test_source_quality() {
        let members = vec![
            Arc::new(
                Item::builder("o", "GPT-5")
                    .url("https://openai.com/gpt5")
                    .published_at(now())
                    .build()
                    .unwrap(),
            ),
            Arc::new(
                Item::builder("c", "GPT-5")
                    .url("https://news.ycombinator.com/item")
                    .published_at(now())
                    .build()
                    .unwrap(),
            ),
        ];
        let cluster = Cluster::new(members, 100.0, 70.0).unwrap();
        assert_eq!(ValueScorer::source_quality(&cluster), SourceQuality::Mixed);
    }
}
