//! Backfill Controller
//!
//! Re-runs clustering with a wider window and a lower threshold until enough
//! clusters qualify or the retry budget runs out:
//! - Step k uses `base_window * multiplier^k` and
//!   `max(floor, base_threshold - k * step)`, always from the base values
//! - The best step seen wins (most qualifying clusters, earliest on ties)
//! - Running out of retries degrades the result, it never fails the pass

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use briefing_core::{BackfillConfig, Cluster, Item};
use briefing_rank::{ClusterBuilder, SimilarityMetric, TokenSetRatio, Window};

/// Upper bound on a widened window
const MAX_WINDOW_DAYS: i64 = 3650;

/// One clustering attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackfillStep {
    pub step: u32,
    pub window: Window,
    pub window_hours: i64,
    pub threshold: f64,
    pub items_in_window: usize,
    pub clusters: usize,
    pub qualifying: usize,
    /// Highest qualifying count up to and including this step
    pub best_qualifying: usize,
}

/// The clusters handed on to ranking, plus how they were obtained
#[derive(Debug, Clone)]
pub struct BackfillOutcome {
    /// Every cluster of the selected step
    pub clusters: Vec<Cluster>,
    pub selected_step: u32,
    pub window: Window,
    pub threshold: f64,
    pub qualifying: usize,
    pub required: usize,
    pub degraded: bool,
    pub steps: Vec<BackfillStep>,
}

impl BackfillOutcome {
    /// Clusters meeting the qualifying cohesion and size
    pub fn qualifying_clusters(&self, config: &BackfillConfig) -> impl Iterator<Item = &Cluster> {
        let (cohesion, members) = (config.min_cohesion, config.min_members);
        self.clusters
            .iter()
            .filter(move |c| c.qualifies(cohesion, members))
    }
}

/// Drives the cluster builder through the relaxation schedule
pub struct BackfillController<M = TokenSetRatio> {
    builder: ClusterBuilder<M>,
    base_window: Duration,
    config: BackfillConfig,
}

impl BackfillController<TokenSetRatio> {
    pub fn new(base_window: Duration, base_threshold: f64, config: BackfillConfig) -> Self {
        Self::with_metric(TokenSetRatio, base_window, base_threshold, config)
    }
}

impl<M: SimilarityMetric> BackfillController<M> {
    pub fn with_metric(
        metric: M,
        base_window: Duration,
        base_threshold: f64,
        config: BackfillConfig,
    ) -> Self {
        Self {
            builder: ClusterBuilder::new(metric, base_threshold),
            base_window,
            config,
        }
    }

    pub fn config(&self) -> &BackfillConfig {
        &self.config
    }

    /// Window span used at `step`
    pub fn window_at(&self, step: u32) -> Duration {
        let cap = Duration::days(MAX_WINDOW_DAYS);
        let factor = self.config.window_multiplier.saturating_pow(step);
        i32::try_from(factor)
            .ok()
            .and_then(|f| self.base_window.checked_mul(f))
            .map_or(cap, |w| w.min(cap))
            .max(self.base_window.min(cap))
    }

    /// Similarity threshold used at `step`
    pub fn threshold_at(&self, step: u32) -> f64 {
        let base = self.builder.threshold();
        let floor = self.config.threshold_floor.min(base);
        (base - step as f64 * self.config.threshold_step).max(floor)
    }

    /// Run the schedule over `items` as of `now`
    pub fn run(&self, items: &[Arc<Item>], now: DateTime<Utc>) -> BackfillOutcome {
        let required = self.config.min_qualifying;
        let mut steps = Vec::new();
        let mut best: Option<Attempt> = None;

        for step in 0..=self.config.max_steps {
            let window = Window::trailing(now, self.window_at(step));
            let threshold = self.threshold_at(step);
            let clusters = self.builder.build_at(items, &window, threshold);
            let qualifying = clusters
                .iter()
                .filter(|c| c.qualifies(self.config.min_cohesion, self.config.min_members))
                .count();

            debug!(
                "Backfill step {}: window {}h, threshold {:.1}, {} clusters, {} qualifying",
                step,
                window.span().num_hours(),
                threshold,
                clusters.len(),
                qualifying
            );

            // Strictly better only, so ties keep the earlier step
            let improved = best.as_ref().map_or(true, |b| qualifying > b.qualifying);
            let best_qualifying = match &best {
                Some(b) if !improved => b.qualifying,
                _ => qualifying,
            };

            steps.push(BackfillStep {
                step,
                window,
                window_hours: window.span().num_hours(),
                threshold,
                items_in_window: items.iter().filter(|i| window.contains(i.timestamp)).count(),
                clusters: clusters.len(),
                qualifying,
                best_qualifying,
            });

            if improved {
                best = Some(Attempt {
                    step,
                    window,
                    threshold,
                    clusters,
                    qualifying,
                });
            }
            if qualifying >= required {
                break;
            }
        }

        let best = best.unwrap_or_else(|| Attempt {
            step: 0,
            window: Window::trailing(now, self.base_window),
            threshold: self.builder.threshold(),
            clusters: Vec::new(),
            qualifying: 0,
        });
        let degraded = best.qualifying < required;

        if degraded {
            warn!(
                "Backfill exhausted after {} steps: {} of {} qualifying clusters",
                steps.len(),
                best.qualifying,
                required
            );
        }
        info!(
            "Selected backfill step {} (window {}h, threshold {:.1}, {} qualifying)",
            best.step,
            best.window.span().num_hours(),
            best.threshold,
            best.qualifying
        );

        BackfillOutcome {
            clusters: best.clusters,
            selected_step: best.step,
            window: best.window,
            threshold: best.threshold,
            qualifying: best.qualifying,
            required,
            degraded,
            steps,
        }
    }
}

struct Attempt {
    step: u32,
    window: Window,
    threshold: f64,
    clusters: Vec<Cluster>,
    qualifying: usize,
}
