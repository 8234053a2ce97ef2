//! Engine configuration
//!
//! Loaded from TOML with per-field defaults, then validated before any
//! clustering work begins. An invalid configuration fails the pass.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::{
    DEFAULT_DEDUP_HOURS, DEFAULT_FEEDBACK_LOOKBACK_DAYS, DEFAULT_SIMILARITY_THRESHOLD,
    DEFAULT_THRESHOLD_FLOOR, DEFAULT_TOP_N, DEFAULT_WINDOW_HOURS, MAX_SIMILARITY,
};

/// Configuration errors (fatal, raised before a pass starts)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("window_hours must be positive, got {0}")]
    NonPositiveWindow(i64),

    #[error("similarity_threshold must be within [0, 100], got {0}")]
    ThresholdOutOfRange(f64),

    #[error("backfill.threshold_floor {floor} must be within [0, similarity_threshold {threshold}]")]
    FloorAboveThreshold { floor: f64, threshold: f64 },

    #[error("backfill.window_multiplier must be at least 1")]
    ZeroMultiplier,

    #[error("backfill.threshold_step must be a non-negative number, got {0}")]
    NegativeStep(f64),

    #[error("backfill allows {max_steps} retries but none of them can widen the window or lower the threshold")]
    InertBackfill { max_steps: u32 },

    #[error("backfill.min_cohesion must be within [0, 100], got {0}")]
    CohesionOutOfRange(f64),

    #[error("top_n must be at least 1")]
    ZeroTopN,

    #[error("dedup_hours must not be negative, got {0}")]
    NegativeDedupWindow(i64),

    #[error("feedback_lookback_days must not be negative, got {0}")]
    NegativeLookback(i64),

    #[error("{name} must be a finite, non-negative number, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },

    #[error("scoring.feedback_cap must be within [0, 1), got {0}")]
    FeedbackCapOutOfRange(f64),

    #[error("failed to read config file {path}: {message}")]
    Io { path: String, message: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("failed to serialize config: {0}")]
    Serialize(String),
}

/// Backfill relaxation policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackfillConfig {
    /// Retry budget; 0 disables backfill
    pub max_steps: u32,
    /// Window multiplier applied per retry step (step k uses multiplier^k)
    pub window_multiplier: u32,
    /// Threshold reduction per retry step (step k lowers by k * step)
    pub threshold_step: f64,
    /// The threshold never drops below this value
    pub threshold_floor: f64,
    /// Minimum number of qualifying clusters wanted
    pub min_qualifying: usize,
    /// Cohesion a cluster needs to qualify. Singletons always have cohesion
    /// 100, so this floor never excludes them; use `min_members` for that.
    pub min_cohesion: f64,
    /// Member count a cluster needs to qualify. The default of 1 counts a
    /// lone item as a topic; set 2 to require corroboration.
    pub min_members: usize,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            max_steps: 2,
            window_multiplier: 2,
            threshold_step: 5.0,
            threshold_floor: DEFAULT_THRESHOLD_FLOOR,
            min_qualifying: DEFAULT_TOP_N,
            min_cohesion: 0.0,
            min_members: 1,
        }
    }
}

/// Named coefficients of the value score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Multiplies the category priority (5 for monetization .. 1 for safety)
    pub category: f64,
    /// Multiplies ln(size + 1)
    pub size: f64,
    /// Multiplies the linear recency decay in [0, 1]
    pub recency: f64,
    /// Multiplies ln(distinct domains + 1)
    pub diversity: f64,
    /// Multiplier change contributed by one feedback record
    pub feedback_step: f64,
    /// The feedback multiplier stays within [1 - cap, 1 + cap]
    pub feedback_cap: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            category: 10.0,
            size: 2.0,
            recency: 3.0,
            diversity: 1.0,
            feedback_step: 0.05,
            feedback_cap: 0.15,
        }
    }
}

/// Coefficients of the repository score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoWeights {
    /// Per star gained since the previous snapshot
    pub star_delta: f64,
    /// Per total star
    pub stars: f64,
    /// Per open issue
    pub open_issues: f64,
    /// Open issues counted at most this many times
    pub open_issues_cap: u32,
}

impl Default for RepoWeights {
    fn default() -> Self {
        Self {
            star_delta: 2.0,
            stars: 0.01,
            open_issues: 0.1,
            open_issues_cap: 50,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Base clustering window in hours
    pub window_hours: i64,
    /// Base similarity threshold (0-100)
    pub similarity_threshold: f64,
    /// Topics handed to generation per pass
    pub top_n: usize,
    /// Repositories handed to generation per pass
    pub top_repos: usize,
    /// Cross-run dedup window in hours (0 disables dedup)
    pub dedup_hours: i64,
    /// Feedback lookback in days
    pub feedback_lookback_days: i64,
    /// Domains only used for links when nothing better exists
    pub low_priority_domains: Vec<String>,
    /// Drop topics with active skip feedback instead of only dampening them
    pub honor_skip_feedback: bool,
    pub backfill: BackfillConfig,
    pub scoring: ScoringWeights,
    pub repo: RepoWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_hours: DEFAULT_WINDOW_HOURS,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            top_n: DEFAULT_TOP_N,
            top_repos: DEFAULT_TOP_N,
            dedup_hours: DEFAULT_DEDUP_HOURS,
            feedback_lookback_days: DEFAULT_FEEDBACK_LOOKBACK_DAYS,
            low_priority_domains: vec!["arxiv.org".to_string()],
            honor_skip_feedback: false,
            backfill: BackfillConfig::default(),
            scoring: ScoringWeights::default(),
            repo: RepoWeights::default(),
        }
    }
}

impl EngineConfig {
    /// Parse from a TOML string (missing fields take defaults)
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Check every parameter; returns the first problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_hours <= 0 {
            return Err(ConfigError::NonPositiveWindow(self.window_hours));
        }
        let threshold = self.similarity_threshold;
        if !(0.0..=MAX_SIMILARITY).contains(&threshold) {
            return Err(ConfigError::ThresholdOutOfRange(threshold));
        }
        if self.top_n == 0 || self.top_repos == 0 {
            return Err(ConfigError::ZeroTopN);
        }
        if self.dedup_hours < 0 {
            return Err(ConfigError::NegativeDedupWindow(self.dedup_hours));
        }
        if self.feedback_lookback_days < 0 {
            return Err(ConfigError::NegativeLookback(self.feedback_lookback_days));
        }

        let backfill = &self.backfill;
        let floor = backfill.threshold_floor;
        if !(0.0..=threshold).contains(&floor) {
            return Err(ConfigError::FloorAboveThreshold { floor, threshold });
        }
        if backfill.window_multiplier == 0 {
            return Err(ConfigError::ZeroMultiplier);
        }
        if !(backfill.threshold_step >= 0.0 && backfill.threshold_step.is_finite()) {
            return Err(ConfigError::NegativeStep(backfill.threshold_step));
        }
        if !(0.0..=MAX_SIMILARITY).contains(&backfill.min_cohesion) {
            return Err(ConfigError::CohesionOutOfRange(backfill.min_cohesion));
        }
        let widens = backfill.window_multiplier > 1;
        let lowers = backfill.threshold_step > 0.0 && threshold > floor;
        if backfill.max_steps > 0 && !widens && !lowers {
            return Err(ConfigError::InertBackfill {
                max_steps: backfill.max_steps,
            });
        }

        let scoring = &self.scoring;
        for (name, value) in [
            ("scoring.category", scoring.category),
            ("scoring.size", scoring.size),
            ("scoring.recency", scoring.recency),
            ("scoring.diversity", scoring.diversity),
            ("scoring.feedback_step", scoring.feedback_step),
            ("repo.star_delta", self.repo.star_delta),
            ("repo.stars", self.repo.stars),
            ("repo.open_issues", self.repo.open_issues),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }
        if !(0.0..1.0).contains(&scoring.feedback_cap) {
            return Err(ConfigError::FeedbackCapOutOfRange(scoring.feedback_cap));
        }

        Ok(())
    }

    /// Base clustering window
    pub fn window(&self) -> Duration {
        Duration::hours(self.window_hours)
    }

    /// Cross-run dedup window
    pub fn dedup_window(&self) -> Duration {
        Duration::hours(self.dedup_hours)
    }

    /// Feedback lookback window
    pub fn feedback_lookback(&self) -> Duration {
        Duration::days(self.feedback_lookback_days)
    }
}
