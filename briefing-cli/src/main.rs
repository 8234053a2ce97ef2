//! Briefing CLI
//!
//! Runs ranking passes over JSON snapshots and prints JSON reports.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use briefing_core::{EngineConfig, FeedbackSnapshot, PublicationSnapshot, RawItem};
use briefing_runtime::{PassInput, RankingEngine, RepoPassInput, RepoSnapshot};

#[derive(Parser)]
#[command(name = "briefing")]
#[command(author, version, about = "Cluster, rank and dedup content for a daily briefing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Engine configuration file (TOML)
    #[arg(short, long, global = true, env = "BRIEFING_CONFIG")]
    config: Option<PathBuf>,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1", global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster and rank news items
    Rank {
        /// Items snapshot (JSON array)
        #[arg(short, long)]
        items: PathBuf,

        #[command(flatten)]
        snapshots: Snapshots,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Rank repositories
    Repos {
        /// Repository snapshot (JSON array)
        #[arg(short, long)]
        repos: PathBuf,

        #[command(flatten)]
        snapshots: Snapshots,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Validate and print the effective configuration
    Config {
        #[command(flatten)]
        overrides: Overrides,
    },
}

/// Read-only history and pass clock shared by both passes
#[derive(Args)]
struct Snapshots {
    /// Feedback snapshot (JSON array)
    #[arg(short, long)]
    feedback: Option<PathBuf>,

    /// Publication record snapshot (JSON array)
    #[arg(short, long)]
    publications: Option<PathBuf>,

    /// Reference time of the pass (RFC 3339, default: now)
    #[arg(long)]
    now: Option<DateTime<Utc>>,

    /// Output file for the JSON report (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Settings that take precedence over the config file
#[derive(Args)]
struct Overrides {
    /// Clustering window in hours
    #[arg(long, env = "NEWS_WINDOW_HOURS")]
    window_hours: Option<i64>,

    /// Similarity threshold (0-100)
    #[arg(long)]
    threshold: Option<f64>,

    /// Cross-run dedup window in hours
    #[arg(long, env = "BRIEF_DEDUP_HOURS")]
    dedup_hours: Option<i64>,

    /// Backfill retry budget
    #[arg(long, env = "NEWS_BACKFILL_MAX_STEPS")]
    backfill_max_steps: Option<u32>,

    /// Backfill window multiplier per step
    #[arg(long, env = "NEWS_BACKFILL_WINDOW_MULTIPLIER")]
    backfill_window_multiplier: Option<u32>,

    /// Backfill threshold reduction per step
    #[arg(long, env = "NEWS_BACKFILL_THRESHOLD_STEP")]
    backfill_threshold_step: Option<f64>,

    /// Number of news topics to keep
    #[arg(long, env = "DAILY_TOP_NEWS")]
    top_news: Option<usize>,

    /// Number of repositories to keep
    #[arg(long, env = "DAILY_TOP_REPOS")]
    top_repos: Option<usize>,

    /// Drop topics readers asked to skip
    #[arg(long)]
    honor_skip: bool,
}

impl Overrides {
    fn apply(&self, config: &mut EngineConfig) {
        if let Some(hours) = self.window_hours {
            config.window_hours = hours;
        }
        if let Some(threshold) = self.threshold {
            config.similarity_threshold = threshold;
        }
        if let Some(hours) = self.dedup_hours {
            config.dedup_hours = hours;
        }
        if let Some(steps) = self.backfill_max_steps {
            config.backfill.max_steps = steps;
        }
        if let Some(multiplier) = self.backfill_window_multiplier {
            config.backfill.window_multiplier = multiplier;
        }
        if let Some(step) = self.backfill_threshold_step {
            config.backfill.threshold_step = step;
        }
        if let Some(n) = self.top_news {
            config.top_n = n;
            config.backfill.min_qualifying = n;
        }
        if let Some(n) = self.top_repos {
            config.top_repos = n;
        }
        if self.honor_skip {
            config.honor_skip_feedback = true;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match cli.command {
        Commands::Rank {
            items,
            snapshots,
            overrides,
        } => {
            let engine = build_engine(cli.config.as_deref(), &overrides)?;
            let input = PassInput {
                now: snapshots.now.unwrap_or_else(Utc::now),
                items: read_json::<Vec<RawItem>>(&items)?,
                feedback: read_optional::<FeedbackSnapshot>(snapshots.feedback.as_deref())?,
                publications: read_optional::<PublicationSnapshot>(
                    snapshots.publications.as_deref(),
                )?,
            };

            let report = engine.run(&input);
            if report.status.is_degraded() {
                warn!("Pass degraded: {:?}", report.status);
            }
            write_json(&report, snapshots.output.as_deref())?;
        }
        Commands::Repos {
            repos,
            snapshots,
            overrides,
        } => {
            let engine = build_engine(cli.config.as_deref(), &overrides)?;
            let input = RepoPassInput {
                now: snapshots.now.unwrap_or_else(Utc::now),
                repos: read_json::<Vec<RepoSnapshot>>(&repos)?,
                feedback: read_optional::<FeedbackSnapshot>(snapshots.feedback.as_deref())?,
                publications: read_optional::<PublicationSnapshot>(
                    snapshots.publications.as_deref(),
                )?,
            };

            let report = engine.run_repos(&input);
            write_json(&report, snapshots.output.as_deref())?;
        }
        Commands::Config { overrides } => {
            let engine = build_engine(cli.config.as_deref(), &overrides)?;
            print!("{}", engine.config().to_toml_string()?);
        }
    }

    Ok(())
}

fn build_engine(path: Option<&Path>, overrides: &Overrides) -> Result<RankingEngine> {
    let mut config = match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            EngineConfig::load(path)?
        }
        None => EngineConfig::default(),
    };
    overrides.apply(&mut config);

    Ok(RankingEngine::new(config)?)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

fn read_optional<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    match path {
        Some(path) => read_json(path),
        None => Ok(T::default()),
    }
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
            info!("Report saved to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
