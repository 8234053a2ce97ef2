//! Link Selector
//!
//! Picks the one URL that represents a topic, plus a short list of evidence
//! links. Members on low-priority domains (preprint servers by default) are
//! only used when nothing else is available. The pick inside a partition is
//! uniform but drawn from a ChaCha stream seeded with the cluster id, so the
//! same membership always yields the same link.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use briefing_core::{normalize_domain, stable_hash, Cluster, Item, ItemId};

const OFFICIAL_DOMAINS: &[&str] = &[
    "openai.com",
    "ai.googleblog.com",
    "deepmind.google",
    "research.google",
    "huggingface.co",
    "blogs.microsoft.com",
    "blogs.nvidia.com",
    "aws.amazon.com",
    "ai.meta.com",
    "anthropic.com",
    "stability.ai",
];

const CODE_OR_PAPER_DOMAINS: &[&str] = &[
    "github.com",
    "gitlab.com",
    "bitbucket.org",
    "arxiv.org",
    "openreview.net",
    "papers.nips.cc",
    "aclanthology.org",
];

const AUTHORITY_DOMAINS: &[&str] = &[
    "nature.com",
    "science.org",
    "sciencedirect.com",
    "ieee.org",
    "acm.org",
];

/// Default evidence list bounds
const MIN_EVIDENCE: usize = 3;
const MAX_EVIDENCE: usize = 5;

/// How authoritative a source domain is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTier {
    Community = 1,
    Authority = 2,
    CodeOrPaper = 3,
    Official = 4,
}

impl SourceTier {
    /// Classify a normalized domain
    pub fn of(domain: &str) -> Self {
        if OFFICIAL_DOMAINS.contains(&domain) {
            SourceTier::Official
        } else if CODE_OR_PAPER_DOMAINS.contains(&domain) {
            SourceTier::CodeOrPaper
        } else if AUTHORITY_DOMAINS.contains(&domain) {
            SourceTier::Authority
        } else {
            SourceTier::Community
        }
    }
}

/// Which member partition the link came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkPartition {
    Primary,
    Fallback,
}

/// The chosen link and how it was chosen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkSelection {
    pub url: String,
    pub domain: String,
    pub item_id: ItemId,
    pub partition: LinkPartition,
    pub tier: SourceTier,
    /// Members considered before partitioning
    pub candidate_count: usize,
    /// Whether low-priority members were set aside
    pub fallback_filtered: bool,
    /// Supporting links, starting with `url`
    pub evidence: Vec<String>,
}

/// Chooses representative links
#[derive(Debug, Clone)]
pub struct LinkSelector {
    low_priority: Vec<String>,
    min_evidence: usize,
    max_evidence: usize,
}

impl Default for LinkSelector {
    fn default() -> Self {
        Self::new(&["arxiv.org".to_string()])
    }
}

impl LinkSelector {
    pub fn new(low_priority_domains: &[String]) -> Self {
        Self {
            low_priority: low_priority_domains
                .iter()
                .map(|d| normalize_domain(d))
                .filter(|d| !d.is_empty())
                .collect(),
            min_evidence: MIN_EVIDENCE,
            max_evidence: MAX_EVIDENCE,
        }
    }

    pub fn with_evidence_bounds(mut self, min: usize, max: usize) -> Self {
        self.min_evidence = min;
        self.max_evidence = max.max(min);
        self
    }

    /// Whether a domain (or a parent domain) is on the low-priority list
    pub fn is_low_priority(&self, domain: &str) -> bool {
        self.low_priority
            .iter()
            .any(|d| domain == d || domain.ends_with(&format!(".{}", d)))
    }

    /// Choose the representative link for a cluster
    pub fn select(&self, cluster: &Cluster) -> Option<LinkSelection> {
        let (primary, fallback): (Vec<&Arc<Item>>, Vec<&Arc<Item>>) = cluster
            .members
            .iter()
            .partition(|m| !self.is_low_priority(&m.domain));

        let (candidates, partition) = if primary.is_empty() {
            (fallback.clone(), LinkPartition::Fallback)
        } else {
            (primary, LinkPartition::Primary)
        };

        let chosen = *candidates.get(Self::seeded_index(cluster, candidates.len())?)?;

        let evidence = self.evidence(cluster, chosen, &candidates);

        Some(LinkSelection {
            url: chosen.url.clone(),
            domain: chosen.domain.clone(),
            item_id: chosen.id.clone(),
            partition,
            tier: SourceTier::of(&chosen.domain),
            candidate_count: cluster.len(),
            fallback_filtered: partition == LinkPartition::Primary && !fallback.is_empty(),
            evidence,
        })
    }

    /// Uniform index drawn from a stream that depends only on membership
    fn seeded_index(cluster: &Cluster, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let mut rng = ChaCha8Rng::from_seed(cluster.id.seed());
        usize::try_from(rng.next_u64() % len as u64).ok()
    }

    /// Evidence links: the chosen link first, then distinct domains by tier,
    /// topped up from repeated domains if too few
    fn evidence(&self, cluster: &Cluster, chosen: &Item, candidates: &[&Arc<Item>]) -> Vec<String> {
        let seed = cluster.id.as_str();
        let mut ordered: Vec<&Arc<Item>> = candidates.to_vec();
        ordered.sort_by(|a, b| {
            SourceTier::of(&b.domain)
                .cmp(&SourceTier::of(&a.domain))
                .then_with(|| stable_hash(seed, &a.url).cmp(&stable_hash(seed, &b.url)))
                .then_with(|| a.url.cmp(&b.url))
        });

        let mut links = vec![chosen.url.clone()];
        let mut domains = vec![chosen.domain.as_str()];

        for item in &ordered {
            if links.len() >= self.max_evidence {
                break;
            }
            if links.contains(&item.url) || domains.contains(&item.domain.as_str()) {
                continue;
            }
            links.push(item.url.clone());
            domains.push(item.domain.as_str());
        }

        for item in &ordered {
            if links.len() >= self.min_evidence {
                break;
            }
            if !links.contains(&item.url) {
                links.push(item.url.clone());
            }
        }

        links.truncate(self.max_evidence.max(1));
        links
    }
}
