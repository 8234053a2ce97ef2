//! Fetched content items
//!
//! The collection stage hands over [`RawItem`]s exactly as stored. Each one is
//! validated into an immutable [`Item`] before clustering; malformed items are
//! rejected with an [`InputError`] and skipped by the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::Url;

/// Maximum title length derived from summary text when an item has no title
const DERIVED_TITLE_CHARS: usize = 120;

/// Errors for individual malformed items (never fatal to a pass)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("item has no identifier")]
    MissingId,

    #[error("item {0} has no publication or fetch timestamp")]
    MissingTimestamp(String),

    #[error("item {0} has neither title nor summary text")]
    MissingText(String),

    #[error("item {0} has no url")]
    MissingUrl(String),

    #[error("item {0} has no resolvable source domain")]
    MissingDomain(String),

    #[error("item {0} appears more than once in the snapshot")]
    DuplicateId(String),
}

/// Stable item identifier assigned by the collection stage
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// An item as read from storage, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Explicit source domain, if the collector recorded one
    #[serde(default)]
    pub domain: Option<String>,
    /// Feed or source name, used as a last-resort domain
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fetched_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A validated, immutable content item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub summary: String,
    pub url: String,
    /// Lower-cased host without a leading `www.`
    pub domain: String,
    /// Publication time, or fetch time when the source gives none
    pub timestamp: DateTime<Utc>,
    pub tags: Vec<String>,
}

impl Item {
    /// Create a new item builder
    pub fn builder(id: &str, title: &str) -> ItemBuilder {
        ItemBuilder::new(id, title)
    }

    /// Title and summary together, as used for category signals
    pub fn text_blob(&self) -> String {
        if self.summary.is_empty() {
            self.title.clone()
        } else {
            format!("{} {}", self.title, self.summary)
        }
    }
}

impl TryFrom<RawItem> for Item {
    type Error = InputError;

    fn try_from(raw: RawItem) -> Result<Self, Self::Error> {
        let id = non_blank(raw.id).ok_or(InputError::MissingId)?;

        let timestamp = raw
            .published_at
            .or(raw.fetched_at)
            .ok_or_else(|| InputError::MissingTimestamp(id.clone()))?;

        let summary = non_blank(raw.summary).unwrap_or_default();
        let title = match non_blank(raw.title) {
            Some(title) => title,
            None if !summary.is_empty() => summary.chars().take(DERIVED_TITLE_CHARS).collect(),
            None => return Err(InputError::MissingText(id)),
        };

        let url = non_blank(raw.url).ok_or_else(|| InputError::MissingUrl(id.clone()))?;

        let domain = non_blank(raw.domain)
            .map(|d| normalize_domain(&d))
            .or_else(|| domain_of(&url))
            .or_else(|| non_blank(raw.source).map(|s| normalize_domain(&s)))
            .filter(|d| !d.is_empty())
            .ok_or_else(|| InputError::MissingDomain(id.clone()))?;

        Ok(Self {
            id: ItemId(id),
            title,
            summary,
            url,
            domain,
            timestamp,
            tags: raw.tags,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Normalize a domain for comparison: lowercase + strip leading `www.`
pub fn normalize_domain(domain: &str) -> String {
    let d = domain.trim().to_lowercase();
    d.strip_prefix("www.").unwrap_or(&d).to_string()
}

/// Extract the normalized host of a URL
pub fn domain_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(normalize_domain))
        .filter(|d| !d.is_empty())
}

/// Builder for items, mostly used by tests and fixtures
pub struct ItemBuilder {
    raw: RawItem,
}

impl ItemBuilder {
    pub fn new(id: &str, title: &str) -> Self {
        Self {
            raw: RawItem {
                id: Some(id.to_string()),
                title: Some(title.to_string()),
                url: Some(format!("https://example.com/{}", id)),
                ..Default::default()
            },
        }
    }

    pub fn summary(mut self, summary: &str) -> Self {
        self.raw.summary = Some(summary.to_string());
        self
    }

    pub fn url(mut self, url: &str) -> Self {
        self.raw.url = Some(url.to_string());
        self
    }

    pub fn domain(mut self, domain: &str) -> Self {
        self.raw.domain = Some(domain.to_string());
        self
    }

    pub fn published_at(mut self, at: DateTime<Utc>) -> Self {
        self.raw.published_at = Some(at);
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.raw.tags.push(tag.to_string());
        self
    }

    pub fn raw(self) -> RawItem {
        self.raw
    }

    pub fn build(self) -> Result<Item, InputError> {
        Item::try_from(self.raw)
    }
}
