//! Value-priority taxonomy
//!
//! Topics are ranked first by what they are worth to a reader:
//! monetization > efficiency > learning/growth > lifestyle > safety/compliance.
//! Classification is a pure function of an item's tags and text.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{normalize, tokens};

/// Value categories, declared from highest to lowest priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Monetization,
    Efficiency,
    Learning,
    Lifestyle,
    SafetyCompliance,
}

impl Category {
    /// All categories, highest priority first
    pub const ALL: [Category; 5] = [
        Category::Monetization,
        Category::Efficiency,
        Category::Learning,
        Category::Lifestyle,
        Category::SafetyCompliance,
    ];

    /// Priority rank: 5 for monetization down to 1 for safety/compliance
    pub fn priority(self) -> u8 {
        match self {
            Category::Monetization => 5,
            Category::Efficiency => 4,
            Category::Learning => 3,
            Category::Lifestyle => 2,
            Category::SafetyCompliance => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Category::Monetization => "monetization",
            Category::Efficiency => "efficiency",
            Category::Learning => "learning",
            Category::Lifestyle => "lifestyle",
            Category::SafetyCompliance => "safety_compliance",
        }
    }

    /// Tag values that name this category explicitly
    fn tag_aliases(self) -> &'static [&'static str] {
        match self {
            Category::Monetization => &["monetization", "revenue", "business", "pricing"],
            Category::Efficiency => &["efficiency", "productivity", "automation", "workflow"],
            Category::Learning => &["learning", "education", "tutorial", "growth"],
            Category::Lifestyle => &["lifestyle", "consumer", "personal", "tool"],
            Category::SafetyCompliance => &["safety", "security", "privacy", "compliance"],
        }
    }

    /// Keywords matched against normalized text.
    ///
    /// ASCII keywords match whole tokens; a trailing `*` makes them a prefix.
    /// Multi-word keywords match as a phrase. Non-ASCII keywords match as
    /// substrings since CJK text is not space-separated.
    fn keywords(self) -> &'static [&'static str] {
        match self {
            Category::Monetization => &[
                "变现", "赚钱", "盈利", "营收", "订阅", "付费", "价格", "商业", "创业", "客户",
                "企业", "pricing", "revenue", "monetiz*", "roi", "profit*", "subscription*",
                "b2b", "go to market", "gtm", "startup*",
            ],
            Category::Efficiency => &[
                "效率", "自动化", "节省时间", "降本", "提效", "workflow*", "agent", "agents",
                "copilot", "automation", "automate*", "productivity",
            ],
            Category::Learning => &[
                "学习", "教程", "课程", "指南", "教学", "education", "guide", "guides",
                "tutorial*", "course", "courses", "growth", "learn*",
            ],
            Category::Lifestyle => &[
                "工具", "应用", "插件", "个人", "家庭", "生活", "体验", "开源", "免费", "app",
                "apps", "product", "tool", "tools", "assistant", "open source", "free",
            ],
            Category::SafetyCompliance => &[
                "安全", "隐私", "合规", "风险", "审计", "security", "privacy", "compliance",
                "regulat*", "audit*",
            ],
        }
    }

    /// Resolve a tag to a category, if it names one
    pub fn from_tag(tag: &str) -> Option<Category> {
        let tag = normalize(tag).replace(' ', "_");
        Category::ALL
            .into_iter()
            .find(|c| c.name() == tag || c.tag_aliases().contains(&tag.as_str()))
    }

    /// Whether any of this category's keywords occur in normalized text
    fn matches_text(self, normalized: &str) -> bool {
        let padded = format!(" {} ", normalized);
        self.keywords().iter().any(|kw| {
            if !kw.is_ascii() {
                normalized.contains(kw)
            } else if let Some(stem) = kw.strip_suffix('*') {
                tokens(normalized).any(|t| t.starts_with(stem))
            } else if kw.contains(' ') {
                padded.contains(&format!(" {} ", kw))
            } else {
                tokens(normalized).any(|t| t == *kw)
            }
        })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// All categories signalled by tags or text, highest priority first
pub fn signals(tags: &[String], text: &str) -> Vec<Category> {
    let normalized = normalize(text);
    let mut found: Vec<Category> = Category::ALL
        .into_iter()
        .filter(|c| {
            tags.iter().any(|t| Category::from_tag(t) == Some(*c)) || c.matches_text(&normalized)
        })
        .collect();
    found.sort();
    found
}

/// Classify one item.
///
/// Explicit category tags win over keyword signals; within either source the
/// highest-priority match is chosen.
pub fn classify(tags: &[String], text: &str) -> Option<Category> {
    let tagged = tags.iter().filter_map(|t| Category::from_tag(t)).min();
    if tagged.is_some() {
        return tagged;
    }

    let normalized = normalize(text);
    Category::ALL.into_iter().find(|c| c.matches_text(&normalized))
}

/// Majority category over per-item classifications; ties go to higher priority
pub fn dominant<I>(votes: I) -> Option<Category>
where
    I: IntoIterator<Item = Option<Category>>,
{
    let mut counts: BTreeMap<Category, usize> = BTreeMap::new();
    for category in votes.into_iter().flatten() {
        *counts.entry(category).or_default() += 1;
    }

    // BTreeMap iterates highest priority first, so `>` keeps the earlier one on ties
    let mut best: Option<(Category, usize)> = None;
    for (category, count) in counts {
        match best {
            Some((_, n)) if count <= n => {}
            _ => best = Some((category, count)),
        }
    }
    best.map(|(category, _)| category)
}
