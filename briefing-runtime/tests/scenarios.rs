use briefing_core::{
    EngineConfig, FeedbackLabel, FeedbackRecord, FeedbackSnapshot, Fingerprint, PublicationRecord,
    PublicationSnapshot, RawItem, TopicKind,
};
use briefing_rank::LinkPartition;
use briefing_runtime::{PassInput, PassStatus, RankingEngine};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn raw(id: &str, title: &str, url: &str, hours_ago: i64) -> RawItem {
    RawItem {
        id: Some(id.to_string()),
        title: Some(title.to_string()),
        url: Some(url.to_string()),
        published_at: Some(now() - Duration::hours(hours_ago)),
        ..Default::default()
    }
}

fn config(min_qualifying: usize) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.window_hours = 24;
    config.backfill.min_qualifying = min_qualifying;
    config
}

fn news_items() -> Vec<RawItem> {
    vec![
        raw("a1", "OpenAI ships GPT-5", "https://openai.com/gpt5", 2),
        raw("a2", "OpenAI ships GPT-5 to everyone", "https://theverge.com/gpt5", 3),
        raw("a3", "OpenAI ships GPT-5", "https://arxiv.org/abs/2603.1", 4),
        raw("b1", "Rust 2.0 compiler released", "https://blog.rust-lang.org/2", 5),
        raw("b2", "Rust 2.0 compiler released", "https://news.ycombinator.com/1", 6),
        raw("c1", "Banana bread recipe", "https://food.example/bread", 7),
    ]
}

#[test]
fn backfill_exhaustion_degrades_with_relaxed_schedule() {
    let mut config = config(4);
    config.backfill.max_steps = 2;
    config.backfill.window_multiplier = 2;
    config.backfill.threshold_step = 5.0;
    config.backfill.min_members = 2;
    let engine = RankingEngine::new(config).unwrap();

    let input = PassInput {
        now: now(),
        items: vec![
            raw("a1", "openai gpt release", "https://one.example/a", 1),
            raw("a2", "openai gpt release", "https://two.example/a", 2),
            raw("b1", "rust compiler speedups", "https://one.example/b", 3),
            raw("b2", "rust compiler speedups", "https://two.example/b", 4),
        ],
        ..Default::default()
    };

    let report = engine.run(&input);

    let windows: Vec<_> = report.trace.backfill.iter().map(|s| s.window_hours).collect();
    let thresholds: Vec<_> = report.trace.backfill.iter().map(|s| s.threshold).collect();
    assert_eq!(windows, vec![24, 48, 96]);
    assert_eq!(thresholds, vec![70.0, 65.0, 60.0]);
    assert!(report.trace.backfill.iter().all(|s| s.qualifying == 2));

    assert_eq!(
        report.status,
        PassStatus::Degraded {
            qualifying: 2,
            required: 4
        }
    );
    assert_eq!(report.trace.selected_step, 0);
    assert_eq!(report.topics.len(), 2);
}

#[test]
fn full_pass_groups_links_and_orders() {
    let engine = RankingEngine::new(config(3)).unwrap();
    let report = engine.run(&PassInput {
        now: now(),
        items: news_items(),
        ..Default::default()
    });

    assert_eq!(report.status, PassStatus::Full);
    assert_eq!(report.topics.len(), 3);

    let gpt = report
        .topics
        .iter()
        .find(|t| t.member_count() == 3)
        .unwrap();
    assert_eq!(gpt.link.partition, LinkPartition::Primary);
    assert_ne!(gpt.link.domain, "arxiv.org");
    assert!(gpt.link.fallback_filtered);

    let scores: Vec<_> = report.topics.iter().map(|t| t.score).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn recent_publication_suppressed_older_kept() {
    let engine = RankingEngine::new(config(1)).unwrap();
    let first = engine.run(&PassInput {
        now: now(),
        items: news_items(),
        ..Default::default()
    });
    let recent = &first.topics[0];
    let older = &first.topics[1];

    let publications = PublicationSnapshot::new(vec![
        PublicationRecord {
            fingerprint: recent.fingerprint.clone(),
            kind: TopicKind::News,
            published_at: now() - Duration::hours(10),
        },
        PublicationRecord {
            fingerprint: older.fingerprint.clone(),
            kind: TopicKind::News,
            published_at: now() - Duration::hours(30),
        },
    ]);
    let second = engine.run(&PassInput {
        now: now(),
        items: news_items(),
        publications,
        ..Default::default()
    });

    let fingerprints: Vec<&Fingerprint> = second.topics.iter().map(|t| &t.fingerprint).collect();
    assert!(!fingerprints.contains(&&recent.fingerprint));
    assert!(fingerprints.contains(&&older.fingerprint));
    assert_eq!(second.trace.suppressed.len(), 1);
}

#[test]
fn published_topic_stays_suppressed_when_older_source_joins() {
    let engine = RankingEngine::new(config(1)).unwrap();
    let first = engine.run(&PassInput {
        now: now(),
        items: vec![
            raw("a", "OpenAI ships GPT-5", "https://theverge.com/gpt5", 7),
            raw("b", "OpenAI ships GPT-5", "https://techcrunch.com/gpt5", 8),
        ],
        ..Default::default()
    });
    assert_eq!(first.topics.len(), 1);
    let published = PublicationSnapshot::new(vec![PublicationRecord {
        fingerprint: first.topics[0].fingerprint.clone(),
        kind: TopicKind::News,
        published_at: now(),
    }]);

    let later = now() + Duration::hours(6);
    for n in 0..20 {
        let items = vec![
            raw("a", "OpenAI ships GPT-5", "https://theverge.com/gpt5", 7),
            raw("b", "OpenAI ships GPT-5", "https://techcrunch.com/gpt5", 8),
            raw(
                &format!("c{}", n),
                "OpenAI ships GPT-5",
                &format!("https://wired{}.com/gpt5", n),
                10,
            ),
        ];
        let second = engine.run(&PassInput {
            now: later,
            items,
            publications: published.clone(),
            ..Default::default()
        });

        assert!(second.topics.is_empty(), "republished with c{}", n);
        assert_eq!(second.trace.suppressed.len(), 1);
    }
}

#[test]
fn pass_is_deterministic_across_input_order() {
    let engine = RankingEngine::new(config(3)).unwrap();
    let forward = engine.run(&PassInput {
        now: now(),
        items: news_items(),
        ..Default::default()
    });

    let mut reversed = news_items();
    reversed.reverse();
    let backward = engine.run(&PassInput {
        now: now(),
        items: reversed,
        ..Default::default()
    });

    assert_eq!(forward.trace.run_id, backward.trace.run_id);
    assert_eq!(
        serde_json::to_value(&forward).unwrap(),
        serde_json::to_value(&backward).unwrap()
    );
}

#[test]
fn feedback_lifts_topic_within_bounds() {
    let engine = RankingEngine::new(config(3)).unwrap();
    let baseline = engine.run(&PassInput {
        now: now(),
        items: news_items(),
        ..Default::default()
    });
    let last = baseline.topics.last().unwrap();

    let feedback = FeedbackSnapshot::new(
        (0..10)
            .map(|n| FeedbackRecord {
                topic_kind: TopicKind::News,
                topic_ref: last.fingerprint.to_string(),
                label: FeedbackLabel::Useful,
                reason: None,
                created_at: now() - Duration::days(1),
                user_id: format!("user-{}", n),
            })
            .collect(),
    );
    let boosted = engine.run(&PassInput {
        now: now(),
        items: news_items(),
        feedback,
        ..Default::default()
    });

    let topic = boosted
        .topics
        .iter()
        .find(|t| t.fingerprint == last.fingerprint)
        .unwrap();
    assert_eq!(topic.breakdown.feedback.useful, 10);
    assert!((topic.breakdown.feedback_multiplier - 1.15).abs() < 1e-9);
    let category = last.breakdown.category_score;
    assert_eq!(topic.breakdown.category_score, category);
    assert!((topic.score - (category + (last.score - category) * 1.15)).abs() < 1e-9);
}

#[test]
fn report_serializes_to_json() {
    let engine = RankingEngine::new(config(3)).unwrap();
    let report = engine.run(&PassInput {
        now: now(),
        items: news_items(),
        ..Default::default()
    });

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["status"]["status"], "full");
    assert_eq!(json["topics"].as_array().unwrap().len(), 3);
    assert!(json["trace"]["backfill"].is_array());
}
