// tests/pipeline_e2e.rs
use std::time::Duration;

use trend_radar::config::PipelineConfig;
use trend_radar::fetch::types::{FetchBatch, FetchError, RawCandidate, SourceAdapter};
use trend_radar::fetch::FetchCoordinator;
use trend_radar::gate::GateDecision;
use trend_radar::pipeline::run_with_coordinator;

const NOW: u64 = 1_800_000_000;

struct StaticAdapter {
    name: String,
    titles: Vec<String>,
}

impl StaticAdapter {
    fn entry(name: &str, titles: &[&str]) -> (Box<dyn SourceAdapter>, Duration) {
        (
            Box::new(Self {
                name: name.to_string(),
                titles: titles.iter().map(|s| s.to_string()).collect(),
            }),
            Duration::from_millis(200),
        )
    }
}

#[async_trait::async_trait]
impl SourceAdapter for StaticAdapter {
    async fn fetch(&self) -> Result<FetchBatch, FetchError> {
        let candidates = self
            .titles
            .iter()
            .map(|t| RawCandidate {
                title: t.clone(),
                url: None,
                source: self.name.clone(),
                published_at: NOW - 1_000,
                author: None,
                category_hint: None,
            })
            .collect();
        Ok(FetchBatch::new(candidates, 0))
    }
    fn name(&self) -> &str {
        &self.name
    }
}

struct HangingAdapter;

#[async_trait::async_trait]
impl SourceAdapter for HangingAdapter {
    async fn fetch(&self) -> Result<FetchBatch, FetchError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(FetchBatch::default())
    }
    fn name(&self) -> &str {
        "hanging"
    }
}

const DISTINCT_TITLES: &[&str] = &[
    "Storm batters northern coast",
    "Parliament passes budget bill",
    "Compiler release cuts build times",
    "Quantum dolphin research expands",
    "Volcano erupts near fishing village",
    "Mars rover drills ancient rock",
    "Championship final goes to overtime",
    "Electric ferry crosses the channel",
    "Museum returns looted bronze statues",
    "Desert festival draws record crowds",
    "Honeybee population rebounds upstate",
    "Submarine cable repaired after outage",
    "Glacier melt accelerates in survey",
    "Startup unveils foldable solar panels",
];

#[tokio::test]
async fn merged_topic_leads_the_published_list() {
    let adapters = vec![
        StaticAdapter::entry(
            "npr",
            &[
                "Company X raises $50M",
                "Storm batters northern coast",
                "Parliament passes budget bill",
                "Quantum dolphin research expands",
                "Mars rover drills ancient rock",
            ],
        ),
        StaticAdapter::entry("techcrunch", &["Company X funding round hits $50 million"]),
        StaticAdapter::entry("espn", &["Unrelated sports score"]),
    ];
    let coordinator = FetchCoordinator::with_adapters(adapters, Duration::from_millis(5));
    let cfg = PipelineConfig::default();

    let report = run_with_coordinator(NOW, &cfg, &[], coordinator, None).await;
    assert_eq!(report.verdict.decision, GateDecision::Proceed);

    let published = report.published().expect("proceed run must publish");
    assert_eq!(published.len(), 6);

    // two sources mentioned the funding story → highest velocity, ranked first
    let top = &published[0];
    assert_eq!(top.distinct_source_count(), 2);
    assert_eq!(top.members.len(), 2);
    assert!(top.velocity_score > published[1].velocity_score);
}

#[tokio::test]
async fn too_few_clusters_abort_without_handoff() {
    let adapters = vec![StaticAdapter::entry("npr", &DISTINCT_TITLES[..4])];
    let coordinator = FetchCoordinator::with_adapters(adapters, Duration::from_millis(5));
    let cfg = PipelineConfig::default();

    let report = run_with_coordinator(NOW, &cfg, &[], coordinator, None).await;

    assert_eq!(report.verdict.decision, GateDecision::Abort);
    assert_eq!(report.verdict.total_trend_count, 4);
    assert!(report
        .verdict
        .reasons
        .iter()
        .any(|r| r.contains("insufficient trends")));
    assert!(report.published().is_none(), "abort must not hand anything downstream");
}

#[tokio::test]
async fn one_timed_out_source_still_proceeds_with_the_rest() {
    let mut adapters: Vec<(Box<dyn SourceAdapter>, Duration)> = DISTINCT_TITLES
        .iter()
        .enumerate()
        .map(|(i, &title)| StaticAdapter::entry(&format!("src{i}"), &[title]))
        .collect();
    adapters.push((Box::new(HangingAdapter), Duration::from_millis(200)));
    assert_eq!(adapters.len(), 15);

    let coordinator = FetchCoordinator::with_adapters(adapters, Duration::from_millis(5));
    let cfg = PipelineConfig::default();
    let report = run_with_coordinator(NOW, &cfg, &[], coordinator, None).await;

    assert_eq!(report.verdict.decision, GateDecision::Proceed);
    // the timed-out source contributed nothing; the other 14 each formed a cluster
    assert_eq!(report.verdict.total_trend_count, 14);
    assert!(report.outcomes.iter().any(|o| o.source == "hanging" && o.is_failure()));
}

#[tokio::test]
async fn clusters_below_velocity_floor_are_noise() {
    let adapters = vec![
        StaticAdapter::entry("npr", &["Company X raises $50M", "Storm batters northern coast"]),
        StaticAdapter::entry("techcrunch", &["Company X funding round hits $50 million"]),
    ];
    let coordinator = FetchCoordinator::with_adapters(adapters, Duration::from_millis(5));

    let mut cfg = PipelineConfig::default();
    // raise the floor past singleton velocity (2*1 + 1*1 = 3)
    cfg.velocity.floor = 4.0;
    cfg.velocity.rising_threshold = 5.0;
    cfg.velocity.hot_threshold = 12.0;

    let report = run_with_coordinator(NOW, &cfg, &[], coordinator, None).await;
    // only the merged funding cluster (velocity 6) survives the floor
    assert_eq!(report.verdict.total_trend_count, 1);
    assert_eq!(report.verdict.decision, GateDecision::Abort);
}

#[tokio::test]
async fn non_english_items_never_reach_clustering() {
    let adapters = vec![
        StaticAdapter::entry(
            "npr",
            &[
                "速報 これはニュースです",
                "Это новость",
                "Storm batters northern coast",
            ],
        ),
        StaticAdapter::entry("bbc", &DISTINCT_TITLES[1..5]),
    ];
    let coordinator = FetchCoordinator::with_adapters(adapters, Duration::from_millis(5));
    let cfg = PipelineConfig::default();

    let report = run_with_coordinator(NOW, &cfg, &[], coordinator, None).await;
    let published = report.published().expect("enough english clusters to proceed");
    assert_eq!(published.len(), 5);
    for cluster in published {
        for member in &cluster.members {
            assert!(member.accepted);
        }
    }
}
