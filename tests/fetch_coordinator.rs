// tests/fetch_coordinator.rs
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use trend_radar::fetch::types::{
    FetchBatch, FetchError, FetchStatus, RawCandidate, SourceAdapter,
};
use trend_radar::fetch::FetchCoordinator;

struct OkAdapter {
    name: String,
    titles: Vec<String>,
}

impl OkAdapter {
    fn boxed(name: &str, titles: &[&str]) -> Box<dyn SourceAdapter> {
        Box::new(Self {
            name: name.to_string(),
            titles: titles.iter().map(|s| s.to_string()).collect(),
        })
    }
}

#[async_trait::async_trait]
impl SourceAdapter for OkAdapter {
    async fn fetch(&self) -> Result<FetchBatch, FetchError> {
        let candidates = self
            .titles
            .iter()
            .map(|t| RawCandidate {
                title: t.clone(),
                url: None,
                source: self.name.clone(),
                published_at: 1_780_000_000,
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

struct FlakyAdapter {
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl SourceAdapter for FlakyAdapter {
    async fn fetch(&self) -> Result<FetchBatch, FetchError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(FetchError::Transient("503 service unavailable".into()));
        }
        Ok(FetchBatch::new(
            vec![RawCandidate {
                title: "Recovered headline".into(),
                url: None,
                source: "flaky".into(),
                published_at: 1_780_000_000,
                author: None,
                category_hint: None,
            }],
            0,
        ))
    }
    fn name(&self) -> &str {
        "flaky"
    }
}

struct BrokenAdapter {
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl SourceAdapter for BrokenAdapter {
    async fn fetch(&self) -> Result<FetchBatch, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(FetchError::Permanent("not a feed".into()))
    }
    fn name(&self) -> &str {
        "broken"
    }
}

fn short(adapter: Box<dyn SourceAdapter>) -> (Box<dyn SourceAdapter>, Duration) {
    (adapter, Duration::from_millis(200))
}

#[tokio::test]
async fn one_timeout_among_many_does_not_sink_the_run() {
    let mut adapters: Vec<(Box<dyn SourceAdapter>, Duration)> = Vec::new();
    for i in 0..14 {
        adapters.push(short(OkAdapter::boxed(
            &format!("src{i}"),
            &[&format!("headline number {i}")],
        )));
    }
    adapters.push(short(Box::new(HangingAdapter)));

    let coordinator = FetchCoordinator::with_adapters(adapters, Duration::from_millis(5));
    let report = coordinator.run().await;

    assert_eq!(report.outcomes.len(), 15);
    assert!(!report.total_failure());
    assert_eq!(report.candidates.len(), 14);

    let timeout = report
        .outcomes
        .iter()
        .find(|o| o.source == "hanging")
        .unwrap();
    assert_eq!(timeout.status, FetchStatus::Timeout);
    assert_eq!(timeout.item_count, 0);

    let ok = report.outcomes.iter().filter(|o| o.status == FetchStatus::Ok);
    assert_eq!(ok.count(), 14);
}

#[tokio::test]
async fn candidates_stay_contiguous_per_source() {
    let adapters = vec![
        short(OkAdapter::boxed("a", &["a one", "a two"])),
        short(OkAdapter::boxed("b", &["b one"])),
        short(OkAdapter::boxed("c", &["c one", "c two", "c three"])),
    ];
    let coordinator = FetchCoordinator::with_adapters(adapters, Duration::from_millis(5));
    let report = coordinator.run().await;

    let sources: Vec<&str> = report.candidates.iter().map(|c| c.source.as_str()).collect();
    // source-major: one contiguous block per source
    let mut blocks = Vec::new();
    for s in &sources {
        if blocks.last() != Some(s) {
            blocks.push(*s);
        }
    }
    let mut dedup = blocks.clone();
    dedup.dedup();
    assert_eq!(blocks.len(), 3, "sources interleaved: {sources:?}");
    assert_eq!(blocks, dedup);
}

#[tokio::test]
async fn transient_failure_is_retried_once_and_recovers() {
    let calls = Arc::new(AtomicUsize::new(0));
    let adapters: Vec<(Box<dyn SourceAdapter>, Duration)> = vec![short(Box::new(FlakyAdapter {
        calls: calls.clone(),
    }))];
    let coordinator = FetchCoordinator::with_adapters(adapters, Duration::from_millis(5));
    let report = coordinator.run().await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(report.outcomes[0].status, FetchStatus::Ok);
    assert_eq!(report.candidates.len(), 1);
}

#[tokio::test]
async fn permanent_failure_is_not_retried() {
    let calls = Arc::new(AtomicUsize::new(0));
    let adapters: Vec<(Box<dyn SourceAdapter>, Duration)> = vec![short(Box::new(BrokenAdapter {
        calls: calls.clone(),
    }))];
    let coordinator = FetchCoordinator::with_adapters(adapters, Duration::from_millis(5));
    let report = coordinator.run().await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.outcomes[0].status, FetchStatus::Error);
    assert_eq!(report.outcomes[0].error.as_deref(), Some("not a feed"));
}

#[tokio::test]
async fn total_failure_only_when_every_source_fails() {
    let adapters: Vec<(Box<dyn SourceAdapter>, Duration)> = vec![
        short(Box::new(BrokenAdapter {
            calls: Arc::new(AtomicUsize::new(0)),
        })),
        short(Box::new(HangingAdapter)),
    ];
    let coordinator = FetchCoordinator::with_adapters(adapters, Duration::from_millis(5));
    let report = coordinator.run().await;
    assert!(report.total_failure());
    assert!(report.candidates.is_empty());
}

#[tokio::test]
async fn empty_but_successful_source_is_marked_empty() {
    let adapters = vec![short(OkAdapter::boxed("quiet", &[]))];
    let coordinator = FetchCoordinator::with_adapters(adapters, Duration::from_millis(5));
    let report = coordinator.run().await;
    assert_eq!(report.outcomes[0].status, FetchStatus::Empty);
    assert!(!report.total_failure());
}
