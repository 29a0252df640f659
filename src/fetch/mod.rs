// src/fetch/mod.rs
pub mod adapters;
pub mod cache;
pub mod types;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Duration;

use crate::config::PipelineConfig;
use crate::fetch::cache::ItemCache;
use crate::fetch::types::{FetchBatch, FetchError, FetchOutcome, FetchStatus, RawCandidate, SourceAdapter};
use crate::sources::SourceSpec;

/// One-time metrics registration (so series show up wherever the embedder
/// exports them).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "collect_candidates_total",
            "Raw candidates parsed from sources."
        );
        describe_counter!(
            "collect_kept_total",
            "Candidates kept after normalization + language filter."
        );
        describe_counter!(
            "collect_filtered_total",
            "Candidates rejected by normalization."
        );
        describe_counter!("collect_clusters_total", "Topic clusters emitted per run.");
        describe_counter!("collect_source_errors_total", "Whole-source fetch failures.");
        describe_counter!("collect_source_retries_total", "Transient-failure retries.");
        describe_counter!("collect_cache_hits_total", "Item-cache hits in API adapters.");
        describe_histogram!("collect_parse_ms", "Source parse time in milliseconds.");
        describe_gauge!("collect_last_run_ts", "Unix ts when the pipeline last ran.");
    });
}

/// Aggregated result of one concurrent fetch round: candidates in
/// source-major order plus one outcome per source.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub candidates: Vec<RawCandidate>,
    pub outcomes: Vec<FetchOutcome>,
}

impl FetchReport {
    /// True only when every configured source failed; partial failure is
    /// the normal operating mode.
    pub fn total_failure(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|o| o.is_failure())
    }

    pub fn failed_sources(&self) -> impl Iterator<Item = &FetchOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }
}

struct Entry {
    adapter: Box<dyn SourceAdapter>,
    timeout: Duration,
}

/// Runs all source adapters concurrently with a per-source deadline and one
/// retry with backoff on transient failure. Always returns a report; failed
/// sources contribute an outcome and zero candidates.
pub struct FetchCoordinator {
    entries: Vec<Entry>,
    retry_backoff: Duration,
}

impl FetchCoordinator {
    /// Build adapters for a whole catalog.
    pub fn from_catalog(
        cfg: &PipelineConfig,
        catalog: &[SourceSpec],
        client: reqwest::Client,
        cache: Arc<ItemCache>,
    ) -> anyhow::Result<Self> {
        let mut entries = Vec::with_capacity(catalog.len());
        for spec in catalog {
            let adapter = adapters::build(spec, cfg.default_item_cap, client.clone(), cache.clone())?;
            entries.push(Entry {
                adapter,
                timeout: cfg.timeouts.for_kind(spec.kind),
            });
        }
        Ok(Self {
            entries,
            retry_backoff: Duration::from_millis(cfg.retry_backoff_ms),
        })
    }

    /// Assemble from pre-built adapters with explicit per-adapter timeouts.
    pub fn with_adapters(
        adapters: Vec<(Box<dyn SourceAdapter>, Duration)>,
        retry_backoff: Duration,
    ) -> Self {
        Self {
            entries: adapters
                .into_iter()
                .map(|(adapter, timeout)| Entry { adapter, timeout })
                .collect(),
            retry_backoff,
        }
    }

    /// Fetch every source concurrently. Candidates from one source stay
    /// contiguous; the report lists sources in catalog order regardless of
    /// completion order.
    pub async fn run(self) -> FetchReport {
        ensure_metrics_described();

        let backoff = self.retry_backoff;
        let mut handles = Vec::with_capacity(self.entries.len());
        for entry in self.entries {
            handles.push(tokio::spawn(fetch_one(entry, backoff)));
        }

        let mut report = FetchReport::default();
        for handle in handles {
            match handle.await {
                Ok((mut candidates, outcome)) => {
                    if outcome.is_failure() {
                        counter!("collect_source_errors_total").increment(1);
                    }
                    report.candidates.append(&mut candidates);
                    report.outcomes.push(outcome);
                }
                Err(e) => {
                    // A panicked adapter task is recorded, never propagated.
                    tracing::error!(error = %e, "source task aborted");
                    report.outcomes.push(FetchOutcome::failed(
                        "unknown",
                        FetchStatus::Error,
                        format!("task aborted: {e}"),
                    ));
                }
            }
        }
        report
    }
}

enum AttemptError {
    TimedOut,
    Fetch(FetchError),
}

impl AttemptError {
    fn retryable(&self) -> bool {
        match self {
            AttemptError::TimedOut => true,
            AttemptError::Fetch(e) => e.is_transient(),
        }
    }
}

async fn attempt(adapter: &dyn SourceAdapter, deadline: Duration) -> Result<FetchBatch, AttemptError> {
    match tokio::time::timeout(deadline, adapter.fetch()).await {
        Ok(Ok(batch)) => Ok(batch),
        Ok(Err(e)) => Err(AttemptError::Fetch(e)),
        Err(_) => Err(AttemptError::TimedOut),
    }
}

async fn fetch_one(entry: Entry, backoff: Duration) -> (Vec<RawCandidate>, FetchOutcome) {
    let adapter = entry.adapter;
    let name = adapter.name().to_string();

    let mut last_err = match attempt(adapter.as_ref(), entry.timeout).await {
        Ok(batch) => {
            let outcome = FetchOutcome::ok(&name, batch.candidates.len(), batch.skipped);
            return (batch.candidates, outcome);
        }
        Err(e) => e,
    };

    if last_err.retryable() {
        counter!("collect_source_retries_total").increment(1);
        tracing::warn!(source = %name, "transient failure, retrying once");
        tokio::time::sleep(backoff).await;
        match attempt(adapter.as_ref(), entry.timeout).await {
            Ok(batch) => {
                let outcome = FetchOutcome::ok(&name, batch.candidates.len(), batch.skipped);
                return (batch.candidates, outcome);
            }
            Err(e) => last_err = e,
        }
    }

    let outcome = match last_err {
        AttemptError::TimedOut => {
            tracing::warn!(source = %name, "source timed out");
            FetchOutcome::failed(&name, FetchStatus::Timeout, "deadline exceeded".into())
        }
        AttemptError::Fetch(e) => {
            tracing::warn!(source = %name, error = %e, "source failed");
            FetchOutcome::failed(&name, FetchStatus::Error, e.detail().to_string())
        }
    };
    (Vec::new(), outcome)
}
