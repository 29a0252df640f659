// src/pipeline.rs
//! # Pipeline Orchestrator
//!
//! Sequences fetch → normalize → dedup → score → gate exactly once per run.
//! Fetch diagnostics ride along regardless of the gate decision; the sealed
//! cluster list is only reachable when the gate said proceed, so an aborted
//! run cannot leak work to downstream consumers.

use metrics::{counter, gauge};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::dedup::{cluster_candidates, TrendCluster};
use crate::fetch::cache::ItemCache;
use crate::fetch::types::FetchOutcome;
use crate::fetch::{ensure_metrics_described, FetchCoordinator};
use crate::gate::{self, GateVerdict};
use crate::normalize::{normalize_candidate, Category};
use crate::score::score_clusters;
use crate::snapshot::PriorSnapshot;
use crate::sources::{SourceSpec, SourceWeights};

/// Result of one pipeline run.
#[derive(Debug)]
pub struct RunReport {
    clusters: Vec<TrendCluster>,
    pub verdict: GateVerdict,
    pub outcomes: Vec<FetchOutcome>,
}

impl RunReport {
    /// The sealed, ordered trend list, `Some` only when the gate decided
    /// to proceed. On abort there is nothing to hand downstream.
    pub fn published(&self) -> Option<&[TrendCluster]> {
        if self.verdict.is_proceed() {
            Some(&self.clusters)
        } else {
            None
        }
    }
}

/// One full run against the real catalog: builds the HTTP client and all
/// adapters, then delegates to [`run_with_coordinator`].
pub async fn run(
    cfg: &PipelineConfig,
    catalog: &[SourceSpec],
    cache: Arc<ItemCache>,
    prior: Option<&PriorSnapshot>,
) -> anyhow::Result<RunReport> {
    // Several feeds answer 403 to the default client string.
    let client = reqwest::Client::builder()
        .user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
        .build()
        .map_err(|e| anyhow::anyhow!("building http client: {e}"))?;

    let coordinator = FetchCoordinator::from_catalog(cfg, catalog, client, cache)?;
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    Ok(run_with_coordinator(now, cfg, catalog, coordinator, prior).await)
}

/// Run the pipeline over a pre-built coordinator with an explicit clock.
/// Everything after the fetch is single-threaded and deterministic over the
/// coordinator's aggregated output.
pub async fn run_with_coordinator(
    now: u64,
    cfg: &PipelineConfig,
    catalog: &[SourceSpec],
    coordinator: FetchCoordinator,
    prior: Option<&PriorSnapshot>,
) -> RunReport {
    ensure_metrics_described();

    let report = coordinator.run().await;
    if report.total_failure() {
        tracing::error!("every configured source failed this run");
    }

    let hints: HashMap<&str, Category> = catalog
        .iter()
        .filter_map(|s| s.category.map(|c| (s.name.as_str(), c)))
        .collect();
    let weights = SourceWeights::from_catalog(catalog);

    let mut accepted = Vec::with_capacity(report.candidates.len());
    let mut filtered = 0usize;
    for raw in &report.candidates {
        let hint = hints.get(raw.source.as_str()).copied();
        let normalized = normalize_candidate(raw, hint);
        if normalized.accepted {
            accepted.push(normalized);
        } else {
            filtered += 1;
        }
    }
    counter!("collect_kept_total").increment(accepted.len() as u64);
    counter!("collect_filtered_total").increment(filtered as u64);
    tracing::info!(
        raw = report.candidates.len(),
        kept = accepted.len(),
        filtered,
        "normalization finished"
    );

    let clusters = cluster_candidates(cfg.similarity_threshold, &weights, accepted);
    let clusters = score_clusters(cfg, now, prior, clusters);
    counter!("collect_clusters_total").increment(clusters.len() as u64);

    let verdict = gate::evaluate(cfg, &clusters, &report.outcomes);
    gauge!("collect_last_run_ts").set(now as f64);

    RunReport {
        clusters,
        verdict,
        outcomes: report.outcomes,
    }
}
