//! Trend Radar binary entrypoint.
//! Runs the collection pipeline once and reports the gate verdict through
//! the exit code, so the surrounding automation can branch on it:
//! 0 = proceed, 2 = gate abort (skip publishing, keep yesterday's output),
//! 1 = fatal configuration error.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trend_radar::config::PipelineConfig;
use trend_radar::fetch::cache::ItemCache;
use trend_radar::score::badge_tier;
use trend_radar::snapshot::PriorSnapshot;
use trend_radar::{pipeline, sources};

const ENV_PRIOR_PATH: &str = "TREND_PRIOR_PATH";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    // Invalid configuration is fatal before any fetch happens.
    let cfg = match PipelineConfig::load_default() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "configuration error");
            return ExitCode::from(1);
        }
    };
    let catalog = match sources::load_catalog_default() {
        Ok(cat) => cat,
        Err(e) => {
            tracing::error!(error = %e, "source catalog error");
            return ExitCode::from(1);
        }
    };

    // Yesterday's published list, if the archive collaborator left one.
    let prior = std::env::var(ENV_PRIOR_PATH)
        .ok()
        .map(PathBuf::from)
        .and_then(|p| match PriorSnapshot::load_from(&p) {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::warn!(error = %e, "prior snapshot unreadable, continuing without it");
                None
            }
        });

    let cache = Arc::new(ItemCache::new(cfg.cache));
    let report = match pipeline::run(&cfg, &catalog, cache, prior.as_ref()).await {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %e, "pipeline setup failed");
            return ExitCode::from(1);
        }
    };

    for reason in &report.verdict.reasons {
        tracing::warn!(%reason, "gate reason");
    }

    match report.published() {
        Some(clusters) => {
            tracing::info!(
                trends = clusters.len(),
                fresh_ratio = report.verdict.fresh_ratio,
                "run proceeding to publication"
            );
            for (i, c) in clusters.iter().take(10).enumerate() {
                let tier = badge_tier(&cfg.velocity, c.velocity_score, c.distinct_source_count());
                tracing::info!(
                    rank = i + 1,
                    title = c.representative_title(),
                    sources = c.distinct_source_count(),
                    velocity = c.velocity_score,
                    tier = ?tier,
                    category = %c.category,
                    "trend"
                );
            }

            // Optional handoff: dump the sealed list as JSON for the
            // downstream collaborators.
            if let Some(path) = std::env::args().nth(1) {
                match serde_json::to_string_pretty(clusters) {
                    Ok(json) => {
                        if let Err(e) = std::fs::write(&path, json) {
                            tracing::error!(error = %e, %path, "writing trend list failed");
                        } else {
                            tracing::info!(%path, "trend list written");
                        }
                    }
                    Err(e) => tracing::error!(error = %e, "serializing trend list failed"),
                }
            }
            ExitCode::SUCCESS
        }
        None => {
            tracing::warn!("gate aborted the run; previous output stays untouched");
            ExitCode::from(2)
        }
    }
}
