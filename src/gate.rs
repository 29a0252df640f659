// src/gate.rs
//! # Quality Gate
//!
//! Decides whether the day's aggregate is fit to publish. Abort is a normal
//! terminal outcome, returned as a value; the surrounding automation skips
//! publishing and keeps the previous day's output untouched.

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::dedup::TrendCluster;
use crate::fetch::types::FetchOutcome;
use crate::score::FreshnessClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateDecision {
    Proceed,
    Abort,
}

/// Sealed result of one gate evaluation. Reasons are ordered and populated
/// on proceed as well whenever a warning threshold was crossed.
#[derive(Debug, Clone, Serialize)]
pub struct GateVerdict {
    pub total_trend_count: usize,
    pub fresh_ratio: f32,
    pub decision: GateDecision,
    pub reasons: Vec<String>,
}

impl GateVerdict {
    pub fn is_proceed(&self) -> bool {
        self.decision == GateDecision::Proceed
    }
}

/// Fraction of clusters classified Fresh; an empty set counts as fully
/// fresh so the ratio never blocks before the count rule has its say.
pub fn fresh_ratio(clusters: &[TrendCluster]) -> f32 {
    if clusters.is_empty() {
        return 1.0;
    }
    let fresh = clusters
        .iter()
        .filter(|c| c.freshness == FreshnessClass::Fresh)
        .count();
    fresh as f32 / clusters.len() as f32
}

/// Evaluate the gate rules in order:
/// 1. fewer clusters than MIN_TRENDS → abort;
/// 2. fresh ratio strictly below MIN_FRESH_RATIO → proceed with a warning;
/// 3. otherwise → clean proceed.
///
/// Failed sources are itemized into the reasons on every branch so a run is
/// diagnosable from its own report.
pub fn evaluate(
    cfg: &PipelineConfig,
    clusters: &[TrendCluster],
    outcomes: &[FetchOutcome],
) -> GateVerdict {
    let total = clusters.len();
    let ratio = fresh_ratio(clusters);
    let mut reasons = Vec::new();

    let failed: Vec<&FetchOutcome> = outcomes.iter().filter(|o| o.is_failure()).collect();
    if !failed.is_empty() {
        let detail = failed
            .iter()
            .map(|o| format!("{} ({:?})", o.source, o.status))
            .collect::<Vec<_>>()
            .join(", ");
        reasons.push(format!(
            "{} of {} sources failed: {}",
            failed.len(),
            outcomes.len(),
            detail
        ));
    }

    let decision = if total < cfg.min_trends {
        reasons.push(format!(
            "insufficient trends collected: {} < {}",
            total, cfg.min_trends
        ));
        GateDecision::Abort
    } else {
        if ratio < cfg.min_fresh_ratio {
            reasons.push(format!(
                "fresh ratio {:.2} below minimum {:.2}; publishing with stale-leaning content",
                ratio, cfg.min_fresh_ratio
            ));
        }
        GateDecision::Proceed
    };

    let verdict = GateVerdict {
        total_trend_count: total,
        fresh_ratio: ratio,
        decision,
        reasons,
    };
    tracing::info!(
        total,
        fresh_ratio = ratio,
        decision = ?verdict.decision,
        "quality gate evaluated"
    );
    verdict
}
