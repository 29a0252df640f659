// src/score.rs
//! # Velocity / Freshness Scorer
//!
//! Pure functions over clusters. Velocity blends source breadth (primary)
//! and mention count (secondary) with configurable coefficients. Badge
//! tiers are derived on demand from the public formula; downstream
//! consumers recompute them, they are never stored independently.

use serde::{Deserialize, Serialize};

use crate::config::{PipelineConfig, VelocityWeights};
use crate::dedup::TrendCluster;
use crate::snapshot::PriorSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreshnessClass {
    Fresh,
    Aging,
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VelocityTier {
    Hot,
    Rising,
    Steady,
}

/// `source_coeff * distinct_sources + member_coeff * members`.
pub fn velocity_score(w: &VelocityWeights, distinct_sources: usize, members: usize) -> f32 {
    w.source_coeff * distinct_sources as f32 + w.member_coeff * members as f32
}

/// Public badge formula. `None` means the cluster sits below the floor and
/// is noise, not a trend.
pub fn badge_tier(w: &VelocityWeights, velocity: f32, distinct_sources: usize) -> Option<VelocityTier> {
    if velocity >= w.hot_threshold && distinct_sources >= 4 {
        return Some(VelocityTier::Hot);
    }
    if velocity >= w.rising_threshold && (2..=3).contains(&distinct_sources) {
        return Some(VelocityTier::Rising);
    }
    if velocity >= w.floor {
        return Some(VelocityTier::Steady);
    }
    None
}

/// Classify recency of `first_seen` against the run's lookback windows.
/// Unknown timestamps (0) are assumed fresh: trend pages list only today's
/// items and carry no per-item time.
pub fn classify_freshness(cfg: &PipelineConfig, now: u64, first_seen: u64) -> FreshnessClass {
    if first_seen == 0 {
        return FreshnessClass::Fresh;
    }
    let age = now.saturating_sub(first_seen);
    if age <= cfg.fresh_window_secs() {
        FreshnessClass::Fresh
    } else if age <= cfg.aging_window_secs() {
        FreshnessClass::Aging
    } else {
        FreshnessClass::Stale
    }
}

/// Fill velocity/freshness on every cluster, drop the ones below the
/// velocity floor, and order survivors by velocity descending (cluster id
/// as the stable tie-break).
///
/// The prior snapshot backdates `first_seen` for topics that were already
/// published yesterday, so recurring stories age instead of re-appearing
/// fresh every run.
pub fn score_clusters(
    cfg: &PipelineConfig,
    now: u64,
    prior: Option<&PriorSnapshot>,
    mut clusters: Vec<TrendCluster>,
) -> Vec<TrendCluster> {
    for cluster in &mut clusters {
        let mut first_seen = cluster.first_seen;
        if let Some(prior) = prior {
            if let Some(seen) = prior.earliest_seen(
                cfg.similarity_threshold,
                &cluster.representative().normalized_title,
            ) {
                first_seen = if first_seen == 0 { seen } else { first_seen.min(seen) };
            }
        }
        cluster.first_seen = first_seen;

        cluster.velocity_score = velocity_score(
            &cfg.velocity,
            cluster.distinct_source_count(),
            cluster.members.len(),
        );
        cluster.freshness = classify_freshness(cfg, now, first_seen);
    }

    let before = clusters.len();
    clusters.retain(|c| c.velocity_score >= cfg.velocity.floor);
    let dropped = before - clusters.len();
    if dropped > 0 {
        tracing::debug!(dropped, "clusters below velocity floor excluded");
    }

    clusters.sort_by(|a, b| {
        b.velocity_score
            .partial_cmp(&a.velocity_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cluster_id.cmp(&b.cluster_id))
    });
    clusters
}
