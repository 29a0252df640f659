// src/dedup.rs
//! # Dedup Engine
//!
//! Clusters candidates that describe the same real-world topic. One greedy
//! pass in source-major order: each accepted candidate either merges into
//! the first best-matching open cluster (similarity to the cluster's
//! representative at or above the threshold) or opens a new cluster. A
//! member is never moved between clusters afterwards.
//!
//! Similarity is the max of an order-insensitive token-overlap ratio
//! (`|A∩B| / min(|A|, |B|)`) and normalized Levenshtein over the match
//! keys; both live in [0, 1].

use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

use crate::normalize::{Category, NormalizedCandidate};
use crate::score::FreshnessClass;
use crate::sources::SourceWeights;

/// The deduplicated representation of one trending topic.
#[derive(Debug, Clone, Serialize)]
pub struct TrendCluster {
    /// Stable within one run; regenerated across runs.
    pub cluster_id: u32,
    /// Insertion order = discovery order.
    pub members: Vec<NormalizedCandidate>,
    representative: usize,
    pub sources: BTreeSet<String>,
    /// Unix seconds of the earliest/latest member timestamps; 0 = unknown.
    pub first_seen: u64,
    pub last_seen: u64,
    /// Filled by the scorer.
    pub velocity_score: f32,
    pub freshness: FreshnessClass,
    pub category: Category,
}

impl TrendCluster {
    fn open(cluster_id: u32, candidate: NormalizedCandidate) -> Self {
        let ts = candidate.raw.published_at;
        let mut sources = BTreeSet::new();
        sources.insert(candidate.raw.source.clone());
        let category = candidate.category;
        Self {
            cluster_id,
            members: vec![candidate],
            representative: 0,
            sources,
            first_seen: ts,
            last_seen: ts,
            velocity_score: 0.0,
            freshness: FreshnessClass::Stale,
            category,
        }
    }

    pub fn representative(&self) -> &NormalizedCandidate {
        &self.members[self.representative]
    }

    pub fn representative_title(&self) -> &str {
        &self.representative().title
    }

    pub fn distinct_source_count(&self) -> usize {
        self.sources.len()
    }

    fn absorb(&mut self, candidate: NormalizedCandidate, weights: &SourceWeights) {
        let ts = candidate.raw.published_at;
        self.sources.insert(candidate.raw.source.clone());
        self.members.push(candidate);

        if ts > 0 {
            if self.first_seen == 0 || ts < self.first_seen {
                self.first_seen = ts;
            }
            if ts > self.last_seen {
                self.last_seen = ts;
            }
        }

        self.elect_representative(weights);
        self.category = self.representative().category;
    }

    /// Highest source reliability weight wins; ties go to the earliest
    /// timestamp (unknown timestamps lose), then to discovery order.
    fn elect_representative(&mut self, weights: &SourceWeights) {
        let mut best = 0usize;
        let mut best_weight = weights.weight_for(&self.members[0].raw.source);
        let mut best_ts = tie_break_ts(&self.members[0]);

        for (i, m) in self.members.iter().enumerate().skip(1) {
            let w = weights.weight_for(&m.raw.source);
            let ts = tie_break_ts(m);
            if w > best_weight || (w == best_weight && ts < best_ts) {
                best = i;
                best_weight = w;
                best_ts = ts;
            }
        }
        self.representative = best;
    }
}

fn tie_break_ts(m: &NormalizedCandidate) -> u64 {
    if m.raw.published_at == 0 {
        u64::MAX
    } else {
        m.raw.published_at
    }
}

/// Normalized similarity of two match keys, in [0, 1].
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let ta: HashSet<&str> = a.split_whitespace().collect();
    let tb: HashSet<&str> = b.split_whitespace().collect();
    let overlap = if ta.is_empty() || tb.is_empty() {
        0.0
    } else {
        ta.intersection(&tb).count() as f64 / ta.len().min(tb.len()) as f64
    };
    let edit = strsim::normalized_levenshtein(a, b);
    overlap.max(edit)
}

/// Single greedy clustering pass over accepted candidates, in the order
/// given. Deterministic: identical input order and threshold produce
/// identical membership, representatives, and cluster order.
pub fn cluster_candidates(
    threshold: f64,
    weights: &SourceWeights,
    candidates: Vec<NormalizedCandidate>,
) -> Vec<TrendCluster> {
    let mut clusters: Vec<TrendCluster> = Vec::new();
    let mut next_id = 0u32;

    for candidate in candidates {
        // Rejected candidates never enter the engine.
        if !candidate.accepted {
            continue;
        }

        let mut best: Option<(usize, f64)> = None;
        for (idx, cluster) in clusters.iter().enumerate() {
            let sim = similarity(
                &candidate.normalized_title,
                &cluster.representative().normalized_title,
            );
            // Strict `>` keeps the earliest-opened cluster on ties.
            if sim >= threshold && best.map_or(true, |(_, s)| sim > s) {
                best = Some((idx, sim));
            }
        }

        match best {
            Some((idx, _)) => clusters[idx].absorb(candidate, weights),
            None => {
                clusters.push(TrendCluster::open(next_id, candidate));
                next_id += 1;
            }
        }
    }

    clusters
}
