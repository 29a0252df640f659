// src/snapshot.rs
//! Read-only prior state: yesterday's published trend list, supplied by the
//! archive collaborator as an opaque JSON array. Used only to backdate
//! `first_seen` for topics we already published, never mutated here.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::dedup::similarity;
use crate::normalize::match_key;

#[derive(Debug, Clone, Deserialize)]
pub struct PriorTrend {
    pub title: String,
    /// Match key as published; recomputed from `title` when absent so older
    /// archive formats still load.
    #[serde(default)]
    pub normalized_title: Option<String>,
    /// Unix seconds.
    pub first_seen: u64,
}

#[derive(Debug, Clone, Default)]
pub struct PriorSnapshot {
    entries: Vec<PriorTrend>,
}

impl PriorSnapshot {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading prior trends from {}", path.display()))?;
        let entries: Vec<PriorTrend> = serde_json::from_str(&content)
            .with_context(|| format!("parsing prior trends {}", path.display()))?;
        Ok(Self { entries })
    }

    pub fn from_entries(entries: Vec<PriorTrend>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Earliest `first_seen` among prior trends whose match key is similar
    /// enough to `normalized_title`. Zero timestamps are treated as unknown
    /// and ignored.
    pub fn earliest_seen(&self, threshold: f64, normalized_title: &str) -> Option<u64> {
        self.entries
            .iter()
            .filter(|e| e.first_seen > 0)
            .filter(|e| {
                let key = e
                    .normalized_title
                    .clone()
                    .unwrap_or_else(|| match_key(&e.title));
                similarity(&key, normalized_title) >= threshold
            })
            .map(|e| e.first_seen)
            .min()
    }
}
