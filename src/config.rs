// src/config.rs
//! Pipeline configuration: thresholds, timeouts, caps, and scoring weights.
//!
//! Loaded once at startup. Invalid values are rejected by [`PipelineConfig::validate`]
//! and abort the run before any fetch happens; they are never clamped or
//! silently replaced with defaults.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::sources::SourceKind;

pub const ENV_CONFIG_PATH: &str = "TREND_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config/pipeline.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Minimum cluster count below which the run aborts.
    pub min_trends: usize,
    /// Minimum fraction of fresh clusters; below this the run proceeds with a warning.
    pub min_fresh_ratio: f32,
    /// Title similarity at or above which a candidate merges into a cluster.
    pub similarity_threshold: f64,
    /// Item cap for sources that do not declare their own.
    pub default_item_cap: usize,
    pub timeouts: TimeoutTable,
    /// Backoff before the single retry of a transiently failed source.
    pub retry_backoff_ms: u64,
    /// Clusters first seen within this window are Fresh.
    pub fresh_window_hours: u64,
    /// Clusters first seen within this wider window are Aging; older are Stale.
    pub aging_window_hours: u64,
    pub velocity: VelocityWeights,
    pub cache: CacheSettings,
}

/// Per-operation fetch timeouts, keyed by source kind.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct TimeoutTable {
    pub feed_secs: u64,
    pub api_secs: u64,
    pub scrape_secs: u64,
}

impl Default for TimeoutTable {
    fn default() -> Self {
        Self {
            feed_secs: 15,
            api_secs: 10,
            scrape_secs: 20,
        }
    }
}

impl TimeoutTable {
    pub fn for_kind(&self, kind: SourceKind) -> std::time::Duration {
        let secs = match kind {
            SourceKind::Feed => self.feed_secs,
            SourceKind::Api => self.api_secs,
            SourceKind::Scrape => self.scrape_secs,
        };
        std::time::Duration::from_secs(secs)
    }
}

/// Tunable velocity formula: `source_coeff * distinct_sources + member_coeff * members`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct VelocityWeights {
    pub source_coeff: f32,
    pub member_coeff: f32,
    /// Clusters scoring below the floor are noise and never published.
    pub floor: f32,
    pub rising_threshold: f32,
    pub hot_threshold: f32,
}

impl Default for VelocityWeights {
    fn default() -> Self {
        Self {
            source_coeff: 2.0,
            member_coeff: 1.0,
            floor: 1.0,
            rising_threshold: 6.0,
            hot_threshold: 12.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub ttl_secs: u64,
    pub cap_per_source: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 6 * 3600,
            cap_per_source: 256,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_trends: 5,
            min_fresh_ratio: 0.5,
            similarity_threshold: 0.8,
            default_item_cap: 8,
            timeouts: TimeoutTable::default(),
            retry_backoff_ms: 500,
            fresh_window_hours: 24,
            aging_window_hours: 72,
            velocity: VelocityWeights::default(),
            cache: CacheSettings::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from an explicit TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading pipeline config from {}", path.display()))?;
        let cfg: Self = toml::from_str(&content)
            .with_context(|| format!("parsing pipeline config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load using env var + fallbacks:
    /// 1) $TREND_CONFIG_PATH (must exist if set)
    /// 2) config/pipeline.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                bail!("{ENV_CONFIG_PATH} points to non-existent path");
            }
            return Self::load_from(&pb);
        }
        let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        let cfg = Self::default();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject out-of-range values. Called on every load path so that a bad
    /// config file stops the run at startup.
    pub fn validate(&self) -> Result<()> {
        if self.min_trends == 0 {
            bail!("min_trends must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.min_fresh_ratio) {
            bail!(
                "min_fresh_ratio must be within [0, 1], got {}",
                self.min_fresh_ratio
            );
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            bail!(
                "similarity_threshold must be within [0, 1], got {}",
                self.similarity_threshold
            );
        }
        if self.default_item_cap == 0 {
            bail!("default_item_cap must be at least 1");
        }
        for (name, secs) in [
            ("feed", self.timeouts.feed_secs),
            ("api", self.timeouts.api_secs),
            ("scrape", self.timeouts.scrape_secs),
        ] {
            if secs == 0 {
                bail!("{name} timeout must be non-zero");
            }
        }
        if self.fresh_window_hours == 0 {
            bail!("fresh_window_hours must be non-zero");
        }
        if self.aging_window_hours <= self.fresh_window_hours {
            bail!(
                "aging_window_hours ({}) must exceed fresh_window_hours ({})",
                self.aging_window_hours,
                self.fresh_window_hours
            );
        }
        let v = &self.velocity;
        if v.source_coeff < 0.0 || v.member_coeff < 0.0 {
            bail!("velocity coefficients must be non-negative");
        }
        if !(v.floor <= v.rising_threshold && v.rising_threshold <= v.hot_threshold) {
            bail!("velocity tiers must satisfy floor <= rising_threshold <= hot_threshold");
        }
        if self.cache.ttl_secs == 0 || self.cache.cap_per_source == 0 {
            bail!("cache ttl and per-source cap must be non-zero");
        }
        Ok(())
    }

    pub fn fresh_window_secs(&self) -> u64 {
        self.fresh_window_hours * 3600
    }

    pub fn aging_window_secs(&self) -> u64 {
        self.aging_window_hours * 3600
    }
}
