// src/sources.rs
//! # Source Catalog
//!
//! Static descriptors for every upstream source: what kind of endpoint it
//! is, where to fetch it, how many items to take, and how much we trust it.
//!
//! - Loads from TOML config (`[[sources]]` entries) or falls back to the
//!   built-in catalog seeded from the production source set.
//! - Reliability weights live in `[0.0, 1.0]` and act as tie-breaks when a
//!   cluster elects its representative, never as hard filters.

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::normalize::Category;

pub const ENV_SOURCES_PATH: &str = "TREND_SOURCES_PATH";
const DEFAULT_SOURCES_PATH: &str = "config/sources.toml";

/// Weight assigned to sources missing from the catalog.
pub const DEFAULT_RELIABILITY: f32 = 0.6;

/// How a source is fetched and parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// RSS 2.0 or Atom feed.
    Feed,
    /// JSON REST endpoint (id list + per-item detail, or an inline array).
    Api,
    /// HTML page scraped with a CSS selector.
    Scrape,
}

/// Immutable descriptor for one upstream source, loaded once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSpec {
    pub name: String,
    pub kind: SourceKind,
    pub url: String,
    /// Per-source item cap; the config default applies when absent.
    #[serde(default)]
    pub item_cap: Option<usize>,
    /// Reliability weight in [0, 1], used as a representative tie-break.
    #[serde(default = "default_reliability")]
    pub weight: f32,
    /// Category every item from this source starts in.
    #[serde(default)]
    pub category: Option<Category>,
    /// CSS selector for `Scrape` sources.
    #[serde(default)]
    pub selector: Option<String>,
    /// Detail URL template for `Api` sources; `{id}` is substituted.
    #[serde(default)]
    pub item_url: Option<String>,
}

fn default_reliability() -> f32 {
    DEFAULT_RELIABILITY
}

impl SourceSpec {
    fn feed(name: &str, url: &str, weight: f32, category: Category) -> Self {
        Self {
            name: name.to_string(),
            kind: SourceKind::Feed,
            url: url.to_string(),
            item_cap: None,
            weight,
            category: Some(category),
            selector: None,
            item_url: None,
        }
    }
}

/// Built-in catalog mirroring the production source set: national news,
/// tech press, science, sports, community aggregators, code hosting, and
/// the reference wiki.
pub fn default_catalog() -> Vec<SourceSpec> {
    let mut out = vec![
        SourceSpec::feed("npr", "https://feeds.npr.org/1001/rss.xml", 0.9, Category::News),
        SourceSpec::feed(
            "nyt",
            "https://rss.nytimes.com/services/xml/rss/nyt/HomePage.xml",
            0.9,
            Category::News,
        ),
        SourceSpec::feed("bbc", "https://feeds.bbci.co.uk/news/rss.xml", 0.9, Category::News),
        SourceSpec::feed(
            "guardian",
            "https://www.theguardian.com/world/rss",
            0.85,
            Category::News,
        ),
        SourceSpec::feed(
            "verge",
            "https://www.theverge.com/rss/index.xml",
            0.75,
            Category::Tech,
        ),
        SourceSpec::feed(
            "ars_technica",
            "https://feeds.arstechnica.com/arstechnica/index",
            0.8,
            Category::Tech,
        ),
        SourceSpec::feed("techcrunch", "https://techcrunch.com/feed/", 0.75, Category::Tech),
        SourceSpec::feed("wired", "https://www.wired.com/feed/rss", 0.75, Category::Tech),
        SourceSpec::feed(
            "science_daily",
            "https://www.sciencedaily.com/rss/all.xml",
            0.75,
            Category::Science,
        ),
        SourceSpec::feed("espn", "https://www.espn.com/espn/rss/news", 0.75, Category::Sports),
        SourceSpec::feed("lobsters", "https://lobste.rs/rss", 0.75, Category::Tech),
        SourceSpec::feed(
            "product_hunt",
            "https://www.producthunt.com/feed",
            0.6,
            Category::Tech,
        ),
        SourceSpec::feed(
            "slashdot",
            "https://rss.slashdot.org/Slashdot/slashdotMain",
            0.6,
            Category::Tech,
        ),
    ];

    out.push(SourceSpec {
        name: "hackernews".into(),
        kind: SourceKind::Api,
        url: "https://hacker-news.firebaseio.com/v0/topstories.json".into(),
        item_cap: None,
        weight: 0.8,
        category: Some(Category::Tech),
        selector: None,
        item_url: Some("https://hacker-news.firebaseio.com/v0/item/{id}.json".into()),
    });
    out.push(SourceSpec {
        name: "devto".into(),
        kind: SourceKind::Api,
        url: "https://dev.to/api/articles?top=1&per_page=10".into(),
        item_cap: None,
        weight: 0.6,
        category: Some(Category::Tech),
        selector: None,
        item_url: None,
    });
    out.push(SourceSpec {
        name: "github_trending".into(),
        kind: SourceKind::Scrape,
        url: "https://github.com/trending?since=daily&spoken_language_code=en".into(),
        item_cap: None,
        weight: 0.6,
        category: Some(Category::Tech),
        selector: Some("article.Box-row h2 a".into()),
        item_url: None,
    });
    out.push(SourceSpec {
        name: "wikipedia_current".into(),
        kind: SourceKind::Scrape,
        url: "https://en.wikipedia.org/wiki/Portal:Current_events".into(),
        item_cap: None,
        weight: 0.9,
        category: Some(Category::News),
        selector: Some("div.current-events-content li > a".into()),
        item_url: None,
    });

    out
}

/// Load catalog using env var + fallbacks:
/// 1) $TREND_SOURCES_PATH
/// 2) config/sources.toml
/// 3) built-in catalog
pub fn load_catalog_default() -> Result<Vec<SourceSpec>> {
    if let Ok(p) = std::env::var(ENV_SOURCES_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!("{ENV_SOURCES_PATH} points to non-existent path"));
        }
        return load_catalog_from(&pb);
    }
    let default_p = PathBuf::from(DEFAULT_SOURCES_PATH);
    if default_p.exists() {
        return load_catalog_from(&default_p);
    }
    Ok(default_catalog())
}

pub fn load_catalog_from(path: &Path) -> Result<Vec<SourceSpec>> {
    #[derive(Deserialize)]
    struct CatalogFile {
        sources: Vec<SourceSpec>,
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading source catalog from {}", path.display()))?;
    let file: CatalogFile = toml::from_str(&content)
        .with_context(|| format!("parsing source catalog {}", path.display()))?;
    validate_catalog(&file.sources)?;
    Ok(file.sources)
}

fn validate_catalog(specs: &[SourceSpec]) -> Result<()> {
    if specs.is_empty() {
        bail!("source catalog must not be empty");
    }
    for s in specs {
        if s.name.trim().is_empty() {
            bail!("source with empty name in catalog");
        }
        if !(0.0..=1.0).contains(&s.weight) {
            bail!("source '{}' has weight {} outside [0, 1]", s.name, s.weight);
        }
        if s.kind == SourceKind::Scrape && s.selector.is_none() {
            bail!("scrape source '{}' is missing a selector", s.name);
        }
    }
    Ok(())
}

/// Reliability lookup resolved once from the catalog.
///
/// Lookup is case-insensitive on the source name; unknown sources get
/// [`DEFAULT_RELIABILITY`] so a misconfigured adapter never breaks ranking.
#[derive(Debug, Clone)]
pub struct SourceWeights {
    weights: HashMap<String, f32>,
}

impl SourceWeights {
    pub fn from_catalog(specs: &[SourceSpec]) -> Self {
        let weights = specs
            .iter()
            .map(|s| (s.name.to_ascii_lowercase(), s.weight))
            .collect();
        Self { weights }
    }

    pub fn weight_for(&self, source: &str) -> f32 {
        self.weights
            .get(&source.to_ascii_lowercase())
            .copied()
            .unwrap_or(DEFAULT_RELIABILITY)
    }
}
