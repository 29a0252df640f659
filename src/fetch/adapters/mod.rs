// src/fetch/adapters/mod.rs
pub mod html_scrape;
pub mod json_api;
pub mod rss;

use anyhow::{bail, Result};
use std::sync::Arc;

use crate::fetch::cache::ItemCache;
use crate::fetch::types::SourceAdapter;
use crate::sources::{SourceKind, SourceSpec};

/// Construct the concrete adapter for one catalog entry. All variants share
/// the [`SourceAdapter`] contract; callers never branch on the kind again.
pub fn build(
    spec: &SourceSpec,
    default_cap: usize,
    client: reqwest::Client,
    cache: Arc<ItemCache>,
) -> Result<Box<dyn SourceAdapter>> {
    let cap = spec.item_cap.unwrap_or(default_cap);
    let adapter: Box<dyn SourceAdapter> = match spec.kind {
        SourceKind::Feed => Box::new(rss::RssAdapter::new(&spec.name, &spec.url, cap, client)),
        SourceKind::Api => Box::new(json_api::JsonApiAdapter::new(
            &spec.name,
            &spec.url,
            spec.item_url.as_deref(),
            cap,
            client,
            cache,
        )),
        SourceKind::Scrape => {
            let Some(selector) = spec.selector.as_deref() else {
                bail!("scrape source '{}' has no selector", spec.name);
            };
            Box::new(html_scrape::HtmlScrapeAdapter::new(
                &spec.name, &spec.url, selector, cap, client,
            ))
        }
    };
    Ok(adapter)
}
