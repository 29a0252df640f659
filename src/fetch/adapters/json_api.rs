// src/fetch/adapters/json_api.rs
//! JSON REST adapter.
//!
//! Handles two payload shapes the catalog actually uses:
//! - an id list plus a per-item detail endpoint (Hacker News top stories),
//!   with the shared item cache short-circuiting detail fetches for ids we
//!   have seen in a recent run;
//! - an inline array of item objects (dev.to articles).

use async_trait::async_trait;
use metrics::counter;
use serde_json::Value;
use std::sync::Arc;

use crate::fetch::cache::ItemCache;
use crate::fetch::types::{
    classify_reqwest, FetchBatch, FetchError, RawCandidate, SourceAdapter,
};

pub struct JsonApiAdapter {
    name: String,
    url: String,
    /// Detail endpoint template with `{id}` placeholder; absent for inline
    /// array APIs.
    item_url: Option<String>,
    cap: usize,
    client: reqwest::Client,
    cache: Arc<ItemCache>,
}

impl JsonApiAdapter {
    pub fn new(
        name: &str,
        url: &str,
        item_url: Option<&str>,
        cap: usize,
        client: reqwest::Client,
        cache: Arc<ItemCache>,
    ) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            item_url: item_url.map(str::to_string),
            cap,
            client,
            cache,
        }
    }

    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_reqwest(&e))?;
        let resp = resp.error_for_status().map_err(|e| classify_reqwest(&e))?;
        resp.json::<Value>()
            .await
            .map_err(|e| FetchError::Permanent(format!("{}: decoding json: {e}", self.name)))
    }

    /// Id-list mode: resolve each id through the cache, fetching details
    /// only for ids we have not seen recently.
    async fn fetch_by_ids(&self, ids: &[Value], template: &str) -> FetchBatch {
        let mut out = Vec::new();
        let mut skipped = 0usize;

        for id_val in ids.iter().take(self.cap) {
            let id = match id_val.as_u64() {
                Some(n) => n.to_string(),
                None => {
                    skipped += 1;
                    continue;
                }
            };

            if let Some(cached) = self.cache.get(&self.name, &id) {
                if let Ok(c) = serde_json::from_str::<RawCandidate>(&cached) {
                    counter!("collect_cache_hits_total").increment(1);
                    out.push(c);
                    continue;
                }
            }

            let detail_url = template.replace("{id}", &id);
            let item = match self.get_json(&detail_url).await {
                Ok(v) => v,
                Err(e) => {
                    // One dead story must not sink the source.
                    tracing::debug!(source = %self.name, %id, error = %e, "item fetch failed");
                    skipped += 1;
                    continue;
                }
            };

            match candidate_from_object(&self.name, &item) {
                Some(c) => {
                    if let Ok(json) = serde_json::to_string(&c) {
                        self.cache.insert(&self.name, &id, &json);
                    }
                    out.push(c);
                }
                None => skipped += 1,
            }
        }

        FetchBatch::new(out, skipped)
    }

    fn collect_inline(&self, items: &[Value]) -> FetchBatch {
        let mut out = Vec::new();
        let mut skipped = 0usize;
        for v in items.iter().take(self.cap) {
            match candidate_from_object(&self.name, v) {
                Some(c) => out.push(c),
                None => skipped += 1,
            }
        }
        FetchBatch::new(out, skipped)
    }
}

/// Map one JSON item object to a candidate; `None` means malformed
/// (missing title) and is counted by the caller.
fn candidate_from_object(source: &str, v: &Value) -> Option<RawCandidate> {
    let title = v.get("title")?.as_str()?.trim();
    if title.is_empty() {
        return None;
    }

    let url = v
        .get("url")
        .or_else(|| v.get("link"))
        .and_then(Value::as_str)
        .map(str::to_string);

    // HN carries unix seconds in `time`; dev.to carries ISO strings.
    let published_at = v
        .get("time")
        .and_then(Value::as_u64)
        .or_else(|| {
            v.get("published_timestamp")
                .or_else(|| v.get("published_at"))
                .or_else(|| v.get("created_at"))
                .and_then(Value::as_str)
                .map(super::rss::parse_timestamp)
        })
        .unwrap_or(0);

    let author = v
        .get("by")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            v.get("user")
                .and_then(|u| u.get("name"))
                .and_then(Value::as_str)
                .map(str::to_string)
        });

    let category_hint = v
        .get("tag_list")
        .and_then(Value::as_array)
        .and_then(|tags| tags.first())
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(RawCandidate {
        title: title.to_string(),
        url,
        source: source.to_string(),
        published_at,
        author,
        category_hint,
    })
}

#[async_trait]
impl SourceAdapter for JsonApiAdapter {
    async fn fetch(&self) -> Result<FetchBatch, FetchError> {
        let root = self.get_json(&self.url).await?;
        let items = root.as_array().ok_or_else(|| {
            FetchError::Permanent(format!("{}: expected a json array", self.name))
        })?;

        let batch = match &self.item_url {
            Some(template) if items.iter().all(|v| v.is_u64()) => {
                self.fetch_by_ids(items, template).await
            }
            _ => self.collect_inline(items),
        };

        counter!("collect_candidates_total").increment(batch.candidates.len() as u64);
        Ok(batch)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
