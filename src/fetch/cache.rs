// src/fetch/cache.rs
//! Bounded per-source item cache shared across runs.
//!
//! Keyed by `source + item identity`; entries expire after a TTL and each
//! source is capped so one chatty API cannot evict everyone else. Each
//! source is fetched by exactly one adapter per run, so writes are
//! single-writer per key.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::config::CacheSettings;

#[derive(Debug)]
struct Entry {
    expires_at: u64,
    payload: String,
}

#[derive(Debug)]
pub struct ItemCache {
    inner: Mutex<HashMap<String, Entry>>,
    ttl: Duration,
    cap_per_source: usize,
}

impl ItemCache {
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            ttl: Duration::from_secs(settings.ttl_secs),
            cap_per_source: settings.cap_per_source,
        }
    }

    /// Look up a previously seen item payload. Expired entries read as absent.
    pub fn get(&self, source: &str, item_id: &str) -> Option<String> {
        let key = cache_key(source, item_id);
        let now = now_unix();
        let inner = self.inner.lock().expect("item cache mutex poisoned");
        inner
            .get(&key)
            .filter(|e| e.expires_at > now)
            .map(|e| e.payload.clone())
    }

    /// Record an item. Prunes expired entries and enforces the per-source
    /// cap by dropping the soonest-to-expire entries for that source.
    pub fn insert(&self, source: &str, item_id: &str, payload: &str) {
        let key = cache_key(source, item_id);
        let now = now_unix();
        let prefix = key_prefix(source);

        let mut inner = self.inner.lock().expect("item cache mutex poisoned");
        inner.retain(|_, e| e.expires_at > now);

        let mut in_source: Vec<(String, u64)> = inner
            .iter()
            .filter(|(k, _)| k.starts_with(&prefix))
            .map(|(k, e)| (k.clone(), e.expires_at))
            .collect();
        if in_source.len() >= self.cap_per_source {
            in_source.sort_by_key(|(_, exp)| *exp);
            for (k, _) in in_source
                .iter()
                .take(in_source.len() + 1 - self.cap_per_source)
            {
                inner.remove(k);
            }
        }

        inner.insert(
            key,
            Entry {
                expires_at: now + self.ttl.as_secs(),
                payload: payload.to_string(),
            },
        );
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}

fn key_prefix(source: &str) -> String {
    format!("{}:", source.to_ascii_lowercase())
}

/// `source:sha256(id)[..12]`. Ids can be long URLs; a short digest keeps
/// keys uniform without storing them.
fn cache_key(source: &str, item_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(item_id.as_bytes());
    let digest = hasher.finalize();
    let mut short = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut short, "{:02x}", b);
    }
    format!("{}{}", key_prefix(source), short)
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs()
}
