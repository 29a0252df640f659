// src/fetch/types.rs
use serde::{Deserialize, Serialize};

/// One item pulled from one source, before normalization.
///
/// Owned by the adapter that produced it until handed to the normalizer;
/// never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawCandidate {
    pub title: String,
    pub url: Option<String>,
    pub source: String,
    /// Unix seconds; 0 when the source gave no usable timestamp.
    pub published_at: u64,
    pub author: Option<String>,
    /// Free-text category hint from the source (e.g. an RSS `<category>`).
    pub category_hint: Option<String>,
}

/// Typed failure for a whole-source fetch.
///
/// Transient failures (timeouts, connect errors, 429/5xx) earn one retry;
/// permanent ones (bad payload, 4xx) do not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    Transient(String),
    Permanent(String),
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient(_))
    }

    pub fn detail(&self) -> &str {
        match self {
            FetchError::Transient(s) | FetchError::Permanent(s) => s,
        }
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Transient(s) => write!(f, "transient: {s}"),
            FetchError::Permanent(s) => write!(f, "permanent: {s}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Classify a reqwest failure for the retry policy.
pub fn classify_reqwest(err: &reqwest::Error) -> FetchError {
    if err.is_timeout() || err.is_connect() {
        return FetchError::Transient(err.to_string());
    }
    if let Some(status) = err.status() {
        if status.is_server_error() || status.as_u16() == 429 {
            return FetchError::Transient(err.to_string());
        }
    }
    FetchError::Permanent(err.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Ok,
    Timeout,
    Error,
    Empty,
}

/// Per-source record of how a fetch went. Diagnostics only; never exposed
/// past the gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchOutcome {
    pub source: String,
    pub status: FetchStatus,
    pub item_count: usize,
    /// Malformed items skipped inside an otherwise successful fetch.
    pub skipped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FetchOutcome {
    pub fn ok(source: &str, item_count: usize, skipped: usize) -> Self {
        let status = if item_count == 0 {
            FetchStatus::Empty
        } else {
            FetchStatus::Ok
        };
        Self {
            source: source.to_string(),
            status,
            item_count,
            skipped,
            error: None,
        }
    }

    pub fn failed(source: &str, status: FetchStatus, error: String) -> Self {
        Self {
            source: source.to_string(),
            status,
            item_count: 0,
            skipped: 0,
            error: Some(error),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, FetchStatus::Timeout | FetchStatus::Error)
    }
}

/// Successful whole-source fetch: the candidates that parsed, plus how many
/// malformed items were skipped along the way.
#[derive(Debug, Clone, Default)]
pub struct FetchBatch {
    pub candidates: Vec<RawCandidate>,
    pub skipped: usize,
}

impl FetchBatch {
    pub fn new(candidates: Vec<RawCandidate>, skipped: usize) -> Self {
        Self { candidates, skipped }
    }
}

/// The capability every concrete source variant implements. The coordinator
/// depends only on this contract and never distinguishes feed, API, and
/// scrape adapters.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self) -> Result<FetchBatch, FetchError>;
    fn name(&self) -> &str;
}
