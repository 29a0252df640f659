// src/fetch/adapters/html_scrape.rs
//! HTML trend-page adapter: selects anchors with the catalog's CSS selector
//! and turns link text into candidates (GitHub trending, the Wikipedia
//! current-events portal).

use async_trait::async_trait;
use metrics::counter;
use scraper::{Html, Selector};
use url::Url;

use crate::fetch::types::{
    classify_reqwest, FetchBatch, FetchError, RawCandidate, SourceAdapter,
};

pub struct HtmlScrapeAdapter {
    name: String,
    url: String,
    selector: String,
    cap: usize,
    client: reqwest::Client,
}

impl HtmlScrapeAdapter {
    pub fn new(name: &str, url: &str, selector: &str, cap: usize, client: reqwest::Client) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            selector: selector.to_string(),
            cap,
            client,
        }
    }
}

/// Extract candidates from a page. Anchors without visible text (or without
/// an href to resolve) count as skipped, not as failures.
pub(crate) fn parse_page(
    source: &str,
    base_url: &str,
    selector: &str,
    body: &str,
    cap: usize,
) -> Result<FetchBatch, FetchError> {
    let sel = Selector::parse(selector)
        .map_err(|e| FetchError::Permanent(format!("{source}: bad selector {selector:?}: {e}")))?;
    let base = Url::parse(base_url)
        .map_err(|e| FetchError::Permanent(format!("{source}: bad base url: {e}")))?;

    let document = Html::parse_document(body);
    let mut out = Vec::new();
    let mut skipped = 0usize;

    for element in document.select(&sel) {
        if out.len() >= cap {
            break;
        }
        let text = element.text().collect::<String>();
        let title = squash_whitespace(&text);
        if title.is_empty() {
            skipped += 1;
            continue;
        }
        let url = element
            .value()
            .attr("href")
            .and_then(|href| base.join(href).ok())
            .map(|u| u.to_string());

        out.push(RawCandidate {
            title,
            url,
            source: source.to_string(),
            // Trend pages carry no per-item timestamps; being listed today
            // is the recency signal.
            published_at: 0,
            author: None,
            category_hint: None,
        });
    }

    counter!("collect_candidates_total").increment(out.len() as u64);
    Ok(FetchBatch::new(out, skipped))
}

fn squash_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl SourceAdapter for HtmlScrapeAdapter {
    async fn fetch(&self) -> Result<FetchBatch, FetchError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| classify_reqwest(&e))?;
        let resp = resp.error_for_status().map_err(|e| classify_reqwest(&e))?;
        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::Transient(format!("{}: reading body: {e}", self.name)))?;
        // `Html` is not Send; parse in a sync helper after the awaits.
        parse_page(&self.name, &self.url, &self.selector, &body, self.cap)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRENDING_FIXTURE: &str = r#"<html><body>
      <article class="Box-row"><h2><a href="/rust-lang/rust">rust-lang / rust</a></h2></article>
      <article class="Box-row"><h2><a href="/tokio-rs/tokio">
        tokio-rs /
        tokio
      </a></h2></article>
      <article class="Box-row"><h2><a href="/ghost/empty">   </a></h2></article>
    </body></html>"#;

    #[test]
    fn anchors_become_candidates_with_resolved_urls() {
        let batch = parse_page(
            "github_trending",
            "https://github.com/trending",
            "article.Box-row h2 a",
            TRENDING_FIXTURE,
            10,
        )
        .unwrap();
        assert_eq!(batch.candidates.len(), 2);
        assert_eq!(batch.skipped, 1);
        assert_eq!(batch.candidates[0].title, "rust-lang / rust");
        assert_eq!(
            batch.candidates[0].url.as_deref(),
            Some("https://github.com/rust-lang/rust")
        );
        // multi-line anchor text collapses to one line
        assert_eq!(batch.candidates[1].title, "tokio-rs / tokio");
    }

    #[test]
    fn cap_is_respected() {
        let batch = parse_page(
            "github_trending",
            "https://github.com/trending",
            "article.Box-row h2 a",
            TRENDING_FIXTURE,
            1,
        )
        .unwrap();
        assert_eq!(batch.candidates.len(), 1);
    }

    #[test]
    fn invalid_selector_is_permanent() {
        let err = parse_page("x", "https://example.test", "[[[", "<html></html>", 5).unwrap_err();
        assert!(!err.is_transient());
    }
}
