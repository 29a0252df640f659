// src/fetch/adapters/rss.rs
//! Feed adapter: RSS 2.0 `<channel><item>` with an Atom `<feed><entry>`
//! fallback, since the catalog mixes both (The Verge ships Atom).

use async_trait::async_trait;
use chrono::DateTime;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::fetch::types::{
    classify_reqwest, FetchBatch, FetchError, RawCandidate, SourceAdapter,
};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    /// Items routinely carry several `<category>` tags; keep them all and
    /// use the first as the hint.
    #[serde(default)]
    category: Vec<String>,
    author: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<String>,
    #[serde(rename = "link", default)]
    link: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
    author: Option<AtomAuthor>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    name: Option<String>,
}

/// Feeds ship RFC 2822 `pubDate`s (often with the obsolete `GMT` zone);
/// Atom and the JSON APIs ship RFC 3339. Unparseable values map to 0.
pub(crate) fn parse_timestamp(ts: &str) -> u64 {
    DateTime::parse_from_rfc2822(ts)
        .or_else(|_| DateTime::parse_from_rfc3339(ts))
        .ok()
        .and_then(|dt| u64::try_from(dt.timestamp()).ok())
        .unwrap_or(0)
}

pub struct RssAdapter {
    name: String,
    url: String,
    cap: usize,
    client: reqwest::Client,
}

impl RssAdapter {
    pub fn new(name: &str, url: &str, cap: usize, client: reqwest::Client) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            cap,
            client,
        }
    }
}

/// Parse a feed body into candidates, skipping (and counting) items that
/// lack a usable title. Malformed items are never fatal to the source.
pub(crate) fn parse_feed(source: &str, body: &str, cap: usize) -> Result<FetchBatch, FetchError> {
    let t0 = std::time::Instant::now();
    let xml_clean = scrub_html_entities_for_xml(body);

    // Sniff the payload before handing it to the XML parser; several feeds
    // answer error pages with status 200.
    let head: String = xml_clean
        .chars()
        .take(512)
        .collect::<String>()
        .to_ascii_lowercase();
    let looks_atom = head.contains("<feed");
    if !looks_atom && !head.contains("<rss") {
        return Err(FetchError::Permanent(format!(
            "{source}: body is neither RSS nor Atom"
        )));
    }

    let mut out = Vec::new();
    let mut skipped = 0usize;

    if !looks_atom {
        let rss: Rss = from_str(&xml_clean)
            .map_err(|e| FetchError::Permanent(format!("{source}: parsing rss xml: {e}")))?;
        for it in rss.channel.item.into_iter().take(cap) {
            match it.title.as_deref().map(str::trim) {
                Some(title) if !title.is_empty() => out.push(RawCandidate {
                    title: title.to_string(),
                    url: it.link,
                    source: source.to_string(),
                    published_at: it.pub_date.as_deref().map(parse_timestamp).unwrap_or(0),
                    author: it.author,
                    category_hint: it.category.into_iter().next(),
                }),
                _ => skipped += 1,
            }
        }
    } else {
        let feed: AtomFeed = from_str(&xml_clean)
            .map_err(|e| FetchError::Permanent(format!("{source}: parsing atom xml: {e}")))?;
        for en in feed.entry.into_iter().take(cap) {
            match en.title.as_deref().map(str::trim) {
                Some(title) if !title.is_empty() => {
                    let link = en.link.into_iter().find_map(|l| l.href);
                    let ts = en
                        .published
                        .as_deref()
                        .or(en.updated.as_deref())
                        .map(parse_timestamp)
                        .unwrap_or(0);
                    out.push(RawCandidate {
                        title: title.to_string(),
                        url: link,
                        source: source.to_string(),
                        published_at: ts,
                        author: en.author.and_then(|a| a.name),
                        category_hint: None,
                    });
                }
                _ => skipped += 1,
            }
        }
    }

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("collect_parse_ms").record(ms);
    counter!("collect_candidates_total").increment(out.len() as u64);
    Ok(FetchBatch::new(out, skipped))
}

#[async_trait]
impl SourceAdapter for RssAdapter {
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
        parse_feed(&self.name, &body, self.cap)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
