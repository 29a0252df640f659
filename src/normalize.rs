// src/normalize.rs
//! # Normalizer
//!
//! Turns raw candidates into the shape the dedup engine consumes: a cleaned
//! display title, a reduced match key, a language verdict, and an inferred
//! category. Deterministic (the same raw candidate always yields the same
//! normalized candidate), and `match_key` is idempotent.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::fetch::types::RawCandidate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    English,
    NonEnglish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    News,
    Tech,
    Science,
    Politics,
    Finance,
    Sports,
    Entertainment,
    General,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Category::News => "news",
            Category::Tech => "tech",
            Category::Science => "science",
            Category::Politics => "politics",
            Category::Finance => "finance",
            Category::Sports => "sports",
            Category::Entertainment => "entertainment",
            Category::General => "general",
        };
        f.write_str(s)
    }
}

/// A raw candidate plus everything normalization derived from it.
/// `accepted == false` candidates never reach the dedup engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedCandidate {
    pub raw: RawCandidate,
    /// Cleaned display title (markup stripped, whitespace collapsed).
    pub title: String,
    /// Lower-cased, punctuation-stripped, stop-word-reduced match key.
    pub normalized_title: String,
    pub language: Language,
    pub category: Category,
    pub accepted: bool,
}

/// Headline filler dropped from match keys. Includes the reporting verbs
/// that vary most between outlets covering the same story.
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "as", "is", "was", "are", "were", "be", "been", "have", "has", "had", "do", "does",
    "did", "will", "would", "could", "should", "may", "might", "must", "can", "this", "that",
    "these", "those", "it", "its", "they", "them", "their", "what", "which", "who", "when",
    "where", "why", "how", "all", "more", "most", "other", "some", "such", "no", "not", "only",
    "so", "than", "too", "very", "just", "about", "after", "before", "into", "over", "under",
    "up", "down", "out", "off", "then", "here", "there", "new", "says", "said", "say", "get",
    "gets", "got", "make", "makes", "made", "take", "takes", "see", "sees", "hit", "hits",
    "raise", "raises", "report", "reports", "breaking", "update", "latest", "news", "today",
    "amid", "against", "during",
];

fn stop_words() -> &'static HashSet<&'static str> {
    static SET: OnceCell<HashSet<&'static str>> = OnceCell::new();
    SET.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

/// Clean a raw title for display: decode entities, strip tags, fold smart
/// quotes, collapse whitespace, trim trailing sentence punctuation.
pub fn clean_title(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    while let Some(last) = out.chars().last() {
        if matches!(last, '!' | '?' | '.' | ',') {
            out.pop();
        } else {
            break;
        }
    }

    if out.chars().count() > 300 {
        out = out.chars().take(300).collect();
    }

    out
}

/// Produce the match key used for similarity: lower-case, strip punctuation,
/// expand numeric magnitude suffixes (`50m` → `50 million`, so `$50M` and
/// `$50 million` headlines agree), drop stop words.
///
/// Idempotent: `match_key(match_key(x)) == match_key(x)`.
pub fn match_key(title: &str) -> String {
    let lowered = title.to_lowercase().replace(['\'', '\u{2019}'], "");
    let spaced: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let mut tokens: Vec<String> = Vec::new();
    for tok in spaced.split_whitespace() {
        match expand_magnitude(tok) {
            Some((num, word)) => {
                tokens.push(num);
                tokens.push(word.to_string());
            }
            None => tokens.push(tok.to_string()),
        }
    }

    tokens.retain(|t| !stop_words().contains(t.as_str()));
    tokens.join(" ")
}

/// `"50m"` → `("50", "million")`; `None` when the token is not a magnitude
/// shorthand.
fn expand_magnitude(tok: &str) -> Option<(String, &'static str)> {
    let suffix_start = tok.find(|c: char| c.is_ascii_alphabetic())?;
    let (num, suffix) = tok.split_at(suffix_start);
    if num.is_empty() || !num.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let word = match suffix {
        "k" => "thousand",
        "m" => "million",
        "b" | "bn" => "billion",
        _ => return None,
    };
    Some((num.to_string(), word))
}

/// Heuristic English check: reject on non-Latin script characters, then
/// require at least 70% ASCII-or-Latin-1 content. Not NLP; just enough to
/// keep obviously non-English feeds out.
pub fn is_english(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }

    let mut total = 0usize;
    let mut latin = 0usize;
    for c in text.chars() {
        if is_non_latin_script(c) {
            return false;
        }
        total += 1;
        if (c as u32) < 128 || is_latin1_letter(c) {
            latin += 1;
        }
    }
    latin as f32 / total as f32 >= 0.7
}

fn is_non_latin_script(c: char) -> bool {
    matches!(c as u32,
        0x4E00..=0x9FFF      // CJK ideographs
        | 0x3040..=0x30FF    // Hiragana / Katakana
        | 0xAC00..=0xD7AF    // Hangul syllables
        | 0x1100..=0x11FF    // Hangul jamo
        | 0x0600..=0x06FF    // Arabic
        | 0x0400..=0x04FF    // Cyrillic
        | 0x0900..=0x097F    // Devanagari
        | 0x0E00..=0x0E7F    // Thai
        | 0x0590..=0x05FF    // Hebrew
    )
}

fn is_latin1_letter(c: char) -> bool {
    "àáâãäåæçèéêëìíîïðñòóôõöøùúûüýÿ".contains(c)
}

/// Fixed keyword-to-category table, checked in order.
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Sports,
        &[
            "nba", "nfl", "mlb", "nhl", "soccer", "football", "playoff", "championship",
            "season", "coach", "league", "tournament", "olympic",
        ],
    ),
    (
        Category::Finance,
        &[
            "stocks", "stock", "market", "markets", "inflation", "earnings", "ipo", "shares",
            "economy", "funding", "investors",
        ],
    ),
    (
        Category::Tech,
        &[
            "ai", "software", "startup", "app", "chip", "cloud", "compiler", "github", "linux",
            "developer", "cyber", "crypto", "robot",
        ],
    ),
    (
        Category::Science,
        &[
            "study", "researchers", "species", "climate", "nasa", "space", "telescope", "fossil",
            "vaccine", "physics", "genome",
        ],
    ),
    (
        Category::Politics,
        &[
            "election", "senate", "congress", "president", "parliament", "minister", "campaign",
            "ballot", "legislation",
        ],
    ),
    (
        Category::Entertainment,
        &[
            "film", "movie", "album", "celebrity", "trailer", "premiere", "boxoffice", "concert",
            "netflix",
        ],
    ),
];

fn category_from_text(text: &str) -> Option<Category> {
    let key = match_key(text);
    let tokens: HashSet<&str> = key.split_whitespace().collect();
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|k| tokens.contains(k)) {
            return Some(*category);
        }
    }
    None
}

/// Category resolution order: the source's own hint text, then title
/// keywords, then the catalog's per-source default, then General.
pub fn infer_category(
    candidate_hint: Option<&str>,
    title: &str,
    source_default: Option<Category>,
) -> Category {
    if let Some(hint) = candidate_hint {
        if let Some(c) = category_from_text(hint) {
            return c;
        }
    }
    if let Some(c) = category_from_text(title) {
        return c;
    }
    source_default.unwrap_or(Category::General)
}

/// Normalize one candidate. Never fails; rejected candidates come back with
/// `accepted == false` and are only counted, not propagated.
pub fn normalize_candidate(
    raw: &RawCandidate,
    source_default: Option<Category>,
) -> NormalizedCandidate {
    let title = clean_title(&raw.title);
    let normalized_title = match_key(&title);

    let language = if is_english(&title) {
        Language::English
    } else {
        Language::NonEnglish
    };
    // An all-stop-word title has nothing to match on; treat it like noise.
    let accepted = language == Language::English && !normalized_title.is_empty();

    let category = infer_category(raw.category_hint.as_deref(), &title, source_default);

    NormalizedCandidate {
        raw: raw.clone(),
        title,
        normalized_title,
        language,
        category,
        accepted,
    }
}
