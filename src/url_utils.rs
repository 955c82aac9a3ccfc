//! Absolute-URL resolution, same-host checks, and chapter-number extraction.
//!
//! Pattern order and the `[1, 10000]`/`/novel/\d+$` guards on the bare
//! `\d+.html` fallback are load-bearing, not incidental — reordering them
//! changes which number a URL like `/novel/42/chapter-7.html` resolves to.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// A fully qualified chapter URL, same-host to the configured base, carrying
/// its derived chapter number when one could be parsed.
///
/// Ordering is by `chapter_number` ascending; URLs lacking a parsable number
/// sort to the end, in original input order (a stable sort achieves this:
/// `None` compares greater than `Some`, and `Ord` on `(Option<u32>, usize)`
/// keeps ties in insertion order via the index).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ChapterUrl {
    pub url: String,
    pub chapter_number: Option<u32>,
}

impl ChapterUrl {
    pub fn new(url: String) -> Self {
        let chapter_number = extract_chapter_number(&url);
        Self { url, chapter_number }
    }
}

/// Sort a set of chapter URLs by `chapter_number` ascending, with unparsable
/// numbers trailing in their original relative order.
pub fn sort_by_chapter_number(urls: &mut [ChapterUrl]) {
    urls.sort_by_key(|u| (u.chapter_number.is_none(), u.chapter_number));
}

/// Resolve `url` (possibly relative) against `base` with standard URL
/// joining: scheme inheritance, `..` collapsing, query/fragment handling.
pub fn absolutize(url: &str, base: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    let joined = base.join(url).ok()?;
    Some(joined.to_string())
}

/// True iff `url`'s host matches `base`'s host exactly after lower-casing.
/// A malformed `url` is treated as same-host: this function is a filtering
/// convenience, not the security boundary (the classifier is).
pub fn same_host(url: &str, base_host: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(h) => h.eq_ignore_ascii_case(base_host),
            None => true,
        },
        Err(_) => true,
    }
}

static RE_STANDARD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)chapter[-_]?(\d+)").unwrap());
static RE_CH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)ch[-_]?(\d+)").unwrap());
static RE_WEIRD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)chapter[-_]?(\d+)[-_]?\d*").unwrap());
static RE_FANMTL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)/novel/[^/]+_(\d+)\.html").unwrap());
static RE_FANMTL_SLASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/novel/\d+/(?:chapter[-_]?)?(\d+)\.html").unwrap());
static RE_NUMERIC_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(\d+)\.html").unwrap());
static RE_NOVEL_ID_TAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)/novel/\d+$").unwrap());

static RE_RAW_WEIRD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)chapter[-_]?(\d+(?:[-_]\d+)*)").unwrap());

/// Applies the pattern list in order, returning the first match's integer
/// value. Preserves the FanMTL-shaped fallbacks alongside the standard ones.
pub fn extract_chapter_number(url: &str) -> Option<u32> {
    if let Some(c) = RE_STANDARD.captures(url) {
        return c.get(1)?.as_str().parse().ok();
    }
    if let Some(c) = RE_CH.captures(url) {
        return c.get(1)?.as_str().parse().ok();
    }
    if let Some(c) = RE_WEIRD.captures(url) {
        return c.get(1)?.as_str().parse().ok();
    }
    if let Some(c) = RE_FANMTL.captures(url) {
        return c.get(1)?.as_str().parse().ok();
    }
    if let Some(c) = RE_FANMTL_SLASH.captures(url) {
        return c.get(1)?.as_str().parse().ok();
    }
    if let Some(c) = RE_NUMERIC_PATH.captures(url)
        && let Ok(num) = c.get(1).unwrap().as_str().parse::<u32>()
        && (1..=10000).contains(&num)
        && !RE_NOVEL_ID_TAIL.is_match(url)
    {
        return Some(num);
    }
    None
}

/// Returns the full matched group, preserving composite forms like `"1-3"`.
pub fn extract_raw_chapter_number(url: &str) -> Option<String> {
    if let Some(c) = RE_RAW_WEIRD.captures(url) {
        return Some(c.get(1)?.as_str().to_string());
    }
    if let Some(c) = RE_STANDARD.captures(url) {
        return Some(c.get(1)?.as_str().to_string());
    }
    None
}

/// Classification of a sample of chapter URLs' raw number tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum NumberingPattern {
    Standard,
    Weird,
    Mixed,
}

/// Samples the first 20 URLs; diagnostic metadata only, never fed back into
/// extraction.
pub fn analyze_numbering(sample_urls: &[String]) -> NumberingPattern {
    let raw: Vec<String> = sample_urls
        .iter()
        .take(20)
        .filter_map(|u| extract_raw_chapter_number(u))
        .collect();

    if raw.is_empty() {
        return NumberingPattern::Standard;
    }

    let weird_count = raw.iter().filter(|t| t.contains('-') || t.contains('_')).count();
    if weird_count == 0 {
        NumberingPattern::Standard
    } else if weird_count == raw.len() {
        NumberingPattern::Weird
    } else {
        NumberingPattern::Mixed
    }
}
