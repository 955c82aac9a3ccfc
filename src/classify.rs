//! Chapter-URL classifier: decides whether `(url, anchor_text)` names a
//! chapter link. The single source of truth every strategy funnels
//! candidates through.

use once_cell::sync::Lazy;
use regex::Regex;

/// A candidate chapter link harvested from a page: its target URL and the
/// link's visible text. Classification is a pure function of the pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorCandidate {
    pub url: String,
    pub anchor_text: String,
}

static RE_TEXT_CHAPTER_NUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bchapter\s+\d+").unwrap());
static RE_URL_CHAPTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)chapter[/_\-\s]?\d+|ch[_\-\s]?\d+").unwrap());
static RE_TEXT_GENERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(chapter|chap)\s*\d+|ch\.?\s*\d+|第\s*\d+\s*章|episode\s*\d+|ep\s*\d+|vol\.?\s*\d+|volume\s*\d+")
        .unwrap()
});
static RE_URL_HTML_NUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"_\d+\.html|/\d+\.html").unwrap());
static RE_URL_BOOK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/book/[^/]+/(?:chapter[/\-]?)?\d+").unwrap());
static RE_ANY_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());
static RE_CH_NUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)ch\s*\d+").unwrap());
static RE_CJK_CHAPTER_NUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"第\s*\d+\s*章").unwrap());
static RE_EP_NUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)ep\s*\d+").unwrap());
static RE_PART_NUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)part\s*\d+").unwrap());
static RE_VOL_NUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)vol\s*\d+").unwrap());

const TEXT_CHAPTER_INDICATORS: &[&str] = &["chapter", "episode", "volume"];

/// Returns `true` on the first matching rule; `false` otherwise.
pub fn is_chapter_url(url: &str, anchor_text: &str) -> bool {
    let url_lower = url.to_lowercase();
    let text_lower = anchor_text.trim().to_lowercase();

    if RE_TEXT_CHAPTER_NUM.is_match(&text_lower) {
        return true;
    }
    if RE_URL_CHAPTER.is_match(&url_lower) {
        return true;
    }
    if RE_TEXT_GENERIC.is_match(&text_lower) {
        return true;
    }
    if RE_URL_HTML_NUM.is_match(&url_lower) {
        return true;
    }
    if RE_URL_BOOK.is_match(&url_lower) {
        return true;
    }
    if RE_ANY_DIGIT.is_match(&url_lower) {
        for indicator in TEXT_CHAPTER_INDICATORS {
            if text_lower.contains(indicator) {
                return true;
            }
        }
        // "ep"/"part"/"vol" require a trailing number: as bare substrings
        // they'd misfire on ordinary words like "Deep Read" or "Department".
        if RE_CH_NUM.is_match(&text_lower)
            || RE_CJK_CHAPTER_NUM.is_match(&text_lower)
            || RE_EP_NUM.is_match(&text_lower)
            || RE_PART_NUM.is_match(&text_lower)
            || RE_VOL_NUM.is_match(&text_lower)
        {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_text_chapter_number_wins_on_opaque_url() {
        assert!(is_chapter_url("https://example.com/slug-abc123", "Chapter 42"));
    }

    #[test]
    fn url_chapter_pattern() {
        assert!(is_chapter_url("https://example.com/chapter-12", ""));
        assert!(is_chapter_url("https://example.com/ch_12", ""));
    }

    #[test]
    fn text_generic_patterns() {
        assert!(is_chapter_url("https://example.com/x", "Chap 3"));
        assert!(is_chapter_url("https://example.com/x", "Episode 3"));
        assert!(is_chapter_url("https://example.com/x", "第 3 章"));
        assert!(is_chapter_url("https://example.com/x", "Volume 2"));
    }

    #[test]
    fn fanmtl_numeric_html() {
        assert!(is_chapter_url("https://fanmtl.com/novel/x_70.html", ""));
        assert!(is_chapter_url("https://fanmtl.com/70.html", ""));
    }

    #[test]
    fn book_path_pattern() {
        assert!(is_chapter_url("https://example.com/book/some-novel/123", ""));
        assert!(is_chapter_url(
            "https://example.com/book/some-novel/chapter-123",
            ""
        ));
    }

    #[test]
    fn digit_plus_text_indicator() {
        assert!(is_chapter_url("https://example.com/read/123", "Part 123"));
    }

    #[test]
    fn rejects_non_chapter_links() {
        assert!(!is_chapter_url("https://example.com/about", "About Us"));
        assert!(!is_chapter_url("https://example.com/contact", "Contact"));
    }

    #[test]
    fn digit_without_chapter_indicator_rejected() {
        assert!(!is_chapter_url("https://example.com/page/2", "Next"));
    }

    #[test]
    fn bare_substring_of_ep_part_vol_does_not_misfire() {
        assert!(!is_chapter_url("https://example.com/read/123", "Deep Read"));
        assert!(!is_chapter_url("https://example.com/read/123", "Department"));
        assert!(!is_chapter_url("https://example.com/read/123", "Involved"));
    }
}
