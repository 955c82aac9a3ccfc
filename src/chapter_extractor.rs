//! Chapter extractor: fetch a chapter page, select its title and prose
//! container, harvest paragraphs, and hand the joined text to the cleaner.
//! Falls back to the browser driver on a 403 that isn't a removal notice, or
//! on any transport failure. The HTTP and browser paths share one
//! `finish()` function for title/content selection and cleaning, rather
//! than maintaining two parallel extraction implementations.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::adaptive_profile::AdaptiveProfile;
use crate::browser_setup::{apply_stealth_measures, launch_browser};
use crate::config::Config;
use crate::error::ChapterError;
use crate::host_session::HostSession;
use crate::strategies::browser_automation::{RE_INTERSTITIAL_BODY, navigate, rendered_html, wait_out_interstitial};
use crate::url_utils::extract_chapter_number;

const TITLE_SELECTORS: &[&str] = &[
    "h1.chapter-title",
    ".chapter-title",
    "h1.title",
    ".entry-title h1",
    "h1",
    "h2.chapter-title",
    "h2",
];

const CONTENT_SELECTORS: &[&str] = &[
    "#chapter-content",
    ".chapter-content",
    "#chr-content",
    ".chapter-c",
    ".cha-words",
    "#content",
    ".reading-content",
    ".text-chapter",
    ".content-text",
];

static RE_REMOVAL_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)not found|removed|deleted|does not exist").unwrap());
static RE_TITLE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*chapter\s+\d+\s*[:.\-]?\s*").unwrap());
static RE_TITLE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s*[-|].{0,40}novel.{0,40}$").unwrap());

static RE_NAV_LINE: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)^\s*(previous|next)\s+(chapter|page)").unwrap(),
        Regex::new(r"(?i)^\s*chapter\s+\d+\s*$").unwrap(),
        Regex::new(r"(?i)^\s*table of contents").unwrap(),
        Regex::new(r"(?i)^\s*advertisement").unwrap(),
    ]
});
const SHORT_LINE_REJECT_TOKENS: &[&str] =
    &["previous", "next", "table of contents", "advertisement", "comment"];

#[derive(Debug, Clone)]
pub struct ChapterExtraction {
    pub title: String,
    pub cleaned_text: String,
}

/// Operation `extract_chapter(url, should_stop) → ChapterExtraction`.
pub async fn extract_chapter(
    url: &str,
    should_stop: &(dyn Fn() -> bool + Send + Sync),
    config: &Config,
    session: &HostSession,
    profile: &dyn AdaptiveProfile,
) -> Result<ChapterExtraction, ChapterError> {
    if should_stop() {
        return Err(ChapterError::Cancelled);
    }

    match fetch_via_http(url, should_stop, config, session).await {
        HttpOutcome::Success(html) => finish(&html, url, profile),
        HttpOutcome::NotFound => Err(ChapterError::ChapterNotFound),
        HttpOutcome::Removed => Err(ChapterError::Removed),
        HttpOutcome::NeedsBrowser => extract_via_browser(url, should_stop, config, profile).await,
    }
}

enum HttpOutcome {
    Success(String),
    NotFound,
    Removed,
    NeedsBrowser,
}

async fn fetch_via_http(
    url: &str,
    should_stop: &(dyn Fn() -> bool + Send + Sync),
    config: &Config,
    session: &HostSession,
) -> HttpOutcome {
    for attempt in 0..config.request_max_retries {
        if should_stop() {
            return HttpOutcome::NeedsBrowser;
        }
        let resp = match session.request(url).await {
            Ok(r) => r,
            Err(e) => {
                debug!(%e, "chapter_extractor: transport failure");
                return HttpOutcome::NeedsBrowser;
            }
        };

        match resp.status().as_u16() {
            200 => {
                return match resp.text().await {
                    Ok(body) => HttpOutcome::Success(body),
                    Err(_) => HttpOutcome::NeedsBrowser,
                };
            }
            404 => return HttpOutcome::NotFound,
            403 => {
                let body = resp.text().await.unwrap_or_default();
                if RE_REMOVAL_TOKEN.is_match(&body) {
                    return HttpOutcome::Removed;
                }
                if attempt + 1 >= config.request_max_retries {
                    return HttpOutcome::NeedsBrowser;
                }
                let backoff = 2u64.pow(attempt + 1);
                sleep(Duration::from_secs(backoff)).await;
            }
            _ => return HttpOutcome::NeedsBrowser,
        }
    }
    HttpOutcome::NeedsBrowser
}

async fn extract_via_browser(
    url: &str,
    should_stop: &(dyn Fn() -> bool + Send + Sync),
    config: &Config,
    profile: &dyn AdaptiveProfile,
) -> Result<ChapterExtraction, ChapterError> {
    if should_stop() {
        return Err(ChapterError::Cancelled);
    }

    let (browser, handler, user_data_dir) = launch_browser(config.browser_headless, None)
        .await
        .map_err(|e| ChapterError::TransportFailure(e.to_string()))?;

    let outcome = async {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ChapterError::TransportFailure(e.to_string()))?;
        let _ = apply_stealth_measures(&page).await;
        navigate(&page, url, config)
            .await
            .map_err(|e| ChapterError::TransportFailure(e.to_string()))?;
        sleep(Duration::from_secs(2)).await;
        wait_out_interstitial(&page, should_stop).await;
        if should_stop() {
            return Err(ChapterError::Cancelled);
        }
        let html = rendered_html(&page).await;

        let extraction = finish(&html, url, profile)?;
        if RE_INTERSTITIAL_BODY.is_match(&html) && extraction.cleaned_text.len() < 200 {
            return Err(ChapterError::AntiBotNotBypassed);
        }
        Ok(extraction)
    }
    .await;

    handler.abort();
    if let Err(e) = std::fs::remove_dir_all(&user_data_dir) {
        debug!(%e, "chapter_extractor: failed to clean up browser profile dir");
    }

    outcome
}

fn finish(
    html: &str,
    url: &str,
    profile: &dyn AdaptiveProfile,
) -> Result<ChapterExtraction, ChapterError> {
    let document = Html::parse_document(html);
    let title = select_title(&document, url);
    let host = url::Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string));
    let learned_selectors = host.map(|h| profile.learned_selectors(&h)).unwrap_or_default();
    let raw_text = select_content(&document, &learned_selectors);

    let cleaned = crate::text_cleaner::clean(&raw_text);
    if cleaned.is_empty() {
        return Err(ChapterError::NoContent);
    }
    Ok(ChapterExtraction {
        title,
        cleaned_text: cleaned,
    })
}

fn select_title(document: &Html, url: &str) -> String {
    for sel in TITLE_SELECTORS {
        let Ok(selector) = Selector::parse(sel) else { continue };
        if let Some(el) = document.select(&selector).next() {
            let raw = el.text().collect::<String>();
            let trimmed = raw.trim();
            let prefix_stripped = RE_TITLE_PREFIX.replace(trimmed, "");
            let stripped = RE_TITLE_SUFFIX.replace(&prefix_stripped, "");
            let stripped = stripped.trim();
            if stripped.chars().count() > 3 && stripped.chars().count() < 200 {
                return stripped.to_string();
            }
        }
    }
    match extract_chapter_number(url) {
        Some(n) => format!("Chapter {n}"),
        None => "Chapter 1".to_string(),
    }
}

fn select_content(document: &Html, learned_selectors: &[String]) -> String {
    let mut selectors: Vec<String> = learned_selectors.to_vec();
    selectors.extend(CONTENT_SELECTORS.iter().map(|s| s.to_string()));

    let mut container = None;
    for sel in &selectors {
        let Ok(selector) = Selector::parse(sel) else { continue };
        if let Some(el) = document.select(&selector).next() {
            container = Some(el);
            break;
        }
    }

    let container = container.or_else(|| {
        for fallback in ["div[class*=content], div[class*=chapter], div[class*=text]", "article", "body"] {
            let Ok(selector) = Selector::parse(fallback) else { continue };
            if let Some(el) = document.select(&selector).next() {
                return Some(el);
            }
        }
        None
    });

    let Some(container) = container else {
        return String::new();
    };

    let harvested = harvest_paragraphs(container);
    if !harvested.is_empty() {
        return harvested.join("\n\n");
    }

    harvest_lines(container).join("\n\n")
}

fn is_rejected_fragment(text: &str) -> bool {
    if text.chars().count() <= 20 {
        return true;
    }
    if RE_NAV_LINE.iter().any(|re| re.is_match(text)) {
        return true;
    }
    if text.chars().count() < 50 {
        let lower = text.to_lowercase();
        if SHORT_LINE_REJECT_TOKENS.iter().any(|t| lower.contains(t)) {
            return true;
        }
    }
    false
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn harvest_paragraphs(container: ElementRef) -> Vec<String> {
    let Ok(p_selector) = Selector::parse("p") else { return Vec::new() };
    let Ok(div_selector) = Selector::parse("div") else { return Vec::new() };

    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();

    for el in container.select(&p_selector) {
        let text = el.text().collect::<String>().trim().to_string();
        push_if_valid(&text, &mut seen, &mut out);
    }

    for el in container.select(&div_selector) {
        if el.select(&p_selector).next().is_some() {
            continue;
        }
        let text = el.text().collect::<String>().trim().to_string();
        push_if_valid(&text, &mut seen, &mut out);
    }

    out
}

fn push_if_valid(text: &str, seen: &mut std::collections::HashSet<String>, out: &mut Vec<String>) {
    if text.is_empty() || is_rejected_fragment(text) {
        return;
    }
    let key = normalize_whitespace(text);
    if seen.insert(key) {
        out.push(text.to_string());
    }
}

fn harvest_lines(container: ElementRef) -> Vec<String> {
    let text = container.text().collect::<Vec<_>>().join("\n");
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for line in text.split('\n') {
        let trimmed = line.trim();
        push_if_valid(trimmed, &mut seen, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptive_profile::NullProfile;

    #[test]
    fn title_prefers_first_matching_selector() {
        let html = r#"<html><body><h1 class="chapter-title">Chapter 12: The Return</h1></body></html>"#;
        let document = Html::parse_document(html);
        assert_eq!(select_title(&document, "https://ex.com/chapter-12"), "The Return");
    }

    #[test]
    fn title_falls_back_to_chapter_number() {
        let html = "<html><body></body></html>";
        let document = Html::parse_document(html);
        assert_eq!(select_title(&document, "https://ex.com/chapter-7"), "Chapter 7");
    }

    #[test]
    fn title_falls_back_to_chapter_1_without_number() {
        let html = "<html><body></body></html>";
        let document = Html::parse_document(html);
        assert_eq!(select_title(&document, "https://ex.com/about"), "Chapter 1");
    }

    #[test]
    fn content_harvests_paragraphs_and_dedupes() {
        let html = r#"<div class="chapter-content"><p>The sun rose over the quiet valley.</p><p>Next Chapter</p><p>The sun rose over the quiet valley.</p></div>"#;
        let document = Html::parse_document(html);
        let text = select_content(&document, &[]);
        assert_eq!(text, "The sun rose over the quiet valley.");
    }

    #[test]
    fn content_falls_back_to_line_harvest_without_paragraphs() {
        let html = "<div class=\"chapter-content\">The sun rose over the quiet valley today.\nAdvertisement\n</div>";
        let document = Html::parse_document(html);
        let text = select_content(&document, &[]);
        assert!(text.contains("The sun rose over the quiet valley today."));
        assert!(!text.contains("Advertisement"));
    }

    #[test]
    fn finish_returns_no_content_on_empty_container() {
        let html = "<html><body><div class=\"chapter-content\"></div></body></html>";
        let profile = NullProfile;
        let result = finish(html, "https://ex.com/chapter-1", &profile);
        assert_eq!(result.unwrap_err(), ChapterError::NoContent);
    }

    #[test]
    fn finish_cleans_and_succeeds() {
        let html = r#"<html><body><h1 class="chapter-title">Chapter 1</h1><div class="chapter-content"><p>The sun rose over the valley this quiet morning.</p></div></body></html>"#;
        let profile = NullProfile;
        let result = finish(html, "https://ex.com/chapter-1", &profile).unwrap();
        assert_eq!(result.title, "Chapter 1");
        assert!(result.cleaned_text.contains("The sun rose"));
    }
}
