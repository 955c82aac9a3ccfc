//! The slowest, most capable strategy. Drives a headless
//! Chrome instance through Cloudflare-style interstitials, discovers and
//! traverses pagination, and falls back to an injected scroll/load-more
//! script when no pagination structure exists. Exactly one browser instance
//! runs per invocation; it is always torn down before returning.

use std::time::Duration;

use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::browser_setup::{apply_stealth_measures, launch_browser};
use crate::classify::is_chapter_url;
use crate::config::Config;
use crate::host_session::HostSession;
use crate::url_utils::absolutize;

const SCROLL_SCRIPT_TEMPLATE: &str = include_str!("../../assets/scroll.js");

static RE_INTERSTITIAL_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)just a moment|checking your browser").unwrap());
pub(crate) static RE_INTERSTITIAL_BODY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)verify you are human|just a moment|cloudflare|ddos protection|cf-browser-verification|please wait")
        .unwrap()
});
static RE_STANDALONE_PAGE_NUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d{1,3})\s*$").unwrap());
static RE_PAGINATION_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)page|\?p=|&p=|/p/").unwrap());
static RE_TRAILING_PAGE_NUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(\d+)/?$").unwrap());

const PAGINATION_SELECTORS: &[&str] = &[
    ".pagination a",
    "a[href*=\"page\"]",
    "a[href*=\"?p=\"]",
    "a[data-page]",
    "nav.pagination a",
];

/// Runs the full browser-automation strategy. `should_stop` is polled
/// between every suspension point; a `true` return closes the browser and
/// returns whatever was collected so far.
pub async fn run(
    toc_url: &str,
    min_chapter_required: Option<u32>,
    should_stop: &(dyn Fn() -> bool + Send + Sync),
    config: &Config,
    session: &HostSession,
) -> Vec<String> {
    if should_stop() {
        return Vec::new();
    }

    let (browser, handler, user_data_dir) = match launch_browser(config.browser_headless, None).await {
        Ok(b) => b,
        Err(e) => {
            warn!(%e, "browser_automation: failed to launch browser");
            return Vec::new();
        }
    };

    let result = drive(&browser, toc_url, min_chapter_required, should_stop, config, session).await;

    handler.abort();
    if let Err(e) = std::fs::remove_dir_all(&user_data_dir) {
        debug!(%e, "browser_automation: failed to clean up profile dir");
    }

    result
}

async fn drive(
    browser: &chromiumoxide::Browser,
    toc_url: &str,
    min_chapter_required: Option<u32>,
    should_stop: &(dyn Fn() -> bool + Send + Sync),
    config: &Config,
    session: &HostSession,
) -> Vec<String> {
    let page = match browser.new_page("about:blank").await {
        Ok(p) => p,
        Err(e) => {
            warn!(%e, "browser_automation: failed to open page");
            return Vec::new();
        }
    };

    let _ = apply_stealth_measures(&page).await;

    if navigate(&page, toc_url, config).await.is_err() {
        return Vec::new();
    }
    sleep(Duration::from_secs(2)).await;
    wait_out_interstitial(&page, should_stop).await;

    if should_stop() {
        return Vec::new();
    }

    let pagination_urls = discover_pagination(&page, toc_url).await;
    let pagination_urls = if pagination_urls.len() < 2 {
        fabricate_pagination(&page, toc_url, min_chapter_required, session, config).await
    } else {
        pagination_urls
    };

    if !pagination_urls.is_empty() {
        traverse_pagination(&page, &pagination_urls, should_stop, config, session).await
    } else {
        scroll_fallback(&page, config).await
    }
}

pub(crate) async fn navigate(page: &Page, url: &str, config: &Config) -> anyhow::Result<()> {
    let params = NavigateParams::builder().url(url).build().map_err(|e| anyhow::anyhow!(e))?;
    tokio::time::timeout(
        Duration::from_secs(config.browser_nav_timeout_sec),
        page.goto(params),
    )
    .await
    .map_err(|_| anyhow::anyhow!("navigation timed out"))??;
    Ok(())
}

/// Step 2: poll at 1s intervals for up to 20s for interstitial tokens to
/// disappear. Transient title-read errors and mid-poll redirects are both
/// treated as "still waiting".
pub(crate) async fn wait_out_interstitial(page: &Page, should_stop: &(dyn Fn() -> bool + Send + Sync)) {
    for _ in 0..20 {
        if should_stop() {
            return;
        }
        let title = page.get_title().await.ok().flatten().unwrap_or_default();
        if !RE_INTERSTITIAL_TITLE.is_match(&title) {
            sleep(Duration::from_secs(2)).await;
            let _ = tokio::time::timeout(Duration::from_secs(10), page.wait_for_navigation()).await;
            return;
        }
        sleep(Duration::from_secs(1)).await;
    }
}

pub(crate) async fn rendered_html(page: &Page) -> String {
    page.content().await.unwrap_or_default()
}

fn extract_anchors(html: &str, base_url: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|el| {
            let href = el.value().attr("href")?;
            let absolute = absolutize(href, base_url)?;
            let text = el.text().collect::<String>();
            Some((absolute, text))
        })
        .collect()
}

async fn discover_pagination(page: &Page, toc_url: &str) -> Vec<String> {
    let html = rendered_html(page).await;
    let anchors = extract_anchors(&html, toc_url);

    let mut candidates: Vec<(u32, String)> = Vec::new();
    let document = Html::parse_document(&html);
    for sel in PAGINATION_SELECTORS {
        let Ok(selector) = Selector::parse(sel) else { continue };
        for el in document.select(&selector) {
            if let Some(href) = el.value().attr("href")
                && let Some(absolute) = absolutize(href, toc_url)
                && !is_chapter_url(&absolute, &el.text().collect::<String>())
            {
                let page_num = extract_page_number(&absolute, &el.text().collect::<String>());
                candidates.push((page_num.unwrap_or(0), absolute));
            }
        }
    }

    for (href, text) in &anchors {
        let trimmed = text.trim();
        if let Some(caps) = RE_STANDALONE_PAGE_NUM.captures(trimmed)
            && let Ok(num) = caps[1].parse::<u32>()
            && (1..=999).contains(&num)
            && (RE_PAGINATION_MARKER.is_match(href) || RE_TRAILING_PAGE_NUM.is_match(href))
            && !is_chapter_url(href, text)
        {
            candidates.push((num, href.clone()));
        }
    }

    let mut seen = std::collections::HashSet::new();
    candidates.retain(|(_, url)| seen.insert(url.clone()));
    candidates.sort_by_key(|(num, _)| *num);
    candidates.into_iter().map(|(_, url)| url).collect()
}

fn extract_page_number(url: &str, text: &str) -> Option<u32> {
    if let Ok(n) = text.trim().parse::<u32>() {
        return Some(n);
    }
    RE_TRAILING_PAGE_NUM
        .captures(url)
        .and_then(|c| c[1].parse().ok())
}

/// Step 3a. Only invoked when pagination discovery came up (nearly) empty.
async fn fabricate_pagination(
    page: &Page,
    toc_url: &str,
    min_chapter_required: Option<u32>,
    session: &HostSession,
    config: &Config,
) -> Vec<String> {
    let html = rendered_html(page).await;
    let anchors = extract_anchors(&html, toc_url);

    let mut page_numbers: Vec<u32> = Vec::new();
    for (href, text) in &anchors {
        if let Some(n) = extract_page_number(href, text)
            && (1..=999).contains(&n)
        {
            page_numbers.push(n);
        }
    }

    if page_numbers.len() >= 2 {
        page_numbers.sort_unstable();
        page_numbers.dedup();
        let min = *page_numbers.first().unwrap();
        let max = *page_numbers.last().unwrap();
        let base = toc_url.split('?').next().unwrap_or(toc_url);
        return (min..=max).map(|n| format!("{base}?page={n}")).collect();
    }

    let Some(min_required) = min_chapter_required else {
        return Vec::new();
    };
    if min_required < 50 {
        return Vec::new();
    }

    let base = toc_url.split('?').next().unwrap_or(toc_url).to_string();
    let page1_urls = extract_anchors(&html, toc_url)
        .into_iter()
        .filter(|(u, t)| is_chapter_url(u, t))
        .map(|(u, _)| u)
        .collect::<std::collections::HashSet<_>>();

    let candidate_patterns = [
        format!("{base}/2"),
        format!("{base}/page/2"),
        format!("{base}?page=2"),
    ];

    let mut winning_pattern = None;
    for pattern in &candidate_patterns {
        let Ok(resp) = session.request(pattern).await else { continue };
        if !resp.status().is_success() {
            continue;
        }
        let Ok(body) = resp.text().await else { continue };
        let page2_urls: std::collections::HashSet<_> = extract_anchors(&body, pattern)
            .into_iter()
            .filter(|(u, t)| is_chapter_url(u, t))
            .map(|(u, _)| u)
            .collect();
        if !page2_urls.is_empty() && page2_urls.is_disjoint(&page1_urls) {
            winning_pattern = Some(pattern.clone());
            break;
        }
    }

    let Some(pattern) = winning_pattern else {
        return Vec::new();
    };

    let observed_per_page = page1_urls.len().max(1) as u32;
    let estimated_total = (min_required.div_ceil(observed_per_page) + 2)
        .min(config.browser_pagination_max_pages);

    (2..=estimated_total)
        .map(|n| pattern.replace("2", &n.to_string()))
        .collect()
}

/// Step 4: visits each discovered page URL in order, aggregating chapter
/// anchors. Does not stop on the first empty page; stops after several
/// consecutive empties if at least one non-empty page was collected.
async fn traverse_pagination(
    page: &Page,
    page_urls: &[String],
    should_stop: &(dyn Fn() -> bool + Send + Sync),
    config: &Config,
    session: &HostSession,
) -> Vec<String> {
    let mut collected: Vec<String> = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let mut consecutive_empty = 0u32;
    let mut any_non_empty = false;

    for url in page_urls.iter().take(config.browser_pagination_max_pages as usize) {
        if should_stop() {
            break;
        }
        session.rate_limit().await;
        if navigate(page, url, config).await.is_err() {
            consecutive_empty += 1;
            if any_non_empty && consecutive_empty >= 3 {
                break;
            }
            continue;
        }
        wait_out_interstitial(page, should_stop).await;
        let _ = tokio::time::timeout(Duration::from_secs(15), page.wait_for_navigation()).await;

        let html = rendered_html(page).await;
        let anchors = extract_anchors(&html, url);
        let before = collected.len();
        for (href, text) in anchors {
            if is_chapter_url(&href, &text) && seen.insert(href.clone()) {
                collected.push(href);
            }
        }

        if collected.len() == before {
            consecutive_empty += 1;
            if any_non_empty && consecutive_empty >= 3 {
                break;
            }
        } else {
            any_non_empty = true;
            consecutive_empty = 0;
        }
    }

    collected
}

/// Step 5: no pagination structure found. Injects the scroll/load-more
/// script and extracts chapter anchors once it settles.
async fn scroll_fallback(page: &Page, config: &Config) -> Vec<String> {
    let script = SCROLL_SCRIPT_TEMPLATE
        .replace("%%MAX_ITERATIONS%%", &config.browser_scroll_max_iterations.to_string())
        .replace(
            "%%NO_CHANGE_PATIENCE%%",
            &config.browser_scroll_no_change_patience.to_string(),
        );

    match page.evaluate(script.as_str()).await {
        Ok(_) => info!("browser_automation: scroll fallback completed"),
        Err(e) => warn!(%e, "browser_automation: scroll script failed"),
    }

    let _ = tokio::time::timeout(Duration::from_secs(15), page.wait_for_navigation()).await;
    let html = rendered_html(page).await;
    let current_url = page.url().await.ok().flatten().unwrap_or_default();
    extract_anchors(&html, &current_url)
        .into_iter()
        .filter(|(u, t)| is_chapter_url(u, t))
        .map(|(u, _)| u)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interstitial_title_detection() {
        assert!(RE_INTERSTITIAL_TITLE.is_match("Just a moment..."));
        assert!(RE_INTERSTITIAL_TITLE.is_match("Checking your browser before accessing"));
        assert!(!RE_INTERSTITIAL_TITLE.is_match("Chapter 12 - My Novel"));
    }

    #[test]
    fn interstitial_body_token_detection() {
        assert!(RE_INTERSTITIAL_BODY.is_match("Please wait while we verify you are human"));
        assert!(!RE_INTERSTITIAL_BODY.is_match("The sun rose over the hills."));
    }

    #[test]
    fn extracts_standalone_page_anchors() {
        let html = r#"<a href="/toc?page=2">2</a><a href="/toc?page=3">3</a>"#;
        let anchors = extract_anchors(html, "https://ex.com/toc");
        assert_eq!(anchors.len(), 2);
    }
}
