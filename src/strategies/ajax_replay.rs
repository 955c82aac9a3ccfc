//! Discover a site's chapter-list API endpoint from markup,
//! then replay it. Two phases: discovery (find a novel/book ID and build
//! candidate endpoint URLs from it) and replay (fetch each and walk the
//! response for chapter links).

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use crate::classify::is_chapter_url;
use crate::host_session::HostSession;
use crate::url_utils::absolutize;

const MAX_ENDPOINTS: usize = 20;
const MAX_COLLECTED: usize = 100;

static RE_DATA_ATTR: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r#"(?i)data-novel-id\s*=\s*["']([^"']+)["']"#).unwrap(),
        Regex::new(r#"(?i)data-book-id\s*=\s*["']([^"']+)["']"#).unwrap(),
        Regex::new(r#"(?i)data-id\s*=\s*["']([^"']+)["']"#).unwrap(),
    ]
});
static RE_JS_VAR: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r#"(?i)novelId\s*[:=]\s*["']?([A-Za-z0-9_-]+)["']?"#).unwrap(),
        Regex::new(r#"(?i)novel_id\s*[:=]\s*["']?([A-Za-z0-9_-]+)["']?"#).unwrap(),
        Regex::new(r#"(?i)bookId\s*[:=]\s*["']?([A-Za-z0-9_-]+)["']?"#).unwrap(),
    ]
});
static RE_PATH_ID: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)/novel/(\d+)").unwrap(),
        Regex::new(r"(?i)/book/(\d+)").unwrap(),
        Regex::new(r"(?i)/b/([^/]+)").unwrap(),
    ]
});

static RE_JS_ENDPOINT: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r#"(?i)ajaxChapterUrl\s*[:=]\s*["']([^"']+)["']"#).unwrap(),
        Regex::new(r#"(?i)chapterApiUrl\s*[:=]\s*["']([^"']+)["']"#).unwrap(),
        Regex::new(r#"(?i)ajaxUrl\s*[:=]\s*["']([^"']+)["']"#).unwrap(),
        Regex::new(r#"(?i)apiEndpoint\s*[:=]\s*["']([^"']+)["']"#).unwrap(),
        Regex::new(r#"(?i)fetch\(\s*["']([^"']*chapter[^"']*)["']"#).unwrap(),
    ]
});

fn find_novel_id(html: &str) -> Option<String> {
    for re in RE_DATA_ATTR.iter() {
        if let Some(c) = re.captures(html) {
            return Some(c[1].to_string());
        }
    }
    for re in RE_JS_VAR.iter() {
        if let Some(c) = re.captures(html) {
            return Some(c[1].to_string());
        }
    }
    for re in RE_PATH_ID.iter() {
        if let Some(c) = re.captures(html) {
            return Some(c[1].to_string());
        }
    }
    None
}

fn build_candidate_endpoints(html: &str, novel_id: &str, base_url: &str) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();

    for re in RE_JS_ENDPOINT.iter() {
        for c in re.captures_iter(html) {
            let template = c[1].replace("{novelId}", novel_id);
            if let Some(absolute) = absolutize(&template, base_url) {
                candidates.push(absolute);
            }
        }
    }

    let conventional = [
        format!("/api/chapters?novel_id={novel_id}"),
        format!("/ajax/chapter-list?novelId={novel_id}"),
        format!("/api/novel/{novel_id}/chapters"),
        format!("/ajax/chapters/{novel_id}"),
        format!("/api/chapter-list/{novel_id}"),
    ];
    for path in conventional {
        if let Some(absolute) = absolutize(&path, base_url) {
            candidates.push(absolute);
        }
    }

    let mut seen = std::collections::HashSet::new();
    candidates.retain(|c| seen.insert(c.clone()));
    candidates.truncate(MAX_ENDPOINTS);
    candidates
}

const URL_FIELD_NAMES: &[&str] = &["url", "href", "link", "chapter_url", "chapterUrl"];

fn walk_json_for_urls(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, v) in map {
                if URL_FIELD_NAMES.iter().any(|f| f.eq_ignore_ascii_case(key))
                    && let Some(s) = v.as_str()
                {
                    out.push(s.to_string());
                }
                walk_json_for_urls(v, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk_json_for_urls(item, out);
            }
        }
        _ => {}
    }
}

fn extract_anchors_from_html(html: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .map(|el| {
            let href = el.value().attr("href").unwrap_or("").to_string();
            let text = el.text().collect::<String>();
            (href, text)
        })
        .collect()
}

/// Runs discovery then replay. Never raises; any failure mode collapses to
/// an empty vec.
pub async fn run(toc_url: &str, session: &HostSession) -> Vec<String> {
    let response = match session.request(toc_url).await {
        Ok(r) => r,
        Err(e) => {
            debug!(%e, "ajax_replay: toc request failed");
            return Vec::new();
        }
    };
    let html = match response.text().await {
        Ok(h) => h,
        Err(_) => return Vec::new(),
    };

    let Some(novel_id) = find_novel_id(&html) else {
        debug!("ajax_replay: no novel id found");
        return Vec::new();
    };

    let endpoints = build_candidate_endpoints(&html, &novel_id, toc_url);
    let mut collected: Vec<String> = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for endpoint in endpoints {
        if collected.len() >= MAX_COLLECTED {
            break;
        }
        let resp = match session.request(&endpoint).await {
            Ok(r) => r,
            Err(_) => continue,
        };
        if !resp.status().is_success() {
            continue;
        }
        let is_json = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("json"));

        let Ok(body) = resp.text().await else { continue };

        if is_json {
            if let Ok(value) = serde_json::from_str::<Value>(&body) {
                let mut found = Vec::new();
                walk_json_for_urls(&value, &mut found);
                for candidate in found {
                    let Some(absolute) = absolutize(&candidate, &endpoint) else { continue };
                    if is_chapter_url(&absolute, "") && seen.insert(absolute.clone()) {
                        collected.push(absolute);
                    }
                }
            }
        } else {
            for (href, text) in extract_anchors_from_html(&body) {
                let Some(absolute) = absolutize(&href, &endpoint) else { continue };
                if is_chapter_url(&absolute, &text) && seen.insert(absolute.clone()) {
                    collected.push(absolute);
                }
            }
        }
    }

    collected
}
