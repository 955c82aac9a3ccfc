//! Regex over the served HTML body for inline JS chapter
//! arrays. No DOM parsing, no JS execution — covers `chapters`/
//! `chapterList`/`chapterUrls` arrays under var/let/const/window. prefixes,
//! plus `JSON.parse("...chapter...")` string literals.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::classify::is_chapter_url;
use crate::host_session::HostSession;
use crate::url_utils::absolutize;

static RE_ARRAY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    let names = ["chapters", "chapterList", "chapterUrls"];
    let prefixes = ["", "var ", "let ", "const ", "window."];
    let mut patterns = Vec::new();
    for name in names {
        for prefix in prefixes {
            let src = format!(r"(?is){prefix}{name}\s*[:=]\s*\[([^\]]+)\]");
            patterns.push(Regex::new(&src).unwrap());
        }
    }
    patterns
});

static RE_JSON_PARSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)JSON\.parse\(\s*['"]([^'"]*chapter[^'"]*)['"]\s*\)"#).unwrap());

static RE_STRING_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"["']([^"']+)["']"#).unwrap());

/// Runs the JS-mining strategy against `toc_url`. Never raises: non-200
/// responses and "regex finds nothing" both collapse to an empty vec.
pub async fn run(toc_url: &str, session: &HostSession) -> Vec<String> {
    let response = match session.request(toc_url).await {
        Ok(r) => r,
        Err(e) => {
            debug!(%e, "js_mining: request failed");
            return Vec::new();
        }
    };
    if !response.status().is_success() {
        debug!(status = %response.status(), "js_mining: non-200 response");
        return Vec::new();
    }
    let body = match response.text().await {
        Ok(b) => b,
        Err(e) => {
            debug!(%e, "js_mining: failed to read body");
            return Vec::new();
        }
    };

    extract_from_body(&body, toc_url)
}

fn extract_from_body(body: &str, base_url: &str) -> Vec<String> {
    let mut raw_candidates: Vec<String> = Vec::new();

    for re in RE_ARRAY_PATTERNS.iter() {
        for caps in re.captures_iter(body) {
            let content = &caps[1];
            for lit in RE_STRING_LITERAL.captures_iter(content) {
                raw_candidates.push(lit[1].to_string());
            }
        }
    }
    for caps in RE_JSON_PARSE.captures_iter(body) {
        let content = &caps[1];
        for lit in RE_STRING_LITERAL.captures_iter(content) {
            raw_candidates.push(lit[1].to_string());
        }
    }

    let mut seen = std::collections::HashSet::new();
    let mut result = Vec::new();
    for candidate in raw_candidates {
        let Some(absolute) = absolutize(&candidate, base_url) else {
            continue;
        };
        if !is_chapter_url(&absolute, "") {
            continue;
        }
        if seen.insert(absolute.clone()) {
            result.push(absolute);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_full_fifty_chapter_array() {
        let mut entries = Vec::new();
        for i in 1..=50 {
            entries.push(format!("\"https://ex.com/b/a/chapter-{i}\""));
        }
        let html = format!("<script>var chapters=[{}];</script>", entries.join(","));
        let urls = extract_from_body(&html, "https://ex.com/b/a/toc");
        assert_eq!(urls.len(), 50);
        assert_eq!(urls[0], "https://ex.com/b/a/chapter-1");
        assert_eq!(urls[49], "https://ex.com/b/a/chapter-50");
    }

    #[test]
    fn window_chapters_prefix_recognized() {
        let html = r#"<script>window.chapters = ["/novel/x/chapter-1", "/novel/x/chapter-2"];</script>"#;
        let urls = extract_from_body(html, "https://ex.com/toc");
        assert_eq!(urls.len(), 2);
    }

    #[test]
    fn no_array_present_yields_empty() {
        let html = "<html><body>No chapters here.</body></html>";
        assert!(extract_from_body(html, "https://ex.com/toc").is_empty());
    }

    #[test]
    fn deduplicates_preserving_first_seen_order() {
        let html = r#"var chapters=["/c/chapter-1","/c/chapter-2","/c/chapter-1"];"#;
        let urls = extract_from_body(html, "https://ex.com/toc");
        assert_eq!(urls, vec!["https://ex.com/c/chapter-1", "https://ex.com/c/chapter-2"]);
    }

    #[test]
    fn non_chapter_strings_filtered_out() {
        let html = r#"var chapters=["/about", "/chapter-1"];"#;
        let urls = extract_from_body(html, "https://ex.com/toc");
        assert_eq!(urls, vec!["https://ex.com/chapter-1"]);
    }
}
