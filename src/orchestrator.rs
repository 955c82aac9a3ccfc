//! Strategy orchestrator: runs the ordered strategy list against a TOC
//! URL, applies the accept gate, and aggregates metadata. A fixed three-way
//! fallback chain rather than an open plugin registry: ordered attempt loop,
//! per-attempt bookkeeping, and a "best result seen" fallback when nothing
//! clears the accept gate.

use std::time::Instant;

use tracing::{debug, info};

use crate::adaptive_profile::AdaptiveProfile;
use crate::config::Config;
use crate::error::ListingError;
use crate::host_session::HostSession;
use crate::pagination::{self, SuggestedAction};
use crate::strategies::{self, ajax_replay, browser_automation, js_mining};
use crate::url_utils::{ChapterUrl, sort_by_chapter_number, same_host};

const ACCEPT_MIN_COUNT: usize = 10;
const HARD_SIGNATURE_COUNT: usize = 55;

/// Per-attempt bookkeeping plus the accepted strategy's name, if any.
#[derive(Debug, Clone, Default)]
pub struct ListingMetadata {
    pub strategy_counts: Vec<(String, usize)>,
    pub accepted_strategy: Option<String>,
    pub cancelled: bool,
}

#[derive(Debug, Clone)]
pub struct ListingResult {
    pub urls: Vec<ChapterUrl>,
    pub metadata: ListingMetadata,
}

/// Runs the js-mining, ajax-replay, and browser-automation strategies in the
/// order named by `profile.optimal_order`, falling back to
/// `[js, ajax, browser]`, applying the accept gate after each.
pub async fn fetch_listing(
    toc_url: &str,
    min_chapter_required: Option<u32>,
    max_chapter_required: Option<u32>,
    should_stop: &(dyn Fn() -> bool + Send + Sync),
    config: &Config,
    profile: &dyn AdaptiveProfile,
) -> Result<ListingResult, ListingError> {
    let parsed = url::Url::parse(toc_url).map_err(|_| ListingError::InvalidUrl)?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ListingError::InvalidUrl);
    }

    let session = HostSession::new(
        std::time::Duration::from_secs_f64(config.request_min_delay_sec),
        std::time::Duration::from_secs(config.request_timeout_sec),
    )
    .map_err(|_| ListingError::InvalidUrl)?;

    let order = {
        let learned = profile.optimal_order(&config.base_host);
        if learned.is_empty() {
            vec![
                strategies::JS_MINING.to_string(),
                strategies::AJAX_REPLAY.to_string(),
                strategies::BROWSER_AUTOMATION.to_string(),
            ]
        } else {
            learned
        }
    };

    let mut metadata = ListingMetadata::default();
    let mut best: Vec<String> = Vec::new();

    for strategy_name in &order {
        if should_stop() {
            metadata.cancelled = true;
            return Ok(finalize(best, metadata, &config.base_host));
        }

        let started = Instant::now();
        let raw = run_strategy(strategy_name, toc_url, min_chapter_required, should_stop, config, &session).await;
        let elapsed = started.elapsed();

        let filtered: Vec<String> = raw
            .into_iter()
            .filter(|u| same_host(u, &config.base_host))
            .collect();

        metadata
            .strategy_counts
            .push((strategy_name.clone(), filtered.len()));

        if filtered.len() > best.len() {
            best = filtered.clone();
        }

        let mut accepted = false;
        if filtered.len() >= ACCEPT_MIN_COUNT {
            let mut sorted: Vec<ChapterUrl> =
                filtered.iter().cloned().map(ChapterUrl::new).collect();
            sort_by_chapter_number(&mut sorted);
            let sorted_urls: Vec<String> = sorted.iter().map(|c| c.url.clone()).collect();

            let verdict = pagination::analyze(&sorted_urls, min_chapter_required, max_chapter_required, config);
            let covers = pagination::covers_range(&sorted_urls, min_chapter_required, max_chapter_required, config);
            let is_hard_signature = filtered.len() == HARD_SIGNATURE_COUNT
                && (strategy_name == strategies::JS_MINING || strategy_name == strategies::AJAX_REPLAY);

            if !is_hard_signature
                && verdict.verdict == pagination::PaginationVerdict::Complete
                && verdict.suggested_action == SuggestedAction::Accept
                && covers
            {
                metadata.accepted_strategy = Some(strategy_name.clone());
                accepted = true;
                info!(strategy = %strategy_name, count = filtered.len(), "orchestrator: accepted");
            } else {
                debug!(strategy = %strategy_name, verdict = ?verdict.verdict, "orchestrator: not accepted");
            }
        }

        profile.update(&config.base_host, strategy_name, accepted, elapsed);

        if accepted {
            return Ok(finalize(filtered, metadata, &config.base_host));
        }
    }

    if best.is_empty() {
        return Err(ListingError::AllStrategiesEmpty);
    }
    Ok(finalize(best, metadata, &config.base_host))
}

async fn run_strategy(
    strategy_name: &str,
    toc_url: &str,
    min_chapter_required: Option<u32>,
    should_stop: &(dyn Fn() -> bool + Send + Sync),
    config: &Config,
    session: &HostSession,
) -> Vec<String> {
    match strategy_name {
        s if s == strategies::JS_MINING => js_mining::run(toc_url, session).await,
        s if s == strategies::AJAX_REPLAY => ajax_replay::run(toc_url, session).await,
        s if s == strategies::BROWSER_AUTOMATION => {
            browser_automation::run(toc_url, min_chapter_required, should_stop, config, session).await
        }
        other => {
            debug!(strategy = other, "orchestrator: unknown strategy name, skipping");
            Vec::new()
        }
    }
}

fn finalize(urls: Vec<String>, metadata: ListingMetadata, base_host: &str) -> ListingResult {
    let mut seen = std::collections::HashSet::new();
    let mut chapter_urls: Vec<ChapterUrl> = urls
        .into_iter()
        .filter(|u| same_host(u, base_host) && seen.insert(u.clone()))
        .map(ChapterUrl::new)
        .collect();
    sort_by_chapter_number(&mut chapter_urls);
    ListingResult {
        urls: chapter_urls,
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptive_profile::NullProfile;

    #[tokio::test]
    async fn invalid_url_rejected() {
        let config = Config::builder("example.com").build();
        let profile = NullProfile;
        let result = fetch_listing("not a url", None, None, &|| false, &config, &profile).await;
        assert_eq!(result.unwrap_err(), ListingError::InvalidUrl);
    }

    #[tokio::test]
    async fn non_http_scheme_rejected() {
        let config = Config::builder("example.com").build();
        let profile = NullProfile;
        let result = fetch_listing("ftp://example.com/toc", None, None, &|| false, &config, &profile).await;
        assert_eq!(result.unwrap_err(), ListingError::InvalidUrl);
    }

    #[test]
    fn finalize_dedupes_and_sorts() {
        let urls = vec![
            "https://example.com/chapter-2".to_string(),
            "https://example.com/chapter-1".to_string(),
            "https://example.com/chapter-1".to_string(),
        ];
        let result = finalize(urls, ListingMetadata::default(), "example.com");
        assert_eq!(result.urls.len(), 2);
        assert_eq!(result.urls[0].chapter_number, Some(1));
    }
}
