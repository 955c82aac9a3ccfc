mod common;

use webnovel_extractor::adaptive_profile::NullProfile;
use webnovel_extractor::config::Config;
use webnovel_extractor::fetch_listing;

fn fast_config(base_host: &str) -> Config {
    Config::builder(base_host)
        .request_min_delay_sec(0.001)
        .build()
}

fn js_array_body(count: u32, prefix: &str) -> String {
    let entries: Vec<String> = (1..=count)
        .map(|i| format!("\"{prefix}/chapter-{i}\""))
        .collect();
    format!(
        "<html><body><script>var chapters=[{}];</script></body></html>",
        entries.join(",")
    )
}

/// JS mining alone produces a clean, non-suspicious 20-chapter set: the
/// orchestrator accepts on the first strategy and never reaches the browser
/// fallback, so this is safe to run without a real Chrome binary.
#[tokio::test]
async fn js_mining_alone_is_accepted_without_escalation() {
    // 15, not 20: a count equal to one of the common-limit values would trip
    // the soft-signature pagination rule and force escalation instead.
    let base = common::spawn_mock_server(200, &js_array_body(15, "/b/a")).await;
    let toc_url = format!("{base}/b/a/toc");

    let config = fast_config("127.0.0.1");
    let profile = NullProfile;
    let result = fetch_listing(&toc_url, None, None, &|| false, &config, &profile)
        .await
        .unwrap();

    assert_eq!(result.urls.len(), 15);
    assert_eq!(result.metadata.accepted_strategy.as_deref(), Some("js"));
    assert_eq!(result.urls.first().unwrap().chapter_number, Some(1));
    assert_eq!(result.urls.last().unwrap().chapter_number, Some(15));
}

#[tokio::test]
async fn invalid_toc_url_rejected_before_any_request() {
    let config = fast_config("127.0.0.1");
    let profile = NullProfile;
    let result = fetch_listing("not-a-url", None, None, &|| false, &config, &profile).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn cancellation_before_first_strategy_returns_cancelled_metadata() {
    let base = common::spawn_mock_server(200, &js_array_body(20, "/b/a")).await;
    let toc_url = format!("{base}/b/a/toc");

    let config = fast_config("127.0.0.1");
    let profile = NullProfile;
    let result = fetch_listing(&toc_url, None, None, &|| true, &config, &profile)
        .await
        .unwrap();

    assert!(result.metadata.cancelled);
    assert!(result.urls.is_empty());
}

/// A 55-URL hard-signature count and a range-shortfall both require the
/// orchestrator to fall through to the browser-automation strategy, which
/// launches a real Chrome/Chromium binary. Ignored by default so
/// `cargo test` doesn't depend on one being installed; run with
/// `cargo test -- --ignored` on a machine that has Chrome available.
#[tokio::test]
#[ignore = "requires a real Chrome/Chromium binary for the browser-automation fallback"]
async fn hard_signature_count_falls_back_to_best_seen_when_browser_finds_nothing_more() {
    let base = common::spawn_mock_server(200, &js_array_body(55, "/b/a")).await;
    let toc_url = format!("{base}/b/a/toc");

    let config = fast_config("127.0.0.1");
    let profile = NullProfile;
    let result = fetch_listing(&toc_url, None, None, &|| false, &config, &profile)
        .await
        .unwrap();

    let js_count = result
        .metadata
        .strategy_counts
        .iter()
        .find(|(name, _)| name == "js")
        .map(|(_, c)| *c);
    assert_eq!(js_count, Some(55));
    assert!(result.urls.len() >= 55);
}

#[tokio::test]
#[ignore = "requires a real Chrome/Chromium binary for the browser-automation fallback"]
async fn range_shortfall_escalates_to_browser() {
    let base = common::spawn_mock_server(200, &js_array_body(46, "/b/a")).await;
    let toc_url = format!("{base}/b/a/toc");

    let config = fast_config("127.0.0.1");
    let profile = NullProfile;
    let result = fetch_listing(&toc_url, Some(500), None, &|| false, &config, &profile)
        .await
        .unwrap();

    assert_ne!(result.metadata.accepted_strategy.as_deref(), Some("js"));
}
