mod common;

use std::time::Duration;

use webnovel_extractor::adaptive_profile::NullProfile;
use webnovel_extractor::config::Config;
use webnovel_extractor::error::ChapterError;
use webnovel_extractor::host_session::HostSession;
use webnovel_extractor::{ChapterExtraction, extract_chapter};

fn fast_session() -> HostSession {
    common::init_tracing();
    HostSession::new(Duration::from_millis(1), Duration::from_secs(5)).unwrap()
}

/// A 403 whose body names the removal reason short-circuits straight to
/// `Removed`, with no browser fallback and no retry.
#[tokio::test]
async fn removed_novel_403_short_circuits_without_retry() {
    let base = common::spawn_mock_server(403, "This novel has been removed.").await;
    let url = format!("{base}/b/a/chapter-1");

    let config = Config::builder("127.0.0.1").build();
    let profile = NullProfile;
    let session = fast_session();

    let result = extract_chapter(&url, &|| false, &config, &session, &profile).await;
    assert_eq!(result.unwrap_err(), ChapterError::Removed);
}

#[tokio::test]
async fn chapter_not_found_maps_to_enumerated_error() {
    let base = common::spawn_mock_server(404, "gone").await;
    let url = format!("{base}/b/a/chapter-1");

    let config = Config::builder("127.0.0.1").build();
    let profile = NullProfile;
    let session = fast_session();

    let result = extract_chapter(&url, &|| false, &config, &session, &profile).await;
    assert_eq!(result.unwrap_err(), ChapterError::ChapterNotFound);
}

#[tokio::test]
async fn successful_fetch_cleans_prose_and_selects_title() {
    let body = r#"<html><body>
        <h1 class="chapter-title">Chapter 3: The Crossing</h1>
        <div class="chapter-content">
            <p>The caravan crossed the river at dawn, mist rising off the water.</p>
            <p>Next Chapter</p>
            <p>Translator: Mei Editor: Jun</p>
        </div>
    </body></html>"#;
    let base = common::spawn_mock_server(200, body).await;
    let url = format!("{base}/b/a/chapter-3");

    let config = Config::builder("127.0.0.1").build();
    let profile = NullProfile;
    let session = fast_session();

    let ChapterExtraction { title, cleaned_text } =
        extract_chapter(&url, &|| false, &config, &session, &profile)
            .await
            .unwrap();

    assert_eq!(title, "The Crossing");
    assert!(cleaned_text.contains("The caravan crossed the river at dawn"));
    assert!(!cleaned_text.to_lowercase().contains("translator"));
    assert!(!cleaned_text.contains("Next Chapter"));
}

#[tokio::test]
async fn cancellation_before_first_request_is_honored() {
    let base = common::spawn_mock_server(200, "<html></html>").await;
    let url = format!("{base}/b/a/chapter-1");

    let config = Config::builder("127.0.0.1").build();
    let profile = NullProfile;
    let session = fast_session();

    let result = extract_chapter(&url, &|| true, &config, &session, &profile).await;
    assert_eq!(result.unwrap_err(), ChapterError::Cancelled);
}
