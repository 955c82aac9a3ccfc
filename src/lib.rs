//! Two public entry points: [`fetch_listing`] resolves a table-of-contents
//! URL into an ordered set of chapter URLs; [`extract_chapter`] turns a
//! chapter URL into TTS-ready prose. Everything else in this crate is a
//! collaborator the two entry points assemble on every call.

pub mod adaptive_profile;
pub mod browser_setup;
pub mod chapter_extractor;
pub mod classify;
pub mod config;
pub mod error;
pub mod host_session;
pub mod orchestrator;
pub mod pagination;
pub mod strategies;
pub mod text_cleaner;
pub mod url_utils;

pub use adaptive_profile::{AdaptiveProfile, InMemoryProfile, NullProfile};
pub use chapter_extractor::ChapterExtraction;
pub use config::{Config, ConfigBuilder};
pub use error::{ChapterError, ListingError};
pub use host_session::HostSession;
pub use orchestrator::{ListingMetadata, ListingResult};
pub use pagination::{PaginationVerdict, SuggestedAction, Verdict};
pub use url_utils::ChapterUrl;

/// Resolves `toc_url` into a complete, ordered set of chapter URLs.
///
/// Builds its own [`HostSession`] for the run, tries strategies in the
/// order [`AdaptiveProfile::optimal_order`] supplies (or the default
/// JS-mining → AJAX-replay → browser-automation order), and applies the
/// pagination/completeness accept gate after every attempt. `should_stop`
/// is polled, never thrown, between suspension points.
pub async fn fetch_listing(
    toc_url: &str,
    min_chapter_required: Option<u32>,
    max_chapter_required: Option<u32>,
    should_stop: &(dyn Fn() -> bool + Send + Sync),
    config: &Config,
    profile: &dyn AdaptiveProfile,
) -> Result<ListingResult, ListingError> {
    orchestrator::fetch_listing(
        toc_url,
        min_chapter_required,
        max_chapter_required,
        should_stop,
        config,
        profile,
    )
    .await
}

/// Extracts cleaned, TTS-safe prose and a title from a single chapter URL.
///
/// Tries the HTTP path first, falling back to a headless browser on a 403
/// that doesn't look like a removal notice, or on any transport failure.
pub async fn extract_chapter(
    url: &str,
    should_stop: &(dyn Fn() -> bool + Send + Sync),
    config: &Config,
    session: &HostSession,
    profile: &dyn AdaptiveProfile,
) -> Result<ChapterExtraction, ChapterError> {
    chapter_extractor::extract_chapter(url, should_stop, config, session, profile).await
}
