//! Tagged error enums for the two public entry points.
//!
//! Every "optional-with-error" return shape in this crate is a sum type with
//! an enumerated tag, never a sentinel `None` or a stringly-typed reason.
//! Internal plumbing (HTTP client construction, browser launch) still uses
//! `anyhow::Result`; it is converted to one of these tags at the component
//! boundary and never leaks past a public function.

use thiserror::Error;

/// Failure returned by [`crate::fetch_listing`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListingError {
    /// `toc_url` did not parse, or was not `http`/`https`.
    #[error("invalid TOC url")]
    InvalidUrl,
    /// Every strategy returned zero URLs.
    #[error("all strategies returned no chapter urls")]
    AllStrategiesEmpty,
    /// `should_stop()` fired before any strategy accepted.
    #[error("cancelled")]
    Cancelled,
}

/// Failure returned by [`crate::extract_chapter`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChapterError {
    #[error("chapter not found")]
    ChapterNotFound,
    #[error("chapter removed by site")]
    Removed,
    #[error("anti-bot interstitial not bypassed")]
    AntiBotNotBypassed,
    #[error("container found but cleaned text was empty")]
    NoContent,
    #[error("transport failure: {0}")]
    TransportFailure(String),
    #[error("cancelled")]
    Cancelled,
}
