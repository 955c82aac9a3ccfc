//! Runtime configuration, built with a typestate builder.
//!
//! A marker-typed builder that only compiles a `.build()` call once the
//! mandatory fields have been supplied. This crate has exactly one
//! mandatory field (`base_host`), so the typestate collapses to a single
//! `Ready` state.

use std::collections::HashSet;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

/// Every tunable knob for the listing and chapter pipelines, with defaults
/// chosen to behave politely against an unfamiliar host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Host that every returned chapter URL must match.
    pub base_host: String,
    pub request_timeout_sec: u64,
    pub request_min_delay_sec: f64,
    pub request_max_retries: u32,
    pub browser_headless: bool,
    pub browser_nav_timeout_sec: u64,
    pub browser_scroll_max_iterations: u32,
    pub browser_scroll_no_change_patience: u32,
    pub browser_pagination_max_pages: u32,
    pub detector_common_limits: HashSet<u32>,
    pub detector_critical_limit: u32,
    pub detector_range_coverage_threshold: f64,
    pub cleaner_preserve_ellipsis: bool,
}

impl Config {
    /// Start building a config for `base_host`.
    pub fn builder(base_host: impl Into<String>) -> ConfigBuilder<Ready> {
        ConfigBuilder {
            inner: Config::defaults(base_host.into()),
            _state: PhantomData,
        }
    }

    fn defaults(base_host: String) -> Self {
        Self {
            base_host,
            request_timeout_sec: 30,
            request_min_delay_sec: 4.0,
            request_max_retries: 3,
            browser_headless: true,
            browser_nav_timeout_sec: 30,
            browser_scroll_max_iterations: 1000,
            browser_scroll_no_change_patience: 30,
            browser_pagination_max_pages: 200,
            detector_common_limits: [20, 25, 30, 40, 50, 100, 200].into_iter().collect(),
            detector_critical_limit: 55,
            detector_range_coverage_threshold: 0.8,
            cleaner_preserve_ellipsis: true,
        }
    }
}

/// Typestate marker: the only mandatory field is already set, `.build()` is
/// callable immediately. Kept as a distinct type (rather than building
/// `Config` directly) so a future mandatory field can introduce an
/// intermediate state without breaking callers.
pub struct Ready;

pub struct ConfigBuilder<State> {
    inner: Config,
    _state: PhantomData<State>,
}

impl ConfigBuilder<Ready> {
    pub fn request_timeout_sec(mut self, v: u64) -> Self {
        self.inner.request_timeout_sec = v;
        self
    }

    pub fn request_min_delay_sec(mut self, v: f64) -> Self {
        self.inner.request_min_delay_sec = v;
        self
    }

    pub fn request_max_retries(mut self, v: u32) -> Self {
        self.inner.request_max_retries = v;
        self
    }

    pub fn browser_headless(mut self, v: bool) -> Self {
        self.inner.browser_headless = v;
        self
    }

    pub fn browser_nav_timeout_sec(mut self, v: u64) -> Self {
        self.inner.browser_nav_timeout_sec = v;
        self
    }

    pub fn browser_scroll_max_iterations(mut self, v: u32) -> Self {
        self.inner.browser_scroll_max_iterations = v;
        self
    }

    pub fn browser_scroll_no_change_patience(mut self, v: u32) -> Self {
        self.inner.browser_scroll_no_change_patience = v;
        self
    }

    pub fn browser_pagination_max_pages(mut self, v: u32) -> Self {
        self.inner.browser_pagination_max_pages = v;
        self
    }

    pub fn detector_common_limits(mut self, v: HashSet<u32>) -> Self {
        self.inner.detector_common_limits = v;
        self
    }

    pub fn detector_critical_limit(mut self, v: u32) -> Self {
        self.inner.detector_critical_limit = v;
        self
    }

    pub fn detector_range_coverage_threshold(mut self, v: f64) -> Self {
        self.inner.detector_range_coverage_threshold = v;
        self
    }

    pub fn cleaner_preserve_ellipsis(mut self, v: bool) -> Self {
        self.inner.cleaner_preserve_ellipsis = v;
        self
    }

    pub fn build(self) -> Config {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_stable() {
        let cfg = Config::builder("example.com").build();
        assert_eq!(cfg.base_host, "example.com");
        assert_eq!(cfg.request_timeout_sec, 30);
        assert_eq!(cfg.request_max_retries, 3);
        assert_eq!(cfg.detector_critical_limit, 55);
        assert!((cfg.detector_range_coverage_threshold - 0.8).abs() < f64::EPSILON);
        assert!(cfg.detector_common_limits.contains(&55) == false);
        assert!(cfg.detector_common_limits.contains(&20));
    }

    #[test]
    fn builder_overrides_apply() {
        let cfg = Config::builder("example.com")
            .request_max_retries(5)
            .browser_headless(false)
            .build();
        assert_eq!(cfg.request_max_retries, 5);
        assert!(!cfg.browser_headless);
    }
}
