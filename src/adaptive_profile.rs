//! Adaptive per-host profile, specified at interface level only.
//!
//! The core never reads or writes the collaborator's storage: a narrow seam
//! with exactly one production implementor and one test stub.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

/// The three operations the orchestrator and chapter extractor call. A
/// `SiteProfile` record lives entirely on the implementor's side; the core
/// never inspects its storage format.
pub trait AdaptiveProfile: Send + Sync {
    /// Returns the strategy order for `host`; an empty vec means "use the
    /// default [js, ajax, browser] order".
    fn optimal_order(&self, host: &str) -> Vec<String>;

    /// Records one strategy attempt's outcome.
    fn update(&self, host: &str, strategy: &str, success: bool, response_time: Duration);

    /// Extra CSS selectors to try before the chapter extractor's generic
    /// content-selector list, learned from past successful extractions on
    /// this host.
    fn learned_selectors(&self, host: &str) -> Vec<String>;
}

/// Always returns the default order and no learned selectors; `update` is a
/// no-op. Lets the orchestrator run with no caller-supplied collaborator.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProfile;

impl AdaptiveProfile for NullProfile {
    fn optimal_order(&self, _host: &str) -> Vec<String> {
        Vec::new()
    }

    fn update(&self, _host: &str, _strategy: &str, _success: bool, _response_time: Duration) {}

    fn learned_selectors(&self, _host: &str) -> Vec<String> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Default)]
struct HostRecord {
    /// success_count, attempt_count per strategy name.
    success_rate: HashMap<String, (u32, u32)>,
    selectors: Vec<String>,
}

/// `parking_lot::Mutex`-guarded in-memory stand-in for a persisted profile
/// store, used by the test suite in place of a real durability layer.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProfile {
    hosts: Arc<Mutex<HashMap<String, HostRecord>>>,
}

impl InMemoryProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_selector(&self, host: &str, selector: &str) {
        let mut hosts = self.hosts.lock();
        let rec = hosts.entry(host.to_string()).or_default();
        if !rec.selectors.iter().any(|s| s == selector) {
            rec.selectors.push(selector.to_string());
            // Bounded to the top ~20 learned selectors per host.
            if rec.selectors.len() > 20 {
                rec.selectors.remove(0);
            }
        }
    }
}

impl AdaptiveProfile for InMemoryProfile {
    fn optimal_order(&self, host: &str) -> Vec<String> {
        let hosts = self.hosts.lock();
        let Some(rec) = hosts.get(host) else {
            return Vec::new();
        };
        let mut scored: Vec<(&String, f64)> = rec
            .success_rate
            .iter()
            .map(|(name, (s, a))| {
                let rate = if *a == 0 { 0.0 } else { *s as f64 / *a as f64 };
                (name, rate)
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
        scored.into_iter().map(|(name, _)| name.clone()).collect()
    }

    fn update(&self, host: &str, strategy: &str, success: bool, _response_time: Duration) {
        let mut hosts = self.hosts.lock();
        let rec = hosts.entry(host.to_string()).or_default();
        let entry = rec.success_rate.entry(strategy.to_string()).or_insert((0, 0));
        entry.1 += 1;
        if success {
            entry.0 += 1;
        }
    }

    fn learned_selectors(&self, host: &str) -> Vec<String> {
        self.hosts
            .lock()
            .get(host)
            .map(|rec| rec.selectors.clone())
            .unwrap_or_default()
    }
}
