//! The three extraction strategies the orchestrator tries in order.

pub mod ajax_replay;
pub mod browser_automation;
pub mod js_mining;

/// Outcome of running one strategy: the candidate chapter URLs it produced.
/// Strategies never raise; every failure mode collapses to an empty vec,
/// logged at `debug!` rather than surfaced as an error.
pub type StrategyResult = Vec<String>;

/// Canonical strategy names used in orchestrator metadata and the adaptive
/// profile's `optimal_order`/`update` calls.
pub const JS_MINING: &str = "js";
pub const AJAX_REPLAY: &str = "ajax";
pub const BROWSER_AUTOMATION: &str = "browser";
