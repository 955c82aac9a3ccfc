//! Pagination / completeness detector: infers whether a proposed
//! chapter-URL set is truncated. Six ordered rules run in sequence and the
//! first to match wins: a hard count signature, a soft common-limit count,
//! a range shortfall against the requested chapter range, insufficient
//! in-range coverage, suspiciously regular numbering gaps, and finally a
//! default "complete" verdict.

use crate::config::Config;
use crate::url_utils::extract_chapter_number;

/// The detector's structured opinion about whether a URL set is truncated,
/// with a confidence score and a suggested next action.
#[derive(Debug, Clone, PartialEq)]
pub enum PaginationVerdict {
    Complete,
    SuspectedPaginatedCommonLimit(u32),
    SuspectedPaginatedIncompleteRange { needed: u32, have: u32 },
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestedAction {
    UseBrowser,
    Accept,
    GiveUp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub verdict: PaginationVerdict,
    pub confidence: f64,
    pub suggested_action: SuggestedAction,
}

/// Runs the six ordered completeness rules against `urls`.
pub fn analyze(
    urls: &[String],
    min_chapter_required: Option<u32>,
    max_chapter_required: Option<u32>,
    config: &Config,
) -> Verdict {
    let mut numbers: Vec<u32> = urls.iter().filter_map(|u| extract_chapter_number(u)).collect();
    numbers.sort_unstable();
    numbers.dedup();

    let count = urls.len() as u32;
    let max_num = numbers.last().copied();

    // Rule 1: hard signature.
    if count == config.detector_critical_limit {
        return Verdict {
            verdict: PaginationVerdict::SuspectedPaginatedCommonLimit(config.detector_critical_limit),
            confidence: 0.95,
            suggested_action: SuggestedAction::UseBrowser,
        };
    }

    // Rule 2: soft signatures.
    if config.detector_common_limits.contains(&count) && max_num == Some(count) {
        return Verdict {
            verdict: PaginationVerdict::SuspectedPaginatedCommonLimit(count),
            confidence: 0.85,
            suggested_action: SuggestedAction::UseBrowser,
        };
    }

    // Rule 3: range shortfall.
    if let Some(min_req) = min_chapter_required {
        let max_found = max_num.unwrap_or(0);
        if max_found < min_req {
            return Verdict {
                verdict: PaginationVerdict::SuspectedPaginatedIncompleteRange {
                    needed: min_req,
                    have: max_found,
                },
                confidence: 0.9,
                suggested_action: SuggestedAction::UseBrowser,
            };
        }
    }

    // Rule 4: range coverage.
    if let (Some(min_req), Some(max_req)) = (min_chapter_required, max_chapter_required)
        && min_req <= max_req
    {
        let span = (max_req - min_req + 1) as f64;
        let present = numbers.iter().filter(|&&n| n >= min_req && n <= max_req).count() as f64;
        let coverage = if span > 0.0 { present / span } else { 1.0 };
        if coverage < config.detector_range_coverage_threshold {
            return Verdict {
                verdict: PaginationVerdict::SuspectedPaginatedIncompleteRange {
                    needed: max_req,
                    have: present as u32,
                },
                confidence: 0.8,
                suggested_action: SuggestedAction::UseBrowser,
            };
        }
    }

    // Rule 5: regularity.
    if numbers.len() >= 20 {
        let diffs: Vec<f64> = numbers
            .windows(2)
            .map(|w| (w[1] - w[0]) as f64)
            .collect();
        let avg = diffs.iter().sum::<f64>() / diffs.len() as f64;
        if (5.0..=20.0).contains(&avg) {
            let variance =
                diffs.iter().map(|d| (d - avg).powi(2)).sum::<f64>() / diffs.len() as f64;
            let stddev = variance.sqrt();
            if stddev < 2.0 {
                return Verdict {
                    verdict: PaginationVerdict::Unknown,
                    confidence: 0.5,
                    suggested_action: SuggestedAction::UseBrowser,
                };
            }
        }
    }

    // Rule 6: otherwise complete.
    Verdict {
        verdict: PaginationVerdict::Complete,
        confidence: 0.9,
        suggested_action: SuggestedAction::Accept,
    }
}

/// Coverage check used by the orchestrator's accept gate: if `min_req` is
/// set, `max(chapter_numbers) ≥ min_req`; if both bounds are set, in-range
/// coverage must clear the configured threshold.
pub fn covers_range(
    urls: &[String],
    min_chapter_required: Option<u32>,
    max_chapter_required: Option<u32>,
    config: &Config,
) -> bool {
    let mut numbers: Vec<u32> = urls.iter().filter_map(|u| extract_chapter_number(u)).collect();
    numbers.sort_unstable();

    if let Some(min_req) = min_chapter_required {
        let max_found = numbers.last().copied().unwrap_or(0);
        if max_found < min_req {
            return false;
        }
    }
    if let (Some(min_req), Some(max_req)) = (min_chapter_required, max_chapter_required)
        && min_req <= max_req
    {
        let span = (max_req - min_req + 1) as f64;
        let present = numbers.iter().filter(|&&n| n >= min_req && n <= max_req).count() as f64;
        let coverage = if span > 0.0 { present / span } else { 1.0 };
        if coverage < config.detector_range_coverage_threshold {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapters(n: u32) -> Vec<String> {
        (1..=n)
            .map(|i| format!("https://example.com/chapter-{i}"))
            .collect()
    }

    #[test]
    fn hard_signature_at_55() {
        let cfg = Config::builder("example.com").build();
        let v = analyze(&chapters(55), None, None, &cfg);
        assert_eq!(
            v.verdict,
            PaginationVerdict::SuspectedPaginatedCommonLimit(55)
        );
        assert_eq!(v.suggested_action, SuggestedAction::UseBrowser);
        assert!((v.confidence - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn soft_signature_at_common_limit() {
        let cfg = Config::builder("example.com").build();
        let v = analyze(&chapters(50), None, None, &cfg);
        assert_eq!(
            v.verdict,
            PaginationVerdict::SuspectedPaginatedCommonLimit(50)
        );
    }

    #[test]
    fn range_shortfall_escalates() {
        let cfg = Config::builder("example.com").build();
        let v = analyze(&chapters(46), Some(500), None, &cfg);
        assert_eq!(
            v.verdict,
            PaginationVerdict::SuspectedPaginatedIncompleteRange {
                needed: 500,
                have: 46
            }
        );
    }

    #[test]
    fn complete_small_set_with_no_range_hint() {
        let cfg = Config::builder("example.com").build();
        let v = analyze(&chapters(10), None, None, &cfg);
        assert_eq!(v.verdict, PaginationVerdict::Complete);
        assert_eq!(v.suggested_action, SuggestedAction::Accept);
    }

    #[test]
    fn range_coverage_below_threshold() {
        let cfg = Config::builder("example.com").build();
        let sparse: Vec<String> = vec![1u32, 60, 120, 180, 241]
            .into_iter()
            .map(|i| format!("https://example.com/chapter-{i}"))
            .collect();
        let v = analyze(&sparse, Some(1), Some(241), &cfg);
        assert!(matches!(
            v.verdict,
            PaginationVerdict::SuspectedPaginatedIncompleteRange { .. }
        ));
    }

    #[test]
    fn covers_range_true_when_max_meets_min() {
        let cfg = Config::builder("example.com").build();
        assert!(covers_range(&chapters(12), Some(10), None, &cfg));
        assert!(!covers_range(&chapters(5), Some(10), None, &cfg));
    }
}
