//! The conflict resolver (C5): combines detector results into a single
//! verdict.
//!
//! Grounded on `examples/original_source/src/core/category_manager.py`.
//! Precedence: two-detector specialisation (when exactly one `Primary` and
//! one `Secondary` role are present) beats consensus, which beats the
//! configurable fallback strategy.

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::config::ConflictStrategy;
use crate::detector::{DetectorResult, DetectorRole};

/// Which rule produced a [`Resolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    /// No detectors ran at all.
    NoGuards,
    /// Both specialised detectors reported safe.
    BothSafe,
    /// Primary safe, secondary unsafe — interpreted as injection-style
    /// evasion of the richer-taxonomy detector.
    PrimarySafeSecondaryUnsafe,
    /// Primary unsafe, secondary safe — primary's category wins.
    PrimaryUnsafeSecondarySafe,
    /// Both unsafe and disagree — primary's category wins.
    BothUnsafeUsePrimary,
    /// Every detector agreed on one category.
    Consensus,
    /// The highest-severity category won on a tie-break.
    HighestSeverity,
    /// A strict majority of detectors agreed.
    Majority,
    /// The first non-safe detector result won.
    FirstUnsafe,
}

/// The outcome of resolving a set of detector results into one verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    /// The winning category.
    pub final_category: Category,
    /// `true` when `final_category` is [`Category::Safe`].
    pub final_is_safe: bool,
    /// Which rule produced this resolution.
    pub method: ResolutionMethod,
    /// Categories that lost out to `final_category`.
    pub conflicting_categories: Vec<Category>,
    /// The detector id whose category/reason was selected, if the method
    /// defers to one specific detector.
    pub selected_detector_id: Option<String>,
    /// A human-readable reason. For methods that defer to one detector,
    /// this is that detector's own reason, copied verbatim (sanitized
    /// later by C7).
    pub reason: String,
}

/// Resolve a list of detector results into a single [`Resolution`] using
/// only the generic strategies (consensus, then the configurable
/// fallback). Role-agnostic — callers that know each result's
/// [`DetectorRole`] should use [`resolve_with_roles`] instead so the
/// two-detector specialisation table (§4.5) gets a chance to apply.
///
/// Empty input yields `unknown_unsafe` with method [`ResolutionMethod::NoGuards`],
/// matching the source's behaviour of treating "no guard opinions" as
/// worth flagging rather than silently safe.
#[must_use]
pub fn resolve(results: &[DetectorResult], strategy: ConflictStrategy) -> Resolution {
    if results.is_empty() {
        return Resolution {
            final_category: Category::UnknownUnsafe,
            final_is_safe: false,
            method: ResolutionMethod::NoGuards,
            conflicting_categories: Vec::new(),
            selected_detector_id: None,
            reason: "No detector results available".to_string(),
        };
    }

    if let Some(resolution) = resolve_consensus(results) {
        return resolution;
    }

    match strategy {
        ConflictStrategy::HighestSeverity => resolve_highest_severity(results),
        ConflictStrategy::Majority => resolve_majority(results),
        ConflictStrategy::FirstUnsafe => resolve_first_unsafe(results),
    }
}

fn resolve_consensus(results: &[DetectorResult]) -> Option<Resolution> {
    let first = results[0].unified;
    if results.iter().all(|r| r.unified == first) {
        return Some(Resolution {
            final_category: first,
            final_is_safe: first.is_safe(),
            method: ResolutionMethod::Consensus,
            conflicting_categories: Vec::new(),
            selected_detector_id: None,
            reason: format!("All guards agree: {}", first.description()),
        });
    }
    None
}

fn resolve_highest_severity(results: &[DetectorResult]) -> Resolution {
    let winner_idx = results
        .iter()
        .enumerate()
        .max_by_key(|(idx, r)| (r.unified.severity(), std::cmp::Reverse(*idx)))
        .map(|(idx, _)| idx)
        .expect("results is non-empty");

    let winner = &results[winner_idx];
    let conflicting: Vec<Category> = results
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != winner_idx)
        .map(|(_, r)| r.unified)
        .collect();

    let reason = if conflicting.is_empty() {
        winner.unified.description().to_string()
    } else {
        format!(
            "Multiple detections - selected highest severity: {}",
            winner.unified.description()
        )
    };

    Resolution {
        final_category: winner.unified,
        final_is_safe: winner.unified.is_safe(),
        method: ResolutionMethod::HighestSeverity,
        conflicting_categories: conflicting,
        selected_detector_id: Some(winner.detector_id.clone()),
        reason,
    }
}

fn resolve_majority(results: &[DetectorResult]) -> Resolution {
    use std::collections::HashMap;

    let mut counts: HashMap<Category, usize> = HashMap::new();
    for r in results {
        *counts.entry(r.unified).or_insert(0) += 1;
    }

    let mut tallied: Vec<(Category, usize)> = counts.into_iter().collect();
    tallied.sort_by(|a, b| b.1.cmp(&a.1));

    let has_majority = match tallied.as_slice() {
        [(_, top), (_, second), ..] => top > second,
        [_] => true,
        [] => false,
    };

    if !has_majority {
        return resolve_highest_severity(results);
    }

    let winner = tallied[0].0;
    let conflicting: Vec<Category> = results
        .iter()
        .map(|r| r.unified)
        .filter(|c| *c != winner)
        .collect();

    Resolution {
        final_category: winner,
        final_is_safe: winner.is_safe(),
        method: ResolutionMethod::Majority,
        conflicting_categories: conflicting,
        selected_detector_id: None,
        reason: format!("Majority of guards agree: {}", winner.description()),
    }
}

fn resolve_first_unsafe(results: &[DetectorResult]) -> Resolution {
    if let Some(first_unsafe) = results.iter().find(|r| !r.clean) {
        let conflicting: Vec<Category> = results
            .iter()
            .map(|r| r.unified)
            .filter(|c| *c != first_unsafe.unified)
            .collect();
        return Resolution {
            final_category: first_unsafe.unified,
            final_is_safe: false,
            method: ResolutionMethod::FirstUnsafe,
            conflicting_categories: conflicting,
            selected_detector_id: Some(first_unsafe.detector_id.clone()),
            reason: format!("First unsafe detection: {}", first_unsafe.unified.description()),
        };
    }

    Resolution {
        final_category: Category::Safe,
        final_is_safe: true,
        method: ResolutionMethod::FirstUnsafe,
        conflicting_categories: Vec::new(),
        selected_detector_id: None,
        reason: Category::Safe.description().to_string(),
    }
}

/// Resolve results paired with the role of the adapter that produced
/// them. This is the entry point the orchestrator actually uses; [`resolve`]
/// is kept public and role-agnostic for direct unit testing of the
/// generic strategies.
#[must_use]
pub fn resolve_with_roles(
    results: &[(DetectorRole, DetectorResult)],
    strategy: ConflictStrategy,
) -> Resolution {
    if results.len() == 2 {
        let (role_a, a) = &results[0];
        let (role_b, b) = &results[1];
        let pair = match (role_a, role_b) {
            (DetectorRole::Primary, DetectorRole::Secondary) => Some((a, b)),
            (DetectorRole::Secondary, DetectorRole::Primary) => Some((b, a)),
            _ => None,
        };
        if let Some((primary, secondary)) = pair {
            return resolve_two_pair(primary, secondary);
        }
    }

    let plain: Vec<DetectorResult> = results.iter().map(|(_, r)| r.clone()).collect();
    resolve(&plain, strategy)
}

fn resolve_two_pair(primary: &DetectorResult, secondary: &DetectorResult) -> Resolution {
    match (primary.clean, secondary.clean) {
        (true, true) => Resolution {
            final_category: Category::Safe,
            final_is_safe: true,
            method: ResolutionMethod::BothSafe,
            conflicting_categories: Vec::new(),
            selected_detector_id: None,
            reason: "Both guards agree: Content is safe".to_string(),
        },
        (true, false) => Resolution {
            final_category: Category::PromptInjection,
            final_is_safe: false,
            method: ResolutionMethod::PrimarySafeSecondaryUnsafe,
            conflicting_categories: vec![primary.unified, secondary.unified],
            selected_detector_id: None,
            reason: "Prompt injection detected: primary analyzer safe, secondary checker unsafe"
                .to_string(),
        },
        (false, true) => Resolution {
            final_category: primary.unified,
            final_is_safe: false,
            method: ResolutionMethod::PrimaryUnsafeSecondarySafe,
            conflicting_categories: vec![secondary.unified],
            selected_detector_id: Some(primary.detector_id.clone()),
            reason: primary.reason.clone(),
        },
        (false, false) => {
            let conflicting = if primary.unified != secondary.unified {
                vec![secondary.unified]
            } else {
                Vec::new()
            };
            Resolution {
                final_category: primary.unified,
                final_is_safe: false,
                method: ResolutionMethod::BothUnsafeUsePrimary,
                conflicting_categories: conflicting,
                selected_detector_id: Some(primary.detector_id.clone()),
                reason: primary.reason.clone(),
            }
        }
    }
}
