//! The response sanitizer (C7): projects an internal [`Verdict`] onto the
//! public response shape, stripping vendor identifiers.
//!
//! Grounded field-for-field on
//! `examples/original_source/src/api/api.py::_create_sanitized_response`
//! and `_sanitize_reason`.

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::verdict::Verdict;

/// Ordered phrase substitutions applied to a reason string before it
/// reaches a client. Order matters: the literal vendor-name replacements
/// run first, then the phrase collapses (each tested against the
/// already-substituted string, first match wins), mirroring the source's
/// `if`/`elif` chain exactly.
const VENDOR_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("LlamaGuard", "Content analyzer"),
    ("GraniteGuard", "Safety checker"),
    ("llama-guard", "analyzer"),
    ("granite", "checker"),
];

const PHRASE_COLLAPSES: &[(&str, &str)] = &[
    ("Both guards agree", "Content analysis completed successfully"),
    ("Multiple detections", "Content flagged by safety analysis"),
    ("highest severity", "Unsafe content detected"),
    ("Prompt injection detected", "Potential security threat detected"),
    ("defaulting to safe", "Analysis completed with safety fallback"),
];

/// Apply the vendor-stripping, phrase-collapsing substitution table to a
/// raw internal reason string.
#[must_use]
pub fn sanitize_reason(reason: &str) -> String {
    let mut sanitized = reason.to_string();
    for (needle, replacement) in VENDOR_SUBSTITUTIONS {
        sanitized = sanitized.replace(needle, replacement);
    }

    for (needle, replacement) in PHRASE_COLLAPSES {
        if sanitized.contains(needle) {
            return (*replacement).to_string();
        }
    }

    sanitized
}

/// Public-facing category name, distinct from the internal
/// machine-readable [`Category::code`].
fn public_category_name(category: Category) -> &'static str {
    match category {
        Category::Safe => "safe",
        Category::HarmfulPrompt => "harmful_content",
        Category::Jailbreak => "policy_violation",
        Category::PromptInjection => "injection_attempt",
        Category::UnknownUnsafe => "unsafe_content",
    }
}

/// One detector's status in the public `analysis.guards` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardSummary {
    /// `guard_1`, `guard_2`, … — never the real detector id.
    pub guard_id: String,
    /// `"safe"` or `"flagged"`.
    pub status: &'static str,
    /// Always `"normal"` — the source never varies this field.
    pub confidence: &'static str,
    /// Present only when flagged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_type: Option<&'static str>,
}

/// The public `analysis.keyword_filter` summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordSummary {
    /// Whether the pattern filter is enabled.
    pub enabled: bool,
    /// `"safe"` or `"flagged"`.
    pub status: &'static str,
    /// Count only — never the matched literals.
    pub matches_found: usize,
}

/// The public `analysis` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    /// Per-detector summaries, in configured order.
    pub guards: Vec<GuardSummary>,
    /// The pattern filter's summary, or `None` if it did not run.
    pub keyword_filter: Option<KeywordSummary>,
    /// `true` when every guard's status is `"safe"`.
    pub consensus: bool,
}

/// The public verdict shape returned to a client (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicVerdict {
    /// Correlation id for this request.
    pub request_id: String,
    /// `true` when the content is safe.
    pub is_safe: bool,
    /// The public-facing category name.
    pub category: &'static str,
    /// `"high"` unless the verdict came from the fallback path.
    pub confidence: &'static str,
    /// Sanitized human-readable reason.
    pub reason: String,
    /// Per-component analysis summary.
    pub analysis: Analysis,
    /// Wall-clock processing time, rounded to 2 decimal places.
    pub processing_time_ms: f64,
    /// Units processed for this request.
    pub tokens_processed: u64,
    /// Running total across the process lifetime.
    pub total_tokens_processed: u64,
    /// Unix epoch seconds at the time the verdict was produced.
    pub timestamp: i64,
    /// Present only when `fallback_used`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Project an internal [`Verdict`] onto the public response shape.
#[must_use]
pub fn sanitize(
    verdict: &Verdict,
    request_id: String,
    processing_time_ms: f64,
    timestamp: i64,
) -> PublicVerdict {
    let guards: Vec<GuardSummary> = verdict
        .detector_results
        .iter()
        .enumerate()
        .map(|(idx, result)| GuardSummary {
            guard_id: format!("guard_{}", idx + 1),
            status: if result.clean { "safe" } else { "flagged" },
            confidence: "normal",
            detection_type: if result.clean {
                None
            } else {
                Some(public_category_name(result.unified))
            },
        })
        .collect();

    let consensus = guards.iter().all(|g| g.status == "safe");

    let keyword_filter = verdict.pattern_report.as_ref().map(|report| KeywordSummary {
        enabled: true,
        status: if report.clean { "safe" } else { "flagged" },
        matches_found: report.hit_count(),
    });

    let category = if verdict.clean {
        Category::Safe
    } else {
        verdict
            .resolution
            .as_ref()
            .map(|r| r.final_category)
            .unwrap_or(Category::UnknownUnsafe)
    };

    let confidence = if verdict.fallback_used { "medium" } else { "high" };
    let warning = verdict
        .fallback_used
        .then(|| "Result produced via safety fallback; treat with reduced confidence".to_string());

    PublicVerdict {
        request_id,
        is_safe: verdict.clean,
        category: public_category_name(category),
        confidence,
        reason: sanitize_reason(&verdict.reason),
        analysis: Analysis {
            guards,
            keyword_filter,
            consensus,
        },
        processing_time_ms: (processing_time_ms * 100.0).round() / 100.0,
        tokens_processed: verdict.units_in,
        total_tokens_processed: verdict.units_total,
        timestamp,
        warning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::DetectorResult;
    use crate::pattern_filter::{Hit, HitKind, MatchReport};
    use crate::resolver::{Resolution, ResolutionMethod};
    use std::collections::BTreeMap;

    fn base_verdict() -> Verdict {
        Verdict {
            clean: true,
            pattern_report: None,
            detector_results: Vec::new(),
            resolution: None,
            reason: "Content is safe".to_string(),
            stage_times: BTreeMap::new(),
            fallback_used: false,
            units_in: 3,
            units_total: 3,
        }
    }

    #[test]
    fn sanitize_reason_strips_vendor_names() {
        assert_eq!(
            sanitize_reason("LlamaGuard flagged this"),
            "Content analyzer flagged this"
        );
    }

    #[test]
    fn sanitize_reason_collapses_both_safe_phrase() {
        assert_eq!(
            sanitize_reason("Both guards agree: Content is safe"),
            "Content analysis completed successfully"
        );
    }

    #[test]
    fn sanitize_reason_collapses_injection_phrase() {
        assert_eq!(
            sanitize_reason("Prompt injection detected: primary safe, secondary unsafe"),
            "Potential security threat detected"
        );
    }

    #[test]
    fn public_verdict_never_leaks_detector_ids() {
        let mut verdict = base_verdict();
        verdict.clean = false;
        verdict.detector_results.push(DetectorResult {
            clean: false,
            unified: Category::Jailbreak,
            raw: "S13".to_string(),
            reason: "LlamaGuard flagged S13".to_string(),
            detector_id: "llama-guard-prod-cluster".to_string(),
        });
        verdict.resolution = Some(Resolution {
            final_category: Category::Jailbreak,
            final_is_safe: false,
            method: ResolutionMethod::HighestSeverity,
            conflicting_categories: Vec::new(),
            selected_detector_id: Some("llama-guard-prod-cluster".to_string()),
            reason: "Jailbreak attempt detected".to_string(),
        });

        let public = sanitize(&verdict, "req-1".to_string(), 12.3, 1_700_000_000);
        let json = serde_json::to_string(&public).unwrap();
        assert!(!json.contains("llama-guard-prod-cluster"));
        assert_eq!(public.category, "policy_violation");
        assert_eq!(public.analysis.guards[0].guard_id, "guard_1");
    }

    #[test]
    fn keyword_summary_never_leaks_matched_text() {
        let mut verdict = base_verdict();
        verdict.clean = false;
        verdict.pattern_report = Some(MatchReport {
            clean: false,
            reason: "Content contains blacklisted terms".to_string(),
            hits: vec![Hit {
                kind: HitKind::Keyword,
                text: "malware".to_string(),
            }],
        });

        let public = sanitize(&verdict, "req-2".to_string(), 1.0, 1_700_000_000);
        let json = serde_json::to_string(&public).unwrap();
        assert!(!json.contains("malware"));
        assert_eq!(public.analysis.keyword_filter.unwrap().matches_found, 1);
    }

    #[test]
    fn fallback_verdict_has_medium_confidence_and_warning() {
        let verdict = Verdict::fallback("Detector 'guard_1' timed out - defaulting to safe", 5);
        let public = sanitize(&verdict, "req-3".to_string(), 30_000.0, 1_700_000_000);
        assert_eq!(public.confidence, "medium");
        assert!(public.warning.is_some());
        assert_eq!(public.reason, "Analysis completed with safety fallback");
    }
}
