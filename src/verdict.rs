//! The internal verdict record (§3) produced by the orchestrator (C6) and
//! consumed by the sanitizer (C7) and the audit logger (C8).

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::detector::DetectorResult;
use crate::pattern_filter::MatchReport;
use crate::resolver::Resolution;

/// The full internal verdict for one check — never exposed to a client
/// directly; always projected through [`crate::sanitizer::sanitize`] first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    /// `true` when the content is safe.
    pub clean: bool,
    /// The pattern filter's report, if it ran.
    pub pattern_report: Option<MatchReport>,
    /// Every detector's result, in configured order.
    pub detector_results: Vec<DetectorResult>,
    /// The conflict resolver's output, if detectors ran.
    pub resolution: Option<Resolution>,
    /// The final human-readable reason (pre-sanitization).
    pub reason: String,
    /// Per-stage wall-clock durations, keyed by stage name.
    pub stage_times: BTreeMap<String, Duration>,
    /// `true` when any part of this verdict came from the safe fallback
    /// path rather than a completed pipeline run.
    pub fallback_used: bool,
    /// Units of work processed for this check.
    pub units_in: u64,
    /// Running total after this check.
    pub units_total: u64,
}

impl Verdict {
    /// Build the canonical safe-fallback verdict used whenever the
    /// pipeline cannot complete normally (deadline expiry, uncaught
    /// error). Grounded on
    /// `examples/original_source/src/core/firewall.py::_create_safe_fallback_result`.
    #[must_use]
    pub fn fallback(reason: impl Into<String>, units_total: u64) -> Self {
        Self {
            clean: true,
            pattern_report: None,
            detector_results: Vec::new(),
            resolution: None,
            reason: reason.into(),
            stage_times: BTreeMap::new(),
            fallback_used: true,
            units_in: 0,
            units_total,
        }
    }
}
