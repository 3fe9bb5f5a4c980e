//! Detector adapters (C3): the uniform contract wrapping one external,
//! model-backed classifier.
//!
//! Every adapter is fail-open by construction — [`DetectorAdapter::inspect`]
//! never returns an `Err`. Timeouts and backend errors are translated into
//! a `safe` [`DetectorResult`] with a `raw` label of `"timeout"` or
//! `"error"` so the failure is still visible in the audit trail (§4.3/§7).

mod backend;
mod primary;
mod registry;
mod secondary;

pub use backend::{Backend, BackendError, StaticBackend};
pub use primary::PrimaryAdapter;
pub use registry::{DetectorFactory, DetectorRegistry};
pub use secondary::SecondaryAdapter;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// A detector's stable role for two-detector specialisation (§4.5).
///
/// Grounded on `category_manager.py::_resolve_two_guard_conflicts`'s
/// primary/secondary distinction, but keyed on a configured tag instead of
/// substring-matching a model name (DESIGN.md OQ2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DetectorRole {
    /// The richer-taxonomy adapter (the source's "LlamaGuard"-equivalent).
    Primary,
    /// The coarser safe/unsafe adapter (the source's "GraniteGuard"-equivalent).
    Secondary,
    /// No specialised role; only generic strategies apply.
    #[default]
    Unspecified,
}

/// Errors raised while constructing or registering a detector adapter.
///
/// Distinct from detector *inspection* failures, which are always
/// recovered internally — this covers configuration-time problems only.
#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    /// The configured detector type has no known implementation.
    #[error("unknown detector type: {detector_type}")]
    UnknownType {
        /// The unrecognised type tag.
        detector_type: String,
    },
}

/// The outcome of one detector's inspection of a piece of text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorResult {
    /// `true` when the detector found nothing unsafe.
    pub clean: bool,
    /// The unified category this result maps to.
    pub unified: Category,
    /// The detector's own raw label (vendor-specific; never exposed
    /// publicly — see the sanitizer, C7).
    pub raw: String,
    /// A human-readable reason, possibly mentioning the vendor — sanitized
    /// before it reaches a client.
    pub reason: String,
    /// Stable identifier for this detector instance (not a vendor name).
    pub detector_id: String,
}

impl DetectorResult {
    /// Build the canonical fail-open result used for timeouts.
    #[must_use]
    pub fn timeout(detector_id: impl Into<String>) -> Self {
        let detector_id = detector_id.into();
        Self {
            clean: true,
            unified: Category::Safe,
            raw: "timeout".to_string(),
            reason: format!("Detector '{detector_id}' timed out - defaulting to safe"),
            detector_id,
        }
    }

    /// Build the canonical fail-open result used for backend errors.
    #[must_use]
    pub fn error(detector_id: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        let detector_id = detector_id.into();
        Self {
            clean: true,
            unified: Category::Safe,
            raw: "error".to_string(),
            reason: format!("Detector '{detector_id}' error - defaulting to safe: {detail}"),
            detector_id,
        }
    }
}

/// The uniform contract every detector adapter implements.
///
/// Implementations are expected to be cheap to share across concurrent
/// checks (internally `Arc`-wrapped backends, no per-call allocation of
/// state beyond the request itself).
#[async_trait]
pub trait DetectorAdapter: Send + Sync {
    /// Stable identifier exposed in audit lines and, sanitized, in public
    /// responses as `guard_N`.
    fn id(&self) -> &str;

    /// This adapter's role for two-detector specialisation.
    fn role(&self) -> DetectorRole {
        DetectorRole::Unspecified
    }

    /// One-shot liveness probe performed at construction time.
    ///
    /// A probe failure does not prevent the adapter from being registered
    /// — it only gets logged, matching the source's "continue without it"
    /// initialization discipline.
    async fn init(&self) -> Result<(), DetectorError> {
        Ok(())
    }

    /// Inspect `text`, giving up after `deadline` elapses.
    ///
    /// Never returns an error: timeouts and backend failures are
    /// translated into [`DetectorResult::timeout`]/[`DetectorResult::error`].
    async fn inspect(&self, text: &str, deadline: Duration) -> DetectorResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_result_is_fail_open() {
        let r = DetectorResult::timeout("guard-1");
        assert!(r.clean);
        assert_eq!(r.unified, Category::Safe);
        assert_eq!(r.raw, "timeout");
    }

    #[test]
    fn error_result_is_fail_open() {
        let r = DetectorResult::error("guard-2", "connection refused");
        assert!(r.clean);
        assert_eq!(r.raw, "error");
        assert!(r.reason.contains("connection refused"));
    }

    #[test]
    fn default_role_is_unspecified() {
        #[derive(Default)]
        struct Dummy;
        #[async_trait]
        impl DetectorAdapter for Dummy {
            fn id(&self) -> &str {
                "dummy"
            }
            async fn inspect(&self, _text: &str, _deadline: Duration) -> DetectorResult {
                DetectorResult {
                    clean: true,
                    unified: Category::Safe,
                    raw: "safe".into(),
                    reason: "ok".into(),
                    detector_id: "dummy".into(),
                }
            }
        }
        assert_eq!(Dummy.role(), DetectorRole::Unspecified);
    }
}
