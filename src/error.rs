//! Crate-wide error type aggregating every component's failure modes.

use miette::Diagnostic;
use thiserror::Error;

use crate::audit::AuditError;
use crate::blacklist::BlacklistError;
use crate::config::ConfigError;
use crate::detector::DetectorError;

/// Top-level error type for fallible [`crate::Gateway`] operations.
///
/// Most call sites never see this directly — the orchestrator (C6) traps
/// internal failures and converts them into a safe fallback verdict
/// instead of propagating an error to the caller. This type exists for the
/// boundary operations that *can* fail outright: configuration loading and
/// blacklist replacement.
#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum GatewayError {
    /// Configuration could not be loaded or failed validation.
    #[error("configuration error: {0}")]
    #[diagnostic(code(contentgate::config))]
    Config(#[from] ConfigError),

    /// The blacklist rejected a replacement because a pattern failed to
    /// compile.
    #[error("blacklist error: {0}")]
    #[diagnostic(code(contentgate::blacklist))]
    Blacklist(#[from] BlacklistError),

    /// A detector adapter could not be constructed or registered.
    #[error("detector error: {0}")]
    #[diagnostic(code(contentgate::detector))]
    Detector(#[from] DetectorError),

    /// The durable counter or audit stream could not be read or written.
    #[error("audit error: {0}")]
    #[diagnostic(code(contentgate::audit))]
    Audit(#[from] AuditError),

    /// A check request was structurally invalid (e.g. empty text).
    #[error("invalid request: {reason}")]
    #[diagnostic(code(contentgate::bad_request))]
    BadRequest {
        /// Human-readable explanation.
        reason: String,
    },
}

/// Convenience alias for gateway operations.
pub type Result<T, E = GatewayError> = std::result::Result<T, E>;
