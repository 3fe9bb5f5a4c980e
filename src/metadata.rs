//! Optional per-request metadata threaded through to the audit line.
//!
//! Narrower than the teacher's `SecurityContext` (no session/delegation
//! machinery — see DESIGN.md Simplifications): just the fields the audit
//! record actually carries.

use serde::{Deserialize, Serialize};

/// Caller-supplied context for one check, attached to its audit line.
///
/// All fields are optional since the embedding HTTP layer (out of scope)
/// may not always have them available.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestMetadata {
    /// Client IP or similar network identifier.
    pub client_id: Option<String>,
    /// The `User-Agent`-style string, if any.
    pub user_agent: Option<String>,
    /// A correlation id for this request; generated if not supplied.
    pub request_id: Option<String>,
}

impl RequestMetadata {
    /// An empty, field-less metadata value.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }
}
