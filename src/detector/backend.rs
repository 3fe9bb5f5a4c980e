//! The pluggable backend behind a detector adapter.
//!
//! The wire protocol to an actual external model is explicitly out of
//! scope for this crate (SPEC_FULL §1) — `Backend` is the seam an embedder
//! implements to talk to whatever classifier they run. [`StaticBackend`] is
//! the in-crate implementation used by tests and as a ready-to-run
//! default: it classifies by simple keyword heuristics instead of a real
//! network call.

use async_trait::async_trait;

/// Errors a [`Backend`] may report; adapters translate both into the
/// standard fail-open [`super::DetectorResult::error`].
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The backend could not be reached at all.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    /// The backend replied with something the adapter could not use.
    #[error("backend error: {0}")]
    Other(String),
}

/// A source of raw classification replies for one detector adapter.
///
/// `query` returns the backend's raw reply string, unparsed — each
/// adapter applies its own grammar to that string (see `primary.rs`,
/// `secondary.rs`).
#[async_trait]
pub trait Backend: Send + Sync {
    /// Issue a trivial request to confirm the backend is reachable.
    async fn probe(&self) -> Result<(), BackendError> {
        Ok(())
    }

    /// Classify `text`, returning the backend's raw reply.
    async fn query(&self, text: &str) -> Result<String, BackendError>;
}

/// A heuristic, no-network [`Backend`] used for testing and as the
/// zero-configuration default.
///
/// Classification function receives the submitted text and returns the
/// raw label a real backend would have replied with.
pub struct StaticBackend {
    classify: Box<dyn Fn(&str) -> String + Send + Sync>,
}

impl StaticBackend {
    /// Build a backend from a classification function.
    pub fn new(classify: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self {
            classify: Box::new(classify),
        }
    }

    /// A backend that always replies `"safe"`.
    #[must_use]
    pub fn always_safe() -> Self {
        Self::new(|_| "safe".to_string())
    }

    /// A backend that always replies with the given raw label.
    #[must_use]
    pub fn constant(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self::new(move |_| raw.clone())
    }
}

#[async_trait]
impl Backend for StaticBackend {
    async fn query(&self, text: &str) -> Result<String, BackendError> {
        Ok((self.classify)(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_safe_backend_replies_safe() {
        let backend = StaticBackend::always_safe();
        assert_eq!(backend.query("anything").await.unwrap(), "safe");
    }

    #[tokio::test]
    async fn constant_backend_ignores_input() {
        let backend = StaticBackend::constant("unsafe");
        assert_eq!(backend.query("x").await.unwrap(), "unsafe");
        assert_eq!(backend.query("y").await.unwrap(), "unsafe");
    }
}
