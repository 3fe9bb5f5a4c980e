//! The secondary detector adapter: a coarse safe/unsafe classifier,
//! grounded on `examples/original_source/src/guards/granite_guard.py`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::category::Category;

use super::backend::Backend;
use super::{DetectorAdapter, DetectorResult, DetectorRole};

/// Parse a raw reply into `(raw_label, unified_category)`: `"safe"` maps
/// to safe, `"unsafe"` maps to `unknown_unsafe` (this adapter has no
/// subcategory taxonomy), anything else is `"unknown"` and also maps to
/// `unknown_unsafe`.
#[must_use]
pub fn parse_raw(reply: &str) -> (String, Category) {
    match reply.trim().to_lowercase().as_str() {
        "safe" => ("safe".to_string(), Category::Safe),
        "unsafe" => ("unsafe".to_string(), Category::UnknownUnsafe),
        _ => ("unknown".to_string(), Category::UnknownUnsafe),
    }
}

/// The secondary ("coarse taxonomy") detector adapter.
pub struct SecondaryAdapter {
    id: String,
    backend: Arc<dyn Backend>,
}

impl SecondaryAdapter {
    /// Build an adapter with the given stable id and backend.
    #[must_use]
    pub fn new(id: impl Into<String>, backend: Arc<dyn Backend>) -> Self {
        Self {
            id: id.into(),
            backend,
        }
    }
}

#[async_trait]
impl DetectorAdapter for SecondaryAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn role(&self) -> DetectorRole {
        DetectorRole::Secondary
    }

    async fn inspect(&self, text: &str, deadline: Duration) -> DetectorResult {
        match tokio::time::timeout(deadline, self.backend.query(text)).await {
            Ok(Ok(reply)) => {
                let (raw, unified) = parse_raw(&reply);
                let reason = if unified.is_safe() {
                    "Content is safe".to_string()
                } else {
                    "Content is unsafe".to_string()
                };
                DetectorResult {
                    clean: unified.is_safe(),
                    unified,
                    raw,
                    reason,
                    detector_id: self.id.clone(),
                }
            }
            Ok(Err(err)) => DetectorResult::error(&self.id, err),
            Err(_) => DetectorResult::timeout(&self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::StaticBackend;

    #[test]
    fn parses_safe_and_unsafe() {
        assert_eq!(parse_raw("safe").1, Category::Safe);
        assert_eq!(parse_raw("unsafe").1, Category::UnknownUnsafe);
        assert_eq!(parse_raw("weird").0, "unknown");
    }

    #[tokio::test]
    async fn inspect_reports_unsafe() {
        let backend = StaticBackend::constant("unsafe");
        let adapter = SecondaryAdapter::new("guard_2", Arc::new(backend));
        let result = adapter.inspect("hi", Duration::from_secs(1)).await;
        assert!(!result.clean);
        assert_eq!(result.unified, Category::UnknownUnsafe);
    }
}
