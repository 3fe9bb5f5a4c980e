//! The primary detector adapter: a richer taxonomy with `S1`–`S14`
//! subcategories, grounded on
//! `examples/original_source/src/guards/llama_guard.py`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

use crate::category::Category;

use super::backend::Backend;
use super::{DetectorAdapter, DetectorResult, DetectorRole};

fn subcategory_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)S(\d+)").expect("static pattern compiles"))
}

/// Parse a raw reply into `(raw_label, unified_category)` following the
/// exact grammar of `llama_guard.py::_parse_llama_response`: an exact
/// `"safe"`, or a reply starting with `"unsafe"` that may carry an
/// `S<n>` subcategory marker anywhere in the text, or `"unknown"` for
/// anything else.
#[must_use]
pub fn parse_raw(reply: &str) -> (String, Category) {
    let trimmed = reply.trim().to_lowercase();

    if trimmed == "safe" {
        return ("safe".to_string(), Category::Safe);
    }

    if trimmed.starts_with("unsafe") {
        if let Some(caps) = subcategory_regex().captures(reply) {
            let raw = format!("S{}", &caps[1]);
            return (raw.clone(), map_subcategory(&raw));
        }
        return ("unsafe".to_string(), Category::UnknownUnsafe);
    }

    ("unknown".to_string(), Category::UnknownUnsafe)
}

/// Map an `S<n>` subcategory label to a unified category.
///
/// `S1`..`S12` → harmful_prompt; `S13`, `S14` → jailbreak. Grounded on
/// `examples/original_source/config/config.py::LLAMAGUARD_CATEGORY_MAPPING`
/// (authoritative over the inconsistent `__main__` self-test block in
/// `llama_guard.py`, which locally redefines `S9` — see DESIGN.md).
fn map_subcategory(raw: &str) -> Category {
    match raw {
        "S13" | "S14" => Category::Jailbreak,
        _ if raw.starts_with('S') => Category::HarmfulPrompt,
        _ => Category::UnknownUnsafe,
    }
}

fn generate_reason(unified: Category, raw: &str) -> String {
    match unified {
        Category::Safe => "Content is safe".to_string(),
        Category::Jailbreak => format!("Jailbreak attempt detected (category: {raw})"),
        Category::HarmfulPrompt => format!("Harmful prompt detected (category: {raw})"),
        _ => format!("Content flagged as {unified} (category: {raw})"),
    }
}

/// The primary ("richer taxonomy") detector adapter.
pub struct PrimaryAdapter {
    id: String,
    backend: Arc<dyn Backend>,
}

impl PrimaryAdapter {
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
impl DetectorAdapter for PrimaryAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn role(&self) -> DetectorRole {
        DetectorRole::Primary
    }

    async fn init(&self) -> Result<(), super::DetectorError> {
        Ok(())
    }

    async fn inspect(&self, text: &str, deadline: Duration) -> DetectorResult {
        match tokio::time::timeout(deadline, self.backend.query(text)).await {
            Ok(Ok(reply)) => {
                let (raw, unified) = parse_raw(&reply);
                let reason = generate_reason(unified, &raw);
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
