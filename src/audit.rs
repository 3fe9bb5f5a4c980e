//! The durable "units processed" counter and structured audit logger (C8).
//!
//! Grounded on
//! `examples/original_source/src/core/firewall.py::_load_token_counter`,
//! `_update_token_counter`, `_count_tokens`, and `_log_detailed_analysis`.
//! The counter is recovered on startup by scanning the audit stream for the
//! last `TOKEN_COUNTER=` marker line; every check appends one human-readable
//! summary line followed by one marker line, both flushed before the public
//! response is returned (§5's ordering guarantee).

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::category::Category;
use crate::detector::DetectorResult;
use crate::metadata::RequestMetadata;
use crate::pattern_filter::{HitKind, MatchReport};

/// Errors raised by the audit log.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The audit stream could not be read during counter recovery.
    #[error("failed to read audit log {path}: {source}")]
    Read {
        /// Path attempted.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

fn token_counter_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"TOKEN_COUNTER=(\d+)").expect("static pattern compiles"))
}

/// Deterministic unit-counting approximation:
/// `floor(len(text) / 4) + 1`, matching `_count_tokens` exactly.
#[must_use]
pub fn count_units(text: &str) -> u64 {
    (text.chars().count() as u64) / 4 + 1
}

/// First 16 hex characters of the SHA-256 digest of `text`.
#[must_use]
pub fn short_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let full = format!("{digest:x}");
    full[..16].to_string()
}

/// The classification of one audit line, driving both its prefix and
/// which optional fields appear.
#[derive(Debug, Clone)]
pub enum AuditOutcome<'a> {
    /// The check completed normally and was safe.
    Safe,
    /// The check completed normally and was unsafe.
    Unsafe {
        /// The winning unified category.
        category: Category,
        /// The pattern filter's report, if it ran.
        pattern_report: Option<&'a MatchReport>,
    },
    /// The check did not complete normally; a safe fallback was returned.
    Fallback {
        /// Why the fallback occurred.
        reason: &'a str,
    },
}

fn build_summary_line(
    outcome: &AuditOutcome<'_>,
    hash: &str,
    duration: Duration,
    metadata: &RequestMetadata,
) -> String {
    let time_ms = duration.as_secs_f64() * 1000.0;
    let mut parts = Vec::new();

    match outcome {
        AuditOutcome::Safe => {
            parts.push("SAFE".to_string());
            parts.push("STATUS=SAFE".to_string());
        }
        AuditOutcome::Unsafe {
            category,
            pattern_report,
        } => {
            parts.push("UNSAFE".to_string());
            parts.push("STATUS=UNSAFE".to_string());
            parts.push(format!("TYPE={}", category.code()));

            if let Some(report) = pattern_report {
                let keywords: Vec<&str> = report
                    .hits
                    .iter()
                    .filter(|h| h.kind == HitKind::Keyword)
                    .map(|h| h.text.as_str())
                    .take(3)
                    .collect();
                if !keywords.is_empty() {
                    parts.push(format!("KEYWORDS={}", keywords.join(",")));
                }
                let rule_count = report
                    .hits
                    .iter()
                    .filter(|h| h.kind == HitKind::Pattern)
                    .count();
                if rule_count > 0 {
                    parts.push(format!("RULES={rule_count}"));
                }
            }
        }
        AuditOutcome::Fallback { .. } => {
            parts.push("FALLBACK".to_string());
            parts.push("STATUS=SAFE".to_string());
            parts.push("FALLBACK=true".to_string());
        }
    }

    parts.insert(1, format!("HASH={hash}"));
    parts.insert(2, format!("TIME={time_ms:.2}ms"));

    if let Some(ip) = &metadata.client_id {
        parts.push(format!("IP={ip}"));
    }

    parts.join(" | ")
}

/// Build the `FIREWALL_DETAILED`-equivalent debug record: `text_length`,
/// `safety_status`, and a per-detector `guard_results` summary, mirroring
/// `_log_detailed_analysis`'s `log_entry` shape. Emitted only at
/// `tracing::Level::DEBUG` — separate from the mandatory one-line summary,
/// which is unconditional.
fn build_debug_detail(text: &str, outcome: &AuditOutcome<'_>, detector_results: &[DetectorResult]) -> serde_json::Value {
    let safety_status = match outcome {
        AuditOutcome::Unsafe { .. } => "UNSAFE",
        AuditOutcome::Safe | AuditOutcome::Fallback { .. } => "SAFE",
    };

    let guard_results: Vec<serde_json::Value> = detector_results
        .iter()
        .map(|result| {
            serde_json::json!({
                "detector_id": result.detector_id,
                "is_safe": result.clean,
                "category": result.unified.code(),
                "raw_category": result.raw,
            })
        })
        .collect();

    serde_json::json!({
        "text_length": text.chars().count(),
        "safety_status": safety_status,
        "guard_results": guard_results,
    })
}

struct CounterState {
    total: u64,
}

/// The durable counter plus structured audit log.
pub struct AuditLog {
    path: Option<PathBuf>,
    state: Mutex<CounterState>,
}

impl AuditLog {
    /// Open (or create) the audit log at `path`, recovering the counter by
    /// scanning for the last `TOKEN_COUNTER=` marker. `path = None` runs
    /// the counter purely in memory, starting at zero.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Read`] if the file exists but cannot be read.
    pub async fn open(path: Option<PathBuf>) -> Result<Self, AuditError> {
        let total = match &path {
            Some(p) if p.exists() => {
                let contents =
                    tokio::fs::read_to_string(p)
                        .await
                        .map_err(|source| AuditError::Read {
                            path: p.display().to_string(),
                            source,
                        })?;
                recover_counter(&contents)
            }
            _ => 0,
        };

        Ok(Self {
            path,
            state: Mutex::new(CounterState { total }),
        })
    }

    /// Append one audit entry for a completed check, advancing the durable
    /// counter by `count_units(text)`.
    ///
    /// Returns `(units_in, units_total)` for the caller to embed in the
    /// public verdict. The write is flushed before this returns, so by the
    /// time a caller observes the result the line is durable (§5). The
    /// counter guard is held across the write, so durable-append order
    /// matches counter-commit order under concurrent calls — required for
    /// scan-based recovery (§4.8) to be sound.
    ///
    /// A failure to persist the line is never propagated to the caller —
    /// per §7 the in-memory counter still advances, and the failure is
    /// only logged; the next successful flush restores durability.
    pub async fn record(
        &self,
        text: &str,
        outcome: &AuditOutcome<'_>,
        detector_results: &[DetectorResult],
        duration: Duration,
        metadata: &RequestMetadata,
    ) -> (u64, u64) {
        let units_in = count_units(text);
        let hash = short_hash(text);
        let summary = build_summary_line(outcome, &hash, duration, metadata);

        let mut guard = self.state.lock().await;
        guard.total += units_in;
        let total = guard.total;

        if let Some(path) = &self.path {
            let marker = format!(
                "{} - TOKEN_COUNTER={} (+{})",
                chrono::Utc::now().to_rfc3339(),
                total,
                units_in
            );
            let line = format!("{summary}\n{marker}\n");

            let write_result = async {
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                let mut file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await?;
                file.write_all(line.as_bytes()).await?;
                file.flush().await
            }
            .await;

            if let Err(source) = write_result {
                tracing::warn!(error = %source, path = %path.display(), "failed to persist audit line");
            }
        }

        drop(guard);

        match outcome {
            AuditOutcome::Safe => tracing::info!(%summary, "check completed"),
            _ => tracing::warn!(%summary, "check completed"),
        }

        let detail = build_debug_detail(text, outcome, detector_results);
        tracing::debug!(%detail, "detailed analysis");

        (units_in, total)
    }

    /// Current running total without recording a new entry.
    pub async fn current_total(&self) -> u64 {
        self.state.lock().await.total
    }
}

fn recover_counter(contents: &str) -> u64 {
    let mut last = 0;
    for caps in token_counter_regex().captures_iter(contents) {
        if let Ok(value) = caps[1].parse::<u64>() {
            last = value;
        }
    }
    last
}
