//! The pipeline orchestrator (C6) and edge handlers (C9), united in
//! [`Gateway`] — the crate's single entry point.
//!
//! Grounded on
//! `examples/original_source/src/core/firewall.py::check_content`/
//! `_check_content_with_timeout` for control flow, and
//! `wg_bastion::pipeline::executor::PipelineExecutor::run` for the
//! per-stage timing idiom. HTTP framing is out of scope, so `check`,
//! `health`, `blacklist_snapshot`, and `blacklist_replace` are plain async
//! methods an embedding transport layer calls directly.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::audit::{AuditLog, AuditOutcome};
use crate::blacklist::{Blacklist, BlacklistData};
use crate::category::Category;
use crate::config::GatewayConfig;
use crate::detector::{DetectorAdapter, DetectorRegistry, DetectorResult, DetectorRole};
use crate::error::GatewayError;
use crate::metadata::RequestMetadata;
use crate::pattern_filter::{self, MatchReport};
use crate::resolver::{self, Resolution};
use crate::sanitizer::{self, PublicVerdict};
use crate::verdict::Verdict;

/// Liveness/readiness summary for [`Gateway::health`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthStatus {
    /// `"ok"` — the gateway only reports health once constructed.
    pub status: &'static str,
    /// Number of detectors successfully constructed from `config.detectors`
    /// (disabled slots and unrecognised types are not counted).
    pub detectors_available: usize,
    /// Whether the pattern filter is enabled.
    pub keyword_filter_enabled: bool,
}

/// An outcome produced by one pipeline run before units/audit fields are
/// attached; kept separate from [`Verdict`] so the orchestrator can build
/// it without yet knowing this check's unit count (only the audit log
/// knows how to compute and persist that).
struct Decision {
    clean: bool,
    category: Category,
    pattern_report: Option<MatchReport>,
    detector_results: Vec<DetectorResult>,
    resolution: Option<Resolution>,
    reason: String,
    stage_times: BTreeMap<String, Duration>,
    fallback_used: bool,
}

impl Decision {
    fn fallback(reason: impl Into<String>) -> Self {
        Self {
            clean: true,
            category: Category::Safe,
            pattern_report: None,
            detector_results: Vec::new(),
            resolution: None,
            reason: reason.into(),
            stage_times: BTreeMap::new(),
            fallback_used: true,
        }
    }
}

/// Combine the pattern filter's verdict with the resolver's verdict per
/// §4.6 step 5. Only reached when short-circuit did not already return —
/// i.e. the keyword filter is clean, disabled, or short-circuit is off.
fn combine(keyword: Option<&MatchReport>, resolution: Option<&Resolution>) -> (bool, Category, String) {
    match (keyword, resolution) {
        (None, None) => (true, Category::Safe, "No filters enabled".to_string()),
        (None, Some(res)) => (res.final_is_safe, res.final_category, res.reason.clone()),
        (Some(kw), None) => {
            if kw.clean {
                (true, Category::Safe, kw.reason.clone())
            } else {
                (false, Category::UnknownUnsafe, kw.reason.clone())
            }
        }
        (Some(kw), Some(res)) if kw.clean => {
            (res.final_is_safe, res.final_category, res.reason.clone())
        }
        (Some(kw), Some(res)) if res.final_is_safe => (
            false,
            Category::UnknownUnsafe,
            format!("Keyword filter flagged content: {}", kw.reason),
        ),
        (Some(kw), Some(res)) => (
            false,
            res.final_category,
            format!(
                "Keyword filter and detectors both flagged content: {}; {}",
                kw.reason, res.reason
            ),
        ),
    }
}

/// The gateway: C1–C9 composed into one facade.
pub struct Gateway {
    config: GatewayConfig,
    blacklist: RwLock<Arc<Blacklist>>,
    blacklist_path: Option<PathBuf>,
    detectors: Vec<Arc<dyn DetectorAdapter>>,
    audit: AuditLog,
}

impl Gateway {
    /// Construct a gateway: loads the blacklist, builds every enabled
    /// detector slot in `config.detectors` via `registry` (an unrecognised
    /// `detector_type` is logged as a warning and the slot is skipped, per
    /// SPEC_FULL §6 — it is not a construction failure), probes every
    /// constructed detector (logging, not failing, on probe errors —
    /// matching the source's "continue without it" initialization
    /// discipline), and recovers the durable counter from the configured
    /// audit log.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Blacklist`] if the configured blacklist
    /// source contains an invalid pattern, or [`GatewayError::Audit`] if
    /// the audit log exists but cannot be read during counter recovery.
    pub async fn new(config: GatewayConfig, registry: DetectorRegistry) -> Result<Self, GatewayError> {
        let blacklist_path = config.keyword_filter.source.clone();
        let blacklist = match &blacklist_path {
            Some(path) => Blacklist::load(path)?,
            None => Blacklist::default_embedded(),
        };

        let mut detectors = Vec::with_capacity(config.detectors.len());
        for slot in &config.detectors {
            if !slot.enabled {
                continue;
            }
            match registry.build(slot) {
                Ok(adapter) => detectors.push(adapter),
                Err(err) => {
                    tracing::warn!(detector_type = %slot.detector_type, error = %err, "unknown detector type, skipping slot");
                }
            }
        }

        for detector in &detectors {
            if let Err(err) = detector.init().await {
                tracing::warn!(detector = detector.id(), error = %err, "detector probe failed, continuing without it");
            }
        }

        let audit = AuditLog::open(config.audit_log_path.clone()).await?;

        Ok(Self {
            config,
            blacklist: RwLock::new(Arc::new(blacklist)),
            blacklist_path,
            detectors,
            audit,
        })
    }

    /// Run a check against `text`, returning the sanitized public verdict.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::BadRequest`] if `text` is empty.
    pub async fn check(
        &self,
        text: &str,
        metadata: RequestMetadata,
    ) -> Result<PublicVerdict, GatewayError> {
        if text.trim().is_empty() {
            return Err(GatewayError::BadRequest {
                reason: "text must not be empty".to_string(),
            });
        }

        let request_id = metadata
            .request_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let deadline = Duration::from_millis(self.config.deadline_ms);
        let start = Instant::now();

        let decision = match tokio::time::timeout(deadline, self.run_pipeline(text, deadline)).await
        {
            Ok(decision) => decision,
            Err(_) => Decision::fallback(
                "Firewall deadline exceeded before all stages completed - content assumed safe",
            ),
        };

        let elapsed = start.elapsed();

        let audit_outcome = if decision.fallback_used {
            AuditOutcome::Fallback {
                reason: &decision.reason,
            }
        } else if decision.clean {
            AuditOutcome::Safe
        } else {
            AuditOutcome::Unsafe {
                category: decision.category,
                pattern_report: decision.pattern_report.as_ref(),
            }
        };

        let (units_in, units_total) = self
            .audit
            .record(text, &audit_outcome, &decision.detector_results, elapsed, &metadata)
            .await;

        let verdict = Verdict {
            clean: decision.clean,
            pattern_report: decision.pattern_report,
            detector_results: decision.detector_results,
            resolution: decision.resolution,
            reason: decision.reason,
            stage_times: decision.stage_times,
            fallback_used: decision.fallback_used,
            units_in,
            units_total,
        };

        Ok(sanitizer::sanitize(
            &verdict,
            request_id,
            elapsed.as_secs_f64() * 1000.0,
            chrono::Utc::now().timestamp(),
        ))
    }

    async fn run_pipeline(&self, text: &str, overall_deadline: Duration) -> Decision {
        let mut stage_times = BTreeMap::new();
        let pipeline_start = Instant::now();
        let blacklist = Arc::clone(&*self.blacklist.read().await);

        let pattern_report = if self.config.keyword_filter.enabled {
            let t0 = Instant::now();
            let report = pattern_filter::scan(text, &blacklist);
            stage_times.insert("keyword_filter".to_string(), t0.elapsed());
            Some(report)
        } else {
            None
        };

        if let Some(report) = &pattern_report {
            if !report.clean && self.config.keyword_filter.short_circuit {
                return Decision {
                    clean: false,
                    category: Category::UnknownUnsafe,
                    pattern_report: pattern_report.clone(),
                    detector_results: Vec::new(),
                    resolution: None,
                    reason: report.reason.clone(),
                    stage_times,
                    fallback_used: false,
                };
            }
        }

        let enabled_detectors: Vec<&Arc<dyn DetectorAdapter>> =
            self.detectors.iter().collect();

        if enabled_detectors.is_empty() {
            let (clean, category, reason) = combine(pattern_report.as_ref(), None);
            return Decision {
                clean,
                category,
                pattern_report,
                detector_results: Vec::new(),
                resolution: None,
                reason,
                stage_times,
                fallback_used: false,
            };
        }

        let remaining = overall_deadline.saturating_sub(pipeline_start.elapsed());
        let t0 = Instant::now();
        let futures = enabled_detectors
            .iter()
            .map(|detector| detector.inspect(text, remaining));
        let results: Vec<DetectorResult> = futures_util::future::join_all(futures).await;
        stage_times.insert("detectors".to_string(), t0.elapsed());

        let pairs: Vec<(DetectorRole, DetectorResult)> = enabled_detectors
            .iter()
            .zip(results.iter())
            .map(|(detector, result)| (detector.role(), result.clone()))
            .collect();

        let resolution = resolver::resolve_with_roles(&pairs, self.config.conflict_strategy);
        let (clean, category, reason) = combine(pattern_report.as_ref(), Some(&resolution));

        Decision {
            clean,
            category,
            pattern_report,
            detector_results: results,
            resolution: Some(resolution),
            reason,
            stage_times,
            fallback_used: false,
        }
    }

    /// Liveness and readiness summary.
    pub async fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "ok",
            detectors_available: self.detectors.len(),
            keyword_filter_enabled: self.config.keyword_filter.enabled,
        }
    }

    /// The current blacklist, as plain data.
    pub async fn blacklist_snapshot(&self) -> BlacklistData {
        self.blacklist.read().await.snapshot()
    }

    /// Atomically replace the blacklist. Every pattern must compile; on
    /// the first invalid pattern the whole update is rejected and the
    /// prior blacklist remains in effect (§4.1/§4.9's atomicity invariant).
    /// If a backing file is configured, the new blacklist is persisted to
    /// it before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Blacklist`] if any pattern fails to
    /// compile, or if persisting to the backing file fails.
    pub async fn blacklist_replace(&self, data: BlacklistData) -> Result<(), GatewayError> {
        let compiled = Blacklist::compile(data)?;

        if let Some(path) = &self.blacklist_path {
            let json = serde_json::to_string_pretty(&compiled.snapshot()).map_err(|source| {
                crate::blacklist::BlacklistError::FileParse {
                    path: path.display().to_string(),
                    source,
                }
            })?;
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| crate::blacklist::BlacklistError::FileRead {
                        path: path.display().to_string(),
                        source,
                    })?;
            }
            tokio::fs::write(path, json).await.map_err(|source| {
                crate::blacklist::BlacklistError::FileRead {
                    path: path.display().to_string(),
                    source,
                }
            })?;
        }

        let mut guard = self.blacklist.write().await;
        *guard = Arc::new(compiled);
        Ok(())
    }
}
