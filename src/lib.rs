//! ```text
//! text ──► pattern_filter (C2) ──┬─► short-circuit (unsafe) ──► resolution
//!                                 │
//!                                 └─► detector fan-out (C3) ──► resolver (C5) ──► resolution
//!                                                                                    │
//!                                                                                    ▼
//!                                                                         audit + counter (C8)
//!                                                                                    │
//!                                                                                    ▼
//!                                                                           sanitizer (C7) ──► PublicVerdict
//! ```
//!
//! # contentgate
//!
//! **A content-safety gateway sitting between client applications and
//! LLM-backed services.**
//!
//! `contentgate` inspects submitted text with a deterministic keyword and
//! regex pattern filter plus zero or more external, model-backed detector
//! adapters, resolves any disagreement between detectors via a fixed
//! policy (including a dedicated two-detector specialisation table for a
//! richer-taxonomy/coarser-taxonomy adapter pair), and returns a sanitized
//! public verdict that never leaks which vendor or model produced it.
//! Every check also advances a durable "units processed" counter and
//! appends a structured audit line, both flushed before the call returns.
//!
//! Out of scope: HTTP framing, licensing/entitlement, PII masking, demo
//! UIs, container packaging, and the wire protocol to any specific model
//! backend — [`detector::Backend`] is the seam an embedder implements for
//! that.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use contentgate::prelude::*;
//!
//! # async fn run() -> Result<(), GatewayError> {
//! let config = GatewayConfigBuilder::new().with_env().build()?;
//! let gateway = Gateway::new(config, DetectorRegistry::with_defaults()).await?;
//!
//! let verdict = gateway.check("Hello there", RequestMetadata::none()).await?;
//! assert!(verdict.is_safe);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`config`] – Configuration, builder pattern, YAML/TOML/JSON/env loading
//! - [`error`] – The crate-wide [`error::GatewayError`] aggregator
//! - [`category`] – The closed unified content-category taxonomy
//! - [`blacklist`] – The keyword/regex blacklist store
//! - [`pattern_filter`] – The deterministic pattern-matching stage
//! - [`detector`] – The pluggable, fail-open detector adapter contract
//! - [`resolver`] – Conflict resolution across detector results
//! - [`sanitizer`] – Projection onto the public, vendor-free response shape
//! - [`audit`] – The durable counter and structured audit log
//! - [`orchestrator`] – [`orchestrator::Gateway`], the pipeline orchestrator
//! - [`telemetry`] – Structured logging bootstrap

#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod audit;
pub mod blacklist;
pub mod category;
pub mod config;
pub mod detector;
pub mod error;
pub mod metadata;
pub mod orchestrator;
pub mod pattern_filter;
pub mod resolver;
pub mod sanitizer;
pub mod telemetry;
pub mod verdict;

pub use error::{GatewayError, Result};
pub use orchestrator::Gateway;

/// Re-exports for convenient access to core types.
pub mod prelude {
    pub use crate::config::{ConflictStrategy, DetectorConfig, FailMode, GatewayConfig, GatewayConfigBuilder};
    pub use crate::detector::DetectorRegistry;
    pub use crate::error::{GatewayError, Result};
    pub use crate::metadata::RequestMetadata;
    pub use crate::orchestrator::{Gateway, HealthStatus};
    pub use crate::sanitizer::PublicVerdict;
}
