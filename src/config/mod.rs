//! Gateway configuration: loading, environment overrides, and validation.
//!
//! Mirrors the layered-builder shape used across the rest of the
//! ecosystem — a base value, an optional file overlay, an optional
//! environment overlay, then a single validation pass.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Errors encountered while building a [`GatewayConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file's contents could not be parsed.
    #[error("failed to parse {format} config: {source}")]
    ParseError {
        /// Format that failed to parse (`yaml`, `toml`, `json`).
        format: &'static str,
        /// Underlying parse error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The file extension did not match a supported format.
    #[error("unsupported config format: {message}")]
    UnsupportedFormat {
        /// Explanation naming the offending extension.
        message: String,
    },

    /// The assembled configuration failed validation.
    #[error(transparent)]
    Validation(#[from] validator::ValidationErrors),

    /// An environment variable override could not be parsed.
    #[error("failed to parse environment variable {key}: {message}")]
    EnvParse {
        /// The variable name.
        key: &'static str,
        /// What went wrong.
        message: String,
    },
}

/// Policy for how the pipeline reacts when something goes wrong internally.
///
/// Distinct from the per-check fail-open behaviour of individual detectors
/// (which is unconditional): this knob controls whether the *gateway as a
/// whole* degrades gracefully, blocks, or merely logs when it cannot
/// complete a normal run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailMode {
    /// On internal failure, treat the content as unsafe.
    Closed,
    /// On internal failure, treat the content as safe (the gateway's
    /// documented default policy — see SPEC_FULL §7).
    Open,
    /// On internal failure, allow the content through but log loudly.
    LogOnly,
}

impl Default for FailMode {
    fn default() -> Self {
        Self::Open
    }
}

/// Configuration for one configured detector slot.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DetectorConfig {
    /// Registry key identifying which adapter implementation to construct
    /// (e.g. `"primary"`, `"secondary"`), looked up in the
    /// [`crate::detector::DetectorRegistry`] passed to
    /// [`crate::orchestrator::Gateway::new`]. Unknown types are ignored
    /// with a warning rather than rejected, per SPEC_FULL §6.
    #[validate(length(min = 1))]
    pub detector_type: String,
    /// Whether this detector participates in checks.
    pub enabled: bool,
    /// Its role for two-detector specialisation (§4.5).
    #[serde(default)]
    pub role: crate::detector::DetectorRole,
    /// Stable identifier for this slot; defaults to `detector_type` when
    /// absent. Distinguishes two configured instances of the same type.
    #[serde(default)]
    pub id: Option<String>,
}

impl DetectorConfig {
    /// The identifier a constructed adapter should report, falling back to
    /// `detector_type` when no explicit `id` is configured.
    #[must_use]
    pub fn effective_id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.detector_type)
    }
}

/// The strategy used by the conflict resolver when the two-detector
/// specialisation table does not apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStrategy {
    /// Pick the category with the highest severity; ties broken by
    /// first-seen order.
    #[default]
    HighestSeverity,
    /// Majority vote among detector categories, falling back to
    /// [`Self::HighestSeverity`] when there is no strict majority.
    Majority,
    /// The first non-safe category wins; otherwise safe.
    FirstUnsafe,
}

/// Configuration for the keyword/regex pattern filter (C1/C2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordFilterConfig {
    /// Whether the pattern filter runs at all.
    pub enabled: bool,
    /// Optional path to a JSON blacklist file; falls back to the
    /// compiled-in default when absent.
    pub source: Option<PathBuf>,
    /// Whether an unsafe pattern-filter verdict skips the detector stage
    /// entirely.
    pub short_circuit: bool,
}

impl Default for KeywordFilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            source: None,
            short_circuit: true,
        }
    }
}

/// The full, validated gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GatewayConfig {
    /// Config schema version, for forward compatibility.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Whether the gateway is enabled at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Internal-failure policy (§7).
    #[serde(default)]
    pub fail_mode: FailMode,
    /// Whole-request deadline in milliseconds (§4.6).
    #[serde(default = "default_deadline_ms")]
    #[validate(range(min = 1))]
    pub deadline_ms: u64,
    /// Pattern filter configuration.
    #[serde(default)]
    pub keyword_filter: KeywordFilterConfig,
    /// Configured detector slots, in the order they should be evaluated
    /// and reported.
    #[serde(default)]
    #[validate(nested)]
    pub detectors: Vec<DetectorConfig>,
    /// Fallback conflict-resolution strategy.
    #[serde(default)]
    pub conflict_strategy: ConflictStrategy,
    /// Path to the append-only audit stream; the durable counter is
    /// recovered by scanning it on startup.
    pub audit_log_path: Option<PathBuf>,
}

fn default_version() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_deadline_ms() -> u64 {
    30_000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            enabled: true,
            fail_mode: FailMode::default(),
            deadline_ms: default_deadline_ms(),
            keyword_filter: KeywordFilterConfig::default(),
            detectors: Vec::new(),
            conflict_strategy: ConflictStrategy::default(),
            audit_log_path: None,
        }
    }
}

/// Builder that layers a base config, an optional file, and optional
/// environment overrides before validating.
#[derive(Debug, Default)]
pub struct GatewayConfigBuilder {
    base: GatewayConfig,
    use_env: bool,
}

impl GatewayConfigBuilder {
    /// Start from the compiled-in defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and merge a YAML/TOML/JSON file, sniffed by extension.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileRead`] if the file cannot be read,
    /// [`ConfigError::UnsupportedFormat`] if the extension is not
    /// recognised, or [`ConfigError::ParseError`] if parsing fails.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let parsed: GatewayConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => {
                serde_yaml::from_str(&contents).map_err(|source| ConfigError::ParseError {
                    format: "yaml",
                    source: Box::new(source),
                })?
            }
            Some("toml") => {
                toml::from_str(&contents).map_err(|source| ConfigError::ParseError {
                    format: "toml",
                    source: Box::new(source),
                })?
            }
            Some("json") => {
                serde_json::from_str(&contents).map_err(|source| ConfigError::ParseError {
                    format: "json",
                    source: Box::new(source),
                })?
            }
            other => {
                return Err(ConfigError::UnsupportedFormat {
                    message: format!("unrecognised config extension: {other:?}"),
                });
            }
        };

        self.base = parsed;
        Ok(self)
    }

    /// Enable environment-variable overrides (`CONTENTGATE_ENABLED`,
    /// `CONTENTGATE_FAIL_MODE`, `CONTENTGATE_DEADLINE_MS`) when
    /// [`build`](Self::build) runs. Loads a `.env` file first if present.
    #[must_use]
    pub fn with_env(mut self) -> Self {
        self.use_env = true;
        self
    }

    /// Apply overrides and validate, producing the final config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EnvParse`] if an environment override cannot
    /// be parsed, or [`ConfigError::Validation`] if the assembled config
    /// fails its invariants.
    pub fn build(mut self) -> Result<GatewayConfig, ConfigError> {
        if self.use_env {
            let _ = dotenvy::dotenv();

            if let Ok(val) = std::env::var("CONTENTGATE_ENABLED") {
                self.base.enabled =
                    val.parse().map_err(|_| ConfigError::EnvParse {
                        key: "CONTENTGATE_ENABLED",
                        message: format!("expected true/false, got {val:?}"),
                    })?;
            }

            if let Ok(val) = std::env::var("CONTENTGATE_FAIL_MODE") {
                self.base.fail_mode = match val.as_str() {
                    "closed" => FailMode::Closed,
                    "open" => FailMode::Open,
                    "log_only" => FailMode::LogOnly,
                    other => {
                        return Err(ConfigError::EnvParse {
                            key: "CONTENTGATE_FAIL_MODE",
                            message: format!("unknown fail mode {other:?}"),
                        });
                    }
                };
            }

            if let Ok(val) = std::env::var("CONTENTGATE_DEADLINE_MS") {
                self.base.deadline_ms = val.parse().map_err(|_| ConfigError::EnvParse {
                    key: "CONTENTGATE_DEADLINE_MS",
                    message: format!("expected an integer, got {val:?}"),
                })?;
            }
        }

        self.base.validate()?;
        Ok(self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_open_and_enabled() {
        let cfg = GatewayConfig::default();
        assert!(cfg.enabled);
        assert_eq!(cfg.fail_mode, FailMode::Open);
        assert_eq!(cfg.deadline_ms, 30_000);
    }

    #[test]
    fn builder_with_no_overrides_matches_default() {
        let cfg = GatewayConfigBuilder::new().build().unwrap();
        assert_eq!(cfg.version, 1);
    }

    #[test]
    fn fail_mode_serialization() {
        let json = serde_json::to_string(&FailMode::LogOnly).unwrap();
        assert_eq!(json, "\"log_only\"");
    }

    #[test]
    fn rejects_zero_deadline() {
        let mut cfg = GatewayConfig::default();
        cfg.deadline_ms = 0;
        assert!(cfg.validate().is_err());
    }
}
