//! The blacklist store (C1): keywords and regex patterns, compiled and
//! atomically replaceable.

use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};

/// The compiled-in default keyword list.
///
/// Matches the source filter's default dataset exactly.
const DEFAULT_KEYWORDS: &[&str] = &[
    "hack",
    "exploit",
    "bypass security",
    "illegal",
    "steal password",
    "malware",
    "phishing",
    "ransomware",
    "keylogger",
];

/// The compiled-in default regex patterns.
///
/// `password`/`ssh-key` boundary matchers plus a credit-card-number
/// matcher, as well as a catch for attempts to extract the system prompt
/// (see DESIGN.md's OQ1: kept data-driven rather than hardcoded).
const DEFAULT_PATTERNS: &[&str] = &[
    r"(\b|_)password(\b|_)",
    r"(\b|_)ssh[_-]key(\b|_)",
    r"\b(?:4[0-9]{12}(?:[0-9]{3})?|5[1-5][0-9]{14}|3[47][0-9]{13}|3(?:0[0-5]|[68][0-9])[0-9]{11}|6(?:011|5[0-9]{2})[0-9]{12}|(?:2131|1800|35\d{3})\d{11})\b",
    r"system\s+prompt",
];

/// Errors raised while loading or replacing a [`Blacklist`].
#[derive(Debug, thiserror::Error)]
pub enum BlacklistError {
    /// A pattern failed to compile as a regular expression.
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The offending pattern source.
        pattern: String,
        /// Underlying compile error.
        #[source]
        source: regex::Error,
    },

    /// The backing JSON source could not be read.
    #[error("failed to read blacklist file {path}: {source}")]
    FileRead {
        /// Path that was attempted.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The backing JSON source could not be parsed.
    #[error("failed to parse blacklist file {path}: {source}")]
    FileParse {
        /// Path that was attempted.
        path: String,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

/// Plain-data form of a blacklist, as read from or written to JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlacklistData {
    /// Case-insensitive literal keywords.
    pub keywords: Vec<String>,
    /// Ordered regular-expression patterns.
    pub regex_patterns: Vec<String>,
}

/// A compiled, immutable blacklist snapshot.
///
/// Cheap to clone — the compiled pattern set is held behind an `Arc`-free
/// plain struct since a full snapshot is produced only on replace, never on
/// every check.
#[derive(Clone)]
pub struct Blacklist {
    data: BlacklistData,
    lower_keywords: Vec<String>,
    set: RegexSet,
    patterns: Vec<Regex>,
}

impl Blacklist {
    /// Build a blacklist from plain data, compiling every pattern.
    ///
    /// # Errors
    ///
    /// Returns [`BlacklistError::InvalidPattern`] on the first pattern that
    /// fails to compile; the caller's prior state (if any) is untouched
    /// since this never mutates anything, it only constructs.
    pub fn compile(data: BlacklistData) -> Result<Self, BlacklistError> {
        let mut patterns = Vec::with_capacity(data.regex_patterns.len());
        for src in &data.regex_patterns {
            let compiled =
                Regex::new(&format!("(?i){src}")).map_err(|source| BlacklistError::InvalidPattern {
                    pattern: src.clone(),
                    source,
                })?;
            patterns.push(compiled);
        }

        let set = RegexSet::new(data.regex_patterns.iter().map(|p| format!("(?i){p}")))
            .map_err(|source| BlacklistError::InvalidPattern {
                pattern: data.regex_patterns.join(", "),
                source,
            })?;

        let lower_keywords = data.keywords.iter().map(|k| k.to_lowercase()).collect();

        Ok(Self {
            data,
            lower_keywords,
            set,
            patterns,
        })
    }

    /// The compiled-in default blacklist.
    ///
    /// # Panics
    ///
    /// Never panics in practice — the default patterns are a compile-time
    /// constant verified to compile by [`tests::default_blacklist_compiles`].
    #[must_use]
    pub fn default_embedded() -> Self {
        let data = BlacklistData {
            keywords: DEFAULT_KEYWORDS.iter().map(|s| (*s).to_string()).collect(),
            regex_patterns: DEFAULT_PATTERNS.iter().map(|s| (*s).to_string()).collect(),
        };
        Self::compile(data).expect("default blacklist must compile")
    }

    /// Load a blacklist from a JSON file; falls back to the compiled-in
    /// default if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns [`BlacklistError::FileParse`] if the file exists but is not
    /// valid JSON, or [`BlacklistError::InvalidPattern`] if a pattern in it
    /// fails to compile.
    pub fn load(path: &std::path::Path) -> Result<Self, BlacklistError> {
        if !path.exists() {
            return Ok(Self::default_embedded());
        }

        let contents =
            std::fs::read_to_string(path).map_err(|source| BlacklistError::FileRead {
                path: path.display().to_string(),
                source,
            })?;

        let data: BlacklistData =
            serde_json::from_str(&contents).map_err(|source| BlacklistError::FileParse {
                path: path.display().to_string(),
                source,
            })?;

        Self::compile(data)
    }

    /// A plain-data snapshot suitable for serialization back out.
    #[must_use]
    pub fn snapshot(&self) -> BlacklistData {
        self.data.clone()
    }

    /// The configured keywords, in insertion order.
    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.data.keywords
    }

    /// The configured pattern sources, in insertion order.
    #[must_use]
    pub fn pattern_sources(&self) -> &[String] {
        &self.data.regex_patterns
    }

    pub(crate) fn lower_keywords(&self) -> &[String] {
        &self.lower_keywords
    }

    pub(crate) fn regex_set(&self) -> &RegexSet {
        &self.set
    }

    pub(crate) fn patterns(&self) -> &[Regex] {
        &self.patterns
    }
}

impl std::fmt::Debug for Blacklist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blacklist")
            .field("keywords", &self.data.keywords.len())
            .field("patterns", &self.data.regex_patterns.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_blacklist_compiles() {
        let bl = Blacklist::default_embedded();
        assert_eq!(bl.keywords().len(), DEFAULT_KEYWORDS.len());
        assert_eq!(bl.patterns().len(), DEFAULT_PATTERNS.len());
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let data = BlacklistData {
            keywords: vec![],
            regex_patterns: vec!["(unclosed".to_string()],
        };
        assert!(matches!(
            Blacklist::compile(data),
            Err(BlacklistError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn load_missing_file_falls_back_to_default() {
        let bl = Blacklist::load(std::path::Path::new("/nonexistent/blacklist.json")).unwrap();
        assert_eq!(bl.keywords().len(), DEFAULT_KEYWORDS.len());
    }

    #[test]
    fn snapshot_round_trips() {
        let bl = Blacklist::default_embedded();
        let snap = bl.snapshot();
        let rebuilt = Blacklist::compile(snap).unwrap();
        assert_eq!(rebuilt.keywords(), bl.keywords());
    }
}
