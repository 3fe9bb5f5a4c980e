//! The closed unified category taxonomy (C4).
//!
//! Values and severities match the source taxonomy exactly: `safe` is
//! severity 0; `unknown_unsafe` is 1; `harmful_prompt` and
//! `prompt_injection` are both 2; `jailbreak` is 3 (the highest).

use serde::{Deserialize, Serialize};

/// One of the five unified content categories.
///
/// `Ord` is derived over the declaration order below, which matches
/// ascending severity — so `Category::Safe < Category::Jailbreak` holds,
/// but ties between `HarmfulPrompt` and `PromptInjection` (both severity 2)
/// are NOT distinguished by this derive; use [`Category::severity`] for
/// the actual ranking used in tie-breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Category {
    /// No unsafe content detected.
    Safe,
    /// An unrecognised or low-confidence unsafe signal.
    UnknownUnsafe,
    /// Content that is itself harmful (e.g. violence, weapons instructions).
    HarmfulPrompt,
    /// An attempt to manipulate the model via injected instructions.
    PromptInjection,
    /// An attempt to bypass safety policy (jailbreak).
    Jailbreak,
}

impl Category {
    /// All categories, in ascending severity order (ties broken by
    /// declaration order above).
    pub const ALL: [Category; 5] = [
        Category::Safe,
        Category::UnknownUnsafe,
        Category::HarmfulPrompt,
        Category::PromptInjection,
        Category::Jailbreak,
    ];

    /// The machine-readable code (`SAFE`, `JAILBREAK`, …).
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Jailbreak => "JAILBREAK",
            Self::HarmfulPrompt => "HARMFUL",
            Self::PromptInjection => "PROMPT_INJECTION",
            Self::UnknownUnsafe => "UNKNOWN_UNSAFE",
        }
    }

    /// A human-readable description.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Safe => "Content is safe",
            Self::Jailbreak => "Jailbreak attempt detected",
            Self::HarmfulPrompt => "Harmful prompt detected",
            Self::PromptInjection => "Prompt injection detected",
            Self::UnknownUnsafe => "Content flagged as unsafe by an unspecified category",
        }
    }

    /// Severity used for tie-breaking in the conflict resolver.
    ///
    /// `safe` is always `0`; every other category is `>= 1`.
    #[must_use]
    pub fn severity(self) -> u8 {
        match self {
            Self::Safe => 0,
            Self::UnknownUnsafe => 1,
            Self::HarmfulPrompt | Self::PromptInjection => 2,
            Self::Jailbreak => 3,
        }
    }

    /// `true` for [`Category::Safe`].
    #[must_use]
    pub fn is_safe(self) -> bool {
        matches!(self, Self::Safe)
    }

    /// Look up the category with the given machine-readable code, if any.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
