//! Trigger variants and matching
//!
//! Every trigger type answers the same question through [`Trigger::matches`],
//! so the matchers never branch on what kind of rule they are looking at.

use glob::{MatchOptions, Pattern};
use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::error::ConfigError;

/// Upper bound on the compiled size of a single trigger regex
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// `*` stays within one path segment, `**` spans segments
const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// How a rule matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerKind {
    Keyword,
    IntentPattern,
    PathPattern,
    ContentPattern,
}

impl TriggerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TriggerKind::Keyword => "keyword",
            TriggerKind::IntentPattern => "intent pattern",
            TriggerKind::PathPattern => "path pattern",
            TriggerKind::ContentPattern => "content pattern",
        }
    }
}

/// The value a trigger is tested against
#[derive(Debug, Clone, Copy)]
pub enum MatchInput<'a> {
    /// A prompt, raw and lowercased
    Prompt { raw: &'a str, lowered: &'a str },

    /// A normalized file path
    Path(&'a str),

    /// File content
    Content(&'a str),
}

/// A compiled trigger
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Case-insensitive substring; stored lowercased
    Keyword { keyword: String },

    /// Regex searched in the raw prompt
    IntentPattern(Regex),

    /// Glob matched against a file path
    PathPattern(Pattern),

    /// Regex searched in file content
    ContentPattern(Regex),
}

impl Trigger {
    pub fn keyword(keyword: &str) -> Self {
        Trigger::Keyword {
            keyword: keyword.to_lowercase(),
        }
    }

    pub fn intent_pattern(rule: &str, pattern: &str) -> Result<Self, ConfigError> {
        compile_regex(rule, pattern).map(Trigger::IntentPattern)
    }

    pub fn content_pattern(rule: &str, pattern: &str) -> Result<Self, ConfigError> {
        compile_regex(rule, pattern).map(Trigger::ContentPattern)
    }

    pub fn path_pattern(rule: &str, pattern: &str) -> Result<Self, ConfigError> {
        if pattern.trim().is_empty() {
            return Err(ConfigError::InvalidGlob {
                rule: rule.to_string(),
                pattern: pattern.to_string(),
                message: "glob is empty".to_string(),
            });
        }

        Pattern::new(pattern)
            .map(Trigger::PathPattern)
            .map_err(|e| ConfigError::InvalidGlob {
                rule: rule.to_string(),
                pattern: pattern.to_string(),
                message: e.msg.to_string(),
            })
    }

    pub fn kind(&self) -> TriggerKind {
        match self {
            Trigger::Keyword { .. } => TriggerKind::Keyword,
            Trigger::IntentPattern(_) => TriggerKind::IntentPattern,
            Trigger::PathPattern(_) => TriggerKind::PathPattern,
            Trigger::ContentPattern(_) => TriggerKind::ContentPattern,
        }
    }

    /// The literal trigger text, as reported in match results
    pub fn source(&self) -> &str {
        match self {
            Trigger::Keyword { keyword } => keyword.as_str(),
            Trigger::IntentPattern(re) | Trigger::ContentPattern(re) => re.as_str(),
            Trigger::PathPattern(pattern) => pattern.as_str(),
        }
    }

    /// Test this trigger against an input. A trigger never matches an
    /// input of a different shape.
    pub fn matches(&self, input: &MatchInput<'_>) -> bool {
        match (self, input) {
            (Trigger::Keyword { keyword }, MatchInput::Prompt { lowered, .. }) => {
                !keyword.is_empty() && lowered.contains(keyword.as_str())
            }
            (Trigger::IntentPattern(re), MatchInput::Prompt { raw, .. }) => re.is_match(raw),
            (Trigger::PathPattern(pattern), MatchInput::Path(path)) => {
                pattern.matches_with(path, GLOB_OPTIONS)
            }
            (Trigger::ContentPattern(re), MatchInput::Content(content)) => re.is_match(content),
            _ => false,
        }
    }
}

fn compile_regex(rule: &str, pattern: &str) -> Result<Regex, ConfigError> {
    RegexBuilder::new(pattern)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
        .map_err(|source| ConfigError::InvalidRegex {
            rule: rule.to_string(),
            pattern: pattern.to_string(),
            source,
        })
}
