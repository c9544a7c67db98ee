//! Error types for skill-rules
//!
//! Configuration errors are fatal at load time. Evaluation and persistence
//! errors are recovered where they happen and only ever reach the logs.

use std::path::PathBuf;
use thiserror::Error;

/// The rule document or engine configuration could not be loaded
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading a configuration file failed
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON/TOML or does not fit the schema
    #[error("failed to parse {context}: {message}")]
    Parse { context: String, message: String },

    /// A rule is structurally valid but semantically wrong
    #[error("rule '{rule}': {reason}")]
    Invalid { rule: String, reason: String },

    /// A rule required by the engine configuration is not defined
    #[error("required rule '{0}' is not defined in the rule document")]
    MissingRule(String),

    /// A regex trigger failed to compile
    #[error("rule '{rule}': invalid regex '{pattern}': {source}")]
    InvalidRegex {
        rule: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A glob trigger failed to compile
    #[error("rule '{rule}': invalid glob '{pattern}': {message}")]
    InvalidGlob {
        rule: String,
        pattern: String,
        message: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(rule: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            rule: rule.to_string(),
            reason: reason.into(),
        }
    }
}

/// A single rule could not be evaluated against an event
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("rule '{rule}' needs file content for {path}, but none is available")]
    ContentUnavailable { rule: String, path: String },
}

/// The session state store could not be read or written
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("session store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode session record: {0}")]
    Serialize(#[from] serde_json::Error),
}
