//! Skip conditions for blocking rules
//!
//! Checked in a fixed order; the first condition that holds suppresses the
//! block.

use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use crate::rules::Rule;
use crate::session::SessionStore;

/// A copy of the environment variables the engine cares about
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment. Variables whose name or
    /// value is not valid Unicode are left out.
    pub fn capture() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(key, value)| match (key.to_str(), value.to_str()) {
                (Some(key), Some(value)) => Some((key.to_string(), value.to_string())),
                _ => {
                    debug!(key = %key.to_string_lossy(), "skipping non-unicode environment variable");
                    None
                }
            })
            .collect();

        Self { vars }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Set to something other than empty, `0`, `false`, `no` or `off`
    pub fn is_truthy(&self, key: &str) -> bool {
        match self.get(key) {
            Some(value) => {
                let value = value.trim().to_ascii_lowercase();
                !matches!(value.as_str(), "" | "0" | "false" | "no" | "off")
            }
            None => false,
        }
    }
}

/// Why a block was suppressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    SessionSkillUsed,
    FileMarker(String),
    EnvOverride(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::SessionSkillUsed => write!(f, "skill already used in this session"),
            SkipReason::FileMarker(marker) => write!(f, "file marker '{}' present", marker),
            SkipReason::EnvOverride(var) => write!(f, "environment override {} set", var),
        }
    }
}

/// Decide whether a block from `rule` should be suppressed
pub fn evaluate(
    rule: &Rule,
    session_id: &str,
    content: Option<&str>,
    env: &EnvSnapshot,
    sessions: &dyn SessionStore,
) -> Option<SkipReason> {
    let skip = &rule.skip_conditions;

    if skip.session_skill_used && sessions.was_used(session_id, &rule.name) {
        return Some(SkipReason::SessionSkillUsed);
    }

    if let Some(content) = content {
        if let Some(marker) = skip
            .file_markers
            .iter()
            .find(|m| !m.is_empty() && content.contains(m.as_str()))
        {
            return Some(SkipReason::FileMarker(marker.clone()));
        }
    }

    if let Some(var) = &skip.env_override {
        if env.is_truthy(var) {
            return Some(SkipReason::EnvOverride(var.clone()));
        }
    }

    None
}
