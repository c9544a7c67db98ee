//! Configuration loading for skill-rules
//!
//! The engine settings live in TOML; the rules themselves live in the JSON
//! rule document that `general.rules_path` points at.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// General configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Rule document; relative paths resolve against the project directory
    pub rules_path: String,

    /// Directory holding one record per session
    pub state_dir: Option<String>,

    /// Enable audit logging
    pub audit_log: bool,

    /// Path to audit log file
    pub audit_path: Option<String>,

    /// Default tracing filter
    pub log_level: String,

    /// Diagnostics log file; stderr when unset
    pub log_path: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            rules_path: ".claude/skills/skill-rules.json".to_string(),
            state_dir: Some("~/.claude/skill-rules/sessions".to_string()),
            audit_log: true,
            audit_path: Some("~/.claude/skill-rules/audit.jsonl".to_string()),
            log_level: "warn".to_string(),
            log_path: Some("~/.claude/skill-rules/engine.log".to_string()),
        }
    }
}

/// Rule document constraints
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RulesConfig {
    /// Rules other configuration depends on; load fails if any is missing
    pub required_rules: Vec<String>,
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub rules: RulesConfig,
}

impl Config {
    /// Load from the first standard location that exists, or defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config_paths = [
            // User-specific config
            dirs::home_dir().map(|p| p.join(".claude/skill-rules/config.toml")),
            // System-wide config
            Some(PathBuf::from("/etc/skill-rules/config.toml")),
        ];

        for path in config_paths.into_iter().flatten() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Ok(Config::default())
    }

    /// Load from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content, &path.display().to_string())
    }

    /// Parse TOML text; `context` names the source in errors
    pub fn from_toml(content: &str, context: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            context: context.to_string(),
            message: e.to_string(),
        })
    }

    /// Expand ~ in path strings. A `~` path cannot be expanded without a
    /// home directory and yields `None`.
    pub fn expand_path(path: &str) -> Option<PathBuf> {
        expand_with_home(path, dirs::home_dir())
    }

    /// Get the audit log path (expanded), if auditing is on
    pub fn audit_path(&self) -> Option<PathBuf> {
        if !self.general.audit_log {
            return None;
        }
        self.general.audit_path.as_deref().and_then(Self::expand_path)
    }

    /// Get the session state directory (expanded)
    pub fn state_dir(&self) -> Option<PathBuf> {
        self.general.state_dir.as_deref().and_then(Self::expand_path)
    }

    /// Get the diagnostics log path (expanded)
    pub fn log_path(&self) -> Option<PathBuf> {
        self.general.log_path.as_deref().and_then(Self::expand_path)
    }

    /// Resolve the rule document path. A relative path is taken from the
    /// project directory, then the hook's working directory.
    pub fn rules_path(&self, project_dir: Option<&str>, cwd: Option<&str>) -> Option<PathBuf> {
        let path = Self::expand_path(&self.general.rules_path)?;
        if path.is_absolute() {
            return Some(path);
        }

        match project_dir.or(cwd) {
            Some(base) => Some(Path::new(base).join(path)),
            None => Some(path),
        }
    }
}

fn expand_with_home(path: &str, home: Option<PathBuf>) -> Option<PathBuf> {
    if path == "~" {
        return home;
    }
    match path.strip_prefix("~/") {
        Some(rest) => home.map(|home| home.join(rest)),
        None => Some(PathBuf::from(path)),
    }
}

/// Embedded default configuration
pub const DEFAULT_CONFIG_TOML: &str = r#"
[general]
rules_path = ".claude/skills/skill-rules.json"
state_dir = "~/.claude/skill-rules/sessions"
audit_log = true
audit_path = "~/.claude/skill-rules/audit.jsonl"
log_level = "warn"
log_path = "~/.claude/skill-rules/engine.log"

[rules]
required_rules = []
"#;
