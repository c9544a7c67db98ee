//! JSONL audit logging for skill-rules
//!
//! Records every hook decision to a JSONL file for later analysis.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::input::HookInput;
use crate::output::{Decision, PromptAdvisory};

/// Log level for audit entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Allowed,
    Advised,
    Blocked,
    Warn,
    Disabled,
}

/// Which hook produced the entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HookEvent {
    Prompt,
    PreTool,
}

/// An audit log entry
#[derive(Debug, Serialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,

    pub event: HookEvent,

    pub level: LogLevel,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,

    /// Rule that decided the outcome, or every activated rule for prompts
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<String>,

    pub input_summary: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl AuditEntry {
    /// Entry for a file-event decision
    pub fn for_decision(input: &HookInput, decision: &Decision, disabled: bool) -> Self {
        let (level, rules, reason) = if disabled {
            (LogLevel::Disabled, Vec::new(), None)
        } else {
            match decision {
                Decision::Allow { advisory: None } => (LogLevel::Allowed, Vec::new(), None),
                Decision::Allow {
                    advisory: Some(text),
                } => (LogLevel::Advised, Vec::new(), Some(text.clone())),
                Decision::Deny { rule_id, reason } => {
                    (LogLevel::Blocked, vec![rule_id.clone()], Some(reason.clone()))
                }
                Decision::Warn { rule_id, reason } => {
                    (LogLevel::Warn, vec![rule_id.clone()], Some(reason.clone()))
                }
            }
        };

        Self {
            timestamp: Utc::now(),
            event: HookEvent::PreTool,
            level,
            tool: input.tool_name.clone(),
            rules,
            input_summary: input.summary(),
            reason,
            session_id: input.session_id.clone(),
        }
    }

    /// Entry for a prompt advisory
    pub fn for_advisory(input: &HookInput, advisory: &PromptAdvisory, disabled: bool) -> Self {
        let level = if disabled {
            LogLevel::Disabled
        } else if advisory.is_empty() {
            LogLevel::Allowed
        } else {
            LogLevel::Advised
        };

        Self {
            timestamp: Utc::now(),
            event: HookEvent::Prompt,
            level,
            tool: None,
            rules: advisory.rule_names().into_iter().map(String::from).collect(),
            input_summary: input.summary(),
            reason: None,
            session_id: input.session_id.clone(),
        }
    }
}

/// Audit logger
#[derive(Default)]
pub struct AuditLogger {
    writer: Option<BufWriter<File>>,
}

impl AuditLogger {
    /// Create a new audit logger; an unopenable path disables logging
    pub fn new(path: Option<&Path>) -> Self {
        let writer = path.and_then(|p| {
            // Ensure parent directory exists
            if let Some(parent) = p.parent() {
                let _ = std::fs::create_dir_all(parent);
            }

            OpenOptions::new()
                .create(true)
                .append(true)
                .open(p)
                .ok()
                .map(BufWriter::new)
        });

        Self { writer }
    }

    /// Log an audit entry
    pub fn log(&mut self, entry: &AuditEntry) -> Result<(), std::io::Error> {
        if let Some(ref mut writer) = self.writer {
            let json = serde_json::to_string(entry)?;
            writeln!(writer, "{}", json)?;
            writer.flush()?;
        }
        Ok(())
    }

    /// Check if logging is enabled
    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }
}
