//! Output formatting for Claude Code hook responses
//!
//! Both hooks answer through exit status and plain text. Exit 0 allows the
//! event and stdout becomes context; exit 2 blocks the tool call and stderr
//! is handed to the agent as the reason.

use serde::Serialize;
use std::io::{self, Write};

use crate::rules::{Enforcement, Priority, TriggerKind};

/// Exit status for an allowed event
pub const EXIT_ALLOW: i32 = 0;

/// Exit status for a fatal configuration error; hosts treat it as allow
pub const EXIT_CONFIG_ERROR: i32 = 1;

/// Exit status the host treats as a blocked tool call
pub const EXIT_DENY: i32 = 2;

/// Decision result for a file event
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Allow the operation, optionally with guidance for the agent
    Allow { advisory: Option<String> },

    /// Block the operation until the remediation is done
    Deny { rule_id: String, reason: String },

    /// A block downgraded to a warning (warn-only mode)
    Warn { rule_id: String, reason: String },
}

impl Decision {
    /// Create an allow decision with no text
    pub fn allow() -> Self {
        Decision::Allow { advisory: None }
    }

    /// Create an allow decision carrying advisory text
    pub fn advise(advisory: impl Into<String>) -> Self {
        Decision::Allow {
            advisory: Some(advisory.into()),
        }
    }

    /// Create a deny decision
    pub fn deny(rule_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Decision::Deny {
            rule_id: rule_id.into(),
            reason: reason.into(),
        }
    }

    /// Create a warn decision
    pub fn warn(rule_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Decision::Warn {
            rule_id: rule_id.into(),
            reason: reason.into(),
        }
    }

    /// Allow and Warn both let the tool call proceed
    pub fn is_allow(&self) -> bool {
        !self.is_deny()
    }

    pub fn is_deny(&self) -> bool {
        matches!(self, Decision::Deny { .. })
    }

    /// Get the rule ID if applicable
    pub fn rule_id(&self) -> Option<&str> {
        match self {
            Decision::Allow { .. } => None,
            Decision::Deny { rule_id, .. } | Decision::Warn { rule_id, .. } => Some(rule_id),
        }
    }

    /// Text that accompanies the decision, if any
    pub fn message(&self) -> Option<&str> {
        match self {
            Decision::Allow { advisory } => advisory.as_deref(),
            Decision::Deny { reason, .. } | Decision::Warn { reason, .. } => Some(reason),
        }
    }
}

/// One rule activated by a prompt
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryEntry {
    pub rule: String,
    pub priority: Priority,
    pub enforcement: Enforcement,
    pub matched_by: TriggerKind,
    pub trigger: String,
}

/// Result of the prompt path. Never blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PromptAdvisory {
    pub entries: Vec<AdvisoryEntry>,
}

impl PromptAdvisory {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of the activated rules, in presentation order
    pub fn rule_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.rule.as_str()).collect()
    }

    /// Render the context block injected ahead of the prompt
    pub fn render(&self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }

        let mut out = String::from("SKILL ACTIVATION CHECK\n");
        for priority in Priority::ALL {
            let group: Vec<&AdvisoryEntry> = self
                .entries
                .iter()
                .filter(|e| e.priority == priority)
                .collect();
            if group.is_empty() {
                continue;
            }

            out.push('\n');
            out.push_str(group_heading(priority));
            out.push('\n');
            for entry in group {
                out.push_str(&format!("  -> {}\n", entry.rule));
            }
        }
        out.push_str("\nACTION: Use the Skill tool for the skills above before responding\n");
        out
    }
}

fn group_heading(priority: Priority) -> &'static str {
    match priority {
        Priority::Critical => "CRITICAL SKILLS (REQUIRED):",
        Priority::High => "RECOMMENDED SKILLS:",
        Priority::Medium => "SUGGESTED SKILLS:",
        Priority::Low => "OPTIONAL SKILLS:",
    }
}

/// What the binary writes and the status it exits with
#[derive(Debug, Clone, PartialEq)]
pub struct HookOutput {
    pub exit_code: i32,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

impl HookOutput {
    /// Create an allow response (no output)
    pub fn allow() -> Self {
        HookOutput {
            exit_code: EXIT_ALLOW,
            stdout: None,
            stderr: None,
        }
    }

    /// Create a deny response with rule ID and remediation text
    pub fn deny_with_rule(rule_id: &str, reason: &str) -> Self {
        HookOutput {
            exit_code: EXIT_DENY,
            stdout: None,
            stderr: Some(format!("[skill-rules:{}] Blocked: {}", rule_id, reason)),
        }
    }

    /// Create a warn response (allows but shows the remediation)
    pub fn warn(rule_id: &str, message: &str) -> Self {
        HookOutput {
            exit_code: EXIT_ALLOW,
            stdout: Some(format!("[skill-rules:{}] Warning: {}", rule_id, message)),
            stderr: None,
        }
    }

    /// Create output from a file-event Decision
    pub fn from_decision(decision: &Decision) -> Self {
        match decision {
            Decision::Allow { advisory: None } => HookOutput::allow(),
            Decision::Allow {
                advisory: Some(text),
            } => HookOutput {
                exit_code: EXIT_ALLOW,
                stdout: Some(text.clone()),
                stderr: None,
            },
            Decision::Deny { rule_id, reason } => HookOutput::deny_with_rule(rule_id, reason),
            Decision::Warn { rule_id, reason } => HookOutput::warn(rule_id, reason),
        }
    }

    /// Create output for the prompt path; always exit 0
    pub fn from_advisory(advisory: &PromptAdvisory) -> Self {
        HookOutput {
            exit_code: EXIT_ALLOW,
            stdout: (!advisory.is_empty()).then(|| advisory.render()),
            stderr: None,
        }
    }

    /// Write the text to the process streams
    pub fn write_to(&self, stdout: &mut impl Write, stderr: &mut impl Write) -> io::Result<()> {
        if let Some(text) = &self.stdout {
            writeln!(stdout, "{}", text.trim_end())?;
            stdout.flush()?;
        }
        if let Some(text) = &self.stderr {
            writeln!(stderr, "{}", text.trim_end())?;
            stderr.flush()?;
        }
        Ok(())
    }
}
