//! Rule definitions for skill-rules
//!
//! The document types mirror `skill-rules.json` field for field. A [`Rule`]
//! is the compiled form: its triggers are ready-to-run regexes and globs.

pub mod store;
pub mod trigger;

use serde::{Deserialize, Serialize};

pub use store::RuleSet;
pub use trigger::{MatchInput, Trigger, TriggerKind};

/// Whether a rule may block a tool call or only advise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// May block file edits
    Guardrail,

    /// Advisory only
    Domain,
}

/// What happens when a rule matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Enforcement {
    Block,
    Suggest,
    Warn,
}

/// Presentation order of matches. Declaration order is the sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// All priorities, highest first
    pub const ALL: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

/// Prompt triggers as written in the document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PromptTriggerSpec {
    pub keywords: Vec<String>,
    pub intent_patterns: Vec<String>,
}

/// File triggers as written in the document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileTriggerSpec {
    pub path_patterns: Vec<String>,
    pub path_exclusions: Vec<String>,
    pub content_patterns: Vec<String>,
    pub create_only: bool,
}

/// Escape hatches that suppress an otherwise firing block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkipConditions {
    /// Skip once the rule has fired in this session
    pub session_skill_used: bool,

    /// Skip when the file content contains any of these literals
    pub file_markers: Vec<String>,

    /// Skip when this environment variable is truthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_override: Option<String>,
}

/// One entry under `skills` in the rule document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSpec {
    #[serde(rename = "type")]
    pub kind: RuleKind,

    pub enforcement: Enforcement,

    pub priority: Priority,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_triggers: Option<PromptTriggerSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_triggers: Option<FileTriggerSpec>,

    /// Remediation text; `{file_path}` and `{tool_name}` are substituted
    #[serde(
        default,
        alias = "remediationMessage",
        skip_serializing_if = "Option::is_none"
    )]
    pub block_message: Option<String>,

    #[serde(default)]
    pub skip_conditions: SkipConditions,
}

/// Compiled prompt triggers
#[derive(Debug, Clone)]
pub struct PromptTriggers {
    pub keywords: Vec<Trigger>,
    pub intent_patterns: Vec<Trigger>,
}

impl PromptTriggers {
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.intent_patterns.is_empty()
    }
}

/// Compiled file triggers
#[derive(Debug, Clone)]
pub struct FileTriggers {
    pub path_patterns: Vec<Trigger>,
    pub path_exclusions: Vec<Trigger>,
    pub content_patterns: Vec<Trigger>,
    pub create_only: bool,
}

/// A validated rule with compiled triggers
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub kind: RuleKind,
    pub enforcement: Enforcement,
    pub priority: Priority,
    pub description: Option<String>,
    pub prompt_triggers: Option<PromptTriggers>,
    pub file_triggers: Option<FileTriggers>,
    pub block_message: Option<String>,
    pub skip_conditions: SkipConditions,

    /// Source form, kept so the set can be written back out
    pub(crate) spec: RuleSpec,
}

impl Rule {
    /// True for guardrail rules whose enforcement is `block`
    pub fn can_block(&self) -> bool {
        self.kind == RuleKind::Guardrail && self.enforcement == Enforcement::Block
    }

    /// Remediation text for a denied edit of `file_path`
    pub fn remediation(&self, file_path: &str, tool_name: &str) -> String {
        match &self.block_message {
            Some(template) => fill_template(template, file_path, tool_name),
            None => format!(
                "Skill '{}' must be used before editing {}",
                self.name, file_path
            ),
        }
    }

    /// The document form of this rule
    pub fn spec(&self) -> &RuleSpec {
        &self.spec
    }
}

/// Substitute placeholders in one pass, so substituted text is never
/// scanned again
fn fill_template(template: &str, file_path: &str, tool_name: &str) -> String {
    let mut out = String::with_capacity(template.len() + file_path.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{file_path}") {
            out.push_str(file_path);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{tool_name}") {
            out.push_str(tool_name);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}
