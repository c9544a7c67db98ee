//! Input parsing for Claude Code hook JSON format
//!
//! One struct covers both hook events this engine serves: `UserPromptSubmit`
//! carries `prompt`, `PreToolUse` carries `tool_name` and `tool_input`.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main input structure from Claude Code hooks
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookInput {
    /// Conversation identifier
    #[serde(default)]
    pub session_id: Option<String>,

    /// Path of the conversation transcript (opaque here)
    #[serde(default)]
    pub transcript_path: Option<String>,

    /// Working directory of the session
    #[serde(default)]
    pub cwd: Option<String>,

    /// Hook event name (e.g., "UserPromptSubmit", "PreToolUse")
    #[serde(default)]
    pub hook_event_name: Option<String>,

    /// Submitted prompt (UserPromptSubmit)
    #[serde(default)]
    pub prompt: Option<String>,

    /// Tool being invoked (PreToolUse)
    #[serde(default)]
    pub tool_name: Option<String>,

    /// Tool-specific parameters (PreToolUse)
    #[serde(default)]
    pub tool_input: Option<ToolInput>,
}

/// A single string replacement
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EditOp {
    pub old_string: String,
    pub new_string: String,
    #[serde(default)]
    pub replace_all: bool,
}

/// Tool-specific input variants
#[derive(Debug, Clone)]
pub enum ToolInput {
    /// Whole-file write
    Write { file_path: String, content: String },

    /// Single replacement edit
    Edit { file_path: String, edit: EditOp },

    /// Several replacements applied in order
    MultiEdit { file_path: String, edits: Vec<EditOp> },

    /// Anything that does not mutate a file
    Other { raw: serde_json::Value },
}

impl<'de> Deserialize<'de> for ToolInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;

        let file_path = value
            .get("file_path")
            .and_then(|v| v.as_str())
            .map(String::from);

        if let Some(file_path) = file_path {
            if let Some(edits) = value.get("edits") {
                let edits: Vec<EditOp> =
                    serde_json::from_value(edits.clone()).map_err(serde::de::Error::custom)?;
                return Ok(ToolInput::MultiEdit { file_path, edits });
            }

            if value.get("old_string").is_some() && value.get("new_string").is_some() {
                let edit: EditOp =
                    serde_json::from_value(value.clone()).map_err(serde::de::Error::custom)?;
                return Ok(ToolInput::Edit { file_path, edit });
            }

            if let Some(content) = value.get("content").and_then(|v| v.as_str()) {
                return Ok(ToolInput::Write {
                    file_path,
                    content: content.to_string(),
                });
            }
        }

        Ok(ToolInput::Other { raw: value })
    }
}

impl ToolInput {
    pub fn file_path(&self) -> Option<&str> {
        match self {
            ToolInput::Write { file_path, .. }
            | ToolInput::Edit { file_path, .. }
            | ToolInput::MultiEdit { file_path, .. } => Some(file_path),
            ToolInput::Other { .. } => None,
        }
    }
}

/// Whether an edit creates the file or changes an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Modify,
}

/// A file mutation as seen by the file matcher
#[derive(Debug, Clone)]
pub struct FileEvent {
    /// Tool that performs the mutation
    pub tool_name: String,

    /// Path as the tool received it
    pub file_path: String,

    /// Working directory used to relativize `file_path`
    pub cwd: Option<String>,

    /// Proposed content after the mutation, if it could be determined
    pub content: Option<String>,

    pub operation: Operation,
}

impl FileEvent {
    /// A modification of `file_path` with unknown content
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            tool_name: "Edit".to_string(),
            file_path: file_path.into(),
            cwd: None,
            content: None,
            operation: Operation::Modify,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_tool(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = tool_name.into();
        self
    }

    pub fn created(mut self) -> Self {
        self.operation = Operation::Create;
        self
    }
}

impl HookInput {
    /// Parse input from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn session_id(&self) -> &str {
        self.session_id.as_deref().unwrap_or("default")
    }

    /// Build the file event for a mutating tool call, reading the current
    /// file from disk to derive the proposed content of edits
    pub fn file_event(&self) -> Option<FileEvent> {
        let tool_input = self.tool_input.as_ref()?;
        let file_path = tool_input.file_path()?;
        let resolved = resolve_path(file_path, self.cwd.as_deref());
        let exists = resolved.exists();

        let content = match tool_input {
            ToolInput::Write { content, .. } => Some(content.clone()),
            ToolInput::Edit { edit, .. } => {
                read_current(&resolved).map(|current| apply_edits(current, std::slice::from_ref(edit)))
            }
            ToolInput::MultiEdit { edits, .. } => {
                read_current(&resolved).map(|current| apply_edits(current, edits))
            }
            ToolInput::Other { .. } => None,
        };

        Some(FileEvent {
            tool_name: self.tool_name.clone().unwrap_or_default(),
            file_path: file_path.to_string(),
            cwd: self.cwd.clone(),
            content,
            operation: if exists {
                Operation::Modify
            } else {
                Operation::Create
            },
        })
    }

    /// Get a summary of the input for logging
    pub fn summary(&self) -> String {
        if let Some(prompt) = &self.prompt {
            let truncated: String = prompt.chars().take(100).collect();
            if truncated.len() < prompt.len() {
                return format!("Prompt: {}...", truncated);
            }
            return format!("Prompt: {}", truncated);
        }

        let tool = self.tool_name.as_deref().unwrap_or("unknown");
        match self.tool_input.as_ref().and_then(|t| t.file_path()) {
            Some(path) => format!("{}: {}", tool, path),
            None => format!("{}: (no file)", tool),
        }
    }
}

fn resolve_path(file_path: &str, cwd: Option<&str>) -> PathBuf {
    let path = Path::new(file_path);
    match cwd {
        Some(cwd) if path.is_relative() => Path::new(cwd).join(path),
        _ => path.to_path_buf(),
    }
}

fn read_current(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "current file content unavailable");
            None
        }
    }
}

fn apply_edits(mut content: String, edits: &[EditOp]) -> String {
    for edit in edits {
        content = if edit.replace_all {
            content.replace(&edit.old_string, &edit.new_string)
        } else {
            content.replacen(&edit.old_string, &edit.new_string, 1)
        };
    }
    content
}
