//! Loading and validating the rule document
//!
//! A [`RuleSet`] is built once per hook invocation and never changes after
//! that. Every problem with the document is a [`ConfigError`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

use crate::error::ConfigError;
use crate::rules::{
    Enforcement, FileTriggerSpec, FileTriggers, PromptTriggerSpec, PromptTriggers, Rule,
    RuleKind, RuleSpec, Trigger,
};

/// The on-disk document shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDocument {
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Rule name → rule; key order is preserved
    pub skills: Map<String, Value>,
}

/// The loaded, immutable set of rules
#[derive(Debug, Clone)]
pub struct RuleSet {
    version: String,
    description: Option<String>,
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Parse and validate a rule document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let document: RuleDocument =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse {
                context: "rule document".to_string(),
                message: e.to_string(),
            })?;
        Self::from_document(document)
    }

    /// Load a rule document from a file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let set = Self::from_json(&content)?;
        debug!(path = %path.display(), rules = set.len(), "loaded rule document");
        Ok(set)
    }

    /// Validate and compile an already parsed document
    pub fn from_document(document: RuleDocument) -> Result<Self, ConfigError> {
        if document.version.trim().is_empty() {
            return Err(ConfigError::Parse {
                context: "rule document".to_string(),
                message: "version must not be empty".to_string(),
            });
        }

        let mut rules = Vec::with_capacity(document.skills.len());
        for (name, value) in document.skills {
            let spec: RuleSpec =
                serde_json::from_value(value).map_err(|e| ConfigError::Parse {
                    context: format!("rule '{}'", name),
                    message: e.to_string(),
                })?;
            rules.push(compile_rule(name, spec)?);
        }

        Ok(Self {
            version: document.version,
            description: document.description,
            rules,
        })
    }

    /// Fail if any of `names` is not defined
    pub fn require(&self, names: &[String]) -> Result<(), ConfigError> {
        for name in names {
            if self.get(name).is_none() {
                return Err(ConfigError::MissingRule(name.clone()));
            }
        }
        Ok(())
    }

    /// All rules in document order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Write the set back out in document form
    pub fn to_document(&self) -> RuleDocument {
        let mut skills = Map::new();
        for rule in &self.rules {
            // RuleSpec only holds strings, bools and enums
            let value = serde_json::to_value(&rule.spec).unwrap_or(Value::Null);
            skills.insert(rule.name.clone(), value);
        }

        RuleDocument {
            version: self.version.clone(),
            description: self.description.clone(),
            skills,
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.to_document()).unwrap_or_else(|_| "{}".to_string())
    }
}

fn compile_rule(name: String, spec: RuleSpec) -> Result<Rule, ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::invalid(&name, "rule name must not be empty"));
    }

    if spec.enforcement == Enforcement::Block {
        if spec.kind != RuleKind::Guardrail {
            return Err(ConfigError::invalid(
                &name,
                "enforcement 'block' is only allowed on guardrail rules",
            ));
        }
        let has_message = spec
            .block_message
            .as_deref()
            .is_some_and(|m| !m.trim().is_empty());
        if !has_message {
            return Err(ConfigError::invalid(
                &name,
                "enforcement 'block' requires a blockMessage",
            ));
        }
    }

    let prompt_triggers = spec
        .prompt_triggers
        .as_ref()
        .map(|p| compile_prompt_triggers(&name, p))
        .transpose()?
        .filter(|p| !p.is_empty());

    let file_triggers = spec
        .file_triggers
        .as_ref()
        .map(|f| compile_file_triggers(&name, f))
        .transpose()?;

    if prompt_triggers.is_none() && file_triggers.is_none() {
        return Err(ConfigError::invalid(
            &name,
            "rule has no promptTriggers or fileTriggers and can never match",
        ));
    }

    Ok(Rule {
        kind: spec.kind,
        enforcement: spec.enforcement,
        priority: spec.priority,
        description: spec.description.clone(),
        prompt_triggers,
        file_triggers,
        block_message: spec.block_message.clone(),
        skip_conditions: spec.skip_conditions.clone(),
        name,
        spec,
    })
}

fn compile_prompt_triggers(
    rule: &str,
    spec: &PromptTriggerSpec,
) -> Result<PromptTriggers, ConfigError> {
    let keywords = spec
        .keywords
        .iter()
        .filter(|k| !k.trim().is_empty())
        .map(|k| Trigger::keyword(k))
        .collect();

    let intent_patterns = spec
        .intent_patterns
        .iter()
        .map(|p| Trigger::intent_pattern(rule, p))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PromptTriggers {
        keywords,
        intent_patterns,
    })
}

fn compile_file_triggers(rule: &str, spec: &FileTriggerSpec) -> Result<FileTriggers, ConfigError> {
    if spec.path_patterns.is_empty() {
        return Err(ConfigError::invalid(
            rule,
            "fileTriggers.pathPatterns must not be empty",
        ));
    }

    let path_patterns = spec
        .path_patterns
        .iter()
        .map(|p| Trigger::path_pattern(rule, p))
        .collect::<Result<Vec<_>, _>>()?;

    let path_exclusions = spec
        .path_exclusions
        .iter()
        .map(|p| Trigger::path_pattern(rule, p))
        .collect::<Result<Vec<_>, _>>()?;

    let content_patterns = spec
        .content_patterns
        .iter()
        .map(|p| Trigger::content_pattern(rule, p))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FileTriggers {
        path_patterns,
        path_exclusions,
        content_patterns,
        create_only: spec.create_only,
    })
}
