//! skill-rules - Skill activation and guardrail hooks for Claude Code
//!
//! This library evaluates a `skill-rules.json` rule document against the two
//! hook events Claude Code exposes for this purpose: prompt submission and
//! file-mutating tool calls.
//!
//! # Features
//!
//! - **Prompt matching**: keywords and intent regexes suggest relevant skills
//! - **File guardrails**: glob + content rules block edits until a skill is used
//! - **Skip conditions**: session memory, inline file markers, env overrides
//! - **Session state**: in-memory or one JSON record per session
//! - **Audit logging**: JSONL log of all decisions
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use skill_rules::{EnvSnapshot, FileEvent, MemorySessionStore, RuleSet, SkillEngine};
//!
//! let rules = RuleSet::from_json(r#"{
//!     "version": "1.0",
//!     "skills": {
//!         "database-verification": {
//!             "type": "guardrail",
//!             "enforcement": "block",
//!             "priority": "critical",
//!             "fileTriggers": {"pathPatterns": ["**/*.ts"], "contentPatterns": ["PrismaService"]},
//!             "blockMessage": "Verify the schema before editing {file_path}"
//!         }
//!     }
//! }"#).unwrap();
//!
//! let engine = SkillEngine::new(rules, Arc::new(MemorySessionStore::new()), EnvSnapshot::empty());
//! let event = FileEvent::new("services/user.ts").with_content("PrismaService");
//!
//! let decision = engine.check_file("session-1", &event);
//! assert!(decision.is_deny());
//! ```

pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod logging;
pub mod output;
pub mod rules;
pub mod session;

// Re-exports for convenience
pub use config::Config;
pub use engine::{EnvSnapshot, MatchResult, SkillEngine};
pub use error::{ConfigError, EvaluationError, PersistenceError};
pub use input::{FileEvent, HookInput, Operation, ToolInput};
pub use output::{Decision, HookOutput, PromptAdvisory};
pub use rules::{Rule, RuleSet};
pub use session::{FileSessionStore, MemorySessionStore, SessionStore};
