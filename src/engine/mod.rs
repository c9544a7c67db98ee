//! Skill rule engine
//!
//! Turns matches into the two hook responses: an advisory block for
//! prompts and an allow/deny decision for file edits.

pub mod file;
pub mod prompt;
pub mod skip;

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::input::{FileEvent, HookInput};
use crate::output::{AdvisoryEntry, Decision, PromptAdvisory};
use crate::rules::{Enforcement, Rule, RuleSet, Trigger, TriggerKind};
use crate::session::SessionStore;

pub use skip::{EnvSnapshot, SkipReason};

/// Environment variable that turns every check into a silent allow
pub const DISABLED_ENV: &str = "SKILL_RULES_DISABLED";

/// Environment variable that downgrades blocks to warnings
pub const WARN_ONLY_ENV: &str = "SKILL_RULES_WARN_ONLY";

/// A rule that matched one event
#[derive(Debug, Clone)]
pub struct MatchResult<'a> {
    pub rule: &'a Rule,
    pub matched_by: TriggerKind,
    /// The literal keyword, pattern or glob that hit
    pub trigger: String,
}

impl<'a> MatchResult<'a> {
    pub fn new(rule: &'a Rule, trigger: &Trigger) -> Self {
        Self {
            rule,
            matched_by: trigger.kind(),
            trigger: trigger.source().to_string(),
        }
    }
}

/// Priority first, then rule name
pub(crate) fn sort_matches(matches: &mut [MatchResult<'_>]) {
    matches.sort_by(|a, b| {
        a.rule
            .priority
            .cmp(&b.rule.priority)
            .then_with(|| a.rule.name.cmp(&b.rule.name))
    });
}

/// The main engine
pub struct SkillEngine {
    rules: RuleSet,
    sessions: Arc<dyn SessionStore>,
    env: EnvSnapshot,
    warn_only: bool,
}

impl SkillEngine {
    /// Create an engine over a loaded rule set
    pub fn new(rules: RuleSet, sessions: Arc<dyn SessionStore>, env: EnvSnapshot) -> Self {
        Self {
            rules,
            sessions,
            env,
            warn_only: false,
        }
    }

    /// Force warn-only mode regardless of the environment
    pub fn with_warn_only(mut self, warn_only: bool) -> Self {
        self.warn_only = warn_only;
        self
    }

    /// Check if all checks are disabled via environment
    pub fn is_disabled(&self) -> bool {
        self.env.is_truthy(DISABLED_ENV)
    }

    /// Check if blocks are downgraded to warnings
    pub fn is_warn_only(&self) -> bool {
        self.warn_only || self.env.is_truthy(WARN_ONLY_ENV)
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Prompt path: which skills a prompt activates. Never blocks.
    pub fn check_prompt(&self, prompt: &str) -> PromptAdvisory {
        if self.is_disabled() {
            return PromptAdvisory::default();
        }

        let entries = prompt::match_prompt(prompt, &self.rules)
            .into_iter()
            .map(|m| AdvisoryEntry {
                rule: m.rule.name.clone(),
                priority: m.rule.priority,
                enforcement: m.rule.enforcement,
                matched_by: m.matched_by,
                trigger: m.trigger,
            })
            .collect();

        PromptAdvisory { entries }
    }

    /// Prompt path from hook input
    pub fn check_prompt_input(&self, input: &HookInput) -> PromptAdvisory {
        self.check_prompt(input.prompt.as_deref().unwrap_or_default())
    }

    /// File path from hook input. Tools that do not mutate a file pass.
    pub fn check_tool_input(&self, input: &HookInput) -> Decision {
        match input.file_event() {
            Some(event) => self.check_file(input.session_id(), &event),
            None => Decision::allow(),
        }
    }

    /// File path: deny when a blocking rule fires, otherwise allow with
    /// any advisory text
    pub fn check_file(&self, session_id: &str, event: &FileEvent) -> Decision {
        if self.is_disabled() {
            return Decision::allow();
        }

        let matches = file::match_file(event, &self.rules);
        let (blocking, advisory): (Vec<_>, Vec<_>) =
            matches.into_iter().partition(|m| m.rule.can_block());

        if let Some(fired) = self.select_block(session_id, event, &blocking) {
            let reason = fired.rule.remediation(&event.file_path, &event.tool_name);

            if self.is_warn_only() {
                info!(rule = %fired.rule.name, file = %event.file_path, "block downgraded to warning");
                return Decision::warn(&fired.rule.name, reason);
            }

            info!(rule = %fired.rule.name, file = %event.file_path, session = session_id, "blocking edit");
            return Decision::deny(&fired.rule.name, reason);
        }

        match advisory_text(&advisory, event) {
            Some(text) => Decision::advise(text),
            None => Decision::allow(),
        }
    }

    /// Pick the first blocking match that survives its skip conditions and
    /// claim it in the session. Later survivors are logged and dropped.
    fn select_block<'a>(
        &self,
        session_id: &str,
        event: &FileEvent,
        blocking: &'a [MatchResult<'a>],
    ) -> Option<&'a MatchResult<'a>> {
        let mut fired: Option<&'a MatchResult<'a>> = None;

        for candidate in blocking {
            let rule = candidate.rule;

            if let Some(reason) = skip::evaluate(
                rule,
                session_id,
                event.content.as_deref(),
                &self.env,
                self.sessions.as_ref(),
            ) {
                debug!(rule = %rule.name, %reason, "block skipped");
                continue;
            }

            if let Some(winner) = fired {
                debug!(rule = %rule.name, winner = %winner.rule.name, "additional block suppressed");
                continue;
            }

            if self.is_warn_only() {
                fired = Some(candidate);
                continue;
            }

            match self.sessions.try_mark_used(session_id, &rule.name) {
                Ok(false) if rule.skip_conditions.session_skill_used => {
                    debug!(rule = %rule.name, "block already claimed in this session");
                }
                Ok(_) => fired = Some(candidate),
                Err(e) => {
                    warn!(rule = %rule.name, error = %e, "failed to record rule use");
                    fired = Some(candidate);
                }
            }
        }

        fired
    }
}

fn advisory_text(matches: &[MatchResult<'_>], event: &FileEvent) -> Option<String> {
    if matches.is_empty() {
        return None;
    }

    let lines: Vec<String> = matches
        .iter()
        .map(|m| match (m.rule.enforcement, &m.rule.block_message) {
            (Enforcement::Warn, Some(_)) => format!(
                "[skill-rules:{}] Warning: {}",
                m.rule.name,
                m.rule.remediation(&event.file_path, &event.tool_name)
            ),
            (Enforcement::Warn, None) => format!(
                "[skill-rules:{}] Warning: skill '{}' applies to {}",
                m.rule.name, m.rule.name, event.file_path
            ),
            _ => format!(
                "[skill-rules:{}] Consider skill '{}' for {}",
                m.rule.name, m.rule.name, event.file_path
            ),
        })
        .collect();

    Some(lines.join("\n"))
}
