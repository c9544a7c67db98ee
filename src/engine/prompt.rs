//! Prompt matching
//!
//! Keywords are tried before intent patterns; the first trigger that hits
//! decides how the rule is reported.

use crate::engine::{sort_matches, MatchResult};
use crate::rules::{MatchInput, RuleSet};

/// Every rule whose prompt triggers match `prompt`, highest priority first
pub fn match_prompt<'a>(prompt: &str, rules: &'a RuleSet) -> Vec<MatchResult<'a>> {
    if prompt.trim().is_empty() {
        return Vec::new();
    }

    let lowered = prompt.to_lowercase();
    let input = MatchInput::Prompt {
        raw: prompt,
        lowered: &lowered,
    };

    let mut matches: Vec<MatchResult<'a>> = rules
        .rules()
        .iter()
        .filter_map(|rule| {
            let triggers = rule.prompt_triggers.as_ref()?;
            triggers
                .keywords
                .iter()
                .chain(triggers.intent_patterns.iter())
                .find(|t| t.matches(&input))
                .map(|trigger| MatchResult::new(rule, trigger))
        })
        .collect();

    sort_matches(&mut matches);
    matches
}
