//! File event matching
//!
//! Path globs select candidate rules, exclusion globs always win, and
//! content patterns (when a rule has any) must find the proposed content.

use tracing::debug;

use crate::engine::{sort_matches, MatchResult};
use crate::error::EvaluationError;
use crate::input::{FileEvent, Operation};
use crate::rules::{MatchInput, Rule, RuleSet};

/// Every rule whose file triggers match `event`, highest priority first
pub fn match_file<'a>(event: &FileEvent, rules: &'a RuleSet) -> Vec<MatchResult<'a>> {
    let path = normalize_path(&event.file_path, event.cwd.as_deref());

    let mut matches: Vec<MatchResult<'a>> = rules
        .rules()
        .iter()
        .filter_map(|rule| match match_rule(rule, &path, event) {
            Ok(result) => result,
            Err(e) => {
                debug!(error = %e, "rule skipped");
                None
            }
        })
        .collect();

    sort_matches(&mut matches);
    matches
}

fn match_rule<'a>(
    rule: &'a Rule,
    path: &str,
    event: &FileEvent,
) -> Result<Option<MatchResult<'a>>, EvaluationError> {
    let Some(triggers) = rule.file_triggers.as_ref() else {
        return Ok(None);
    };

    if triggers.create_only && event.operation != Operation::Create {
        return Ok(None);
    }

    let path_input = MatchInput::Path(path);
    let Some(path_hit) = triggers.path_patterns.iter().find(|t| t.matches(&path_input)) else {
        return Ok(None);
    };

    if triggers.path_exclusions.iter().any(|t| t.matches(&path_input)) {
        return Ok(None);
    }

    if triggers.content_patterns.is_empty() {
        return Ok(Some(MatchResult::new(rule, path_hit)));
    }

    let Some(content) = event.content.as_deref() else {
        return Err(EvaluationError::ContentUnavailable {
            rule: rule.name.clone(),
            path: path.to_string(),
        });
    };

    let content_input = MatchInput::Content(content);
    Ok(triggers
        .content_patterns
        .iter()
        .find(|t| t.matches(&content_input))
        .map(|trigger| MatchResult::new(rule, trigger)))
}

/// Normalize a file path for glob matching: forward slashes, no leading
/// `./`, and relative to `cwd` when the path lies under it
pub fn normalize_path(path: &str, cwd: Option<&str>) -> String {
    let mut normalized = path.replace('\\', "/");

    if let Some(cwd) = cwd {
        let cwd = cwd.replace('\\', "/");
        let cwd = cwd.trim_end_matches('/');
        if !cwd.is_empty() {
            if let Some(rest) = normalized.strip_prefix(cwd) {
                if let Some(relative) = rest.strip_prefix('/') {
                    normalized = relative.to_string();
                }
            }
        }
    }

    while let Some(rest) = normalized.strip_prefix("./") {
        normalized = rest.to_string();
    }

    normalized
}
