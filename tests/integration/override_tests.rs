//! Integration tests for skip conditions and global overrides

use skill_rules::engine::{DISABLED_ENV, WARN_ONLY_ENV};
use skill_rules::{ConfigError, Decision, EnvSnapshot, FileEvent, RuleSet, SessionStore};

use crate::common::{engine, engine_with_env};

fn prisma_edit(content: &str) -> FileEvent {
    FileEvent::new("services/user.ts").with_content(content)
}

// ============================================================================
// Per-rule skip conditions
// ============================================================================

#[test]
fn test_env_override_allows() {
    let (engine, store) =
        engine_with_env(EnvSnapshot::empty().with("SKIP_DB_VERIFICATION", "1"));

    let decision = engine.check_file("s", &prisma_edit("PrismaService"));
    assert!(decision.is_allow());
    assert!(!store.was_used("s", "database-verification"));
}

#[test]
fn test_env_override_falsy_still_blocks() {
    let (engine, _) = engine_with_env(EnvSnapshot::empty().with("SKIP_DB_VERIFICATION", "0"));
    assert!(engine.check_file("s", &prisma_edit("PrismaService")).is_deny());
}

#[test]
fn test_file_marker_allows() {
    let (engine, _) = engine();
    let content = "// @skip-validation\nconst db: PrismaService = get();";
    assert!(engine.check_file("s", &prisma_edit(content)).is_allow());
}

#[test]
fn test_session_used_and_marker_both_hold() {
    let (engine, store) = engine();
    store.mark_used("s", "database-verification").unwrap();

    let content = "// @skip-validation\nPrismaService";
    let decision = engine.check_file("s", &prisma_edit(content));
    assert!(decision.is_allow());
    assert_eq!(decision.rule_id(), None);
}

#[test]
fn test_mark_used_idempotent() {
    let (engine, store) = engine();
    store.mark_used("s", "database-verification").unwrap();
    store.mark_used("s", "database-verification").unwrap();

    assert!(store.was_used("s", "database-verification"));
    assert!(engine.check_file("s", &prisma_edit("PrismaService")).is_allow());

    store.reset("s").unwrap();
    assert!(engine.check_file("s", &prisma_edit("PrismaService")).is_deny());
}

// ============================================================================
// Global switches
// ============================================================================

#[test]
fn test_disabled_allows_everything() {
    let (engine, _) = engine_with_env(EnvSnapshot::empty().with(DISABLED_ENV, "1"));

    assert_eq!(
        engine.check_file("s", &prisma_edit("PrismaService")),
        Decision::allow()
    );
    assert!(engine.check_prompt("prisma migration").is_empty());
}

#[test]
fn test_warn_only_downgrades() {
    let (engine, store) = engine_with_env(EnvSnapshot::empty().with(WARN_ONLY_ENV, "yes"));

    let decision = engine.check_file("s", &prisma_edit("PrismaService"));
    assert!(matches!(decision, Decision::Warn { .. }));
    assert!(decision.message().unwrap().contains("services/user.ts"));
    assert!(!store.was_used("s", "database-verification"));
}

#[test]
fn test_dry_run_matches_warn_only() {
    let (engine, _) = engine();
    let engine = engine.with_warn_only(true);

    let decision = engine.check_file("s", &prisma_edit("PrismaService"));
    assert_eq!(decision.rule_id(), Some("database-verification"));
    assert!(decision.is_allow());
}

// ============================================================================
// Configuration errors
// ============================================================================

#[test]
fn test_block_without_message_fails_load() {
    let doc = r#"{
        "version": "1.0",
        "skills": {
            "database-verification": {
                "type": "guardrail",
                "enforcement": "block",
                "priority": "critical",
                "fileTriggers": {"pathPatterns": ["**/*.ts"]}
            }
        }
    }"#;

    let err = RuleSet::from_json(doc).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }));
    assert!(err.to_string().contains("database-verification"));
}

#[test]
fn test_rule_without_triggers_fails_load() {
    let doc = r#"{"version": "1.0", "skills": {"orphan": {
        "type": "domain", "enforcement": "suggest", "priority": "low"
    }}}"#;
    assert!(RuleSet::from_json(doc).is_err());
}

#[test]
fn test_unknown_fields_ignored() {
    let doc = r#"{"version": "1.0", "generatedBy": "tool", "skills": {"docs": {
        "type": "domain", "enforcement": "suggest", "priority": "low",
        "promptTriggers": {"keywords": ["docs"], "weights": [1]},
        "owner": "platform-team"
    }}}"#;
    let rules = RuleSet::from_json(doc).unwrap();
    assert_eq!(rules.len(), 1);
}
