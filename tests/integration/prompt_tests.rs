//! Integration tests for the prompt path

use skill_rules::rules::Priority;
use skill_rules::HookOutput;

use crate::common::engine;

#[test]
fn test_xano_endpoint_prompt() {
    let (engine, _) = engine();
    let advisory = engine.check_prompt("how do I add a new xano endpoint");

    assert_eq!(
        advisory.rule_names(),
        vec!["backend-dev-guidelines", "xano-api"]
    );
    let xano = advisory.entries.iter().find(|e| e.rule == "xano-api").unwrap();
    assert_eq!(xano.priority, Priority::Medium);

    let text = advisory.render();
    let heading = text.find("SUGGESTED SKILLS:").unwrap();
    assert!(text[heading..].contains("-> xano-api"));
}

#[test]
fn test_unrelated_prompt_is_empty() {
    let (engine, _) = engine();
    let advisory = engine.check_prompt("what's the weather today");

    assert!(advisory.is_empty());
    let output = HookOutput::from_advisory(&advisory);
    assert_eq!(output.exit_code, 0);
    assert!(output.stdout.is_none());
}

#[test]
fn test_guardrail_prompt_match_is_only_advisory() {
    let (engine, store) = engine();
    let advisory = engine.check_prompt("write a Prisma migration for orders");

    assert_eq!(advisory.rule_names(), vec!["database-verification"]);
    assert_eq!(advisory.entries[0].priority, Priority::Critical);
    assert_eq!(HookOutput::from_advisory(&advisory).exit_code, 0);
    assert!(store.used_rules("default").is_empty());
}

#[test]
fn test_critical_listed_before_high() {
    let (engine, _) = engine();
    let advisory = engine.check_prompt("add a backend controller that runs a prisma query");

    assert_eq!(
        advisory.rule_names(),
        vec!["database-verification", "backend-dev-guidelines"]
    );
    let text = advisory.render();
    assert!(text.find("CRITICAL SKILLS").unwrap() < text.find("RECOMMENDED SKILLS").unwrap());
}
