//! Shared fixtures

use std::sync::Arc;

use skill_rules::{EnvSnapshot, MemorySessionStore, RuleSet, SkillEngine};

pub const RULES_JSON: &str = include_str!("fixtures/skill-rules.json");

pub fn rules() -> RuleSet {
    RuleSet::from_json(RULES_JSON).unwrap()
}

pub fn engine() -> (SkillEngine, Arc<MemorySessionStore>) {
    engine_with_env(EnvSnapshot::empty())
}

pub fn engine_with_env(env: EnvSnapshot) -> (SkillEngine, Arc<MemorySessionStore>) {
    let store = Arc::new(MemorySessionStore::new());
    let engine = SkillEngine::new(rules(), store.clone(), env);
    (engine, store)
}
