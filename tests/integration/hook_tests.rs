//! Integration tests for the hook wire format, end to end

use std::sync::Arc;
use tempfile::TempDir;

use skill_rules::output::{EXIT_ALLOW, EXIT_DENY};
use skill_rules::{EnvSnapshot, FileSessionStore, HookInput, HookOutput, SkillEngine};

use crate::common::rules;

fn write_input(cwd: &TempDir, file_path: &str, content: &str) -> HookInput {
    let json = serde_json::json!({
        "session_id": "sess-42",
        "transcript_path": "/tmp/transcript.jsonl",
        "cwd": cwd.path().display().to_string(),
        "hook_event_name": "PreToolUse",
        "tool_name": "Write",
        "tool_input": {"file_path": file_path, "content": content}
    });
    HookInput::from_json(&json.to_string()).unwrap()
}

fn file_engine(state: &TempDir) -> SkillEngine {
    SkillEngine::new(
        rules(),
        Arc::new(FileSessionStore::new(state.path())),
        EnvSnapshot::empty(),
    )
}

#[test]
fn test_write_hook_denies_with_exit_2() {
    let cwd = TempDir::new().unwrap();
    let state = TempDir::new().unwrap();
    let engine = file_engine(&state);

    let input = write_input(&cwd, "services/user.ts", "inject(PrismaService)");
    let output = HookOutput::from_decision(&engine.check_tool_input(&input));

    assert_eq!(output.exit_code, EXIT_DENY);
    assert!(output.stderr.unwrap().contains("services/user.ts"));
}

#[test]
fn test_session_survives_separate_engines() {
    let cwd = TempDir::new().unwrap();
    let state = TempDir::new().unwrap();
    let input = write_input(&cwd, "services/user.ts", "inject(PrismaService)");

    let first = file_engine(&state).check_tool_input(&input);
    assert!(first.is_deny());

    let second = file_engine(&state).check_tool_input(&input);
    assert!(second.is_allow());
    assert_eq!(HookOutput::from_decision(&second).exit_code, EXIT_ALLOW);
}

#[test]
fn test_absolute_path_under_cwd() {
    let cwd = TempDir::new().unwrap();
    let state = TempDir::new().unwrap();
    let absolute = cwd.path().join("services").join("user.test.ts");

    let input = write_input(&cwd, &absolute.display().to_string(), "PrismaService");
    let decision = file_engine(&state).check_tool_input(&input);
    assert!(decision.is_allow());
}

#[test]
fn test_edit_hook_uses_file_on_disk() {
    let cwd = TempDir::new().unwrap();
    let state = TempDir::new().unwrap();
    std::fs::create_dir_all(cwd.path().join("services")).unwrap();
    std::fs::write(
        cwd.path().join("services/order.ts"),
        "export class OrderService {\n  constructor(private db: PrismaService) {}\n}\n",
    )
    .unwrap();

    let json = serde_json::json!({
        "session_id": "sess-7",
        "cwd": cwd.path().display().to_string(),
        "tool_name": "Edit",
        "tool_input": {
            "file_path": "services/order.ts",
            "old_string": "OrderService",
            "new_string": "OrdersService"
        }
    });
    let input = HookInput::from_json(&json.to_string()).unwrap();
    let decision = file_engine(&state).check_tool_input(&input);
    assert_eq!(decision.rule_id(), Some("database-verification"));
}

#[test]
fn test_prompt_hook_input() {
    let state = TempDir::new().unwrap();
    let json = r#"{"session_id":"s","transcript_path":"/t","cwd":"/w","hook_event_name":"UserPromptSubmit","prompt":"how do I add a new xano endpoint"}"#;
    let input = HookInput::from_json(json).unwrap();

    let advisory = file_engine(&state).check_prompt_input(&input);
    let output = HookOutput::from_advisory(&advisory);
    assert_eq!(output.exit_code, EXIT_ALLOW);
    assert!(output.stdout.unwrap().contains("xano-api"));
}

#[test]
fn test_non_file_tool_passes() {
    let state = TempDir::new().unwrap();
    let json = r#"{"session_id":"s","tool_name":"Bash","tool_input":{"command":"rm -rf build"}}"#;
    let input = HookInput::from_json(json).unwrap();

    let output = HookOutput::from_decision(&file_engine(&state).check_tool_input(&input));
    assert_eq!(output, HookOutput::allow());
}
