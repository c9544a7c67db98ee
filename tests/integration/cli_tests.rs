//! Integration tests for the hook binary at the process boundary

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

const FIXTURE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/integration/fixtures/skill-rules.json"
);

/// A scratch home for config, session state and logs
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = format!(
            "[general]\nstate_dir = \"{}\"\naudit_log = false\nlog_path = \"{}\"\n",
            dir.path().join("sessions").display(),
            dir.path().join("engine.log").display(),
        );
        std::fs::write(dir.path().join("config.toml"), config).unwrap();
        Sandbox { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn run(&self, args: &[&str], rules: &Path, stdin: &str) -> Output {
        let mut child = Command::new(env!("CARGO_BIN_EXE_skill-rules"))
            .arg("--config")
            .arg(self.path().join("config.toml"))
            .arg("--rules")
            .arg(rules)
            .args(args)
            .env_remove("SKILL_RULES_DISABLED")
            .env_remove("SKILL_RULES_WARN_ONLY")
            .env_remove("SKILL_RULES_CONFIG")
            .env_remove("SKIP_DB_VERIFICATION")
            .env_remove("CLAUDE_PROJECT_DIR")
            .current_dir(self.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();

        child
            .stdin
            .take()
            .unwrap()
            .write_all(stdin.as_bytes())
            .unwrap();
        child.wait_with_output().unwrap()
    }
}

fn fixture() -> PathBuf {
    PathBuf::from(FIXTURE)
}

fn prisma_write(cwd: &Path) -> String {
    serde_json::json!({
        "session_id": "cli-session",
        "cwd": cwd.display().to_string(),
        "hook_event_name": "PreToolUse",
        "tool_name": "Write",
        "tool_input": {"file_path": "services/user.ts", "content": "inject(PrismaService)"}
    })
    .to_string()
}

#[test]
fn test_unknown_flag_is_config_error_not_deny() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["pre-tool", "--not-a-flag"], &fixture(), "");

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_unknown_subcommand_is_config_error() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["post-tool"], &fixture(), "");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_help_exits_zero() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["--help"], &fixture(), "");

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("pre-tool"));
}

#[test]
fn test_empty_stdin_allows_silently() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["pre-tool"], &fixture(), "");

    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
    assert!(output.stderr.is_empty());
}

#[test]
fn test_unparseable_stdin_allows() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["pre-tool"], &fixture(), "{not json");

    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
    assert!(output.stderr.is_empty());
}

#[test]
fn test_prisma_write_exits_2_with_remediation() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["pre-tool"], &fixture(), &prisma_write(sandbox.path()));

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("[skill-rules:database-verification] Blocked:"));
    assert!(stderr.contains("services/user.ts"));
}

#[test]
fn test_second_write_in_session_allowed() {
    let sandbox = Sandbox::new();
    let input = prisma_write(sandbox.path());

    let first = sandbox.run(&["pre-tool"], &fixture(), &input);
    assert_eq!(first.status.code(), Some(2));

    let second = sandbox.run(&["pre-tool"], &fixture(), &input);
    assert_eq!(second.status.code(), Some(0));
    assert!(sandbox.path().join("sessions").join("cli-session.json").exists());
}

#[test]
fn test_dry_run_allows_with_warning() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(
        &["pre-tool", "--dry-run"],
        &fixture(),
        &prisma_write(sandbox.path()),
    );

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Warning:"));
}

#[test]
fn test_rejected_rule_document_exits_1() {
    let sandbox = Sandbox::new();
    let rules = sandbox.path().join("bad-rules.json");
    std::fs::write(
        &rules,
        r#"{"version": "1.0", "skills": {"db": {
            "type": "domain", "enforcement": "block", "priority": "high",
            "fileTriggers": {"pathPatterns": ["**/*.ts"]},
            "blockMessage": "no"
        }}}"#,
    )
    .unwrap();

    let output = sandbox.run(&["pre-tool"], &rules, &prisma_write(sandbox.path()));
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("db"));
}

#[test]
fn test_missing_explicit_rules_exits_1() {
    let sandbox = Sandbox::new();
    let missing = sandbox.path().join("nowhere.json");

    let output = sandbox.run(&["pre-tool"], &missing, &prisma_write(sandbox.path()));
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_prompt_hook_prints_advisory() {
    let sandbox = Sandbox::new();
    let input = r#"{"session_id":"s","hook_event_name":"UserPromptSubmit","prompt":"how do I add a new xano endpoint"}"#;
    let output = sandbox.run(&["prompt"], &fixture(), input);

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("xano-api"));
}
