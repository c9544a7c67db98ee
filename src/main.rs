//! skill-rules - Skill activation and guardrail hooks for Claude Code
//!
//! # Usage
//!
//! ```bash
//! # UserPromptSubmit hook: prints the skills a prompt activates
//! echo '{"session_id":"s","prompt":"add a prisma migration"}' | skill-rules prompt
//!
//! # PreToolUse hook: exit 2 with the remediation on stderr blocks the edit
//! echo '{"session_id":"s","tool_name":"Write","tool_input":{"file_path":"a.ts","content":"x"}}' | skill-rules pre-tool
//!
//! # Check a rule document
//! skill-rules --rules .claude/skills/skill-rules.json validate
//! ```

use clap::{error::ErrorKind, Parser, Subcommand};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, warn};

use skill_rules::{
    audit::{AuditEntry, AuditLogger},
    config::Config,
    engine::{EnvSnapshot, SkillEngine},
    error::ConfigError,
    input::{FileEvent, HookInput},
    logging,
    output::{HookOutput, EXIT_ALLOW, EXIT_CONFIG_ERROR},
    rules::RuleSet,
    session::{FileSessionStore, MemorySessionStore, SessionStore},
};

#[derive(Parser)]
#[command(
    name = "skill-rules",
    about = "Skill activation and guardrail hooks for Claude Code",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the engine config file
    #[arg(short, long, global = true, env = "SKILL_RULES_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the rule document (overrides general.rules_path)
    #[arg(short, long, global = true)]
    rules: Option<PathBuf>,

    /// Directory for session records (overrides general.state_dir)
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// UserPromptSubmit hook: read hook JSON from stdin, print activated skills
    Prompt,

    /// PreToolUse hook: read hook JSON from stdin, allow or block the edit
    PreTool {
        /// Show what would be blocked but allow
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Load and validate the rule document
    Validate,

    /// Show which skills a prompt would activate
    TestPrompt {
        /// Prompt text
        text: String,
    },

    /// Show the decision for a file edit, without session state
    TestFile {
        /// File path as the tool would receive it
        path: String,

        /// Read the proposed content from this file instead of PATH
        #[arg(long)]
        content_file: Option<PathBuf>,

        /// Treat the edit as a file creation
        #[arg(long)]
        create: bool,
    },

    /// Forget which rules a session has already used
    ResetSession {
        /// Session identifier
        session_id: String,
    },
}

impl Commands {
    fn is_hook(&self) -> bool {
        matches!(self, Commands::Prompt | Commands::PreTool { .. })
    }
}

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    // Exit 2 is reserved for deny, so argument errors exit 1
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => EXIT_ALLOW,
                _ => EXIT_CONFIG_ERROR,
            };
        }
    };
    let env = EnvSnapshot::capture();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("skill-rules: {}", e);
            return EXIT_CONFIG_ERROR;
        }
    };

    let level = if cli.verbose {
        "debug"
    } else {
        config.general.log_level.as_str()
    };
    let log_path = if cli.command.is_hook() {
        config.log_path()
    } else {
        None
    };
    if let Err(e) = logging::init_logging(level, log_path.as_deref()) {
        eprintln!("skill-rules: logging disabled: {:#}", e);
    }

    let ctx = Context { cli: &cli, config: &config, env };
    match &cli.command {
        Commands::Prompt => ctx.prompt_hook(),
        Commands::PreTool { dry_run } => ctx.pre_tool_hook(*dry_run),
        Commands::Validate => ctx.validate(),
        Commands::TestPrompt { text } => ctx.test_prompt(text),
        Commands::TestFile {
            path,
            content_file,
            create,
        } => ctx.test_file(path, content_file.as_deref(), *create),
        Commands::ResetSession { session_id } => ctx.reset_session(session_id),
    }
}

struct Context<'a> {
    cli: &'a Cli,
    config: &'a Config,
    env: EnvSnapshot,
}

impl Context<'_> {
    fn prompt_hook(&self) -> i32 {
        let Some(input) = read_hook_input() else {
            return EXIT_ALLOW;
        };
        let engine = match self.hook_engine(&input, false) {
            Ok(Some(engine)) => engine,
            Ok(None) => return EXIT_ALLOW,
            Err(code) => return code,
        };

        let advisory = engine.check_prompt_input(&input);
        self.audit(&AuditEntry::for_advisory(
            &input,
            &advisory,
            engine.is_disabled(),
        ));
        emit(&HookOutput::from_advisory(&advisory))
    }

    fn pre_tool_hook(&self, dry_run: bool) -> i32 {
        let Some(input) = read_hook_input() else {
            return EXIT_ALLOW;
        };
        let engine = match self.hook_engine(&input, dry_run) {
            Ok(Some(engine)) => engine,
            Ok(None) => return EXIT_ALLOW,
            Err(code) => return code,
        };

        let decision = engine.check_tool_input(&input);
        self.audit(&AuditEntry::for_decision(
            &input,
            &decision,
            engine.is_disabled(),
        ));
        emit(&HookOutput::from_decision(&decision))
    }

    fn validate(&self) -> i32 {
        let rules = match self.load_rules(None) {
            Ok(Some(rules)) => rules,
            Ok(None) => {
                eprintln!("No rule document found");
                return EXIT_CONFIG_ERROR;
            }
            Err(e) => {
                eprintln!("Invalid rule document: {}", e);
                return EXIT_CONFIG_ERROR;
            }
        };

        println!(
            "Loaded {} rule(s), version {}",
            rules.len(),
            rules.version()
        );
        for rule in rules.rules() {
            let mut triggers = Vec::new();
            if let Some(prompt) = &rule.prompt_triggers {
                triggers.push(format!(
                    "{} keyword(s), {} intent pattern(s)",
                    prompt.keywords.len(),
                    prompt.intent_patterns.len()
                ));
            }
            if let Some(files) = &rule.file_triggers {
                triggers.push(format!(
                    "{} path pattern(s), {} exclusion(s), {} content pattern(s)",
                    files.path_patterns.len(),
                    files.path_exclusions.len(),
                    files.content_patterns.len()
                ));
            }
            println!(
                "  {:<32} {:?}/{:?}/{}  {}",
                rule.name,
                rule.kind,
                rule.enforcement,
                rule.priority.as_str(),
                triggers.join("; ")
            );
        }
        EXIT_ALLOW
    }

    fn test_prompt(&self, text: &str) -> i32 {
        let engine = match self.standalone_engine() {
            Ok(engine) => engine,
            Err(code) => return code,
        };

        let advisory = engine.check_prompt(text);
        if advisory.is_empty() {
            println!("No skills activated");
        } else {
            for entry in &advisory.entries {
                println!(
                    "{:<32} {:<8} via {} '{}'",
                    entry.rule,
                    entry.priority.as_str(),
                    entry.matched_by.as_str(),
                    entry.trigger
                );
            }
            println!();
            print!("{}", advisory.render());
        }
        EXIT_ALLOW
    }

    fn test_file(&self, path: &str, content_file: Option<&Path>, create: bool) -> i32 {
        let engine = match self.standalone_engine() {
            Ok(engine) => engine,
            Err(code) => return code,
        };

        let content_source = content_file.unwrap_or_else(|| Path::new(path));
        let mut event = FileEvent::new(path);
        if let Ok(content) = std::fs::read_to_string(content_source) {
            event = event.with_content(content);
        }
        if create || !Path::new(path).exists() {
            event = event.created();
        }

        let decision = engine.check_file("test-file", &event);
        match decision.rule_id() {
            Some(rule) => println!("{}: {}", if decision.is_deny() { "DENY" } else { "WARN" }, rule),
            None => println!("ALLOW"),
        }
        if let Some(message) = decision.message() {
            println!("{}", message);
        }
        EXIT_ALLOW
    }

    fn reset_session(&self, session_id: &str) -> i32 {
        let Some(dir) = self.state_dir() else {
            eprintln!("No state directory configured");
            return EXIT_CONFIG_ERROR;
        };

        match FileSessionStore::new(dir).reset(session_id) {
            Ok(()) => {
                println!("Session {} reset", session_id);
                EXIT_ALLOW
            }
            Err(e) => {
                eprintln!("Failed to reset session {}: {}", session_id, e);
                EXIT_CONFIG_ERROR
            }
        }
    }

    /// Engine for a hook call. `Ok(None)` means no rule document applies.
    fn hook_engine(&self, input: &HookInput, dry_run: bool) -> Result<Option<SkillEngine>, i32> {
        match self.load_rules(input.cwd.as_deref()) {
            Ok(Some(rules)) => {
                let sessions: Arc<dyn SessionStore> = match self.state_dir() {
                    Some(dir) => Arc::new(FileSessionStore::new(dir)),
                    None => Arc::new(MemorySessionStore::new()),
                };
                Ok(Some(
                    SkillEngine::new(rules, sessions, self.env.clone()).with_warn_only(dry_run),
                ))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                error!(error = %e, "rule document rejected");
                eprintln!("skill-rules: {}", e);
                Err(EXIT_CONFIG_ERROR)
            }
        }
    }

    /// Engine for the interactive test commands, with throwaway session state
    fn standalone_engine(&self) -> Result<SkillEngine, i32> {
        match self.load_rules(None) {
            Ok(Some(rules)) => Ok(SkillEngine::new(
                rules,
                Arc::new(MemorySessionStore::new()),
                self.env.clone(),
            )),
            Ok(None) => {
                eprintln!("No rule document found");
                Err(EXIT_CONFIG_ERROR)
            }
            Err(e) => {
                eprintln!("Invalid rule document: {}", e);
                Err(EXIT_CONFIG_ERROR)
            }
        }
    }

    /// Load the rule document. A missing document at the configured
    /// default location is not an error; an explicit `--rules` path is.
    fn load_rules(&self, cwd: Option<&str>) -> Result<Option<RuleSet>, ConfigError> {
        let explicit = self.cli.rules.is_some();
        let path = match &self.cli.rules {
            Some(path) => path.clone(),
            None => {
                let cwd = cwd.map(String::from).or_else(|| {
                    std::env::current_dir()
                        .ok()
                        .map(|d| d.display().to_string())
                });
                match self
                    .config
                    .rules_path(self.env.get("CLAUDE_PROJECT_DIR"), cwd.as_deref())
                {
                    Some(path) => path,
                    None => {
                        debug!("rules path needs a home directory, nothing to check");
                        return Ok(None);
                    }
                }
            }
        };

        if !explicit && !path.exists() {
            debug!(path = %path.display(), "no rule document, nothing to check");
            return Ok(None);
        }

        let rules = RuleSet::load_from(&path)?;
        rules.require(&self.config.rules.required_rules)?;
        Ok(Some(rules))
    }

    fn state_dir(&self) -> Option<PathBuf> {
        self.cli.state_dir.clone().or_else(|| self.config.state_dir())
    }

    fn audit(&self, entry: &AuditEntry) {
        let path = self.config.audit_path();
        let mut logger = AuditLogger::new(path.as_deref());
        if let Err(e) = logger.log(entry) {
            warn!(error = %e, "failed to write audit log");
        }
    }
}

/// Read the hook JSON from stdin. Empty or unparseable input yields
/// `None`, which callers answer with a plain allow.
fn read_hook_input() -> Option<HookInput> {
    let mut raw = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut raw) {
        warn!(error = %e, "failed to read hook input");
        return None;
    }

    if raw.trim().is_empty() {
        return None;
    }

    match HookInput::from_json(&raw) {
        Ok(input) => Some(input),
        Err(e) => {
            warn!(error = %e, "failed to parse hook input, allowing");
            None
        }
    }
}

fn emit(output: &HookOutput) -> i32 {
    let stdout = io::stdout();
    let stderr = io::stderr();
    if let Err(e) = output.write_to(&mut stdout.lock(), &mut stderr.lock()) {
        warn!(error = %e, "failed to write hook output");
    }
    output.exit_code
}
