//! Per-session record of guardrail rules that have already fired
//!
//! The engine takes a [`SessionStore`] by injection. A missing record is the
//! same as an empty one; read failures degrade to "nothing used yet".

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::PersistenceError;

/// Storage for the used-rule set of each session
pub trait SessionStore: Send + Sync {
    /// Whether `rule` was already marked in `session_id`
    fn was_used(&self, session_id: &str, rule: &str) -> bool;

    /// Mark `rule` as used. Idempotent.
    fn mark_used(&self, session_id: &str, rule: &str) -> Result<(), PersistenceError>;

    /// Mark `rule` as used, returning true if this call was the first to do so
    fn try_mark_used(&self, session_id: &str, rule: &str) -> Result<bool, PersistenceError>;

    /// Forget everything recorded for `session_id`
    fn reset(&self, session_id: &str) -> Result<(), PersistenceError>;
}

/// In-process store. Check-and-mark is atomic under one lock.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, HashSet<String>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules marked in a session, sorted
    pub fn used_rules(&self, session_id: &str) -> Vec<String> {
        let sessions = self.sessions.lock();
        let mut rules: Vec<String> = sessions
            .get(session_id)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default();
        rules.sort();
        rules
    }
}

impl SessionStore for MemorySessionStore {
    fn was_used(&self, session_id: &str, rule: &str) -> bool {
        self.sessions
            .lock()
            .get(session_id)
            .is_some_and(|s| s.contains(rule))
    }

    fn mark_used(&self, session_id: &str, rule: &str) -> Result<(), PersistenceError> {
        self.try_mark_used(session_id, rule).map(|_| ())
    }

    fn try_mark_used(&self, session_id: &str, rule: &str) -> Result<bool, PersistenceError> {
        let mut sessions = self.sessions.lock();
        Ok(sessions
            .entry(session_id.to_string())
            .or_default()
            .insert(rule.to_string()))
    }

    fn reset(&self, session_id: &str) -> Result<(), PersistenceError> {
        self.sessions.lock().remove(session_id);
        Ok(())
    }
}

/// On-disk record for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,

    #[serde(default)]
    pub used_rules: BTreeSet<String>,

    pub updated_at: DateTime<Utc>,
}

/// One JSON file per session under a state directory.
///
/// The lock only covers this process. Separate hook processes for the same
/// session rely on the host running tool calls of a session one at a time;
/// a lost update there costs one repeated reminder.
#[derive(Debug)]
pub struct FileSessionStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record file for a session
    pub fn record_path(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_session_id(session_id)))
    }

    /// Load a session record; missing or unreadable records are empty
    pub fn load(&self, session_id: &str) -> SessionRecord {
        let path = self.record_path(session_id);
        let empty = || SessionRecord {
            session_id: session_id.to_string(),
            used_rules: BTreeSet::new(),
            updated_at: Utc::now(),
        };

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return empty(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read session record");
                return empty();
            }
        };

        match serde_json::from_str(&content) {
            Ok(record) => record,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt session record, starting fresh");
                empty()
            }
        }
    }

    fn save(&self, record: &SessionRecord) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir).map_err(|source| PersistenceError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.record_path(&record.session_id);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(record)?;

        fs::write(&tmp, json).map_err(|source| PersistenceError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| PersistenceError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(path = %path.display(), rules = record.used_rules.len(), "saved session record");
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn was_used(&self, session_id: &str, rule: &str) -> bool {
        let _guard = self.lock.lock();
        self.load(session_id).used_rules.contains(rule)
    }

    fn mark_used(&self, session_id: &str, rule: &str) -> Result<(), PersistenceError> {
        self.try_mark_used(session_id, rule).map(|_| ())
    }

    fn try_mark_used(&self, session_id: &str, rule: &str) -> Result<bool, PersistenceError> {
        let _guard = self.lock.lock();
        let mut record = self.load(session_id);
        if !record.used_rules.insert(rule.to_string()) {
            return Ok(false);
        }
        record.updated_at = Utc::now();
        self.save(&record)?;
        Ok(true)
    }

    fn reset(&self, session_id: &str) -> Result<(), PersistenceError> {
        let _guard = self.lock.lock();
        let path = self.record_path(session_id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(PersistenceError::Io { path, source }),
        }
    }
}

/// Reduce a session id to a safe file stem
fn sanitize_session_id(session_id: &str) -> String {
    let cleaned: String = session_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "default".to_string()
    } else {
        cleaned
    }
}
