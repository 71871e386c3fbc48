//! Session snapshot export.
//!
//! A snapshot is a faithful point-in-time copy of the session (cloned data,
//! never a live reference) serialized for download or later inspection.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::types::{LogEntry, Task};
use crate::session::AgentSession;

/// Serialized session snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub objective: String,
    pub tasks: Vec<Task>,
    pub execution_log: Vec<LogEntry>,
}

/// Clone the live session into an immutable snapshot.
pub fn snapshot(session: &AgentSession) -> SessionSnapshot {
    SessionSnapshot {
        session_id: session.session_id().to_string(),
        timestamp: Utc::now(),
        objective: session.objective().to_string(),
        tasks: session.tasks.all().to_vec(),
        execution_log: session.log.entries().to_vec(),
    }
}

/// Write a snapshot as pretty-printed JSON with a trailing newline.
pub fn write_snapshot(path: &Path, snapshot: &SessionSnapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
    }
    let mut buf = serde_json::to_string_pretty(snapshot).context("serialize snapshot")?;
    buf.push('\n');
    fs::write(path, buf).with_context(|| format!("write {}", path.display()))
}

/// Load a snapshot from disk.
pub fn load_snapshot(path: &Path) -> Result<SessionSnapshot> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{LogKind, Mode, NewTask, Tuning};

    fn sample_session() -> AgentSession {
        let mut session = AgentSession::new(Mode::Simulated, Tuning::default(), 5);
        session.set_objective("snapshot objective");
        session.tasks.add(NewTask::new("one", 2));
        session.log.append(LogKind::Info, "seeded");
        session
    }

    #[test]
    fn snapshot_is_a_point_in_time_copy() {
        let mut session = sample_session();
        let snap = snapshot(&session);

        session.tasks.add(NewTask::new("two", 1));
        session.log.append(LogKind::Info, "later");

        assert_eq!(snap.tasks.len(), 1);
        assert_eq!(snap.execution_log.len(), 1);
        assert_eq!(snap.objective, "snapshot objective");
        assert_eq!(snap.session_id, session.session_id());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("snapshot.json");
        let snap = snapshot(&sample_session());

        write_snapshot(&path, &snap).expect("write");
        let loaded = load_snapshot(&path).expect("load");
        assert_eq!(loaded, snap);

        let raw = std::fs::read_to_string(&path).expect("read");
        assert!(raw.contains("\"sessionId\""));
        assert!(raw.contains("\"executionLog\""));
        assert!(raw.ends_with('\n'));
    }
}
