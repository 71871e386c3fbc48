//! In-memory session aggregate: objective, task store, event log, run flags.
//!
//! One [`AgentSession`] is the single owned state for a run. The scheduler
//! loop and the operator commands defined here are its only writers; there
//! are no ambient globals beyond the session-id sequence.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use chrono::Utc;

use crate::core::types::{
    LogEntry, LogKind, Mode, NewTask, StatusCounts, Task, TaskPatch, TaskStatus, Tuning,
    TuningPatch,
};

static SESSION_SEQ: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> String {
    let seq = SESSION_SEQ.fetch_add(1, Ordering::SeqCst);
    format!("session-{}-{seq}", Utc::now().timestamp_millis())
}

/// Insertion-ordered task collection with a quiet partial-update surface.
///
/// No cached indices: every read recomputes from the live sequence.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
    next_id: u64,
}

impl TaskStore {
    /// Append a draft; the store assigns a fresh unique id and creation time.
    pub fn add(&mut self, draft: NewTask) -> &Task {
        self.next_id += 1;
        let task = Task {
            id: format!("task-{}", self.next_id),
            description: draft.description,
            status: TaskStatus::Pending,
            priority: draft.priority,
            created_at: Utc::now(),
            completed_at: None,
            result: None,
            dependencies: draft.dependencies,
        };
        let idx = self.tasks.len();
        self.tasks.push(task);
        &self.tasks[idx]
    }

    /// Partial merge by id. Quietly a no-op when the id is absent; the loop
    /// may race a stale id immediately after a reset.
    pub fn update(&mut self, id: &str, patch: TaskPatch) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(result) = patch.result {
            task.result = Some(result);
        }
        if let Some(at) = patch.completed_at {
            task.completed_at = Some(at);
        }
        true
    }

    pub fn mark_running(&mut self, id: &str) -> bool {
        self.update(
            id,
            TaskPatch {
                status: Some(TaskStatus::Running),
                ..TaskPatch::default()
            },
        )
    }

    pub fn mark_completed(&mut self, id: &str, result: impl Into<String>) -> bool {
        self.update(
            id,
            TaskPatch {
                status: Some(TaskStatus::Completed),
                result: Some(result.into()),
                completed_at: Some(Utc::now()),
            },
        )
    }

    pub fn mark_failed(&mut self, id: &str, reason: impl Into<String>) -> bool {
        self.update(
            id,
            TaskPatch {
                status: Some(TaskStatus::Failed),
                result: Some(reason.into()),
                completed_at: None,
            },
        )
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
        self.next_id = 0;
    }

    pub fn all(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for task in &self.tasks {
            match task.status {
                TaskStatus::Pending => counts.pending += 1,
                TaskStatus::Running => counts.running += 1,
                TaskStatus::Completed => counts.completed += 1,
                TaskStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }
}

/// Append-only execution record; ids, timestamps, and icons are assigned on
/// append. Cleared only by a session reset.
#[derive(Debug, Default)]
pub struct EventLog {
    entries: Vec<LogEntry>,
    next_id: u64,
}

impl EventLog {
    pub fn append(&mut self, kind: LogKind, message: impl Into<String>) -> &LogEntry {
        self.append_inner(kind, message.into(), None)
    }

    pub fn append_with_metadata(
        &mut self,
        kind: LogKind,
        message: impl Into<String>,
        metadata: serde_json::Value,
    ) -> &LogEntry {
        self.append_inner(kind, message.into(), Some(metadata))
    }

    fn append_inner(
        &mut self,
        kind: LogKind,
        message: String,
        metadata: Option<serde_json::Value>,
    ) -> &LogEntry {
        self.next_id += 1;
        let entry = LogEntry {
            id: self.next_id,
            timestamp: Utc::now(),
            kind,
            message,
            icon: kind.icon().to_string(),
            metadata,
        };
        let idx = self.entries.len();
        self.entries.push(entry);
        &self.entries[idx]
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.next_id = 0;
    }
}

/// Process-wide session state, one instance per run.
#[derive(Debug)]
pub struct AgentSession {
    session_id: String,
    objective: String,
    pub tasks: TaskStore,
    pub log: EventLog,
    is_running: bool,
    is_paused: bool,
    current_iteration: u32,
    max_iterations: u32,
    mode: Mode,
    tuning: Tuning,
    milestones_logged: Vec<u8>,
}

impl AgentSession {
    pub fn new(mode: Mode, tuning: Tuning, max_iterations: u32) -> Self {
        Self {
            session_id: next_session_id(),
            objective: String::new(),
            tasks: TaskStore::default(),
            log: EventLog::default(),
            is_running: false,
            is_paused: false,
            current_iteration: 0,
            max_iterations,
            mode,
            tuning,
            milestones_logged: Vec::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn objective(&self) -> &str {
        &self.objective
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn current_iteration(&self) -> u32 {
        self.current_iteration
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Set the objective; effective only while the loop is not running.
    pub fn set_objective(&mut self, objective: impl Into<String>) -> bool {
        if self.is_running {
            return false;
        }
        self.objective = objective.into();
        true
    }

    /// Switch executor mode; effective only while the loop is not running.
    pub fn set_mode(&mut self, mode: Mode) -> bool {
        if self.is_running {
            return false;
        }
        self.mode = mode;
        true
    }

    /// Partial tuning update, rejected when it violates the allowed ranges.
    pub fn update_tuning(&mut self, patch: TuningPatch) -> Result<()> {
        let mut next = self.tuning.clone();
        next.apply(patch);
        next.validate()?;
        self.tuning = next;
        Ok(())
    }

    pub fn mark_running(&mut self) {
        self.is_running = true;
        self.is_paused = false;
    }

    pub fn mark_stopped(&mut self) {
        self.is_running = false;
        self.is_paused = false;
    }

    /// Toggle pause; returns the new paused state. Only meaningful while
    /// running.
    pub fn toggle_pause(&mut self) -> bool {
        if self.is_running {
            self.is_paused = !self.is_paused;
        }
        self.is_paused
    }

    pub fn bump_iteration(&mut self) {
        self.current_iteration += 1;
    }

    pub fn milestones_logged(&self) -> &[u8] {
        &self.milestones_logged
    }

    /// Record a threshold as logged; false when it was already recorded.
    pub fn record_milestone(&mut self, threshold: u8) -> bool {
        if self.milestones_logged.contains(&threshold) {
            return false;
        }
        self.milestones_logged.push(threshold);
        true
    }

    /// Full reset: tasks, log, counters, and session identity. Mode, tuning,
    /// and the iteration budget survive.
    pub fn reset(&mut self) {
        self.tasks.clear();
        self.log.clear();
        self.current_iteration = 0;
        self.milestones_logged.clear();
        self.is_running = false;
        self.is_paused = false;
        self.session_id = next_session_id();
    }
}
