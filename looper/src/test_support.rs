//! Test-only helpers: deterministic tasks and scripted executors.

use std::cell::RefCell;
use std::collections::VecDeque;

use anyhow::Result;
use chrono::DateTime;

use crate::core::generator;
use crate::core::types::{LogEntry, LogKind, NewTask, Task, TaskStatus, Tuning};
use crate::exec::delegated::DelegationError;
use crate::exec::{ExecRequest, Executor};
use crate::looping::ControlHandle;

/// Create a deterministic pending task with a fixed creation time.
pub fn task(id: &str, priority: i64) -> Task {
    Task {
        id: id.to_string(),
        description: format!("{id} description"),
        status: TaskStatus::Pending,
        priority,
        created_at: DateTime::UNIX_EPOCH,
        completed_at: None,
        result: None,
        dependencies: Vec::new(),
    }
}

/// Create a deterministic task with an explicit status and matching fields.
pub fn task_with_status(id: &str, priority: i64, status: TaskStatus) -> Task {
    let mut task = task(id, priority);
    task.status = status;
    match status {
        TaskStatus::Completed => {
            task.completed_at = Some(DateTime::UNIX_EPOCH);
            task.result = Some(format!("{id} result"));
        }
        TaskStatus::Failed => {
            task.result = Some(format!("{id} failure"));
        }
        TaskStatus::Pending | TaskStatus::Running => {}
    }
    task
}

/// Create a deterministic pending task gated on the given dependency ids.
pub fn task_with_deps(id: &str, priority: i64, deps: &[&str]) -> Task {
    let mut task = task(id, priority);
    task.dependencies = deps.iter().map(|dep| dep.to_string()).collect();
    task
}

/// Create a deterministic log entry with a fixed timestamp.
pub fn log_entry(id: u64, kind: LogKind, message: &str) -> LogEntry {
    LogEntry {
        id,
        timestamp: DateTime::UNIX_EPOCH,
        kind,
        message: message.to_string(),
        icon: kind.icon().to_string(),
        metadata: None,
    }
}

/// One scripted executor response.
pub struct ScriptedExec {
    pub output: ScriptedOutput,
    /// Raised while "in flight" to model an operator interrupt mid-call.
    pub interrupt: Option<ControlHandle>,
}

pub enum ScriptedOutput {
    Done(String),
    Fail(String),
}

impl ScriptedExec {
    pub fn done(result: &str) -> Self {
        Self {
            output: ScriptedOutput::Done(result.to_string()),
            interrupt: None,
        }
    }

    pub fn fail(detail: &str) -> Self {
        Self {
            output: ScriptedOutput::Fail(detail.to_string()),
            interrupt: None,
        }
    }
}

/// Executor returning queued outputs without touching the network.
///
/// Failures surface as [`DelegationError`]s so tests exercise the same
/// failure path as the delegated backend.
pub struct ScriptedExecutor {
    script: RefCell<VecDeque<ScriptedExec>>,
    decomposition: Option<Vec<NewTask>>,
}

impl ScriptedExecutor {
    pub fn new(script: Vec<ScriptedExec>) -> Self {
        Self {
            script: RefCell::new(script.into_iter().collect()),
            decomposition: None,
        }
    }

    /// Override the default (heuristic) decomposition.
    pub fn with_decomposition(mut self, drafts: Vec<NewTask>) -> Self {
        self.decomposition = Some(drafts);
        self
    }

    pub fn remaining(&self) -> usize {
        self.script.borrow().len()
    }
}

impl Executor for ScriptedExecutor {
    fn execute(&self, _request: &ExecRequest<'_>) -> Result<String> {
        let exec = self
            .script
            .borrow_mut()
            .pop_front()
            .expect("scripted executor ran out of responses");
        if let Some(ctl) = &exec.interrupt {
            ctl.request_pause();
        }
        match exec.output {
            ScriptedOutput::Done(result) => Ok(result),
            ScriptedOutput::Fail(detail) => Err(DelegationError::new(detail).into()),
        }
    }

    fn decompose(&self, objective: &str, tuning: &Tuning) -> Result<Vec<NewTask>> {
        let _ = tuning;
        match &self.decomposition {
            Some(drafts) => Ok(drafts.clone()),
            None => generator::initial_tasks(objective),
        }
    }
}
