//! Orchestration for a single scheduler tick.
//!
//! A tick is: budget gate, selection, execution, and state commit. Every
//! executor error is converted into the selected task's failure path;
//! nothing from a single task's execution escapes the tick.

use tracing::{debug, warn};

use crate::core::generator;
use crate::core::milestone::{completion_percent, crossed};
use crate::core::selector::{SelectOutcome, next_runnable};
use crate::core::types::{LogKind, Mode, TaskPatch, TaskStatus};
use crate::exec::{ExecRequest, Executor};
use crate::looping::ControlHandle;
use crate::session::AgentSession;

/// Result of executing one task during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    /// Iteration number (1-indexed).
    pub iter: u32,
    /// Id of the task that was driven.
    pub task_id: String,
    /// Description of the task that was driven.
    pub description: String,
    /// Terminal status of the attempt (completed or failed).
    pub status: TaskStatus,
    /// Follow-up tasks appended after completion.
    pub follow_ups: usize,
    /// Milestone thresholds crossed by this attempt.
    pub milestones: Vec<u8>,
}

/// What a tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// A task was driven to completed or failed.
    Executed(StepOutcome),
    /// Every task is resolved and at least one completed; terminal.
    Complete,
    /// Unresolved tasks remain but none can ever run; terminal.
    Stalled { blocked: usize },
    /// The iteration budget is exhausted; terminal.
    BudgetExhausted,
    /// Nothing to do this tick (no tasks, or an in-flight task owns it).
    Idle,
    /// An operator interrupt arrived while a task was in flight; the attempt
    /// was discarded and the task reverted to pending.
    Discarded,
}

/// Run one tick against the session.
pub fn run_tick<E: Executor + ?Sized>(
    session: &mut AgentSession,
    executor: &E,
    ctl: &ControlHandle,
) -> TickOutcome {
    if session.current_iteration() >= session.max_iterations() {
        let counts = session.tasks.counts();
        let unresolved = counts.total() - counts.resolved();
        warn!(
            max = session.max_iterations(),
            unresolved, "iteration budget exhausted"
        );
        session.log.append(
            LogKind::Warning,
            format!(
                "Iteration budget of {} reached; halting with {unresolved} tasks unresolved",
                session.max_iterations()
            ),
        );
        return TickOutcome::BudgetExhausted;
    }

    let selected = match next_runnable(session.tasks.all()) {
        SelectOutcome::Ready(task) => task.clone(),
        SelectOutcome::Complete => {
            session.log.append(
                LogKind::Milestone,
                "All tasks resolved; objective loop complete",
            );
            return TickOutcome::Complete;
        }
        SelectOutcome::Blocked { blocked } => {
            if session.tasks.counts().running > 0 {
                // An in-flight task still owns the tick; nothing to select.
                return TickOutcome::Idle;
            }
            // Dependencies only complete through this loop, so with nothing
            // running a blocked queue can never make progress again.
            let message = if blocked == 0 {
                "Every task failed; halting".to_string()
            } else {
                format!("{blocked} pending tasks are permanently blocked; halting")
            };
            warn!(blocked, "no runnable task and no way to unblock");
            session.log.append(LogKind::Warning, message);
            return TickOutcome::Stalled { blocked };
        }
        SelectOutcome::Idle => return TickOutcome::Idle,
    };

    session.tasks.mark_running(&selected.id);
    session.bump_iteration();
    let iter = session.current_iteration();
    session.log.append(
        LogKind::Task,
        format!("Executing task: {}", selected.description),
    );
    match session.mode() {
        Mode::Simulated => {
            session
                .log
                .append(LogKind::Thinking, "Simulating task execution");
        }
        Mode::Delegated => {
            session.log.append(
                LogKind::Info,
                format!("Delegating task to {}", session.tuning().model),
            );
        }
    }
    debug!(iter, task = %selected.id, "executing");

    let objective = session.objective().to_string();
    let tuning = session.tuning().clone();
    let attempt = executor.execute(&ExecRequest {
        task_description: &selected.description,
        objective: &objective,
        tuning: &tuning,
    });

    // An operator interrupt issued while the call was in flight must not
    // commit a stale result.
    if ctl.interrupted() {
        session.tasks.update(
            &selected.id,
            TaskPatch {
                status: Some(TaskStatus::Pending),
                ..TaskPatch::default()
            },
        );
        session.log.append(
            LogKind::Warning,
            format!("Discarded in-flight result for '{}'", selected.description),
        );
        return TickOutcome::Discarded;
    }

    match attempt {
        Ok(result) => {
            session.tasks.mark_completed(&selected.id, result.clone());
            session.log.append(
                LogKind::Success,
                format!("Task completed: {}", selected.description),
            );
            session.log.append(LogKind::Result, result.clone());

            let drafts = generator::follow_up_tasks(&selected, &result, &objective);
            let follow_ups = drafts.len();
            for draft in drafts {
                let id = session.tasks.add(draft).id.clone();
                debug!(task = %id, "queued follow-up task");
            }
            if follow_ups > 0 {
                session
                    .log
                    .append(LogKind::Info, format!("Queued {follow_ups} follow-up tasks"));
            }

            let counts = session.tasks.counts();
            let percent = completion_percent(counts.completed, counts.total());
            let milestones = crossed(percent, session.milestones_logged());
            for threshold in &milestones {
                session.record_milestone(*threshold);
                session.log.append_with_metadata(
                    LogKind::Milestone,
                    format!("Milestone reached: {threshold}% of tasks completed"),
                    serde_json::json!({ "percent": threshold }),
                );
            }

            TickOutcome::Executed(StepOutcome {
                iter,
                task_id: selected.id,
                description: selected.description,
                status: TaskStatus::Completed,
                follow_ups,
                milestones,
            })
        }
        Err(err) => {
            let reason = err.to_string();
            session.tasks.mark_failed(&selected.id, reason.clone());
            session
                .log
                .append(LogKind::Error, format!("Task failed: {reason}"));

            TickOutcome::Executed(StepOutcome {
                iter,
                task_id: selected.id,
                description: selected.description,
                status: TaskStatus::Failed,
                follow_ups: 0,
                milestones: Vec::new(),
            })
        }
    }
}
