//! Dependency-aware selection over the task list.

use std::collections::HashMap;

use crate::core::generator::prioritize;
use crate::core::types::{Task, TaskStatus};

/// Structured selection outcome for one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectOutcome<'a> {
    /// Highest-priority runnable task.
    Ready(&'a Task),
    /// Every task is resolved and at least one completed.
    Complete,
    /// Nothing is selectable but unresolved work remains: `blocked` pending
    /// tasks are gated on dependencies that are not completed, or every task
    /// failed.
    Blocked { blocked: usize },
    /// The task list is empty.
    Idle,
}

/// Select the next runnable task.
///
/// A task is runnable when it is pending and every dependency id resolves to
/// a completed task; an id that matches no known task counts as unmet.
/// Candidates are considered in stable priority order.
pub fn next_runnable(tasks: &[Task]) -> SelectOutcome<'_> {
    if tasks.is_empty() {
        return SelectOutcome::Idle;
    }

    let by_id: HashMap<&str, &Task> = tasks.iter().map(|t| (t.id.as_str(), t)).collect();
    let deps_met = |task: &Task| {
        task.dependencies.iter().all(|dep| {
            by_id
                .get(dep.as_str())
                .is_some_and(|found| found.status == TaskStatus::Completed)
        })
    };

    for candidate in prioritize(tasks) {
        if candidate.status == TaskStatus::Pending && deps_met(candidate) {
            return SelectOutcome::Ready(candidate);
        }
    }

    if tasks.iter().all(|t| t.status.is_resolved()) {
        if tasks.iter().any(|t| t.status == TaskStatus::Completed) {
            return SelectOutcome::Complete;
        }
        return SelectOutcome::Blocked { blocked: 0 };
    }

    let blocked = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Pending)
        .count();
    SelectOutcome::Blocked { blocked }
}
