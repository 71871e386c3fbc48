//! Semantic invariants for exported session state.
//!
//! Schema conformance says a snapshot is well-formed; these checks say it is
//! consistent: unique ids, single-task concurrency, status/field coupling,
//! resolvable dependencies, and an append-only log shape.

use std::collections::{HashMap, HashSet};

use crate::core::types::{LogEntry, LogKind, Task, TaskStatus};

/// Validate tasks and log against the loop's semantic invariants.
///
/// Returns human-readable violations; empty means consistent.
pub fn validate_invariants(tasks: &[Task], log: &[LogEntry]) -> Vec<String> {
    let mut errors = Vec::new();

    let mut seen_ids = HashSet::new();
    for task in tasks {
        if !seen_ids.insert(task.id.as_str()) {
            errors.push(format!("duplicate task id '{}'", task.id));
        }
    }

    let running = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Running)
        .count();
    if running > 1 {
        errors.push(format!("{running} tasks are running (at most one allowed)"));
    }

    for task in tasks {
        match task.status {
            TaskStatus::Completed => {
                if task.completed_at.is_none() {
                    errors.push(format!("completed task '{}' has no completedAt", task.id));
                }
                if task.result.is_none() {
                    errors.push(format!("completed task '{}' has no result", task.id));
                }
            }
            TaskStatus::Failed => {
                if task.result.is_none() {
                    errors.push(format!("failed task '{}' has no failure reason", task.id));
                }
                if task.completed_at.is_some() {
                    errors.push(format!("failed task '{}' has a completedAt", task.id));
                }
            }
            TaskStatus::Pending | TaskStatus::Running => {
                if task.completed_at.is_some() {
                    errors.push(format!("unresolved task '{}' has a completedAt", task.id));
                }
            }
        }

        for dep in &task.dependencies {
            if dep == &task.id {
                errors.push(format!("task '{}' depends on itself", task.id));
            } else if !seen_ids.contains(dep.as_str()) {
                errors.push(format!(
                    "task '{}' depends on unknown id '{dep}'",
                    task.id
                ));
            }
        }
    }

    let mut seen_log_ids = HashSet::new();
    for entry in log {
        if !seen_log_ids.insert(entry.id) {
            errors.push(format!("duplicate log entry id {}", entry.id));
        }
    }
    for window in log.windows(2) {
        if window[1].timestamp < window[0].timestamp {
            errors.push(format!(
                "log entry {} is older than its predecessor",
                window[1].id
            ));
        }
    }

    let mut milestone_percents: HashMap<u64, usize> = HashMap::new();
    for entry in log {
        if entry.kind != LogKind::Milestone {
            continue;
        }
        let Some(percent) = entry
            .metadata
            .as_ref()
            .and_then(|m| m.get("percent"))
            .and_then(serde_json::Value::as_u64)
        else {
            continue;
        };
        *milestone_percents.entry(percent).or_default() += 1;
    }
    for (percent, count) in milestone_percents {
        if count > 1 {
            errors.push(format!(
                "milestone {percent}% logged {count} times (at most once allowed)"
            ));
        }
    }

    errors.sort();
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{log_entry, task_with_deps, task_with_status};
    use serde_json::json;

    #[test]
    fn consistent_state_has_no_violations() {
        let tasks = vec![
            task_with_status("task-1", 2, TaskStatus::Completed),
            task_with_deps("task-2", 1, &["task-1"]),
        ];
        let log = vec![log_entry(1, LogKind::Info, "seeded")];
        assert!(validate_invariants(&tasks, &log).is_empty());
    }

    #[test]
    fn reports_duplicate_ids_and_concurrent_running() {
        let tasks = vec![
            task_with_status("dup", 1, TaskStatus::Running),
            task_with_status("dup", 1, TaskStatus::Running),
        ];
        let errors = validate_invariants(&tasks, &[]);
        assert!(errors.iter().any(|e| e.contains("duplicate task id")));
        assert!(errors.iter().any(|e| e.contains("at most one allowed")));
    }

    #[test]
    fn reports_status_field_mismatches() {
        let mut completed = task_with_status("a", 1, TaskStatus::Completed);
        completed.completed_at = None;
        let mut failed = task_with_status("b", 1, TaskStatus::Failed);
        failed.result = None;

        let errors = validate_invariants(&[completed, failed], &[]);
        assert!(errors.iter().any(|e| e.contains("no completedAt")));
        assert!(errors.iter().any(|e| e.contains("no failure reason")));
    }

    #[test]
    fn reports_unknown_and_self_dependencies() {
        let tasks = vec![
            task_with_deps("a", 1, &["missing"]),
            task_with_deps("b", 1, &["b"]),
        ];
        let errors = validate_invariants(&tasks, &[]);
        assert!(errors.iter().any(|e| e.contains("unknown id 'missing'")));
        assert!(errors.iter().any(|e| e.contains("depends on itself")));
    }

    #[test]
    fn reports_duplicate_milestone_thresholds() {
        let mut first = log_entry(1, LogKind::Milestone, "Milestone reached: 25%");
        first.metadata = Some(json!({ "percent": 25 }));
        let mut second = log_entry(2, LogKind::Milestone, "Milestone reached: 25%");
        second.metadata = Some(json!({ "percent": 25 }));

        let errors = validate_invariants(&[], &[first, second]);
        assert!(errors.iter().any(|e| e.contains("milestone 25%")));
    }
}
