//! Heuristic task decomposition and priority ordering.
//!
//! Everything here is pure: the same objective and result text always yield
//! the same drafts, which keeps loop runs reproducible in simulated mode.

use std::fmt;
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;

use crate::core::types::{NewTask, Task};

/// Start was attempted with a blank objective.
///
/// Surfaced to the caller as a rejected start; the loop never begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyObjectiveError;

impl fmt::Display for EmptyObjectiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "objective is empty")
    }
}

impl std::error::Error for EmptyObjectiveError {}

static WRITING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(write|draft|blog|article|post|document|essay)\b").unwrap()
});
static BUILDING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(build|implement|create|develop|design|code)\b").unwrap()
});
static PLANNING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(plan|organi[sz]e|schedule|prepare|coordinate)\b").unwrap()
});
static FOLLOW_UP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(follow-up|next step|remaining|further work|unresolved)\b").unwrap()
});

/// Decompose an objective into the initial ordered task batch.
///
/// Produces at least one task for any non-empty objective. Priorities descend
/// so the first phase runs first; no draft carries dependencies.
pub fn initial_tasks(objective: &str) -> Result<Vec<NewTask>> {
    let objective = objective.trim();
    if objective.is_empty() {
        return Err(EmptyObjectiveError.into());
    }

    let phases: &[&str] = if WRITING_RE.is_match(objective) {
        &[
            "Research the topic and gather key points for",
            "Outline the structure for",
            "Write a first draft for",
            "Review and polish the draft for",
        ]
    } else if BUILDING_RE.is_match(objective) {
        &[
            "Clarify requirements and constraints for",
            "Sketch an approach for",
            "Carry out the main work for",
            "Verify the outcome of",
        ]
    } else if PLANNING_RE.is_match(objective) {
        &[
            "List everything that must happen for",
            "Order the work and flag blockers for",
            "Work through the highest-impact items for",
        ]
    } else {
        &[
            "Break down and research",
            "Carry out the main work for",
            "Summarize outcomes and loose ends for",
        ]
    };

    let count = phases.len() as i64;
    Ok(phases
        .iter()
        .enumerate()
        .map(|(idx, phase)| NewTask::new(format!("{phase}: {objective}"), count - idx as i64))
        .collect())
}

/// Derive follow-up tasks from a completed task's result text.
///
/// Side-effect-free, and the returned drafts never depend on `completed`.
/// The derived priority strictly decreases toward 1, so follow-up chains
/// always drain; an empty return is the expected terminal-path signal.
pub fn follow_up_tasks(completed: &Task, result: &str, objective: &str) -> Vec<NewTask> {
    if completed.priority <= 1 {
        return Vec::new();
    }
    if !FOLLOW_UP_RE.is_match(result) {
        return Vec::new();
    }
    vec![NewTask::new(
        format!(
            "Address follow-up work from '{}' toward: {}",
            summarize(&completed.description),
            objective.trim()
        ),
        completed.priority - 1,
    )]
}

fn summarize(text: &str) -> &str {
    match text.char_indices().nth(60) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Stable priority ordering: higher priority first, ties keep insertion
/// order, so repeated application is idempotent.
pub fn prioritize(tasks: &[Task]) -> Vec<&Task> {
    let mut ordered: Vec<&Task> = tasks.iter().collect();
    ordered.sort_by(|a, b| b.priority.cmp(&a.priority));
    ordered
}
