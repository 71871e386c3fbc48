//! Local, network-free execution heuristic.

use std::sync::LazyLock;

use anyhow::{Result, bail};
use regex::Regex;

use super::{ExecRequest, Executor};

static RESEARCH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(research|gather|investigate|clarify|break down)\b").unwrap()
});
static SHAPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(outline|sketch|structure|order|plan|list)\b").unwrap()
});
static REVIEW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(review|verify|polish|summari[sz]e)\b").unwrap()
});

/// Deterministic executor that templates a result from the task description.
///
/// Never fails for external reasons; the only failure is its own heuristic
/// being handed nothing to work with, which it signals explicitly instead of
/// returning an empty result.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedExecutor;

impl Executor for SimulatedExecutor {
    fn execute(&self, request: &ExecRequest<'_>) -> Result<String> {
        let description = request.task_description.trim();
        if description.is_empty() {
            bail!("simulated execution needs a task description");
        }
        let objective = request.objective.trim();

        let result = if RESEARCH_RE.is_match(description) {
            format!(
                "Collected background notes for '{objective}'. Key sources and constraints \
                 are organized by theme. Remaining: fold the findings into the next phase."
            )
        } else if SHAPE_RE.is_match(description) {
            format!(
                "Laid out a working structure for '{description}'. Each section has a \
                 one-line intent. Next step: fill the sections in order."
            )
        } else if REVIEW_RE.is_match(description) {
            format!(
                "Reviewed the work for '{objective}'. The output is consistent and \
                 self-contained; nothing further is required."
            )
        } else {
            format!("Completed '{description}' in support of '{objective}'.")
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Tuning;

    fn request<'a>(description: &'a str, objective: &'a str, tuning: &'a Tuning) -> ExecRequest<'a> {
        ExecRequest {
            task_description: description,
            objective,
            tuning,
        }
    }

    #[test]
    fn execution_is_deterministic() {
        let tuning = Tuning::default();
        let req = request("Research the topic for: a post", "a post", &tuning);
        let first = SimulatedExecutor.execute(&req).expect("execute");
        let second = SimulatedExecutor.execute(&req).expect("execute");
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn research_phases_leave_a_follow_up_marker() {
        let tuning = Tuning::default();
        let req = request("Research the topic for: a post", "a post", &tuning);
        let result = SimulatedExecutor.execute(&req).expect("execute");
        assert!(result.contains("Remaining:"));
    }

    #[test]
    fn review_phases_end_the_chain() {
        let tuning = Tuning::default();
        let req = request("Review and polish the draft for: a post", "a post", &tuning);
        let result = SimulatedExecutor.execute(&req).expect("execute");
        assert!(result.contains("nothing further is required"));
    }

    #[test]
    fn blank_description_fails_explicitly() {
        let tuning = Tuning::default();
        let req = request("   ", "a post", &tuning);
        let err = SimulatedExecutor.execute(&req).unwrap_err();
        assert!(err.to_string().contains("task description"));
    }
}
