//! Executor strategies for driving one task to a result.
//!
//! The [`Executor`] trait decouples the scheduler loop from the execution
//! backend. Two strategies ship: a local deterministic simulation
//! ([`simulated`]) and a delegated chat-completion round trip
//! ([`delegated`]). Tests use scripted executors that return predetermined
//! outputs without touching the network.

use anyhow::Result;

use crate::core::generator;
use crate::core::types::{NewTask, Tuning};

pub mod delegated;
pub mod simulated;

/// Parameters for one executor invocation.
#[derive(Debug, Clone)]
pub struct ExecRequest<'a> {
    /// Description of the task being driven.
    pub task_description: &'a str,
    /// The session objective, for framing.
    pub objective: &'a str,
    /// Tuning forwarded to delegated backends.
    pub tuning: &'a Tuning,
}

/// Abstraction over task execution backends.
pub trait Executor {
    /// Drive one task to a textual result. The task is already marked
    /// running when this is called; the caller converts every error into the
    /// task's failure path.
    fn execute(&self, request: &ExecRequest<'_>) -> Result<String>;

    /// Decompose an objective into the initial task batch. Defaults to the
    /// local heuristic; delegated backends override this with a provider
    /// round trip.
    fn decompose(&self, objective: &str, tuning: &Tuning) -> Result<Vec<NewTask>> {
        let _ = tuning;
        generator::initial_tasks(objective)
    }
}
