//! Orchestration for seeding and starting a session run.

use anyhow::{Result, bail};
use tracing::{debug, info};

use crate::core::generator::EmptyObjectiveError;
use crate::core::types::LogKind;
use crate::exec::Executor;
use crate::session::AgentSession;

/// Outcome of a successful start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOutcome {
    pub session_id: String,
    pub seeded: usize,
}

/// Seed the initial task batch and mark the session running.
///
/// Rejected when the session is already running, the task list is not empty,
/// or the objective is blank ([`EmptyObjectiveError`], also surfaced as an
/// error log entry so the record shows why the loop never started). In
/// delegated mode the seeding round trip itself can fail; that too rejects
/// the start instead of leaving a silently empty queue.
pub fn start_session<E: Executor + ?Sized>(
    session: &mut AgentSession,
    executor: &E,
) -> Result<StartOutcome> {
    if session.is_running() {
        bail!("session is already running");
    }
    if !session.tasks.is_empty() {
        bail!("task list is not empty (reset before starting a new run)");
    }
    let objective = session.objective().trim().to_string();
    if objective.is_empty() {
        session
            .log
            .append(LogKind::Error, "Cannot start: objective is empty");
        return Err(EmptyObjectiveError.into());
    }

    debug!(mode = session.mode().as_str(), "seeding initial tasks");
    let drafts = match executor.decompose(&objective, session.tuning()) {
        Ok(drafts) => drafts,
        Err(err) => {
            session
                .log
                .append(LogKind::Error, format!("Failed to seed tasks: {err}"));
            return Err(err);
        }
    };
    if drafts.is_empty() {
        bail!("decomposition produced no tasks");
    }

    let seeded = drafts.len();
    for draft in drafts {
        session.tasks.add(draft);
    }
    session.log.append(
        LogKind::Info,
        format!("Seeded {seeded} initial tasks for objective '{objective}'"),
    );
    session.mark_running();
    info!(seeded, session_id = %session.session_id(), "session started");

    Ok(StartOutcome {
        session_id: session.session_id().to_string(),
        seeded,
    })
}
