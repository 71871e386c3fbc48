//! Multi-tick loop driver with cadence and operator controls.
//!
//! Ticks are serialized by construction: the driver is a synchronous loop,
//! so a new tick cannot begin while a previous tick's execution is still in
//! flight, even when a delegated call runs long. Operator interrupts are
//! honored at the next safe point, never by aborting an in-flight
//! execution.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::info;

use crate::exec::Executor;
use crate::session::AgentSession;
use crate::step::{StepOutcome, TickOutcome, run_tick};

/// Thread-safe operator interrupt surface.
///
/// Writers (e.g. a ctrl-c handler thread) set flags at any time; the loop
/// reads them between ticks and immediately after an in-flight execution
/// resolves.
#[derive(Clone, Default)]
pub struct ControlHandle {
    inner: Arc<ControlFlags>,
}

#[derive(Default)]
struct ControlFlags {
    stop: AtomicBool,
    pause: AtomicBool,
}

impl ControlHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.inner.stop.store(true, Ordering::SeqCst);
    }

    pub fn stop_requested(&self) -> bool {
        self.inner.stop.load(Ordering::SeqCst)
    }

    pub fn request_pause(&self) {
        self.inner.pause.store(true, Ordering::SeqCst);
    }

    pub fn clear_pause(&self) {
        self.inner.pause.store(false, Ordering::SeqCst);
    }

    pub fn pause_requested(&self) -> bool {
        self.inner.pause.load(Ordering::SeqCst)
    }

    /// True when any interrupt should discard an in-flight attempt.
    pub fn interrupted(&self) -> bool {
        self.stop_requested() || self.pause_requested()
    }
}

/// Reason why `run_loop` stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopStop {
    /// Every task resolved with at least one completed.
    Complete,
    /// The iteration budget was exhausted before the queue drained.
    BudgetExhausted { iterations: u32, max_iterations: u32 },
    /// Unresolved tasks remain but none can ever run.
    Stalled { blocked: usize },
    /// An operator stop request ended the run.
    Interrupted,
}

/// Summary of a loop invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    pub session_id: String,
    /// Ticks that actually drove a task (idle and discarded ticks excluded).
    pub ticks: u32,
    pub stop: LoopStop,
}

/// Drive ticks until a terminal outcome, sleeping `delay` between ticks.
///
/// Call after [`crate::start::start_session`] has seeded the queue. Pause
/// (session flag or control handle) idles the loop without consuming
/// iterations; stop requests are honored before each tick.
pub fn run_loop<E, F>(
    session: &mut AgentSession,
    executor: &E,
    ctl: &ControlHandle,
    delay: Duration,
    mut on_step: F,
) -> LoopOutcome
where
    E: Executor + ?Sized,
    F: FnMut(&StepOutcome),
{
    let mut ticks = 0u32;
    loop {
        if ctl.stop_requested() {
            session.mark_stopped();
            info!(ticks, "loop interrupted");
            return outcome(session, ticks, LoopStop::Interrupted);
        }
        if ctl.pause_requested() || session.is_paused() {
            thread::sleep(delay);
            continue;
        }

        match run_tick(session, executor, ctl) {
            TickOutcome::Executed(step) => {
                ticks += 1;
                on_step(&step);
            }
            TickOutcome::Complete => {
                session.mark_stopped();
                info!(ticks, "queue drained");
                return outcome(session, ticks, LoopStop::Complete);
            }
            TickOutcome::BudgetExhausted => {
                session.mark_stopped();
                let stop = LoopStop::BudgetExhausted {
                    iterations: session.current_iteration(),
                    max_iterations: session.max_iterations(),
                };
                return outcome(session, ticks, stop);
            }
            TickOutcome::Stalled { blocked } => {
                session.mark_stopped();
                return outcome(session, ticks, LoopStop::Stalled { blocked });
            }
            TickOutcome::Idle | TickOutcome::Discarded => {}
        }

        thread::sleep(delay);
    }
}

fn outcome(session: &AgentSession, ticks: u32, stop: LoopStop) -> LoopOutcome {
    LoopOutcome {
        session_id: session.session_id().to_string(),
        ticks,
        stop,
    }
}
