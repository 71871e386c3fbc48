//! Loop-level harness tests for full lifecycle scenarios.
//!
//! These tests drive the scheduler through seeding, execution, follow-up
//! derivation, and termination to verify end-to-end behavior: dependency
//! gating, budget enforcement, failure handling, milestones, and reset.

use std::time::Duration;

use looper::core::invariants::validate_invariants;
use looper::core::types::{LogKind, Mode, NewTask, TaskStatus, Tuning};
use looper::exec::simulated::SimulatedExecutor;
use looper::io::export::snapshot;
use looper::looping::{ControlHandle, LoopStop, run_loop};
use looper::session::AgentSession;
use looper::start::start_session;
use looper::step::{TickOutcome, run_tick};
use looper::test_support::{ScriptedExec, ScriptedExecutor, ScriptedOutput};

fn session(mode: Mode, max_iterations: u32) -> AgentSession {
    AgentSession::new(mode, Tuning::default(), max_iterations)
}

/// Drives a writing objective in simulated mode from seeding to completion.
///
/// Asserts the queue drains: at least one task completed, none left pending,
/// the session stopped, and the snapshot passes every semantic invariant.
#[test]
fn simulated_run_completes_writing_objective() {
    let mut session = session(Mode::Simulated, 20);
    assert!(session.set_objective("Write a blog post about autonomous agents"));
    let executor = SimulatedExecutor;
    let started = start_session(&mut session, &executor).expect("start");
    assert!(started.seeded >= 1);

    let ctl = ControlHandle::new();
    let outcome = run_loop(&mut session, &executor, &ctl, Duration::ZERO, |_| {});

    assert_eq!(outcome.stop, LoopStop::Complete);
    let counts = session.tasks.counts();
    assert!(counts.completed >= 1);
    assert_eq!(counts.pending, 0);
    assert_eq!(counts.running, 0);
    assert!(!session.is_running());
    assert!(
        session
            .log
            .entries()
            .iter()
            .any(|e| e.kind == LogKind::Milestone)
    );

    let snap = snapshot(&session);
    assert!(validate_invariants(&snap.tasks, &snap.execution_log).is_empty());
}

/// A budget of one halts after a single tick, leaving the second task queued.
#[test]
fn budget_halts_after_one_tick_with_tasks_left() {
    let mut session = session(Mode::Simulated, 1);
    session.set_objective("two queued tasks");
    session.tasks.add(NewTask::new("first queued task", 2));
    session.tasks.add(NewTask::new("second queued task", 1));
    session.mark_running();

    let executor = ScriptedExecutor::new(vec![ScriptedExec::done("first finished cleanly")]);
    let ctl = ControlHandle::new();
    let outcome = run_loop(&mut session, &executor, &ctl, Duration::ZERO, |_| {});

    assert_eq!(
        outcome.stop,
        LoopStop::BudgetExhausted {
            iterations: 1,
            max_iterations: 1
        }
    );
    assert_eq!(outcome.ticks, 1);
    let counts = session.tasks.counts();
    assert_eq!(counts.completed, 1);
    assert_eq!(counts.pending, 1);
    assert!(session.current_iteration() <= session.max_iterations());
}

/// A dependent task must wait for its prerequisite even at higher priority.
#[test]
fn dependency_gates_selection_over_priority() {
    let mut session = session(Mode::Simulated, 10);
    session.set_objective("dependency ordering");
    let prereq_id = session
        .tasks
        .add(NewTask::new("low priority prerequisite", 1))
        .id
        .clone();
    session.tasks.add(NewTask {
        description: "high priority dependent".to_string(),
        priority: 5,
        dependencies: vec![prereq_id.clone()],
    });
    session.mark_running();

    let executor = ScriptedExecutor::new(vec![
        ScriptedExec::done("prerequisite finished"),
        ScriptedExec::done("dependent finished"),
    ]);
    let ctl = ControlHandle::new();
    let mut order = Vec::new();
    let outcome = run_loop(&mut session, &executor, &ctl, Duration::ZERO, |step| {
        order.push(step.task_id.clone());
    });

    assert_eq!(outcome.stop, LoopStop::Complete);
    assert_eq!(order, vec![prereq_id, "task-2".to_string()]);
}

/// A delegation failure marks the task failed with the provider detail as its
/// result, logs an error, and the loop moves on to the next eligible task.
#[test]
fn delegation_failure_marks_task_failed_and_continues() {
    let mut session = session(Mode::Delegated, 10);
    session.set_objective("delegated failure handling");
    session.tasks.add(NewTask::new("task that will fail", 2));
    session.tasks.add(NewTask::new("task that will pass", 1));
    session.mark_running();

    let detail = "provider returned status 500 Internal Server Error: upstream exploded";
    let executor = ScriptedExecutor::new(vec![
        ScriptedExec::fail(detail),
        ScriptedExec::done("second finished"),
    ]);
    let ctl = ControlHandle::new();
    let outcome = run_loop(&mut session, &executor, &ctl, Duration::ZERO, |_| {});

    assert_eq!(outcome.stop, LoopStop::Complete);
    let failed = session.tasks.get("task-1").expect("task-1");
    assert_eq!(failed.status, TaskStatus::Failed);
    assert_eq!(failed.result.as_deref(), Some(detail));
    assert!(failed.completed_at.is_none());
    assert!(
        session
            .log
            .entries()
            .iter()
            .any(|e| e.kind == LogKind::Error)
    );
    let passed = session.tasks.get("task-2").expect("task-2");
    assert_eq!(passed.status, TaskStatus::Completed);
}

/// Reset mid-run clears tasks, log, and counters, and assigns a fresh
/// session id with both run flags down.
#[test]
fn reset_mid_run_clears_state_and_regenerates_session_id() {
    let mut session = session(Mode::Simulated, 10);
    session.set_objective("reset midway");
    let executor = SimulatedExecutor;
    start_session(&mut session, &executor).expect("start");
    let ctl = ControlHandle::new();
    assert!(matches!(
        run_tick(&mut session, &executor, &ctl),
        TickOutcome::Executed(_)
    ));
    let old_id = session.session_id().to_string();
    assert!(!session.tasks.is_empty());

    session.reset();

    assert!(session.tasks.all().is_empty());
    assert!(session.log.entries().is_empty());
    assert_eq!(session.current_iteration(), 0);
    assert_ne!(session.session_id(), old_id);
    assert!(!session.is_running());
    assert!(!session.is_paused());
}

/// With a fixed total of four tasks, each milestone threshold is logged
/// exactly once as completions cross 25/50/75/100 percent.
#[test]
fn milestones_logged_once_per_threshold() {
    let mut session = session(Mode::Simulated, 10);
    session.set_objective("four fixed tasks");
    for (idx, name) in ["alpha", "beta", "gamma", "delta"].iter().enumerate() {
        session
            .tasks
            .add(NewTask::new(format!("{name} unit"), 4 - idx as i64));
    }
    session.mark_running();

    // Results carry no expansion markers, so the total stays fixed at four.
    let executor = ScriptedExecutor::new(vec![
        ScriptedExec::done("alpha finished"),
        ScriptedExec::done("beta finished"),
        ScriptedExec::done("gamma finished"),
        ScriptedExec::done("delta finished"),
    ]);
    let ctl = ControlHandle::new();
    let outcome = run_loop(&mut session, &executor, &ctl, Duration::ZERO, |_| {});
    assert_eq!(outcome.stop, LoopStop::Complete);

    let mut percents: Vec<u64> = session
        .log
        .entries()
        .iter()
        .filter(|e| e.kind == LogKind::Milestone)
        .filter_map(|e| e.metadata.as_ref()?.get("percent")?.as_u64())
        .collect();
    percents.sort_unstable();
    assert_eq!(percents, vec![25, 50, 75, 100]);
}

/// Between ticks there is never a running task, and the iteration counter
/// only moves forward.
#[test]
fn single_task_concurrency_observed_between_ticks() {
    let mut session = session(Mode::Simulated, 30);
    session.set_objective("Write a blog post about invariants");
    let executor = SimulatedExecutor;
    start_session(&mut session, &executor).expect("start");
    let ctl = ControlHandle::new();

    let mut last_iteration = 0;
    loop {
        let outcome = run_tick(&mut session, &executor, &ctl);
        assert!(session.tasks.counts().running <= 1);
        assert!(session.current_iteration() >= last_iteration);
        last_iteration = session.current_iteration();
        match outcome {
            TickOutcome::Executed(_) | TickOutcome::Idle | TickOutcome::Discarded => {
                assert_eq!(session.tasks.counts().running, 0);
            }
            TickOutcome::Complete | TickOutcome::Stalled { .. } | TickOutcome::BudgetExhausted => {
                break;
            }
        }
    }
}

/// When the only prerequisite fails, its dependent can never run and the
/// loop stops in the stalled terminal instead of spinning.
#[test]
fn blocked_queue_stalls_instead_of_spinning() {
    let mut session = session(Mode::Simulated, 10);
    session.set_objective("stalled queue");
    let prereq_id = session
        .tasks
        .add(NewTask::new("failing prerequisite", 2))
        .id
        .clone();
    session.tasks.add(NewTask {
        description: "forever gated".to_string(),
        priority: 1,
        dependencies: vec![prereq_id],
    });
    session.mark_running();

    let executor = ScriptedExecutor::new(vec![ScriptedExec::fail("prerequisite exploded")]);
    let ctl = ControlHandle::new();
    let outcome = run_loop(&mut session, &executor, &ctl, Duration::ZERO, |_| {});

    assert_eq!(outcome.stop, LoopStop::Stalled { blocked: 1 });
    assert_eq!(session.tasks.counts().pending, 1);
    assert!(!session.is_running());
}

/// A pause raised while a task is in flight discards the attempt: the task
/// reverts to pending and its stale result is never committed.
#[test]
fn pause_during_flight_discards_the_stale_result() {
    let mut session = session(Mode::Simulated, 10);
    session.set_objective("in-flight pause");
    session.tasks.add(NewTask::new("interrupted work", 1));
    session.mark_running();

    let ctl = ControlHandle::new();
    let executor = ScriptedExecutor::new(vec![ScriptedExec {
        output: ScriptedOutput::Done("stale result".to_string()),
        interrupt: Some(ctl.clone()),
    }]);

    let outcome = run_tick(&mut session, &executor, &ctl);
    assert_eq!(outcome, TickOutcome::Discarded);

    let task = session.tasks.get("task-1").expect("task-1");
    assert_eq!(task.status, TaskStatus::Pending);
    assert!(task.result.is_none());

    // After resuming, the same task runs again and commits normally.
    ctl.clear_pause();
    let executor = ScriptedExecutor::new(vec![ScriptedExec::done("fresh result")]);
    let TickOutcome::Executed(step) = run_tick(&mut session, &executor, &ctl) else {
        panic!("expected an executed tick");
    };
    assert_eq!(step.task_id, "task-1");
    assert_eq!(step.status, TaskStatus::Completed);
}

/// Pausing the session idles the loop without consuming iterations; a stop
/// request then ends the run.
#[test]
fn paused_session_consumes_no_iterations() {
    let mut session = session(Mode::Simulated, 10);
    session.set_objective("paused loop");
    session.tasks.add(NewTask::new("waiting work", 1));
    session.mark_running();
    assert!(session.toggle_pause());

    let executor = ScriptedExecutor::new(Vec::new());
    let ctl = ControlHandle::new();
    ctl.request_stop();
    let outcome = run_loop(&mut session, &executor, &ctl, Duration::ZERO, |_| {});

    assert_eq!(outcome.stop, LoopStop::Interrupted);
    assert_eq!(session.current_iteration(), 0);
    assert_eq!(session.tasks.counts().pending, 1);
}
