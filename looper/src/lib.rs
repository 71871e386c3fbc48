//! Objective-driven autonomous task loop.
//!
//! Given one high-level objective, the loop decomposes it into a queue of
//! tasks, executes them strictly one at a time through a pluggable executor
//! (local simulation or a delegated language-model call), derives follow-up
//! work from each result, and halts when the queue drains, the iteration
//! budget runs out, or the operator intervenes. The architecture enforces a
//! strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (generation, selection,
//!   milestones, invariants). No I/O, fully testable in isolation.
//! - **[`exec`]**: Executor strategies behind one trait (simulated and
//!   delegated).
//! - **[`io`]**: Side-effecting operations (configuration, snapshot export,
//!   prompt templates).
//!
//! Orchestration modules ([`session`], [`start`], [`step`], [`looping`])
//! coordinate core logic with executors to implement CLI commands.

pub mod core;
pub mod exec;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod looping;
pub mod session;
pub mod start;
pub mod step;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
