//! Objective-driven autonomous task loop CLI.
//!
//! `looper run` seeds a task queue from an objective and drives it to a
//! terminal state; `select` and `validate` operate on exported session
//! snapshots.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use jsonschema::Draft;
use serde_json::Value;

use looper::core::invariants::validate_invariants;
use looper::core::selector::{SelectOutcome, next_runnable};
use looper::core::types::{Mode, TaskStatus};
use looper::exec::Executor;
use looper::exec::delegated::DelegatedExecutor;
use looper::exec::simulated::SimulatedExecutor;
use looper::exit_codes;
use looper::io::config::{LooperConfig, default_config_path, load_config, write_config};
use looper::io::export::{SessionSnapshot, load_snapshot, snapshot, write_snapshot};
use looper::looping::{ControlHandle, LoopStop, run_loop};
use looper::session::AgentSession;
use looper::start::start_session;

const V1_SCHEMA: &str = include_str!("../../schemas/session/v1.schema.json");

#[derive(Parser)]
#[command(
    name = "looper",
    version,
    about = "Objective-driven autonomous task loop"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write `.looper/config.toml` with defaults if missing.
    Init {
        /// Overwrite an existing config file.
        #[arg(short, long)]
        force: bool,
    },
    /// Run the loop for an objective until it reaches a terminal state.
    Run {
        /// The top-level goal to decompose and work toward.
        objective: String,
        /// Execution strategy.
        #[arg(long, value_enum, default_value = "simulated")]
        mode: ModeArg,
        /// Override the configured iteration budget.
        #[arg(long)]
        max_iterations: Option<u32>,
        /// Override the configured tick delay in milliseconds.
        #[arg(long)]
        delay_ms: Option<u64>,
        /// Write a session snapshot here after the run.
        #[arg(long)]
        export: Option<PathBuf>,
        /// Config file location.
        #[arg(long, default_value = ".looper/config.toml")]
        config: PathBuf,
    },
    /// Print the next runnable task id from a session snapshot.
    Select {
        /// Exported session snapshot.
        snapshot: PathBuf,
    },
    /// Check a session snapshot against the schema and semantic invariants.
    Validate {
        /// Exported session snapshot.
        snapshot: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Simulated,
    Delegated,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Simulated => Mode::Simulated,
            ModeArg::Delegated => Mode::Delegated,
        }
    }
}

fn main() {
    looper::logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force } => cmd_init(force),
        Command::Run {
            objective,
            mode,
            max_iterations,
            delay_ms,
            export,
            config,
        } => cmd_run(
            &objective,
            mode.into(),
            max_iterations,
            delay_ms,
            export.as_deref(),
            &config,
        ),
        Command::Select { snapshot } => cmd_select(&snapshot),
        Command::Validate { snapshot } => cmd_validate(&snapshot),
    }
}

fn cmd_init(force: bool) -> Result<i32> {
    let path = default_config_path(Path::new("."));
    if !force && path.exists() {
        println!("{} already exists", path.display());
        return Ok(exit_codes::OK);
    }
    write_config(&path, &LooperConfig::default())?;
    println!("wrote {}", path.display());
    Ok(exit_codes::OK)
}

fn cmd_run(
    objective: &str,
    mode: Mode,
    max_iterations: Option<u32>,
    delay_ms: Option<u64>,
    export: Option<&Path>,
    config_path: &Path,
) -> Result<i32> {
    let cfg = load_config(config_path)?;
    let max_iterations = max_iterations.unwrap_or(cfg.max_iterations);
    let delay = Duration::from_millis(delay_ms.unwrap_or(cfg.iteration_delay_ms));

    let mut session = AgentSession::new(mode, cfg.tuning(), max_iterations);
    session.set_objective(objective);

    let ctl = ControlHandle::new();
    {
        let ctl = ctl.clone();
        ctrlc::set_handler(move || ctl.request_stop()).context("install ctrl-c handler")?;
    }

    let executor: Box<dyn Executor> = match mode {
        Mode::Simulated => Box::new(SimulatedExecutor),
        Mode::Delegated => Box::new(DelegatedExecutor::new(&cfg)?),
    };

    let started = start_session(&mut session, executor.as_ref())?;
    println!(
        "session {} seeded {} tasks ({} mode)",
        started.session_id,
        started.seeded,
        mode.as_str()
    );

    let outcome = run_loop(&mut session, executor.as_ref(), &ctl, delay, |step| {
        let status = match step.status {
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Pending | TaskStatus::Running => "unresolved",
        };
        println!(
            "[{:>3}/{max_iterations}] {status}: {}",
            step.iter, step.description
        );
    });

    let counts = session.tasks.counts();
    println!(
        "{} completed, {} failed, {} pending after {} ticks",
        counts.completed, counts.failed, counts.pending, outcome.ticks
    );

    if let Some(path) = export {
        let snap = snapshot(&session);
        write_snapshot(path, &snap)?;
        println!("snapshot written to {}", path.display());
    }

    let (message, code) = match &outcome.stop {
        LoopStop::Complete => ("objective loop complete".to_string(), exit_codes::OK),
        LoopStop::BudgetExhausted {
            iterations,
            max_iterations,
        } => (
            format!("halted: iteration budget exhausted ({iterations}/{max_iterations})"),
            exit_codes::BUDGET,
        ),
        LoopStop::Stalled { blocked } => (
            format!("halted: {blocked} tasks permanently blocked"),
            exit_codes::STALLED,
        ),
        LoopStop::Interrupted => ("interrupted".to_string(), exit_codes::OK),
    };
    println!("{message}");
    Ok(code)
}

fn cmd_select(path: &Path) -> Result<i32> {
    let snap = validate_snapshot_file(path)?;
    match next_runnable(&snap.tasks) {
        SelectOutcome::Ready(task) => {
            println!("{}", task.id);
            Ok(exit_codes::OK)
        }
        SelectOutcome::Complete => {
            println!("all tasks resolved");
            Ok(exit_codes::OK)
        }
        SelectOutcome::Blocked { blocked } => {
            println!("{blocked} tasks permanently blocked");
            Ok(exit_codes::STALLED)
        }
        SelectOutcome::Idle => {
            println!("no tasks");
            Ok(exit_codes::OK)
        }
    }
}

fn cmd_validate(path: &Path) -> Result<i32> {
    validate_snapshot_file(path)?;
    println!("{} is valid", path.display());
    Ok(exit_codes::OK)
}

/// Parse and validate a snapshot: schema conformance + semantic invariants.
fn validate_snapshot_file(path: &Path) -> Result<SessionSnapshot> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let instance: Value = serde_json::from_str(&raw).context("parse snapshot json")?;
    let schema: Value = serde_json::from_str(V1_SCHEMA).context("parse embedded schema")?;
    validate_schema(&instance, &schema)?;

    let snap = load_snapshot(path)?;
    let errors = validate_invariants(&snap.tasks, &snap.execution_log);
    if !errors.is_empty() {
        bail!("invariant violations:\n- {}", errors.join("\n- "));
    }
    Ok(snap)
}

/// Validate JSON instance against a JSON Schema (Draft 2020-12).
fn validate_schema(instance: &Value, schema: &Value) -> Result<()> {
    let compiled = jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(schema)
        .context("compile json schema")?;
    let messages: Vec<String> = compiled
        .iter_errors(instance)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        bail!("schema validation failed:\n- {}", messages.join("\n- "));
    }
    Ok(())
}
