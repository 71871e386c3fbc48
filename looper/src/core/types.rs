//! Shared deterministic types for the agent loop core.
//!
//! These types define stable contracts between core components. They must not
//! depend on external state or I/O, and they serialize to the camelCase wire
//! format used by session snapshots.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    /// A resolved task never runs again; only a session reset clears it.
    pub fn is_resolved(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// One atomic unit of decomposed work toward the objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Opaque unique identifier, assigned by the store at creation.
    pub id: String,
    pub description: String,
    pub status: TaskStatus,
    /// Higher sorts first when dependencies are satisfied.
    pub priority: i64,
    pub created_at: DateTime<Utc>,
    /// Set exactly once, when the task transitions to completed.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Outcome text on completion; the failure reason on failure.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result: Option<String>,
    /// Ids that must reach completed before this task may run.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub dependencies: Vec<String>,
}

/// A task draft produced by decomposition or follow-up derivation.
///
/// The store assigns id, status, and creation time when the draft is
/// appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub description: String,
    pub priority: i64,
    pub dependencies: Vec<String>,
}

impl NewTask {
    pub fn new(description: impl Into<String>, priority: i64) -> Self {
        Self {
            description: description.into(),
            priority,
            dependencies: Vec::new(),
        }
    }
}

/// Partial merge applied by `TaskStore::update`.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub status: Option<TaskStatus>,
    pub result: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Classification for execution log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Success,
    Warning,
    Error,
    Task,
    Result,
    Thinking,
    Milestone,
}

impl LogKind {
    /// Default icon rendered next to entries of this kind.
    pub fn icon(self) -> &'static str {
        match self {
            LogKind::Info => "ℹ️",
            LogKind::Success => "✅",
            LogKind::Warning => "⚠️",
            LogKind::Error => "❌",
            LogKind::Task => "⚙️",
            LogKind::Result => "📄",
            LogKind::Thinking => "🤔",
            LogKind::Milestone => "🏁",
        }
    }
}

/// Append-only record of one thing the loop did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: LogKind,
    pub message: String,
    pub icon: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub metadata: Option<serde_json::Value>,
}

/// Execution strategy for the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Simulated,
    Delegated,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Simulated => "simulated",
            Mode::Delegated => "delegated",
        }
    }
}

/// Tuning parameters forwarded to the delegated executor per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tuning {
    pub model: String,
    /// Sampling temperature (0..=2).
    pub temperature: f64,
    /// Response budget in tokens (100..=4000).
    pub max_tokens: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

impl Tuning {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(anyhow!("temperature must be within 0..=2"));
        }
        if !(100..=4000).contains(&self.max_tokens) {
            return Err(anyhow!("max_tokens must be within 100..=4000"));
        }
        if self.model.trim().is_empty() {
            return Err(anyhow!("model must be non-empty"));
        }
        Ok(())
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, patch: TuningPatch) {
        if let Some(model) = patch.model {
            self.model = model;
        }
        if let Some(temperature) = patch.temperature {
            self.temperature = temperature;
        }
        if let Some(max_tokens) = patch.max_tokens {
            self.max_tokens = max_tokens;
        }
    }
}

/// Partial update for tuning parameters (operator settings command).
#[derive(Debug, Clone, Default)]
pub struct TuningPatch {
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

/// Live status tally, recomputed from the task sequence on every read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.pending + self.running + self.completed + self.failed
    }

    pub fn resolved(&self) -> usize {
        self.completed + self.failed
    }
}
