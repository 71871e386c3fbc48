//! Delegated execution through an external chat-completion provider.
//!
//! One blocking round trip per task; the loop is suspended on the call by
//! design (single-task concurrency). The request timeout configured at the
//! client is the only wall-clock bound and surfaces as a [`DelegationError`]
//! like any other provider failure.

use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Result, bail};
use regex::Regex;
use reqwest::blocking::Client;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::{ExecRequest, Executor};
use crate::core::generator::EmptyObjectiveError;
use crate::core::types::{NewTask, Tuning};
use crate::io::config::LooperConfig;
use crate::io::prompt::PromptSet;

/// External call failed, timed out, or returned an error payload.
///
/// The display form is the provider detail verbatim; it becomes the failed
/// task's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationError {
    pub detail: String,
}

impl DelegationError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl fmt::Display for DelegationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.detail)
    }
}

impl std::error::Error for DelegationError {}

/// Executor that performs one blocking chat-completion round trip per task.
pub struct DelegatedExecutor {
    client: Client,
    endpoint: String,
    api_key: String,
    prompts: PromptSet,
}

impl DelegatedExecutor {
    pub fn new(config: &LooperConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            bail!("delegated mode needs an api_key in the configuration");
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint(),
            api_key: config.api_key.clone(),
            prompts: PromptSet::new(),
        })
    }

    fn complete(
        &self,
        system: &str,
        user: &str,
        tuning: &Tuning,
    ) -> Result<String, DelegationError> {
        let payload = build_payload(
            &tuning.model,
            system,
            user,
            tuning.temperature,
            tuning.max_tokens,
        );
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .map_err(|err| DelegationError::new(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|err| DelegationError::new(err.to_string()))?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "provider returned an error");
            return Err(DelegationError::new(format!(
                "provider returned status {status}: {}",
                body.trim()
            )));
        }

        let raw: Value = serde_json::from_str(&body)
            .map_err(|_| DelegationError::new("provider returned invalid json"))?;
        let content = extract_content(&raw)
            .ok_or_else(|| DelegationError::new("provider response had no message content"))?;
        if content.trim().is_empty() {
            return Err(DelegationError::new("provider returned an empty result"));
        }
        Ok(content)
    }
}

impl Executor for DelegatedExecutor {
    fn execute(&self, request: &ExecRequest<'_>) -> Result<String> {
        let system = self.prompts.render_persona(request.objective)?;
        let user = format!("Execute this task: {}", request.task_description);
        debug!(model = %request.tuning.model, "delegating task");
        Ok(self.complete(&system, &user, request.tuning)?)
    }

    fn decompose(&self, objective: &str, tuning: &Tuning) -> Result<Vec<NewTask>> {
        let objective = objective.trim();
        if objective.is_empty() {
            return Err(EmptyObjectiveError.into());
        }
        let system = self.prompts.render_seed(objective)?;
        let reply = self.complete(&system, "List the initial tasks.", tuning)?;
        Ok(parse_task_lines(&reply))
    }
}

/// Chat-completion payload in the provider wire format.
pub(crate) fn build_payload(
    model: &str,
    system: &str,
    user: &str,
    temperature: f64,
    max_tokens: u32,
) -> Value {
    json!({
        "model": model,
        "messages": [
            { "role": "system", "content": system },
            { "role": "user", "content": user },
        ],
        "temperature": temperature,
        "max_tokens": max_tokens,
    })
}

pub(crate) fn extract_content(raw: &Value) -> Option<String> {
    raw.get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

static TASK_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(?:\d+[.)]|[-*])\s+(.+\S)\s*$").unwrap());

/// Parse a numbered or bulleted task list, most important first.
///
/// Falls back to the whole reply as one task so a non-empty decomposition
/// always seeds at least one task.
pub(crate) fn parse_task_lines(reply: &str) -> Vec<NewTask> {
    let lines: Vec<&str> = TASK_LINE_RE
        .captures_iter(reply)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();
    if lines.is_empty() {
        return vec![NewTask::new(reply.trim(), 1)];
    }
    let count = lines.len() as i64;
    lines
        .into_iter()
        .enumerate()
        .map(|(idx, line)| NewTask::new(line, count - idx as i64))
        .collect()
}
