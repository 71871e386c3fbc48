//! Operator configuration stored under `.looper/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::types::Tuning;

/// Operator configuration (TOML).
///
/// This file is intended to be edited by humans and must remain stable and
/// automatable. Missing fields default to sensible values. The presentation
/// preferences (`enable_sounds`, `auto_scroll`, `theme`) are carried for
/// clients and are not interpreted by the loop itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LooperConfig {
    /// Provider the delegated executor talks to (`openai`, `openrouter`,
    /// `groq`).
    pub provider: String,

    /// Bearer token for the provider. Required in delegated mode only.
    pub api_key: String,

    /// Overrides the provider endpoint base when set.
    pub base_url: Option<String>,

    /// Model identifier forwarded per request.
    pub model: String,

    /// Sampling temperature forwarded per request (0..=2).
    pub temperature: f64,

    /// Response budget in tokens forwarded per request (100..=4000).
    pub max_tokens: u32,

    /// Iteration budget for one run.
    pub max_iterations: u32,

    /// Sleep between scheduler ticks, in milliseconds.
    pub iteration_delay_ms: u64,

    /// Wall-clock bound on one delegated round trip.
    pub request_timeout_secs: u64,

    pub enable_sounds: bool,
    pub auto_scroll: bool,
    pub theme: String,
}

impl Default for LooperConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            api_key: String::new(),
            base_url: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            max_iterations: 25,
            iteration_delay_ms: 1_000,
            request_timeout_secs: 60,
            enable_sounds: false,
            auto_scroll: true,
            theme: "dark".to_string(),
        }
    }
}

impl LooperConfig {
    pub fn validate(&self) -> Result<()> {
        if self.provider.trim().is_empty() {
            return Err(anyhow!("provider must be non-empty"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(anyhow!("temperature must be within 0..=2"));
        }
        if !(100..=4000).contains(&self.max_tokens) {
            return Err(anyhow!("max_tokens must be within 100..=4000"));
        }
        if self.max_iterations == 0 {
            return Err(anyhow!("max_iterations must be > 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("request_timeout_secs must be > 0"));
        }
        Ok(())
    }

    /// Chat-completion endpoint for the configured provider.
    pub fn endpoint(&self) -> String {
        if let Some(base) = &self.base_url {
            return format!("{}/chat/completions", base.trim_end_matches('/'));
        }
        match self.provider.as_str() {
            "openrouter" => "https://openrouter.ai/api/v1/chat/completions".to_string(),
            "groq" => "https://api.groq.com/openai/v1/chat/completions".to_string(),
            _ => "https://api.openai.com/v1/chat/completions".to_string(),
        }
    }

    /// Per-request tuning slice handed to the session.
    pub fn tuning(&self) -> Tuning {
        Tuning {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

/// Default config location relative to the working directory.
pub fn default_config_path(root: &Path) -> PathBuf {
    root.join(".looper").join("config.toml")
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `LooperConfig::default()`.
pub fn load_config(path: &Path) -> Result<LooperConfig> {
    if !path.exists() {
        let cfg = LooperConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: LooperConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &LooperConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
