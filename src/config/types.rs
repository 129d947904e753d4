//! Configuration data model.
//!
//! This module intentionally holds struct definitions plus per-section
//! defaults. Loader and precedence logic stays in `config::mod` so parsing
//! behavior remains centralized.

use serde::Deserialize;
use std::path::PathBuf;

use super::defaults::{
    DEFAULT_API_BASE_URL, DEFAULT_API_TIMEOUT_SECS, DEFAULT_MAX_TURNS, DEFAULT_MODEL_ID,
    DEFAULT_OUTPUT_LIMIT_BYTES,
};

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelProfileConfig,
    pub agent: AgentConfig,
    pub limits: LimitsConfig,
    pub display: DisplayConfig,
}

/// Model provider settings used by the runtime HTTP client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelProfileConfig {
    #[serde(alias = "api_base_url")]
    pub base_url: String,
    pub api_key: String,
    /// Environment variable to read the key from when `api_key` is empty.
    pub api_key_env: Option<String>,
    /// Concrete model id sent with every request.
    pub model: String,
    /// Price per million prompt tokens, used for cost telemetry.
    pub prompt_price_per_mtok: f64,
    /// Price per million completion tokens, used for cost telemetry.
    pub completion_price_per_mtok: f64,
}

impl Default for ModelProfileConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.into(),
            api_key: String::new(),
            api_key_env: None,
            model: DEFAULT_MODEL_ID.into(),
            prompt_price_per_mtok: 0.0,
            completion_price_per_mtok: 0.0,
        }
    }
}

/// Agent loop behavior settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Safety cap on model queries per run.
    pub max_turns: usize,
    /// Default working directory for extracted commands. Falls back to the
    /// process working directory when unset.
    pub project_root: Option<PathBuf>,
    /// Skip the confirmation gate entirely (unattended runs).
    pub auto_accept: bool,
    /// Extra operator instructions appended to the system prompt.
    pub instructions: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            project_root: None,
            auto_accept: false,
            instructions: String::new(),
        }
    }
}

/// Capture and transport limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Byte ceiling per captured output stream before truncation.
    pub output_limit_bytes: usize,
    /// Timeout for model API requests.
    pub api_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            output_limit_bytes: DEFAULT_OUTPUT_LIMIT_BYTES,
            api_timeout_secs: DEFAULT_API_TIMEOUT_SECS,
        }
    }
}

/// Display / rendering preferences.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub color: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { color: true }
    }
}
