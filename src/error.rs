//! Unified error types for the agent.

use crate::types::ExitStatus;
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// ModelError
// ---------------------------------------------------------------------------

/// Errors from the model query port.
///
/// These are terminal for the run: the loop surfaces them immediately and
/// never retries (retry policy is deliberately not part of this core).
#[derive(Debug)]
pub enum ModelError {
    /// Network / reqwest-level failure before an exchange completed.
    Http(reqwest::Error),
    /// Non-2xx status from the provider.
    Status(u16, String),
    /// The exchange completed but the body was unusable.
    InvalidResponse(String),
    /// The caller violated the port's input contract.
    InvalidConversation(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "http: {e}"),
            Self::Status(code, body) => write!(f, "status {code}: {body}"),
            Self::InvalidResponse(msg) => write!(f, "invalid response: {msg}"),
            Self::InvalidConversation(msg) => write!(f, "invalid conversation: {msg}"),
        }
    }
}

impl std::error::Error for ModelError {}

impl From<reqwest::Error> for ModelError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

// ---------------------------------------------------------------------------
// EnvironmentError
// ---------------------------------------------------------------------------

/// Errors from the execution environment port.
///
/// A failing shell command is ordinary data, not a port failure; these
/// variants cover only the cases where execution could not be attempted.
#[derive(Debug)]
pub enum EnvironmentError {
    /// The requested working directory does not exist.
    MissingWorkingDirectory(PathBuf),
    /// The shell process could not be spawned or awaited.
    Spawn(std::io::Error),
}

impl fmt::Display for EnvironmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingWorkingDirectory(path) => {
                write!(f, "working directory does not exist: {}", path.display())
            }
            Self::Spawn(e) => write!(f, "failed to run shell: {e}"),
        }
    }
}

impl std::error::Error for EnvironmentError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors when loading or parsing configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Toml(e) => write!(f, "toml: {e}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e)
    }
}

// ---------------------------------------------------------------------------
// AgentError — top-level
// ---------------------------------------------------------------------------

/// Failures that escalate out of the agent loop.
///
/// Everything else (malformed replies, declines, budget exhaustion) is
/// absorbed into the conversation or reported as a normal [`RunOutcome`];
/// only these two port failures end a run as an error.
///
/// [`RunOutcome`]: crate::types::RunOutcome
#[derive(Debug)]
pub enum AgentError {
    Model(ModelError),
    Environment(EnvironmentError),
}

impl AgentError {
    /// Terminal status label recorded when this error ends a run.
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            Self::Model(_) => ExitStatus::ModelError,
            Self::Environment(_) => ExitStatus::EnvironmentError,
        }
    }
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model(e) => write!(f, "model: {e}"),
            Self::Environment(e) => write!(f, "environment: {e}"),
        }
    }
}

impl std::error::Error for AgentError {}

impl From<ModelError> for AgentError {
    fn from(e: ModelError) -> Self {
        Self::Model(e)
    }
}

impl From<EnvironmentError> for AgentError {
    fn from(e: EnvironmentError) -> Self {
        Self::Environment(e)
    }
}
