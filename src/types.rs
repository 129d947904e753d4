//! Core data model for the agent loop.
//!
//! These types serialize directly into the trajectory record, so field and
//! variant names here are the on-disk schema.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Message roles
// ---------------------------------------------------------------------------

/// Conversation participant role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instruction message.
    System,
    /// End-user task message.
    User,
    /// Assistant/model reply.
    Assistant,
    /// Outcome of an executed action, or a corrective note from the loop.
    Observation,
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// A single message in the conversation history.
///
/// The conversation is append-only: messages are never mutated or removed
/// once pushed, so the transcript is a total-ordered replay of the run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Author role for this conversation turn.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Create an observation message.
    pub fn observation(content: impl Into<String>) -> Self {
        Self {
            role: Role::Observation,
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// A single shell command extracted from a model reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// Command text passed to `sh -c`.
    pub command: String,
    /// Directory the command runs from.
    pub working_directory: PathBuf,
    /// Exact fenced substring the model produced, kept for transcript
    /// fidelity even though only `command`/`working_directory` drive
    /// execution.
    pub raw_span: String,
}

// ---------------------------------------------------------------------------
// Execution results
// ---------------------------------------------------------------------------

/// Captured output of one executed command. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    /// True when either stream was cut at the capture ceiling.
    pub truncated: bool,
}

// ---------------------------------------------------------------------------
// Run outcomes
// ---------------------------------------------------------------------------

/// Terminal state of one agent run.
///
/// The serialized label doubles as the human-readable `exit_status` tag in
/// the trajectory record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExitStatus {
    /// The model emitted the sentinel and submitted a final result.
    Submitted,
    /// The turn budget ran out before the model submitted.
    Exhausted,
    /// The operator aborted the run.
    Cancelled,
    /// The model query failed; nothing was retried.
    ModelError,
    /// The execution environment could not attempt a command.
    EnvironmentError,
}

impl ExitStatus {
    /// Stable status label used in trajectory records and CLI output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::Exhausted => "Exhausted",
            Self::Cancelled => "Cancelled",
            Self::ModelError => "ModelError",
            Self::EnvironmentError => "EnvironmentError",
        }
    }

    /// True for the one status that means the task converged.
    pub fn is_success(self) -> bool {
        matches!(self, Self::Submitted)
    }
}

/// Final `(status, result)` pair of a run, computed exactly once at loop
/// termination and immutable afterward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunOutcome {
    pub exit_status: ExitStatus,
    /// Submitted result text, last thought, or error message depending on
    /// how the loop ended. Never silently empty for error paths.
    pub result: String,
    /// Optional structured context, e.g. a captured failure trace.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_info: Option<serde_json::Value>,
}
