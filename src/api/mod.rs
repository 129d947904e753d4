//! Model query port for OpenAI-compatible APIs.
//!
//! The port is the loop's only view of the provider: conversation in, one
//! text reply out, plus running call/cost telemetry owned by the port
//! itself. Tests substitute deterministic implementations; production uses
//! [`client::ApiClient`].

use crate::error::ModelError;
use crate::types::{Message, Role};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod client;

pub use client::ApiClient;

/// One model reply plus optional provider-reported token usage.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse {
    /// Assistant reply text.
    pub content: String,
    /// Token usage when the provider reports it; drives cost telemetry.
    pub usage: Option<Usage>,
}

/// Token usage for a single exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// Snapshot of the port's running telemetry counters.
///
/// Counters are monotonically non-decreasing for the lifetime of the port
/// and are read (never reset) by the trajectory recorder at exit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Telemetry {
    /// Completed remote exchanges, charged even when the body later fails
    /// validation.
    pub calls_made: u64,
    /// Accumulated request cost in account currency units.
    pub accumulated_cost: f64,
    /// Model id used for request routing.
    pub model_identifier: String,
}

/// Minimal model interface used by the agent loop.
///
/// Implementations own their telemetry counters behind `&self`; the loop
/// only ever reads snapshots. No retry happens at this boundary — a failed
/// query surfaces immediately as [`ModelError`].
#[async_trait]
pub trait ModelPort: Send + Sync {
    /// Send the full conversation and return the assistant reply.
    ///
    /// `conversation` must be non-empty and end with a non-assistant
    /// message: the loop must not ask the model to respond to itself.
    async fn query(&self, conversation: &[Message]) -> Result<QueryResponse, ModelError>;

    /// Current telemetry snapshot.
    fn telemetry(&self) -> Telemetry;
}

/// Check the port input contract shared by all implementations.
pub fn validate_conversation(conversation: &[Message]) -> Result<(), ModelError> {
    let Some(last) = conversation.last() else {
        return Err(ModelError::InvalidConversation(
            "conversation is empty".to_string(),
        ));
    };
    if last.role == Role::Assistant {
        return Err(ModelError::InvalidConversation(
            "conversation ends with an assistant message".to_string(),
        ));
    }
    Ok(())
}
