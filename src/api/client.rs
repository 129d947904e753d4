//! HTTP client for OpenAI-compatible `/chat/completions` endpoints.

use crate::config::ModelProfileConfig;
use crate::error::ModelError;
use crate::types::{Message, Role};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{validate_conversation, ModelPort, QueryResponse, Telemetry, Usage};

/// Client for OpenAI-compatible model APIs.
///
/// Owns the run's telemetry counters behind `&self`: each completed remote
/// exchange increments `calls_made` by exactly one, and provider-reported
/// usage adds a non-negative amount to `accumulated_cost`.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    prompt_price_per_mtok: f64,
    completion_price_per_mtok: f64,
    calls_made: AtomicU64,
    accumulated_cost: Mutex<f64>,
}

impl ApiClient {
    /// Build a client from resolved model profile configuration.
    pub fn new(profile: &ModelProfileConfig, timeout: Duration) -> Self {
        // Fall back to reqwest defaults if builder creation fails for any reason.
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            base_url: profile.base_url.trim_end_matches('/').to_string(),
            api_key: profile.api_key.trim().to_string(),
            model: profile.model.clone(),
            prompt_price_per_mtok: profile.prompt_price_per_mtok,
            completion_price_per_mtok: profile.completion_price_per_mtok,
            calls_made: AtomicU64::new(0),
            accumulated_cost: Mutex::new(0.0),
        }
    }

    fn record_cost(&self, usage: Usage) {
        let amount = exchange_cost(
            usage,
            self.prompt_price_per_mtok,
            self.completion_price_per_mtok,
        );
        if let Ok(mut cost) = self.accumulated_cost.lock() {
            *cost += amount;
        }
    }
}

#[async_trait]
impl ModelPort for ApiClient {
    async fn query(&self, conversation: &[Message]) -> Result<QueryResponse, ModelError> {
        validate_conversation(conversation)?;

        let request = WireRequest {
            model: &self.model,
            messages: conversation.iter().map(wire_message).collect(),
        };
        let url = format!("{}/chat/completions", self.base_url);
        let mut req = self.http.post(&url).json(&request);
        if !self.api_key.is_empty() {
            req = req.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let response = req.send().await?;
        // The exchange completed: the call is charged before any validation,
        // since providers bill regardless of what we make of the body.
        self.calls_made.fetch_add(1, Ordering::Relaxed);

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status(status, body));
        }

        let body: WireResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        let usage = body.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
        });
        if let Some(usage) = usage {
            self.record_cost(usage);
        }

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::InvalidResponse("response contained no choices".into()))?;
        let content = choice
            .message
            .content
            .ok_or_else(|| ModelError::InvalidResponse("assistant message had no content".into()))?;

        Ok(QueryResponse { content, usage })
    }

    fn telemetry(&self) -> Telemetry {
        Telemetry {
            calls_made: self.calls_made.load(Ordering::Relaxed),
            accumulated_cost: self
                .accumulated_cost
                .lock()
                .map(|cost| *cost)
                .unwrap_or(0.0),
            model_identifier: self.model.clone(),
        }
    }
}

/// Map a transcript role onto the provider wire role.
///
/// OpenAI-compatible providers have no observation role; observations are
/// replayed as user messages while the transcript keeps the distinct role.
fn wire_role(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User | Role::Observation => "user",
        Role::Assistant => "assistant",
    }
}

fn wire_message(message: &Message) -> WireMessage<'_> {
    WireMessage {
        role: wire_role(message.role),
        content: &message.content,
    }
}

/// Cost of one exchange given per-million-token prices.
fn exchange_cost(usage: Usage, prompt_price_per_mtok: f64, completion_price_per_mtok: f64) -> f64 {
    let prompt = usage.prompt_tokens as f64 * prompt_price_per_mtok / 1_000_000.0;
    let completion = usage.completion_tokens as f64 * completion_price_per_mtok / 1_000_000.0;
    (prompt + completion).max(0.0)
}

// ---------------------------------------------------------------------------
// Wire payloads
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireReplyMessage,
}

#[derive(Deserialize)]
struct WireReplyMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct WireUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}
