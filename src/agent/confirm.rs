//! Human-in-the-loop confirmation gate.
//!
//! Every extracted action passes through the gate before execution. The
//! operator can accept it, decline it (the loop continues with a synthetic
//! observation), or interrupt the whole run. Unattended runs disable the
//! gate with auto-accept.

use crate::render;
use crate::types::Action;
use tokio::sync::{mpsc, oneshot};

/// Operator verdict for one pending action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Execute the command as-is.
    Accept,
    /// Skip the command; the loop continues.
    Decline { reason: Option<String> },
    /// Abort the entire run.
    Interrupt,
}

/// Confirmation request emitted by the gate when a broker is attached.
#[derive(Debug)]
pub struct ConfirmRequest {
    command: String,
    working_directory: String,
    response: oneshot::Sender<Decision>,
}

impl ConfirmRequest {
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn working_directory(&self) -> &str {
        &self.working_directory
    }

    /// Resolve the request with the operator's decision.
    pub fn respond(self, decision: Decision) {
        let _ = self.response.send(decision);
    }
}

/// Sender side for confirmation requests.
///
/// Lets alternative frontends (and tests) answer confirmations without
/// owning the terminal.
#[derive(Clone, Debug)]
pub struct ConfirmBroker {
    tx: mpsc::UnboundedSender<ConfirmRequest>,
}

impl ConfirmBroker {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ConfirmRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    async fn request(&self, action: &Action) -> Decision {
        let (response_tx, response_rx) = oneshot::channel();
        let request = ConfirmRequest {
            command: action.command.clone(),
            working_directory: action.working_directory.display().to_string(),
            response: response_tx,
        };
        if self.tx.send(request).is_err() {
            // The approval UI is gone; treat the run as operator-aborted.
            return Decision::Interrupt;
        }
        response_rx.await.unwrap_or(Decision::Interrupt)
    }
}

/// Blocking approval step in front of the environment port.
pub struct ConfirmationGate {
    /// When set, every action is accepted without blocking.
    auto_accept: bool,
    /// Optional out-of-band approval channel used instead of stdin.
    broker: Option<ConfirmBroker>,
    /// Whether the stdin prompt uses color.
    color: bool,
}

impl ConfirmationGate {
    /// Interactive gate prompting on the terminal.
    pub fn interactive(color: bool) -> Self {
        Self {
            auto_accept: false,
            broker: None,
            color,
        }
    }

    /// Gate that accepts everything without blocking (unattended runs).
    pub fn auto_accept() -> Self {
        Self {
            auto_accept: true,
            broker: None,
            color: false,
        }
    }

    /// Gate answered through a broker channel instead of stdin.
    pub fn with_broker(broker: ConfirmBroker) -> Self {
        Self {
            auto_accept: false,
            broker: Some(broker),
            color: false,
        }
    }

    /// Present `action` to the operator and wait for a decision.
    pub async fn confirm(&self, action: &Action) -> Decision {
        if self.auto_accept {
            return Decision::Accept;
        }
        if let Some(broker) = &self.broker {
            return broker.request(action).await;
        }
        prompt_on_stdin(action, self.color)
    }
}

/// Terminal prompt fallback: enter/`y` accepts, other text declines with
/// that text as the reason, `q` or end-of-input interrupts.
fn prompt_on_stdin(action: &Action, color: bool) -> Decision {
    render::print_confirm_request(color, action);
    let mut input = String::new();
    match std::io::stdin().read_line(&mut input) {
        // Zero bytes means stdin is closed; there is no operator to ask.
        Ok(0) => Decision::Interrupt,
        Ok(_) => decision_from_input(&input),
        Err(e) => {
            tracing::warn!(error = %e, "confirmation prompt failed; aborting run");
            Decision::Interrupt
        }
    }
}

fn decision_from_input(input: &str) -> Decision {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("y") || trimmed.eq_ignore_ascii_case("yes")
    {
        return Decision::Accept;
    }
    if trimmed.eq_ignore_ascii_case("q") || trimmed.eq_ignore_ascii_case("quit") {
        return Decision::Interrupt;
    }
    Decision::Decline {
        reason: Some(trimmed.to_string()),
    }
}
