//! Core agent control loop.
//!
//! The [`Agent`] drives one task to a terminal state: it queries the model,
//! extracts a single shell action from the reply, asks the operator for
//! confirmation, executes the action, and feeds the observed output back as
//! the next message. A sentinel token in a command's stdout ends the loop
//! with a submitted result; a turn budget bounds the number of queries.
//!
//! Terminal states map onto [`ExitStatus`]: `Submitted`, `Exhausted`, and
//! `Cancelled` return as ordinary outcomes, while model/environment port
//! failures escalate as [`AgentError`] and are converted into outcomes by
//! [`run_task`], which also persists the trajectory on every exit path.

use crate::api::{ApiClient, ModelPort, QueryResponse, Telemetry};
use crate::config::Config;
use crate::error::AgentError;
use crate::exec::{EnvironmentPort, LocalEnvironment};
use crate::prompt::{render_system_prompt, SystemPromptParams};
use crate::trajectory::{TrajectoryRecord, TrajectoryRecorder};
use crate::types::{ExecutionResult, ExitStatus, Message, RunOutcome};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;

mod completion;
mod confirm;
mod extractor;

pub use completion::{final_result, is_complete, SUBMIT_SENTINEL};
pub use confirm::{ConfirmBroker, ConfirmRequest, ConfirmationGate, Decision};
pub use extractor::{extract, Extraction};

/// Result text used when a run is cancelled before any thought was observed.
const CANCELLED_BY_USER_RESULT: &str = "operation cancelled by user";

/// The core agent that owns one run's conversation and drives the ports.
///
/// Each run must use its own `Agent` value; conversation state is never
/// shared across runs.
pub struct Agent {
    /// Model port implementation (HTTP client in prod, scripted in tests).
    model: Box<dyn ModelPort>,
    /// Execution environment for extracted commands.
    env: Box<dyn EnvironmentPort>,
    /// Approval step in front of every execution.
    gate: ConfirmationGate,
    /// Effective runtime settings.
    config: Config,
    /// Default working directory for extracted commands.
    project_root: PathBuf,
    /// Full conversation history sent on each request. Append-only.
    messages: Vec<Message>,
    /// Optional cancellation signal for the in-flight run.
    cancellation_rx: Option<watch::Receiver<bool>>,
}

impl Agent {
    /// Create an agent from configuration with production ports.
    pub fn new(config: Config) -> Self {
        let model = Box::new(ApiClient::new(
            &config.model,
            Duration::from_secs(config.limits.api_timeout_secs),
        ));
        let env = Box::new(LocalEnvironment::new(config.limits.output_limit_bytes));
        let gate = if config.agent.auto_accept {
            ConfirmationGate::auto_accept()
        } else {
            ConfirmationGate::interactive(config.display.color)
        };
        Self::with_ports(config, model, env, gate)
    }

    /// Create an agent with explicit port implementations.
    ///
    /// Used for deterministic testing and alternative backends.
    pub fn with_ports(
        config: Config,
        model: Box<dyn ModelPort>,
        env: Box<dyn EnvironmentPort>,
        gate: ConfirmationGate,
    ) -> Self {
        let project_root = config
            .agent
            .project_root
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        Self {
            model,
            env,
            gate,
            config,
            project_root,
            messages: Vec::new(),
            cancellation_rx: None,
        }
    }

    /// Register a cancellation signal for the next run.
    pub fn set_cancellation_receiver(&mut self, rx: Option<watch::Receiver<bool>>) {
        self.cancellation_rx = rx;
    }

    /// Return true when the run has been cancelled out-of-band.
    fn cancellation_requested(&self) -> bool {
        self.cancellation_rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Access the conversation message history.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Current telemetry snapshot from the model port.
    pub fn telemetry(&self) -> Telemetry {
        self.model.telemetry()
    }

    /// Run one task to a terminal state.
    ///
    /// Returns `Ok` for `Submitted`/`Exhausted`/`Cancelled` outcomes and
    /// `Err` when a port failure ends the run; in both cases the
    /// conversation so far remains readable via [`Agent::messages`].
    pub async fn run(&mut self, task: &str) -> Result<RunOutcome, AgentError> {
        self.messages = vec![
            Message::system(render_system_prompt(SystemPromptParams {
                project_root: &self.project_root.display().to_string(),
                instructions: Some(&self.config.agent.instructions),
            })),
            Message::user(task),
        ];

        let mut turns = 0usize;
        let mut last_thought = String::new();

        loop {
            turns += 1;
            if turns > self.config.agent.max_turns {
                tracing::debug!(turns = turns - 1, "turn budget exhausted");
                return Ok(RunOutcome {
                    exit_status: ExitStatus::Exhausted,
                    result: last_thought,
                    extra_info: None,
                });
            }

            tracing::debug!(turn = turns, messages = self.messages.len(), "querying model");
            let reply = match self.query_model().await {
                Ok(QueryOutcome::Reply(reply)) => reply,
                Ok(QueryOutcome::Cancelled) => {
                    tracing::info!("run cancelled while awaiting the model");
                    return Ok(cancelled_outcome(&last_thought));
                }
                // Terminal: nothing further is appended and nothing retried.
                Err(err) => return Err(err.into()),
            };
            self.messages.push(Message::assistant(&reply.content));

            let extraction = extractor::extract(&reply.content, &self.project_root);
            last_thought = extraction.thought.clone();

            let Some(action) = extraction.action else {
                // A reply without an action is never a valid completion;
                // correct the model and keep going.
                tracing::debug!("reply contained no command block");
                self.messages.push(Message::observation(no_action_observation()));
                continue;
            };

            match self.gate.confirm(&action).await {
                Decision::Interrupt => {
                    tracing::info!("run interrupted at confirmation");
                    return Ok(cancelled_outcome(&last_thought));
                }
                Decision::Decline { reason } => {
                    tracing::debug!(command = %action.command, "command declined");
                    self.messages
                        .push(Message::observation(decline_observation(reason.as_deref())));
                    continue;
                }
                Decision::Accept => {}
            }

            tracing::debug!(command = %action.command, cwd = %action.working_directory.display(), "executing command");
            let result = self
                .env
                .execute(&action.command, &action.working_directory)
                .await?;

            if completion::is_complete(&result) {
                tracing::debug!(turns, "sentinel observed; submitting");
                return Ok(RunOutcome {
                    exit_status: ExitStatus::Submitted,
                    result: completion::final_result(&result.stdout),
                    extra_info: None,
                });
            }

            self.messages.push(Message::observation(observation_text(
                &result,
                extraction.ignored_blocks,
            )));

            // Out-of-band cancellation is honored only after the in-flight
            // command has finished, so no orphaned process is left behind.
            if self.cancellation_requested() {
                tracing::info!("run cancelled after command completion");
                return Ok(cancelled_outcome(&last_thought));
            }
        }
    }

    /// Query the model, racing the call against the cancellation signal.
    async fn query_model(&self) -> Result<QueryOutcome, crate::error::ModelError> {
        if self.cancellation_requested() {
            return Ok(QueryOutcome::Cancelled);
        }
        if let Some(cancel_rx) = &self.cancellation_rx {
            let mut cancel_rx = cancel_rx.clone();
            tokio::select! {
                // Cancellation wins immediately; the provider call is dropped.
                _ = wait_for_cancellation(&mut cancel_rx) => Ok(QueryOutcome::Cancelled),
                reply = self.model.query(&self.messages) => reply.map(QueryOutcome::Reply),
            }
        } else {
            self.model
                .query(&self.messages)
                .await
                .map(QueryOutcome::Reply)
        }
    }
}

enum QueryOutcome {
    Reply(QueryResponse),
    Cancelled,
}

/// Wait for cancellation signal state change (or return immediately if set).
async fn wait_for_cancellation(cancel_rx: &mut watch::Receiver<bool>) {
    if *cancel_rx.borrow() {
        return;
    }
    let _ = cancel_rx.changed().await;
}

/// Run one task and persist its trajectory on every exit path.
///
/// Port failures are converted into outcomes carrying the error kind as
/// status label and the error text as result, so the caller always receives
/// a human-readable `(status, result)` pair and one trajectory record is
/// written no matter how the loop ended.
pub async fn run_task(agent: &mut Agent, task: &str, recorder: &TrajectoryRecorder) -> RunOutcome {
    let outcome = match agent.run(task).await {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::error!(error = %err, "run ended with a port failure");
            RunOutcome {
                exit_status: err.exit_status(),
                result: err.to_string(),
                extra_info: Some(serde_json::json!({ "error": format!("{err:?}") })),
            }
        }
    };

    let record = TrajectoryRecord::new(task, agent.messages().to_vec(), agent.telemetry(), &outcome);
    match recorder.persist(&record) {
        Ok(path) => tracing::debug!(path = %path.display(), "trajectory written"),
        Err(e) => tracing::warn!(error = %e, "failed to write trajectory"),
    }
    outcome
}

fn cancelled_outcome(last_thought: &str) -> RunOutcome {
    let result = if last_thought.trim().is_empty() {
        CANCELLED_BY_USER_RESULT.to_string()
    } else {
        last_thought.to_string()
    };
    RunOutcome {
        exit_status: ExitStatus::Cancelled,
        result,
        extra_info: None,
    }
}

/// Corrective note appended when a reply carries no command block.
fn no_action_observation() -> String {
    format!(
        "No command found in your reply. Run exactly one command in a ```bash fenced block, \
         or finish by printing {SUBMIT_SENTINEL} as the first line of a command's output \
         followed by the final answer."
    )
}

/// Synthetic observation appended when the operator declines a command.
fn decline_observation(reason: Option<&str>) -> String {
    let base = "Command execution declined by the user. Propose a different approach.";
    match reason.map(str::trim).filter(|r| !r.is_empty()) {
        Some(reason) => format!("{base}\nOperator note: {reason}"),
        None => base.to_string(),
    }
}

/// Observation text for one executed command.
fn observation_text(result: &ExecutionResult, ignored_blocks: usize) -> String {
    let mut text = format!(
        "exit code: {}\nstdout:\n{}\nstderr:\n{}",
        result.exit_code, result.stdout, result.stderr
    );
    if result.truncated {
        text.push_str("\nwarning: output exceeded the capture limit and was truncated");
    }
    if ignored_blocks > 0 {
        text.push_str(&format!(
            "\nnote: {ignored_blocks} additional command block(s) were ignored; only the first was executed"
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EnvironmentError, ModelError};
    use crate::types::Role;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex as StdMutex;

    /// Scripted reply entry for the FIFO mock model.
    enum MockReply {
        Text(&'static str),
        Error,
    }

    /// FIFO mock model port for deterministic loop tests.
    struct MockModel {
        /// Queued replies returned in order.
        replies: StdMutex<VecDeque<MockReply>>,
        /// Completed exchanges, including scripted provider errors.
        calls: AtomicU64,
        /// Accumulated cost; a fixed amount per completed exchange.
        cost: StdMutex<f64>,
    }

    impl MockModel {
        fn new(replies: Vec<MockReply>) -> Self {
            Self {
                replies: StdMutex::new(replies.into()),
                calls: AtomicU64::new(0),
                cost: StdMutex::new(0.0),
            }
        }
    }

    #[async_trait]
    impl ModelPort for MockModel {
        async fn query(&self, conversation: &[Message]) -> Result<QueryResponse, ModelError> {
            crate::api::validate_conversation(conversation)?;
            self.calls.fetch_add(1, Ordering::Relaxed);
            *self.cost.lock().expect("cost lock") += 0.01;
            match self.replies.lock().expect("replies lock").pop_front() {
                Some(MockReply::Text(text)) => Ok(QueryResponse {
                    content: text.to_string(),
                    usage: None,
                }),
                Some(MockReply::Error) => Err(ModelError::Status(500, "provider down".into())),
                None => Err(ModelError::InvalidResponse("no scripted reply".into())),
            }
        }

        fn telemetry(&self) -> Telemetry {
            Telemetry {
                calls_made: self.calls.load(Ordering::Relaxed),
                accumulated_cost: *self.cost.lock().expect("cost lock"),
                model_identifier: "mock-model".to_string(),
            }
        }
    }

    /// Scripted environment entry.
    enum MockExecution {
        Result(ExecutionResult),
        Error,
    }

    /// FIFO mock environment port that records executed commands.
    struct MockEnv {
        executions: StdMutex<VecDeque<MockExecution>>,
        commands: StdMutex<Vec<String>>,
    }

    impl MockEnv {
        fn new(executions: Vec<MockExecution>) -> Self {
            Self {
                executions: StdMutex::new(executions.into()),
                commands: StdMutex::new(Vec::new()),
            }
        }

        fn commands(&self) -> Vec<String> {
            self.commands.lock().expect("commands lock").clone()
        }
    }

    #[async_trait]
    impl EnvironmentPort for MockEnv {
        async fn execute(
            &self,
            command: &str,
            _working_directory: &Path,
        ) -> Result<ExecutionResult, EnvironmentError> {
            self.commands
                .lock()
                .expect("commands lock")
                .push(command.to_string());
            match self.executions.lock().expect("executions lock").pop_front() {
                Some(MockExecution::Result(result)) => Ok(result),
                Some(MockExecution::Error) => Err(EnvironmentError::MissingWorkingDirectory(
                    PathBuf::from("/gone"),
                )),
                None => Ok(exec_result("", 0)),
            }
        }
    }

    fn exec_result(stdout: &str, exit_code: i32) -> ExecutionResult {
        ExecutionResult {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code,
            truncated: false,
        }
    }

    fn test_config(max_turns: usize) -> Config {
        let mut config = Config::default();
        config.agent.max_turns = max_turns;
        config.agent.project_root = Some(PathBuf::from("/project"));
        config
    }

    fn test_agent(
        max_turns: usize,
        model: MockModel,
        env: MockEnv,
        gate: ConfirmationGate,
    ) -> (Agent, std::sync::Arc<MockEnv>) {
        let env = std::sync::Arc::new(env);
        let agent = Agent::with_ports(
            test_config(max_turns),
            Box::new(model),
            Box::new(ArcEnv(env.clone())),
            gate,
        );
        (agent, env)
    }

    /// Boxable wrapper so tests can keep a handle to the mock environment.
    struct ArcEnv(std::sync::Arc<MockEnv>);

    #[async_trait]
    impl EnvironmentPort for ArcEnv {
        async fn execute(
            &self,
            command: &str,
            working_directory: &Path,
        ) -> Result<ExecutionResult, EnvironmentError> {
            self.0.execute(command, working_directory).await
        }
    }

    fn roles(messages: &[Message]) -> Vec<Role> {
        messages.iter().map(|m| m.role).collect()
    }

    // Verifies the end-to-end scenario: command, observation, submission.
    #[tokio::test]
    async fn end_to_end_submission() {
        let model = MockModel::new(vec![
            MockReply::Text("I'll print it.\n```bash\necho hello\n```"),
            MockReply::Text("Finishing.\n```bash\necho COMPLETE_TASK_AND_SUBMIT_FINAL_OUTPUT && echo done\n```"),
        ]);
        let env = MockEnv::new(vec![
            MockExecution::Result(exec_result("hello\n", 0)),
            MockExecution::Result(exec_result(
                "COMPLETE_TASK_AND_SUBMIT_FINAL_OUTPUT\ndone\n",
                0,
            )),
        ]);
        let (mut agent, env) = test_agent(10, model, env, ConfirmationGate::auto_accept());

        let outcome = agent.run("print hello").await.expect("run");
        assert_eq!(outcome.exit_status, ExitStatus::Submitted);
        assert_eq!(outcome.result, "done\n");
        assert_eq!(agent.telemetry().calls_made, 2);
        assert_eq!(env.commands().len(), 2);
        assert_eq!(
            roles(agent.messages()),
            vec![
                Role::System,
                Role::User,
                Role::Assistant,
                Role::Observation,
                Role::Assistant,
            ]
        );
    }

    // Verifies output without the sentinel leads to another model call.
    #[tokio::test]
    async fn no_sentinel_continues_the_loop() {
        let model = MockModel::new(vec![
            MockReply::Text("```bash\nls\n```"),
            MockReply::Text("```bash\necho COMPLETE_TASK_AND_SUBMIT_FINAL_OUTPUT\n```"),
        ]);
        let env = MockEnv::new(vec![
            MockExecution::Result(exec_result("file.txt\n", 0)),
            MockExecution::Result(exec_result("COMPLETE_TASK_AND_SUBMIT_FINAL_OUTPUT\n", 0)),
        ]);
        let (mut agent, _env) = test_agent(10, model, env, ConfirmationGate::auto_accept());

        let outcome = agent.run("list files").await.expect("run");
        assert_eq!(outcome.exit_status, ExitStatus::Submitted);
        assert_eq!(agent.telemetry().calls_made, 2);
    }

    // Verifies a reply without an action appends one corrective observation.
    #[tokio::test]
    async fn no_action_reply_is_corrected_not_terminal() {
        let model = MockModel::new(vec![
            MockReply::Text("The task is done, I believe."),
            MockReply::Text("```bash\necho COMPLETE_TASK_AND_SUBMIT_FINAL_OUTPUT && echo ok\n```"),
        ]);
        let env = MockEnv::new(vec![MockExecution::Result(exec_result(
            "COMPLETE_TASK_AND_SUBMIT_FINAL_OUTPUT\nok\n",
            0,
        ))]);
        let (mut agent, env) = test_agent(10, model, env, ConfirmationGate::auto_accept());

        let outcome = agent.run("finish up").await.expect("run");
        assert_eq!(outcome.exit_status, ExitStatus::Submitted);
        assert_eq!(env.commands().len(), 1);

        let corrective: Vec<&Message> = agent
            .messages()
            .iter()
            .filter(|m| m.role == Role::Observation)
            .collect();
        assert_eq!(corrective.len(), 1);
        assert!(corrective[0].content.contains("No command found"));
    }

    // Verifies a decline never terminates: one synthetic observation, then
    // the loop re-queries the model.
    #[tokio::test]
    async fn decline_does_not_terminate() {
        let model = MockModel::new(vec![
            MockReply::Text("```bash\nrm -rf build\n```"),
            MockReply::Text("```bash\necho COMPLETE_TASK_AND_SUBMIT_FINAL_OUTPUT && echo ok\n```"),
        ]);
        let env = MockEnv::new(vec![MockExecution::Result(exec_result(
            "COMPLETE_TASK_AND_SUBMIT_FINAL_OUTPUT\nok\n",
            0,
        ))]);

        let (broker, mut rx) = ConfirmBroker::channel();
        let (mut agent, env) = test_agent(10, model, env, ConfirmationGate::with_broker(broker));

        let responder = tokio::spawn(async move {
            let first = rx.recv().await.expect("first request");
            assert_eq!(first.command(), "rm -rf build");
            first.respond(Decision::Decline {
                reason: Some("too risky".to_string()),
            });
            let second = rx.recv().await.expect("second request");
            second.respond(Decision::Accept);
        });

        let outcome = agent.run("clean up").await.expect("run");
        responder.await.expect("responder");

        assert_eq!(outcome.exit_status, ExitStatus::Submitted);
        // The declined command never reached the environment.
        assert_eq!(env.commands().len(), 1);
        let declines: Vec<&Message> = agent
            .messages()
            .iter()
            .filter(|m| m.role == Role::Observation && m.content.contains("declined"))
            .collect();
        assert_eq!(declines.len(), 1);
        assert!(declines[0].content.contains("too risky"));
        assert_eq!(agent.telemetry().calls_made, 2);
    }

    // Verifies an interrupt at the gate is terminal and skips execution.
    #[tokio::test]
    async fn interrupt_cancels_the_run() {
        let model = MockModel::new(vec![MockReply::Text(
            "Removing it.\n```bash\nrm -rf /\n```",
        )]);
        let env = MockEnv::new(Vec::new());

        let (broker, mut rx) = ConfirmBroker::channel();
        let (mut agent, env) = test_agent(10, model, env, ConfirmationGate::with_broker(broker));

        let responder = tokio::spawn(async move {
            let request = rx.recv().await.expect("request");
            request.respond(Decision::Interrupt);
        });

        let outcome = agent.run("dangerous").await.expect("run");
        responder.await.expect("responder");

        assert_eq!(outcome.exit_status, ExitStatus::Cancelled);
        assert_eq!(outcome.result, "Removing it.");
        assert!(env.commands().is_empty());
    }

    // Verifies the turn budget scenario: max_turns = 1, no sentinel.
    #[tokio::test]
    async fn turn_budget_exhausts_after_one_cycle() {
        let model = MockModel::new(vec![MockReply::Text("Looking around.\n```bash\nls\n```")]);
        let env = MockEnv::new(vec![MockExecution::Result(exec_result("file.txt\n", 0))]);
        let (mut agent, _env) = test_agent(1, model, env, ConfirmationGate::auto_accept());

        let outcome = agent.run("look").await.expect("run");
        assert_eq!(outcome.exit_status, ExitStatus::Exhausted);
        assert_eq!(outcome.result, "Looking around.");
        assert_eq!(agent.telemetry().calls_made, 1);
    }

    // Verifies a model failure is terminal with nothing further appended.
    #[tokio::test]
    async fn model_error_is_terminal() {
        let model = MockModel::new(vec![MockReply::Error]);
        let env = MockEnv::new(Vec::new());
        let (mut agent, env) = test_agent(10, model, env, ConfirmationGate::auto_accept());

        let err = agent.run("anything").await.expect_err("must fail");
        assert_eq!(err.exit_status(), ExitStatus::ModelError);
        // Only the seed messages exist; no observation was appended.
        assert_eq!(roles(agent.messages()), vec![Role::System, Role::User]);
        assert!(env.commands().is_empty());
    }

    // Verifies an environment failure is terminal without further queries.
    #[tokio::test]
    async fn environment_error_is_terminal() {
        let model = MockModel::new(vec![
            MockReply::Text("```bash\necho hi\n```"),
            MockReply::Text("never reached"),
        ]);
        let env = MockEnv::new(vec![MockExecution::Error]);
        let (mut agent, _env) = test_agent(10, model, env, ConfirmationGate::auto_accept());

        let err = agent.run("anything").await.expect_err("must fail");
        assert_eq!(err.exit_status(), ExitStatus::EnvironmentError);
        assert_eq!(agent.telemetry().calls_made, 1);
    }

    // Verifies telemetry counts every completed query and cost never drops.
    #[tokio::test]
    async fn telemetry_is_monotonic_across_calls() {
        let model = MockModel::new(vec![
            MockReply::Text("```bash\ntrue\n```"),
            MockReply::Text("```bash\ntrue\n```"),
            MockReply::Text("```bash\necho COMPLETE_TASK_AND_SUBMIT_FINAL_OUTPUT\n```"),
        ]);
        let env = MockEnv::new(vec![
            MockExecution::Result(exec_result("", 0)),
            MockExecution::Result(exec_result("", 0)),
            MockExecution::Result(exec_result("COMPLETE_TASK_AND_SUBMIT_FINAL_OUTPUT\n", 0)),
        ]);
        let (mut agent, _env) = test_agent(10, model, env, ConfirmationGate::auto_accept());

        let before = agent.telemetry().accumulated_cost;
        agent.run("loop a bit").await.expect("run");
        let telemetry = agent.telemetry();
        assert_eq!(telemetry.calls_made, 3);
        assert!(telemetry.accumulated_cost >= before);
    }

    // Verifies a pre-set cancellation signal stops the run before any query.
    #[tokio::test]
    async fn preset_cancellation_prevents_port_calls() {
        let model = MockModel::new(vec![MockReply::Text("unused")]);
        let env = MockEnv::new(Vec::new());
        let (mut agent, env) = test_agent(10, model, env, ConfirmationGate::auto_accept());

        let (tx, rx) = watch::channel(true);
        agent.set_cancellation_receiver(Some(rx));
        let outcome = agent.run("anything").await.expect("run");
        drop(tx);

        assert_eq!(outcome.exit_status, ExitStatus::Cancelled);
        assert_eq!(outcome.result, CANCELLED_BY_USER_RESULT);
        assert_eq!(agent.telemetry().calls_made, 0);
        assert!(env.commands().is_empty());
    }

    /// Environment that signals cancellation while its command is running.
    struct CancellingEnv {
        cancel_tx: watch::Sender<bool>,
    }

    #[async_trait]
    impl EnvironmentPort for CancellingEnv {
        async fn execute(
            &self,
            _command: &str,
            _working_directory: &Path,
        ) -> Result<ExecutionResult, EnvironmentError> {
            // Cancellation arrives mid-execution; the result must still land.
            let _ = self.cancel_tx.send(true);
            Ok(exec_result("finished anyway\n", 0))
        }
    }

    // Verifies cancellation during an in-flight command is honored only
    // after the command has finished, with the observation still recorded.
    #[tokio::test]
    async fn cancellation_during_execution_waits_for_completion() {
        let model = MockModel::new(vec![MockReply::Text("Working.\n```bash\nsleep 0\n```")]);
        let (tx, rx) = watch::channel(false);
        let mut agent = Agent::with_ports(
            test_config(10),
            Box::new(model),
            Box::new(CancellingEnv { cancel_tx: tx }),
            ConfirmationGate::auto_accept(),
        );
        agent.set_cancellation_receiver(Some(rx));

        let outcome = agent.run("work").await.expect("run");

        assert_eq!(outcome.exit_status, ExitStatus::Cancelled);
        assert_eq!(outcome.result, "Working.");
        // The command's observation was appended before the cancel unwound.
        assert!(agent
            .messages()
            .iter()
            .any(|m| m.role == Role::Observation && m.content.contains("finished anyway")));
    }

    // Verifies ignored extra blocks surface as a note in the observation.
    #[tokio::test]
    async fn extra_blocks_are_noted_in_the_observation() {
        let model = MockModel::new(vec![MockReply::Text(
            "```bash\necho one\n```\nand\n```bash\necho two\n```",
        )]);
        let env = MockEnv::new(vec![MockExecution::Result(exec_result("one\n", 0))]);
        let (mut agent, env) = test_agent(1, model, env, ConfirmationGate::auto_accept());

        let outcome = agent.run("two blocks").await.expect("run");
        assert_eq!(outcome.exit_status, ExitStatus::Exhausted);
        assert_eq!(env.commands(), vec!["echo one".to_string()]);
        assert!(agent
            .messages()
            .iter()
            .any(|m| m.content.contains("1 additional command block")));
    }

    #[test]
    fn observation_text_includes_truncation_warning() {
        let result = ExecutionResult {
            stdout: "partial".into(),
            stderr: String::new(),
            exit_code: 0,
            truncated: true,
        };
        let text = observation_text(&result, 0);
        assert!(text.contains("exit code: 0"));
        assert!(text.contains("truncated"));
    }

    #[test]
    fn decline_observation_carries_operator_note() {
        let text = decline_observation(Some("not on prod"));
        assert!(text.contains("declined"));
        assert!(text.contains("not on prod"));
        assert!(!decline_observation(None).contains("Operator note"));
    }
}
