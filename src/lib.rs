//! Nanoagent — a single-command agentic loop for OpenAI-compatible APIs.
//!
//! This crate turns a free-text task into a bounded sequence of model
//! queries and shell commands: the model replies with one fenced `bash`
//! block per turn, the command runs in a local environment after operator
//! confirmation, and its output is fed back as an observation. A fixed
//! sentinel token in a command's stdout signals completion. Every run ends
//! with a persisted trajectory record, regardless of how it terminated.
//!
//! # Quick start
//!
//! ```no_run
//! use nanoagent::agent::{run_task, Agent};
//! use nanoagent::config::load_config;
//! use nanoagent::trajectory::TrajectoryRecorder;
//!
//! # async fn example() {
//! let config = load_config(None).unwrap();
//! let recorder = TrajectoryRecorder::open_default().unwrap();
//! let mut agent = Agent::new(config);
//! let outcome = run_task(&mut agent, "print hello", &recorder).await;
//! println!("{}: {}", outcome.exit_status.as_str(), outcome.result);
//! # }
//! ```

pub mod agent;
pub mod api;
pub mod build_info;
pub mod config;
pub mod error;
pub mod exec;
pub mod prompt;
pub mod render;
#[cfg(test)]
pub mod testsupport;
pub mod textutil;
pub mod trajectory;
pub mod types;
