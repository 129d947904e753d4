//! Command execution port.
//!
//! The port runs one shell command in a working directory and returns the
//! captured output. A non-zero exit code is ordinary data, never a port
//! failure; the port only errors when execution cannot be attempted at all.

use crate::error::EnvironmentError;
use crate::types::ExecutionResult;
use async_trait::async_trait;
use std::path::Path;

pub mod local;

pub use local::LocalEnvironment;

/// Minimal execution interface used by the agent loop.
///
/// Implementations are stateless with respect to the loop: each execution
/// is independent and no state is carried across calls.
#[async_trait]
pub trait EnvironmentPort: Send + Sync {
    /// Run one shell command from `working_directory`.
    async fn execute(
        &self,
        command: &str,
        working_directory: &Path,
    ) -> Result<ExecutionResult, EnvironmentError>;
}
