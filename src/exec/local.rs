//! Local subprocess execution backend.
//!
//! Runs commands via `sh -c` and captures stdout/stderr with a byte ceiling
//! per stream, so a runaway command cannot flood the conversation.

use crate::error::EnvironmentError;
use crate::textutil::safe_prefix_by_bytes;
use crate::types::ExecutionResult;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::EnvironmentPort;

/// Executes commands on the local host.
pub struct LocalEnvironment {
    /// Byte ceiling per captured output stream.
    output_limit_bytes: usize,
}

impl LocalEnvironment {
    pub fn new(output_limit_bytes: usize) -> Self {
        Self { output_limit_bytes }
    }
}

#[async_trait]
impl EnvironmentPort for LocalEnvironment {
    async fn execute(
        &self,
        command: &str,
        working_directory: &Path,
    ) -> Result<ExecutionResult, EnvironmentError> {
        if !working_directory.is_dir() {
            return Err(EnvironmentError::MissingWorkingDirectory(
                working_directory.to_path_buf(),
            ));
        }

        let mut cmd = Command::new("sh");
        // Cancellation drops in-flight futures; ensure child processes are
        // terminated when their owning future is dropped.
        cmd.kill_on_drop(true);
        cmd.arg("-c")
            .arg(command)
            .current_dir(working_directory)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = cmd.output().await.map_err(EnvironmentError::Spawn)?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let truncated = stdout.len() > self.output_limit_bytes
            || stderr.len() > self.output_limit_bytes;

        Ok(ExecutionResult {
            stdout: capped(&stdout, self.output_limit_bytes),
            stderr: capped(&stderr, self.output_limit_bytes),
            exit_code: output.status.code().unwrap_or(-1),
            truncated,
        })
    }
}

fn capped(text: &str, limit: usize) -> String {
    safe_prefix_by_bytes(text, limit).to_string()
}
