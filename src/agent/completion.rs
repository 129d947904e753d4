//! Submission detection via a fixed sentinel token.
//!
//! The model is instructed to finish a task by running a command whose
//! stdout starts with the sentinel; everything after the token is the
//! submitted result. The token is deliberately narrow and non-configurable
//! so completion is never ambiguous.

use crate::types::ExecutionResult;

/// Literal token that signals task completion and result submission.
pub const SUBMIT_SENTINEL: &str = "COMPLETE_TASK_AND_SUBMIT_FINAL_OUTPUT";

/// True iff the sentinel appears verbatim in the command's stdout.
pub fn is_complete(result: &ExecutionResult) -> bool {
    result.stdout.contains(SUBMIT_SENTINEL)
}

/// Extract the submitted result: everything after the first sentinel
/// occurrence, with the token's own trailing newline stripped. Output before
/// the token is discarded here but survives in the transcript.
pub fn final_result(stdout: &str) -> String {
    match stdout.find(SUBMIT_SENTINEL) {
        Some(idx) => {
            let after = &stdout[idx + SUBMIT_SENTINEL.len()..];
            after.strip_prefix('\n').unwrap_or(after).to_string()
        }
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with_stdout(stdout: &str) -> ExecutionResult {
        ExecutionResult {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: 0,
            truncated: false,
        }
    }

    // Verifies sentinel-first output submits the remaining stdout.
    #[test]
    fn sentinel_first_line_submits_rest() {
        let stdout = format!("{SUBMIT_SENTINEL}\nhello world\n");
        assert!(is_complete(&result_with_stdout(&stdout)));
        assert_eq!(final_result(&stdout), "hello world\n");
    }

    #[test]
    fn output_without_sentinel_is_not_complete() {
        let result = result_with_stdout("hello\n");
        assert!(!is_complete(&result));
        assert_eq!(final_result(&result.stdout), "");
    }

    // Verifies output before the token is dropped from the result.
    #[test]
    fn text_before_sentinel_is_discarded() {
        let stdout = format!("build ok\n{SUBMIT_SENTINEL}\ndone\n");
        assert!(is_complete(&result_with_stdout(&stdout)));
        assert_eq!(final_result(&stdout), "done\n");
    }

    #[test]
    fn only_first_occurrence_splits_the_result() {
        let stdout = format!("{SUBMIT_SENTINEL}\nfirst\n{SUBMIT_SENTINEL}\nsecond\n");
        assert_eq!(
            final_result(&stdout),
            format!("first\n{SUBMIT_SENTINEL}\nsecond\n")
        );
    }

    #[test]
    fn sentinel_with_no_trailing_output_submits_empty_result() {
        let stdout = format!("{SUBMIT_SENTINEL}\n");
        assert!(is_complete(&result_with_stdout(&stdout)));
        assert_eq!(final_result(&stdout), "");
    }

    #[test]
    fn sentinel_in_stderr_does_not_complete() {
        let result = ExecutionResult {
            stdout: String::new(),
            stderr: format!("{SUBMIT_SENTINEL}\n"),
            exit_code: 0,
            truncated: false,
        };
        assert!(!is_complete(&result));
    }
}
