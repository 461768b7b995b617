//! Verdict comparison for batch runs.
//!
//! Knows nothing about processes or workspaces: raw execution output in,
//! caller-facing result out.
//!
//! Normalization is whitespace trim at the two ends of the whole string,
//! nothing smarter. Internal whitespace, empty lines, and case all count.

use chrono::Utc;
use testit_common::types::{TestCase, TestCaseResult, TestStatus};

use crate::supervisor::RunOutput;

fn normalize_output(output: &str) -> &str {
    output.trim()
}

/// Map one raw execution outcome against its test case.
///
/// Fault precedence: compile failure, then timeout, then runtime error;
/// output comparison only applies to a clean exit.
pub fn evaluate(output: &RunOutput, case: &TestCase, timeout_ms: u64) -> TestCaseResult {
    let (status, error_message) = if output.compile_failed {
        (
            TestStatus::Error,
            format!("Compilation Error:\n{}", output.stderr),
        )
    } else if output.timed_out {
        (
            TestStatus::TimedOut,
            format!("Time Limit Exceeded ({}s)", timeout_ms / 1000),
        )
    } else if output.runtime_error() {
        let message = match output.exit_code {
            Some(code) => format!("Runtime Error (Exit Code {}):\n{}", code, output.stderr),
            None => format!("Runtime Error (killed by signal):\n{}", output.stderr),
        };
        (TestStatus::Error, message)
    } else if normalize_output(&output.stdout) == normalize_output(&case.expected_output) {
        (TestStatus::Passed, String::new())
    } else {
        (TestStatus::Failed, String::new())
    };

    TestCaseResult {
        test_case_id: case.id.clone(),
        input: case.input.clone(),
        expected_output: case.expected_output.clone(),
        actual_output: output.stdout.clone(),
        status,
        execution_time: output.execution_time_ms,
        error_message,
        executed_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_case(expected: &str) -> TestCase {
        TestCase {
            id: None,
            input: "input".to_string(),
            expected_output: expected.to_string(),
        }
    }

    fn make_output(stdout: &str, exec_time: u64) -> RunOutput {
        RunOutput {
            stdout: stdout.to_string(),
            exit_code: Some(0),
            execution_time_ms: exec_time,
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_output() {
        assert_eq!(normalize_output("hello"), "hello");
        assert_eq!(normalize_output("  hello  "), "hello");
        assert_eq!(normalize_output("hello\n"), "hello");
        assert_eq!(normalize_output("   "), "");
        // Only the ends of the whole string are trimmed.
        assert_eq!(normalize_output(" a \n b \n"), "a \n b");
    }

    #[test]
    fn test_exact_match_passes() {
        let result = evaluate(&make_output("120", 42), &make_case("120"), 3000);
        assert_eq!(result.status, TestStatus::Passed);
        assert_eq!(result.execution_time, 42);
        assert!(result.error_message.is_empty());
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        let result = evaluate(&make_output("  hello  \n", 5), &make_case("hello"), 3000);
        assert_eq!(result.status, TestStatus::Passed);
    }

    #[test]
    fn test_mismatch_fails_without_error() {
        let result = evaluate(&make_output("actual", 5), &make_case("expected"), 3000);
        assert_eq!(result.status, TestStatus::Failed);
        assert_eq!(result.actual_output, "actual");
        assert!(result.error_message.is_empty());
    }

    #[test]
    fn test_case_sensitivity_preserved() {
        let result = evaluate(&make_output("hello", 5), &make_case("Hello"), 3000);
        assert_eq!(result.status, TestStatus::Failed);
    }

    #[test]
    fn test_internal_whitespace_preserved() {
        let result = evaluate(
            &make_output("a  b", 5),
            &make_case("a b"),
            3000,
        );
        assert_eq!(result.status, TestStatus::Failed);
    }

    #[test]
    fn test_empty_expected_matches_whitespace_output() {
        let result = evaluate(&make_output("   \n", 5), &make_case(""), 3000);
        assert_eq!(result.status, TestStatus::Passed);
    }

    #[test]
    fn test_nonempty_output_against_empty_expected_fails() {
        // Whitespace-only input, empty expected, program produced real
        // output: a plain mismatch, not an error.
        let case = TestCase {
            id: None,
            input: " ".to_string(),
            expected_output: String::new(),
        };
        let result = evaluate(&make_output("something\n", 8), &case, 3000);
        assert_eq!(result.status, TestStatus::Failed);
        assert_eq!(result.actual_output, "something\n");
        assert!(result.error_message.is_empty());
    }

    #[test]
    fn test_runtime_error_surfaces_exit_code_and_stderr() {
        let output = RunOutput {
            stdout: "partial".to_string(),
            stderr: "Exception in thread main".to_string(),
            exit_code: Some(1),
            execution_time_ms: 17,
            ..Default::default()
        };
        let result = evaluate(&output, &make_case("partial"), 3000);
        assert_eq!(result.status, TestStatus::Error);
        assert!(result.error_message.contains("Exit Code 1"));
        assert!(result.error_message.contains("Exception in thread main"));
    }

    #[test]
    fn test_compile_error_has_zero_execution_time() {
        let output = RunOutput {
            stderr: "error: cannot find symbol".to_string(),
            compile_failed: true,
            ..Default::default()
        };
        let result = evaluate(&output, &make_case("Hello World"), 3000);
        assert_eq!(result.status, TestStatus::Error);
        assert_eq!(result.execution_time, 0);
        assert!(result.error_message.starts_with("Compilation Error:"));
        assert!(result.error_message.contains("cannot find symbol"));
    }

    #[test]
    fn test_timeout_maps_to_timed_out() {
        let output = RunOutput {
            stdout: "partial".to_string(),
            execution_time_ms: 3004,
            timed_out: true,
            ..Default::default()
        };
        let result = evaluate(&output, &make_case("whatever"), 3000);
        assert_eq!(result.status, TestStatus::TimedOut);
        assert_eq!(result.error_message, "Time Limit Exceeded (3s)");
        assert_eq!(result.actual_output, "partial");
        assert!(result.execution_time >= 3000);
    }

    #[test]
    fn test_case_id_passes_through() {
        let case = TestCase {
            id: Some("tc-42".to_string()),
            input: String::new(),
            expected_output: "x".to_string(),
        };
        let result = evaluate(&make_output("x", 1), &case, 3000);
        assert_eq!(result.test_case_id.as_deref(), Some("tc-42"));
    }
}
