use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Languages the execution engine accepts.
///
/// This is a closed set: adding a language means adding a variant here and a
/// command plan in the engine's language adapter, never another string branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Java,
    Python,
    Javascript,
    Cpp,
}

impl Language {
    pub fn from_str(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "java" => Some(Language::Java),
            "python" => Some(Language::Python),
            "javascript" => Some(Language::Javascript),
            "cpp" => Some(Language::Cpp),
            _ => None,
        }
    }

    pub fn all() -> &'static [Language] {
        &[
            Language::Java,
            Language::Python,
            Language::Javascript,
            Language::Cpp,
        ]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::Java => "java",
            Language::Python => "python",
            Language::Javascript => "javascript",
            Language::Cpp => "cpp",
        };
        write!(f, "{}", name)
    }
}

/// One input/expected-output pair of a batch execution request.
///
/// `id` is the caller's identifier for the linked test-case entity; it is
/// passed through to the matching result untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub input: String,
    pub expected_output: String,
}

/// Verdict for one test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestStatus {
    Passed,
    Failed,
    Error,
    TimedOut,
}

/// Outcome of one Job, as returned to the batch caller.
///
/// Produced once when the Job reaches a terminal state and immutable after
/// that; the engine retains no copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_case_id: Option<String>,
    pub input: String,
    pub expected_output: String,
    pub actual_output: String,
    pub status: TestStatus,
    /// Wall-clock milliseconds from run-process spawn to settlement.
    pub execution_time: u64,
    pub error_message: String,
    pub executed_at: DateTime<Utc>,
}

/// Outcome of the opaque browser-automation call.
///
/// The black-box UI test runner is an external collaborator: the CRUD layer
/// invokes it and persists this outcome. The execution engine never touches
/// it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlackBoxOutcome {
    pub status: String,
    pub actual_result: String,
    pub execution_time_ms: u64,
}
