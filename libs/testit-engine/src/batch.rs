//! Batch executor: drives workspace + language adapter + supervisor once per
//! test case, strictly sequentially, and never lets an internal failure
//! escape as anything but a structured result.

use anyhow::Result;
use chrono::Utc;
use testit_common::types::{Language, TestCase, TestCaseResult, TestStatus};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::evaluator;
use crate::job::{Job, JobState};
use crate::language;
use crate::supervisor::{self, RunOutput, MAX_SOURCE_CODE_BYTES};
use crate::workspace::Workspace;

/// Run every test case against `code`, one isolated Job per pair.
///
/// Results preserve input order. A compile error, runtime error, or timeout
/// in one case never aborts the remaining cases, and the caller always gets
/// a complete array.
pub async fn run_all(
    config: &EngineConfig,
    code: &str,
    language: Language,
    test_cases: &[TestCase],
) -> Vec<TestCaseResult> {
    info!(
        language = %language,
        test_cases = test_cases.len(),
        timeout_ms = config.batch_timeout_ms,
        "starting batch execution"
    );

    if code.len() > MAX_SOURCE_CODE_BYTES {
        warn!(source_size = code.len(), "source exceeds size limit, rejecting batch");
        return test_cases
            .iter()
            .map(|case| {
                error_result(
                    case,
                    &format!(
                        "source code exceeds maximum size of {} bytes",
                        MAX_SOURCE_CODE_BYTES
                    ),
                )
            })
            .collect();
    }

    let mut results = Vec::with_capacity(test_cases.len());
    for (idx, case) in test_cases.iter().enumerate() {
        let result = match run_case(config, code, language, case).await {
            Ok(result) => result,
            Err(e) => {
                warn!(test_index = idx, error = %e, "test case failed before execution");
                error_result(case, &format!("{:#}", e))
            }
        };
        results.push(result);
    }

    info!(test_cases = results.len(), "batch execution finished");
    results
}

/// One Job: acquire workspace, write source, compile/run, evaluate, release.
/// The workspace is released on every path out of this function, including
/// the error ones (Drop covers early returns).
async fn run_case(
    config: &EngineConfig,
    code: &str,
    language: Language,
    case: &TestCase,
) -> Result<TestCaseResult> {
    let mut job = Job::new(language);
    let plan = language::resolve(language, code);

    let workspace = Workspace::acquire(&config.scratch_root, job.id).await?;
    workspace.write_source(&plan.entry_filename, code).await?;

    job.advance(if plan.compile.is_some() {
        JobState::Compiling
    } else {
        JobState::Running
    });

    let output = match supervisor::execute(
        &plan,
        workspace.dir(),
        Some(&case.input),
        config.batch_timeout_ms,
    )
    .await
    {
        Ok(output) => output,
        Err(e) => {
            workspace.release().await;
            return Err(e);
        }
    };

    job.advance(terminal_state(&output));
    workspace.release().await;

    Ok(evaluator::evaluate(&output, case, config.batch_timeout_ms))
}

fn terminal_state(output: &RunOutput) -> JobState {
    if output.compile_failed {
        JobState::CompileFailed
    } else if output.timed_out {
        JobState::TimedOut
    } else if output.runtime_error() {
        JobState::RuntimeError
    } else {
        JobState::Completed
    }
}

fn error_result(case: &TestCase, message: &str) -> TestCaseResult {
    TestCaseResult {
        test_case_id: case.id.clone(),
        input: case.input.clone(),
        expected_output: case.expected_output.clone(),
        actual_output: String::new(),
        status: TestStatus::Error,
        execution_time: 0,
        error_message: message.to_string(),
        executed_at: Utc::now(),
    }
}
