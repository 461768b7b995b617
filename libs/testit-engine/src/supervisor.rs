//! Process supervisor for batch runs.
//!
//! Runs the compile step synchronously if the plan has one, then spawns the
//! run command with piped stdio, writes the stdin blob and closes the pipe,
//! and races the child's natural exit against the wall-clock timeout. The
//! loser of the race is cancelled: on timeout the child is killed (idempotent
//! via `start_kill`) and partial output is still returned.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::language::CommandPlan;

/// Guardrails against pathological inputs reaching the OS.
pub const MAX_SOURCE_CODE_BYTES: usize = 1024 * 1024; // 1MB
pub const MAX_STDIN_BYTES: usize = 10 * 1024 * 1024; // 10MB

/// Raw outcome of one supervised execution. The evaluator turns this into a
/// caller-facing verdict; the supervisor itself never judges correctness.
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    /// Measured from just before the run-process spawn to settlement; zero
    /// when the run phase was never entered.
    pub execution_time_ms: u64,
    pub timed_out: bool,
    pub compile_failed: bool,
}

impl RunOutput {
    /// The run process settled with a non-zero exit (or died to a signal).
    pub fn runtime_error(&self) -> bool {
        !self.compile_failed && !self.timed_out && self.exit_code != Some(0)
    }
}

/// Execute a command plan inside `workdir`.
///
/// A non-zero compile exit is a terminal `compile_failed` outcome and the run
/// phase is never entered. IO failures (compiler missing, spawn refused)
/// surface as `Err`; callers convert them into structured error results
/// before they cross the engine boundary.
pub async fn execute(
    plan: &CommandPlan,
    workdir: &Path,
    stdin_data: Option<&str>,
    timeout_ms: u64,
) -> Result<RunOutput> {
    if let Some(input) = stdin_data {
        if input.len() > MAX_STDIN_BYTES {
            bail!("stdin exceeds maximum size of {} bytes", MAX_STDIN_BYTES);
        }
    }

    if let Some(compile_argv) = &plan.compile {
        let output = command(compile_argv, workdir)
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("failed to run compiler {}", compile_argv[0]))?;

        if !output.status.success() {
            let mut diagnostics = String::from_utf8_lossy(&output.stderr).into_owned();
            if diagnostics.is_empty() {
                diagnostics = String::from_utf8_lossy(&output.stdout).into_owned();
            }
            debug!(exit = ?output.status.code(), "compilation failed");
            return Ok(RunOutput {
                stderr: diagnostics,
                compile_failed: true,
                ..Default::default()
            });
        }
    }

    let started = Instant::now();
    let mut child = command(&plan.run, workdir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to spawn {}", plan.run[0]))?;

    // Batch mode: one fixed stdin blob, written up front and closed so the
    // child sees EOF instead of blocking on more input.
    let stdin_pipe = child.stdin.take();
    if let Some(mut pipe) = stdin_pipe {
        if let Some(data) = stdin_data {
            if let Err(e) = pipe.write_all(data.as_bytes()).await {
                warn!(error = %e, "failed to write stdin to child");
            }
        }
        let _ = pipe.shutdown().await;
    }

    let stdout_pipe = child.stdout.take().context("child stdout not piped")?;
    let stderr_pipe = child.stderr.take().context("child stderr not piped")?;
    let stdout_task = tokio::spawn(read_stream(stdout_pipe));
    let stderr_task = tokio::spawn(read_stream(stderr_pipe));

    let mut timed_out = false;
    let exit_status = match tokio::time::timeout(Duration::from_millis(timeout_ms), child.wait())
        .await
    {
        Ok(status) => Some(status.context("failed waiting on child process")?),
        Err(_) => {
            timed_out = true;
            if let Err(e) = child.start_kill() {
                debug!(error = %e, "kill after timeout failed, child likely exited");
            }
            let _ = child.wait().await;
            None
        }
    };

    // Readers finish at EOF, which the kill above forces; partial output is
    // preserved on the timeout path.
    let stdout = stdout_task.await.unwrap_or_default();
    let stderr = stderr_task.await.unwrap_or_default();
    let execution_time_ms = started.elapsed().as_millis() as u64;

    Ok(RunOutput {
        stdout,
        stderr,
        exit_code: exit_status.and_then(|s| s.code()),
        execution_time_ms,
        timed_out,
        compile_failed: false,
    })
}

fn command(argv: &[String], workdir: &Path) -> Command {
    let mut cmd = Command::new(&argv[0]);
    cmd.args(&argv[1..]).current_dir(workdir);
    cmd
}

async fn read_stream<R: AsyncRead + Unpin>(mut pipe: R) -> String {
    let mut buf = Vec::new();
    let _ = pipe.read_to_end(&mut buf).await;
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::Workspace;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    fn plan(compile: Option<&str>, run: &str) -> CommandPlan {
        CommandPlan {
            entry_filename: "Main.sh".to_string(),
            compile: compile.map(sh),
            run: sh(run),
        }
    }

    fn scratch_root() -> PathBuf {
        std::env::temp_dir().join(format!("testit-supervisor-tests-{}", Uuid::new_v4()))
    }

    async fn in_workspace() -> (PathBuf, Workspace) {
        let root = scratch_root();
        let workspace = Workspace::acquire(&root, Uuid::new_v4()).await.unwrap();
        (root, workspace)
    }

    #[tokio::test]
    async fn test_successful_run_collects_stdout() {
        let (root, workspace) = in_workspace().await;
        let output = execute(&plan(None, "echo hello"), workspace.dir(), None, 3000)
            .await
            .unwrap();
        assert_eq!(output.exit_code, Some(0));
        assert_eq!(output.stdout, "hello\n");
        assert!(!output.timed_out);
        assert!(!output.runtime_error());
        workspace.release().await;
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_stdin_is_written_then_closed() {
        let (root, workspace) = in_workspace().await;
        let output = execute(&plan(None, "cat"), workspace.dir(), Some("TestInput"), 3000)
            .await
            .unwrap();
        assert_eq!(output.stdout, "TestInput");
        assert_eq!(output.exit_code, Some(0));
        workspace.release().await;
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_runtime_error() {
        let (root, workspace) = in_workspace().await;
        let output = execute(
            &plan(None, "echo boom >&2; exit 3"),
            workspace.dir(),
            None,
            3000,
        )
        .await
        .unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert!(output.runtime_error());
        assert!(output.stderr.contains("boom"));
        workspace.release().await;
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_timeout_kills_and_reports_elapsed_time() {
        let (root, workspace) = in_workspace().await;
        let output = execute(&plan(None, "sleep 5"), workspace.dir(), None, 200)
            .await
            .unwrap();
        assert!(output.timed_out);
        assert!(output.execution_time_ms >= 200);
        assert_eq!(output.exit_code, None);
        workspace.release().await;
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_timeout_preserves_partial_output() {
        let (root, workspace) = in_workspace().await;
        let output = execute(
            &plan(None, "echo partial; sleep 5"),
            workspace.dir(),
            None,
            300,
        )
        .await
        .unwrap();
        assert!(output.timed_out);
        assert!(output.stdout.contains("partial"));
        workspace.release().await;
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_compile_failure_never_enters_run_phase() {
        let (root, workspace) = in_workspace().await;
        let output = execute(
            &plan(Some("echo nope >&2; exit 1"), "touch ran-marker"),
            workspace.dir(),
            None,
            3000,
        )
        .await
        .unwrap();
        assert!(output.compile_failed);
        assert!(output.stderr.contains("nope"));
        assert_eq!(output.execution_time_ms, 0);
        // The run command would have left a marker; its absence proves zero
        // run-process spawns.
        assert!(!workspace.dir().join("ran-marker").exists());
        workspace.release().await;
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_compile_success_then_run() {
        let (root, workspace) = in_workspace().await;
        let output = execute(
            &plan(Some("true"), "echo built"),
            workspace.dir(),
            None,
            3000,
        )
        .await
        .unwrap();
        assert!(!output.compile_failed);
        assert_eq!(output.stdout, "built\n");
        workspace.release().await;
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_missing_binary_surfaces_as_error() {
        let (root, workspace) = in_workspace().await;
        let missing = CommandPlan {
            entry_filename: "Main.sh".to_string(),
            compile: None,
            run: vec!["definitely-not-a-real-binary-xyz".to_string()],
        };
        assert!(execute(&missing, workspace.dir(), None, 3000).await.is_err());
        workspace.release().await;
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_oversized_stdin_rejected() {
        let (root, workspace) = in_workspace().await;
        let huge = "x".repeat(MAX_STDIN_BYTES + 1);
        assert!(execute(&plan(None, "cat"), workspace.dir(), Some(&huge), 3000)
            .await
            .is_err());
        workspace.release().await;
        let _ = std::fs::remove_dir_all(&root);
    }
}
