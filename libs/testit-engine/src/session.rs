//! Session registry for interactive runs.
//!
//! One live connection owns at most one in-flight Job. The registry is the
//! only global mutable state in the engine; its lock is held for map
//! insert/remove only, never across a process wait. Cleanup (kill the
//! process, delete the workspace, clear the binding) runs on every exit
//! path: natural exit, kill-then-replace, disconnect, optional timeout.
//!
//! The registry is transport-agnostic: callers provide an event sink and the
//! gateway decides how events reach the wire.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use testit_common::protocol::{ServerEvent, SessionStatus, StreamKind};
use testit_common::types::Language;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{mpsc, Notify};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::job::{Job, JobState};
use crate::language;
use crate::workspace::Workspace;

/// Where a session's events are forwarded. Sends to a disconnected sink are
/// swallowed; the disconnect path tears the Job down separately.
pub type EventSink = mpsc::UnboundedSender<ServerEvent>;

struct ActiveJob {
    job_id: Uuid,
    stdin_tx: mpsc::UnboundedSender<String>,
    kill: Arc<Notify>,
}

/// Cheaply clonable handle; all clones share the same session map.
#[derive(Clone)]
pub struct SessionRegistry {
    config: EngineConfig,
    sessions: Arc<Mutex<HashMap<Uuid, ActiveJob>>>,
}

impl SessionRegistry {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Connections currently bound to a live Job.
    pub fn active_sessions(&self) -> usize {
        self.lock().len()
    }

    /// Start a run for `conn_id`. If the connection already has an active
    /// Job it is killed and unbound first (kill-then-replace), never
    /// silently orphaned.
    pub async fn start_run(
        &self,
        conn_id: Uuid,
        code: String,
        language: Language,
        sink: EventSink,
    ) {
        if let Some(previous) = self.remove_binding(conn_id) {
            info!(
                conn_id = %conn_id,
                job_id = %previous.job_id,
                "new run while job active, killing previous"
            );
            previous.kill.notify_one();
        }

        let mut job = Job::new(language);
        let plan = language::resolve(language, &code);
        info!(conn_id = %conn_id, job_id = %job.id, language = %language, "starting interactive run");

        let workspace = match Workspace::acquire(&self.config.scratch_root, job.id).await {
            Ok(workspace) => workspace,
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "workspace allocation failed");
                send_error(&sink, format!("Failed to allocate workspace: {:#}", e));
                return;
            }
        };
        if let Err(e) = workspace.write_source(&plan.entry_filename, &code).await {
            warn!(job_id = %job.id, error = %e, "source write failed");
            send_error(&sink, format!("Failed to write source: {:#}", e));
            workspace.release().await;
            return;
        }

        if let Some(compile_argv) = &plan.compile {
            job.advance(JobState::Compiling);
            let compiled = Command::new(&compile_argv[0])
                .args(&compile_argv[1..])
                .current_dir(workspace.dir())
                .stdin(Stdio::null())
                .output()
                .await;
            match compiled {
                Ok(output) if output.status.success() => {}
                Ok(output) => {
                    job.advance(JobState::CompileFailed);
                    let diagnostics = String::from_utf8_lossy(&output.stderr);
                    send_error(&sink, format!("Compilation Failed:\n{}", diagnostics));
                    workspace.release().await;
                    return;
                }
                Err(e) => {
                    send_error(&sink, format!("Failed to start compiler: {}", e));
                    workspace.release().await;
                    return;
                }
            }
        }

        let mut child = match Command::new(&plan.run[0])
            .args(&plan.run[1..])
            .current_dir(workspace.dir())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "run spawn failed");
                send_error(&sink, format!("Failed to start process: {}", e));
                workspace.release().await;
                return;
            }
        };
        job.advance(JobState::Running);

        let (stdin_tx, stdin_rx) = mpsc::unbounded_channel();
        let kill = Arc::new(Notify::new());
        self.insert_binding(
            conn_id,
            ActiveJob {
                job_id: job.id,
                stdin_tx,
                kill: Arc::clone(&kill),
            },
        );

        let _ = sink.send(ServerEvent::Status {
            data: SessionStatus::Running,
        });

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_stream(stdout, StreamKind::Stdout, sink.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stream(stderr, StreamKind::Stderr, sink.clone()));
        }

        let registry = self.clone();
        let timeout_ms = self.config.interactive_timeout_ms;
        tokio::spawn(supervise(
            registry, conn_id, job, child, workspace, stdin_rx, kill, sink, timeout_ms,
        ));
    }

    /// Forward a line of client input to the active Job's stdin. A newline
    /// is appended at the write site. If the process already exited the
    /// attempt is swallowed.
    pub fn push_input(&self, conn_id: Uuid, data: &str) {
        let sessions = self.lock();
        if let Some(active) = sessions.get(&conn_id) {
            let _ = active.stdin_tx.send(data.to_string());
        } else {
            debug!(conn_id = %conn_id, "input for connection with no active job");
        }
    }

    /// Transport-level disconnect: kill the active Job if any. Workspace
    /// removal happens on the supervise task's exit path.
    pub fn disconnect(&self, conn_id: Uuid) {
        if let Some(active) = self.remove_binding(conn_id) {
            info!(conn_id = %conn_id, job_id = %active.job_id, "disconnect with active job, killing");
            active.kill.notify_one();
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, ActiveJob>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn insert_binding(&self, conn_id: Uuid, active: ActiveJob) {
        self.lock().insert(conn_id, active);
    }

    fn remove_binding(&self, conn_id: Uuid) -> Option<ActiveJob> {
        self.lock().remove(&conn_id)
    }

    /// Remove the binding only if it still belongs to `job_id`; a
    /// kill-then-replace may already have installed a newer Job.
    fn remove_if_current(&self, conn_id: Uuid, job_id: Uuid) {
        let mut sessions = self.lock();
        if sessions.get(&conn_id).map(|a| a.job_id) == Some(job_id) {
            sessions.remove(&conn_id);
        }
    }
}

/// How the supervised process left the select loop.
enum Exit {
    Natural(Option<std::process::ExitStatus>),
    Killed,
    DeadlineExceeded,
}

/// Owns the child for the rest of the Job's life: relays stdin lines, reacts
/// to kill/timeout, and runs the single cleanup path once the process is
/// gone.
#[allow(clippy::too_many_arguments)]
async fn supervise(
    registry: SessionRegistry,
    conn_id: Uuid,
    mut job: Job,
    mut child: Child,
    workspace: Workspace,
    mut stdin_rx: mpsc::UnboundedReceiver<String>,
    kill: Arc<Notify>,
    sink: EventSink,
    timeout_ms: Option<u64>,
) {
    let mut stdin_pipe = child.stdin.take();
    let mut stdin_open = true;

    let deadline = async {
        match timeout_ms {
            Some(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    let exit = loop {
        tokio::select! {
            status = child.wait() => break Exit::Natural(status.ok()),
            maybe_line = stdin_rx.recv(), if stdin_open => {
                match maybe_line {
                    Some(line) => write_stdin(&mut stdin_pipe, &line).await,
                    // Binding was replaced or removed; keep waiting on the child.
                    None => stdin_open = false,
                }
            }
            _ = kill.notified() => break Exit::Killed,
            _ = &mut deadline => break Exit::DeadlineExceeded,
        }
    };

    if matches!(exit, Exit::DeadlineExceeded) {
        let _ = sink.send(ServerEvent::Output {
            kind: StreamKind::System,
            data: "\nTime limit exceeded, terminating process".to_string(),
        });
    }

    let (exit_status, killed) = match exit {
        Exit::Natural(status) => (status, false),
        Exit::Killed | Exit::DeadlineExceeded => {
            // Idempotent: safe if the process already exited on its own.
            if let Err(e) = child.start_kill() {
                debug!(job_id = %job.id, error = %e, "kill failed, child likely exited");
            }
            let _ = child.wait().await;
            (None, true)
        }
    };

    job.advance(if killed {
        JobState::Killed
    } else if exit_status.as_ref().map_or(false, |s| s.success()) {
        JobState::Completed
    } else {
        JobState::RuntimeError
    });

    let _ = sink.send(ServerEvent::Status {
        data: SessionStatus::Stopped,
    });
    let notice = match exit_status.and_then(|s| s.code()) {
        Some(code) => format!("\nProcess exited with code {}", code),
        None => "\nProcess terminated".to_string(),
    };
    let _ = sink.send(ServerEvent::Output {
        kind: StreamKind::System,
        data: notice,
    });

    workspace.release().await;
    registry.remove_if_current(conn_id, job.id);
    info!(conn_id = %conn_id, job_id = %job.id, state = ?job.state, "interactive job finished");
}

/// Relay one child stream to the sink chunk by chunk. Per-stream order is
/// arrival order; nothing is guaranteed across the two streams.
async fn forward_stream<R: AsyncRead + Unpin>(mut stream: R, kind: StreamKind, sink: EventSink) {
    let mut buf = [0u8; 4096];
    loop {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let chunk = String::from_utf8_lossy(&buf[..n]).into_owned();
                if sink
                    .send(ServerEvent::Output { kind, data: chunk })
                    .is_err()
                {
                    break;
                }
            }
        }
    }
}

async fn write_stdin(pipe: &mut Option<ChildStdin>, line: &str) {
    if let Some(stdin) = pipe.as_mut() {
        let mut data = line.as_bytes().to_vec();
        data.push(b'\n');
        if let Err(e) = stdin.write_all(&data).await {
            debug!(error = %e, "stdin write failed, process likely exited");
        } else {
            let _ = stdin.flush().await;
        }
    }
}

fn send_error(sink: &EventSink, message: String) {
    let _ = sink.send(ServerEvent::Output {
        kind: StreamKind::Error,
        data: message,
    });
}
