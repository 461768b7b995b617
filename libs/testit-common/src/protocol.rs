//! Wire messages for the interactive execution protocol.
//!
//! The realtime gateway relays these as JSON text frames. The engine side is
//! transport-agnostic: it only ever sees a sink of [`ServerEvent`]s.

use crate::types::Language;
use serde::{Deserialize, Serialize};

/// Client → engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start a run, replacing the session's active Job if one exists.
    RunCode { code: String, language: Language },
    /// A line of stdin for the active Job. A newline is appended before the
    /// write, matching line-buffered scanner conventions.
    Input { data: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Running,
    Stopped,
}

/// Which stream an output chunk came from. `Error` and `System` are
/// engine-synthesized (compile failures, exit notices), not child streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Stdout,
    Stderr,
    Error,
    System,
}

/// Engine → client. Chunks preserve per-stream arrival order; no ordering is
/// guaranteed between stdout and stderr.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ServerEvent {
    Status {
        data: SessionStatus,
    },
    Output {
        #[serde(rename = "type")]
        kind: StreamKind,
        data: String,
    },
}
