//! Code execution engine.
//!
//! Takes untrusted source in one of the supported languages, compiles it if
//! the language requires it, runs it as an isolated OS process inside a
//! per-job scratch directory, and guarantees workspace cleanup under every
//! outcome: success, compile error, runtime error, timeout, disconnect.
//!
//! Two operating modes share the mechanics:
//! - batch ([`batch::run_all`]): one Job per input/expected-output pair, run
//!   strictly sequentially, structured verdicts back to the caller;
//! - interactive ([`session::SessionRegistry`]): one live connection bound to
//!   at most one Job, stdout/stderr streamed as chunks, stdin pushed while
//!   the process runs.
//!
//! The engine knows nothing about HTTP, sockets, or persistence. Callers hand
//! it code + language and either collect results or provide an event sink.

pub mod batch;
pub mod config;
pub mod evaluator;
pub mod job;
pub mod language;
pub mod session;
pub mod supervisor;
pub mod workspace;

pub use config::EngineConfig;
pub use session::SessionRegistry;
