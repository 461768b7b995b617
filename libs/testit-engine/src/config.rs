// Engine configuration, resolved from the environment at boot.

use std::path::PathBuf;

/// Default wall-clock timeout per batch run.
pub const DEFAULT_BATCH_TIMEOUT_MS: u64 = 3000;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Process-wide scratch root; each Job gets an exclusively-owned
    /// subdirectory under it.
    pub scratch_root: PathBuf,
    /// Hard timeout per batch run. Compile time is not counted against it.
    pub batch_timeout_ms: u64,
    /// Optional hard timeout for interactive runs. `None` (the default)
    /// leaves interactive runs unbounded; disconnect is the cancellation
    /// path.
    pub interactive_timeout_ms: Option<u64>,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let scratch_root = std::env::var("SCRATCH_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_scratch_root());

        let batch_timeout_ms = std::env::var("BATCH_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_BATCH_TIMEOUT_MS);

        let interactive_timeout_ms = std::env::var("INTERACTIVE_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok());

        Self {
            scratch_root,
            batch_timeout_ms,
            interactive_timeout_ms,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scratch_root: default_scratch_root(),
            batch_timeout_ms: DEFAULT_BATCH_TIMEOUT_MS,
            interactive_timeout_ms: None,
        }
    }
}

fn default_scratch_root() -> PathBuf {
    std::env::temp_dir().join("testit-jobs")
}
