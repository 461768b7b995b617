//! Per-job scratch directories.
//!
//! Every Job owns exactly one directory under the scratch root for its whole
//! lifetime; no other Job ever reads or writes it. Deletion failures are
//! non-fatal for the Job but leak disk, so they are counted and surfaced
//! through the metrics endpoint rather than only logged.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

static CLEANUP_FAILURES: AtomicU64 = AtomicU64::new(0);

/// Number of workspace deletions that failed since process start.
pub fn cleanup_failures() -> u64 {
    CLEANUP_FAILURES.load(Ordering::Relaxed)
}

#[derive(Debug)]
pub struct Workspace {
    dir: PathBuf,
    released: bool,
}

impl Workspace {
    /// Create the Job's directory, creating the scratch root first if this is
    /// the first Job. Failure is fatal for this Job only.
    pub async fn acquire(scratch_root: &Path, job_id: Uuid) -> Result<Self> {
        fs::create_dir_all(scratch_root)
            .await
            .with_context(|| format!("failed to create scratch root {}", scratch_root.display()))?;

        let dir = scratch_root.join(job_id.to_string());
        fs::create_dir(&dir)
            .await
            .with_context(|| format!("failed to create workspace {}", dir.display()))?;

        debug!(job_id = %job_id, dir = %dir.display(), "workspace acquired");
        Ok(Self {
            dir,
            released: false,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the Job's source file. Must happen before any process is
    /// spawned in this workspace.
    pub async fn write_source(&self, entry_filename: &str, code: &str) -> Result<PathBuf> {
        let path = self.dir.join(entry_filename);
        fs::write(&path, code)
            .await
            .with_context(|| format!("failed to write source file {}", path.display()))?;
        Ok(path)
    }

    /// Recursively delete the workspace. Deletion failure does not alter the
    /// Job's outcome; it is logged and counted.
    pub async fn release(mut self) {
        self.released = true;
        if let Err(e) = fs::remove_dir_all(&self.dir).await {
            CLEANUP_FAILURES.fetch_add(1, Ordering::Relaxed);
            warn!(dir = %self.dir.display(), error = %e, "workspace cleanup failed");
        } else {
            debug!(dir = %self.dir.display(), "workspace released");
        }
    }
}

impl Drop for Workspace {
    // Safety net for paths that never reach release(), e.g. an early return
    // on a write failure or a panic while driving the Job.
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                CLEANUP_FAILURES.fetch_add(1, Ordering::Relaxed);
                warn!(dir = %self.dir.display(), error = %e, "workspace cleanup failed on drop");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_root() -> PathBuf {
        std::env::temp_dir().join(format!("testit-workspace-tests-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_acquire_creates_directory() {
        let root = scratch_root();
        let job_id = Uuid::new_v4();
        let workspace = Workspace::acquire(&root, job_id).await.unwrap();
        assert!(workspace.dir().is_dir());
        assert!(workspace.dir().starts_with(&root));
        workspace.release().await;
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_write_source_lands_in_workspace() {
        let root = scratch_root();
        let workspace = Workspace::acquire(&root, Uuid::new_v4()).await.unwrap();
        let path = workspace.write_source("Main.py", "print(1)\n").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "print(1)\n");
        workspace.release().await;
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_release_removes_directory() {
        let root = scratch_root();
        let workspace = Workspace::acquire(&root, Uuid::new_v4()).await.unwrap();
        let dir = workspace.dir().to_path_buf();
        workspace.release().await;
        assert!(!dir.exists());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_drop_removes_unreleased_directory() {
        let root = scratch_root();
        let dir;
        {
            let workspace = Workspace::acquire(&root, Uuid::new_v4()).await.unwrap();
            dir = workspace.dir().to_path_buf();
        }
        assert!(!dir.exists());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_two_jobs_get_distinct_directories() {
        let root = scratch_root();
        let a = Workspace::acquire(&root, Uuid::new_v4()).await.unwrap();
        let b = Workspace::acquire(&root, Uuid::new_v4()).await.unwrap();
        assert_ne!(a.dir(), b.dir());
        a.release().await;
        b.release().await;
        let _ = std::fs::remove_dir_all(&root);
    }
}
