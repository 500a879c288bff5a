//! Repository-scoped mutual exclusion for operations that touch the checkout.
//!
//! Two layers guard a source root:
//!
//! - **In-process**: a process-wide map from canonical root to an async mutex.
//!   A second caller fails immediately with [`UpdaterError::UpdateInProgress`].
//! - **Cross-process**: an exclusive advisory lock on
//!   `<lock_dir>/<sha256(root)[..16]>.lock`. Another process waits until the
//!   holder finishes.
//!
//! Both are released when the [`RepoLockGuard`] is dropped.

use crate::core::{UpdateResult, UpdaterError};
use dashmap::DashMap;
use fs4::fs_std::FileExt;
use sha2::{Digest, Sha256};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tokio::sync::{Mutex, OwnedMutexGuard};

static IN_PROCESS_LOCKS: LazyLock<DashMap<PathBuf, Arc<Mutex<()>>>> = LazyLock::new(DashMap::new);

/// Hands out exclusive access to source roots.
#[derive(Debug, Clone)]
pub struct RepoLock {
    lock_dir: PathBuf,
}

impl RepoLock {
    pub fn new(lock_dir: impl Into<PathBuf>) -> Self {
        Self {
            lock_dir: lock_dir.into(),
        }
    }

    pub fn lock_dir(&self) -> &Path {
        &self.lock_dir
    }

    /// Lock file used for `root`.
    pub fn lock_path(&self, root: &Path) -> PathBuf {
        let digest = hex::encode(Sha256::digest(canonical_key(root).to_string_lossy().as_bytes()));
        self.lock_dir.join(format!("{}.lock", &digest[..16]))
    }

    /// Takes exclusive access to `root`.
    ///
    /// # Errors
    ///
    /// [`UpdaterError::UpdateInProgress`] if this process already holds the
    /// lock, [`UpdaterError::LockFailed`] if the lock file cannot be used.
    pub async fn acquire(&self, root: &Path) -> UpdateResult<RepoLockGuard> {
        let key = canonical_key(root);
        let mutex = IN_PROCESS_LOCKS
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let in_process = mutex.try_lock_owned().map_err(|_| {
            tracing::debug!(target: "upgrade", "Lock on {} is held in this process", key.display());
            UpdaterError::UpdateInProgress {
                path: key.display().to_string(),
            }
        })?;

        let path = self.lock_path(root);
        let lock_failed = |reason: String| UpdaterError::LockFailed {
            path: path.display().to_string(),
            reason,
        };

        tokio::fs::create_dir_all(&self.lock_dir)
            .await
            .map_err(|e| lock_failed(format!("cannot create {}: {e}", self.lock_dir.display())))?;

        let file_path = path.clone();
        let file = tokio::task::spawn_blocking(move || -> std::io::Result<File> {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(false)
                .open(&file_path)?;
            file.lock_exclusive()?;
            Ok(file)
        })
        .await
        .map_err(|e| lock_failed(format!("lock task failed: {e}")))?
        .map_err(|e| lock_failed(e.to_string()))?;

        tracing::debug!(target: "upgrade", "Acquired lock {} for {}", path.display(), key.display());

        Ok(RepoLockGuard {
            file,
            path,
            _in_process: in_process,
        })
    }
}

/// Proof of exclusive access to a source root. Dropping it releases the lock.
#[derive(Debug)]
pub struct RepoLockGuard {
    file: File,
    path: PathBuf,
    _in_process: OwnedMutexGuard<()>,
}

impl RepoLockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RepoLockGuard {
    fn drop(&mut self) {
        #[allow(unstable_name_collisions)]
        if let Err(e) = self.file.unlock() {
            tracing::warn!(target: "upgrade", "Failed to unlock {}: {}", self.path.display(), e);
        }
    }
}

fn canonical_key(root: &Path) -> PathBuf {
    std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf())
}
