//! Update orchestration for a source-controlled application checkout.
//!
//! [`UpdateController`] compares the local checkout with the latest published
//! release, moves the checkout to that release, and rebuilds it. It owns the
//! session's [`UpdateState`] and is the only component with state transitions.
//!
//! # Operations
//!
//! ```text
//! identify_remote   git remote get-url <remote>
//!
//! check_for_update  git fetch
//!                   git rev-parse HEAD
//!                   git remote get-url <remote>
//!                   GET /repos/{owner}/{name}/releases/latest
//!
//! apply_update      git remote get-url <remote>
//!                   GET /repos/{owner}/{name}/releases/latest
//!                   git rev-parse HEAD
//!                   git switch <tag> --detach
//!                   git rev-parse HEAD
//!                   git submodule update --init --recursive
//!
//! build             <build program> <args...> [--dev]
//! ```
//!
//! The order inside `check_for_update` is fixed: comparing against a head read
//! before the fetch, or a release read before it, can report a false
//! "up to date".
//!
//! # Exclusion and cancellation
//!
//! `check_for_update`, `apply_update` and `build` each take the repository lock
//! (see [`lock`]) and fail fast with [`UpdaterError::UpdateInProgress`] while
//! another one runs in this process. Their bodies run in a spawned task that
//! owns the lock guard: a caller that stops waiting detaches from the work, and
//! the lock is released only when the subprocesses have really finished.
//!
//! # Errors
//!
//! Failures from git, the locator and the registry are returned unchanged.
//! Nothing is retried and no failure is turned into "up to date".

pub mod lock;
pub mod markers;
pub mod state;


pub use lock::{RepoLock, RepoLockGuard};
pub use markers::OutputMarkers;
pub use state::{CheckOutcome, RebuildStatus, UpdateState};

use crate::config::{BuildConfig, UpdaterConfig, default_lock_dir};
use crate::constants::{DEFAULT_REMOTE, IS_DEV_BUILD};
use crate::core::{UpdateResult, UpdaterError};
use crate::git::{GitRepo, RepoLocator, ResolvedRemote};
use crate::release::{ReleaseClient, ReleaseDescriptor};
use crate::runner::{CommandRunner, Executor, SystemExecutor};
use chrono::Utc;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Tunables of an [`UpdateController`].
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub remote: String,
    pub build: BuildConfig,
    pub markers: OutputMarkers,
    /// Pass the build's development flag.
    pub dev_build: bool,
    pub lock_dir: PathBuf,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            remote: DEFAULT_REMOTE.to_string(),
            build: BuildConfig::default(),
            markers: OutputMarkers::default(),
            dev_build: IS_DEV_BUILD,
            lock_dir: default_lock_dir(),
        }
    }
}

impl ControllerSettings {
    pub fn from_config(config: &UpdaterConfig) -> anyhow::Result<Self> {
        Ok(Self {
            remote: config.remote.clone(),
            build: config.build.clone(),
            markers: config.markers(),
            dev_build: IS_DEV_BUILD,
            lock_dir: config.lock_dir()?,
        })
    }
}

struct Inner<E> {
    runner: CommandRunner<E>,
    repo: GitRepo<E>,
    locator: RepoLocator<E>,
    releases: ReleaseClient,
    settings: ControllerSettings,
    lock: RepoLock,
    state: Mutex<UpdateState>,
}

impl<E: Executor> Inner<E> {
    fn state(&self) -> UpdateState {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn update_state(&self, f: impl FnOnce(&UpdateState) -> Option<UpdateState>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(next) = f(&state) {
            tracing::debug!(target: "upgrade", "State {} -> {}", state.name(), next.name());
            *state = next;
        }
    }

    fn set_state(&self, next: UpdateState) {
        self.update_state(|_| Some(next));
    }

    fn source_root(&self) -> &Path {
        self.runner.source_root()
    }
}

/// Checks for, applies, and builds releases of one source checkout.
///
/// Cloning is cheap and clones share state.
pub struct UpdateController<E = SystemExecutor> {
    inner: Arc<Inner<E>>,
}

impl<E> Clone for UpdateController<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Executor> UpdateController<E> {
    pub fn new(runner: CommandRunner<E>, releases: ReleaseClient, settings: ControllerSettings) -> Self {
        let locator = RepoLocator::new(runner.clone(), settings.remote.clone());
        let lock = RepoLock::new(settings.lock_dir.clone());
        Self {
            inner: Arc::new(Inner {
                repo: GitRepo::new(runner.clone()),
                runner,
                locator,
                releases,
                settings,
                lock,
                state: Mutex::new(UpdateState::Unknown),
            }),
        }
    }

    pub fn source_root(&self) -> &Path {
        self.inner.source_root()
    }

    pub fn runner(&self) -> &CommandRunner<E> {
        &self.inner.runner
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.inner.settings
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> UpdateState {
        self.inner.state()
    }

    /// Returns to [`UpdateState::Unknown`] unless an apply is in flight.
    pub fn reset(&self) -> UpdateResult<()> {
        self.reject_while_applying()?;
        self.inner.set_state(UpdateState::Unknown);
        Ok(())
    }

    /// Resolves the canonical remote without touching the network or the lock.
    pub async fn identify_remote(&self) -> UpdateResult<ResolvedRemote> {
        self.inner.locator.resolve_remote().await
    }

    /// Compares the local head with the latest release tag.
    ///
    /// Returns an empty list when they are equal, else the single pending
    /// release with the fixed `Actions` / `Latest release` metadata.
    pub async fn check_for_update(&self) -> UpdateResult<Vec<ReleaseDescriptor>> {
        self.exclusive("check", |inner| async move {
            inner.repo.fetch().await?;
            let local_head = inner.repo.current_commit().await?;
            let identity = inner.locator.resolve_remote_identity().await?;
            let latest = inner.releases.fetch_latest_release(&identity).await?;

            let outcome = if local_head == latest.tag {
                tracing::info!(target: "upgrade", "Checkout is at the latest release {}", latest.tag);
                CheckOutcome::UpToDate
            } else {
                tracing::info!(
                    target: "upgrade",
                    "Release {} available (local head {})",
                    latest.tag,
                    local_head
                );
                CheckOutcome::UpdateAvailable(ReleaseDescriptor::pending(latest.tag))
            };

            let updates = outcome.updates();
            inner.set_state(UpdateState::Checked {
                local_head,
                outcome,
                checked_at: Utc::now(),
            });
            Ok(updates)
        })
        .await
    }

    /// Switches the checkout to the latest release and syncs submodules.
    ///
    /// The latest tag is fetched again rather than taken from a prior check.
    /// Returns whether the working tree actually changed; a repeated call with
    /// no new release returns `Ok(false)`.
    pub async fn apply_update(&self) -> UpdateResult<bool> {
        self.exclusive("apply", |inner| async move {
            inner.set_state(UpdateState::Applying { since: Utc::now() });

            let result = async {
                let identity = inner.locator.resolve_remote_identity().await?;
                let latest = inner.releases.fetch_latest_release(&identity).await?;
                let head_before = inner.repo.current_commit().await?;
                let switch = inner.repo.switch_detached(&latest.tag).await?;
                let head_after = inner.repo.current_commit().await?;
                inner.repo.update_submodules().await?;
                let changed =
                    inner.settings.markers.working_tree_changed(&head_before, &head_after, &switch);
                Ok::<_, UpdaterError>((latest.tag, changed))
            }
            .await;

            match result {
                Ok((tag, changed)) => {
                    tracing::info!(
                        target: "upgrade",
                        "Checkout switched to {} ({})",
                        tag,
                        if changed { "updated" } else { "already current" }
                    );
                    inner.set_state(UpdateState::Applied {
                        tag,
                        changed,
                        rebuild: None,
                    });
                    Ok(changed)
                }
                Err(e) => {
                    tracing::warn!(target: "upgrade", "Update failed: {}", e);
                    inner.set_state(UpdateState::Unknown);
                    Err(e)
                }
            }
        })
        .await
    }

    /// Runs the external build; returns `false` when it reported a failure.
    pub async fn build(&self) -> UpdateResult<bool> {
        self.exclusive("build", |inner| async move {
            let argv = inner.settings.build.argv(inner.settings.dev_build);
            let output = inner.runner.run(&inner.settings.build.program, argv).await?;
            let success = !inner.settings.markers.build_failed(&output);

            if success {
                tracing::info!(target: "upgrade", "Build succeeded");
            } else {
                tracing::warn!(target: "upgrade", "Build reported a failure: {}", output.stderr.trim());
            }

            inner.update_state(|state| match state {
                UpdateState::Applied { tag, changed, .. } => Some(UpdateState::Applied {
                    tag: tag.clone(),
                    changed: *changed,
                    rebuild: Some(RebuildStatus::from_success(success)),
                }),
                _ => None,
            });
            Ok(success)
        })
        .await
    }

    fn reject_while_applying(&self) -> UpdateResult<()> {
        if self.inner.state().is_applying() {
            return Err(UpdaterError::UpdateInProgress {
                path: self.source_root().display().to_string(),
            });
        }
        Ok(())
    }

    /// Runs `work` in a detached task holding the repository lock.
    async fn exclusive<T, F, Fut>(&self, operation: &'static str, work: F) -> UpdateResult<T>
    where
        T: Send + 'static,
        F: FnOnce(Arc<Inner<E>>) -> Fut,
        Fut: Future<Output = UpdateResult<T>> + Send + 'static,
    {
        self.reject_while_applying()?;
        let guard = self.inner.lock.acquire(self.source_root()).await?;
        tracing::debug!(target: "upgrade", "Starting {} in {}", operation, self.source_root().display());

        let work = work(Arc::clone(&self.inner));
        let task = tokio::spawn(async move {
            let result = work.await;
            drop(guard);
            result
        });

        task.await.unwrap_or_else(|e| {
            // A panicking apply leaves the tree in an unknown state
            self.inner.update_state(|state| state.is_applying().then_some(UpdateState::Unknown));
            Err(UpdaterError::Internal {
                message: format!("{operation} task failed: {e}"),
            })
        })
    }
}
