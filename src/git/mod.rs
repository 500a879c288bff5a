//! Git operations on the application's own source checkout.
//!
//! Like the rest of tagsync this module drives the system `git` binary rather
//! than an embedded library, so the user's credential helpers, SSH agent and
//! git configuration apply unchanged. Every command goes through a
//! [`CommandRunner`], which makes these operations work the same way natively
//! and from inside a sandbox.
//!
//! - [`command_builder`] - the exact argument vector of each git operation
//! - [`locator`] - canonical remote identity (`owner/name`) from the remote URL
//! - [`GitRepo`] - the operations the updater composes

pub mod command_builder;
pub mod locator;

pub use command_builder::GitCommand;
pub use locator::{RepoLocator, RepositoryIdentity, ResolvedRemote};

use crate::core::{UpdateResult, UpdaterError};
use crate::runner::{CommandOutput, CommandRunner, Executor, SystemExecutor};
use std::path::Path;

/// Marker git prints when asked for a remote that does not exist.
const NO_SUCH_REMOTE: &str = "No such remote";

/// Handle on the source checkout, executing git through a [`CommandRunner`].
pub struct GitRepo<E = SystemExecutor> {
    runner: CommandRunner<E>,
}

impl<E> Clone for GitRepo<E> {
    fn clone(&self) -> Self {
        Self {
            runner: self.runner.clone(),
        }
    }
}

impl<E: Executor> GitRepo<E> {
    pub fn new(runner: CommandRunner<E>) -> Self {
        Self { runner }
    }

    pub fn path(&self) -> &Path {
        self.runner.source_root()
    }

    pub fn runner(&self) -> &CommandRunner<E> {
        &self.runner
    }

    /// Returns the configured URL of `remote`.
    ///
    /// # Errors
    ///
    /// [`UpdaterError::NoRemoteConfigured`] when git reports the remote does not
    /// exist; any other failure is returned as [`UpdaterError::CommandFailed`].
    pub async fn remote_url(&self, remote: &str) -> UpdateResult<String> {
        match GitCommand::remote_url(remote).execute_stdout(&self.runner).await {
            Err(UpdaterError::CommandFailed { stderr, .. }) if stderr.contains(NO_SUCH_REMOTE) => {
                Err(UpdaterError::NoRemoteConfigured {
                    remote: remote.to_string(),
                })
            }
            other => other,
        }
    }

    /// Refreshes remote-tracking refs and tags. Never merges.
    pub async fn fetch(&self) -> UpdateResult<()> {
        GitCommand::fetch().execute_success(&self.runner).await
    }

    /// Commit identifier currently checked out.
    pub async fn current_commit(&self) -> UpdateResult<String> {
        GitCommand::current_commit().execute_stdout(&self.runner).await
    }

    /// Moves the working tree to `tag` in detached-head mode.
    ///
    /// Returns the raw output so callers can inspect what git reported.
    pub async fn switch_detached(&self, tag: &str) -> UpdateResult<CommandOutput> {
        GitCommand::switch_detached(tag).execute(&self.runner).await
    }

    pub async fn update_submodules(&self) -> UpdateResult<()> {
        GitCommand::update_submodules().execute_success(&self.runner).await
    }
}
