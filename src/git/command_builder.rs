//! Argument builders for the version-control operations the updater performs.
//!
//! The updater only ever issues five git commands. Each has a named
//! constructor here so the exact argument contract lives in one place:
//!
//! | Constructor | Command line |
//! |---|---|
//! | [`GitCommand::remote_url`] | `git remote get-url <remote>` |
//! | [`GitCommand::fetch`] | `git fetch` |
//! | [`GitCommand::current_commit`] | `git rev-parse HEAD` |
//! | [`GitCommand::switch_detached`] | `git switch <tag> --detach` |
//! | [`GitCommand::update_submodules`] | `git submodule update --init --recursive` |
//!
//! A built command is executed through a [`CommandRunner`], which decides
//! whether git runs directly or through the sandbox launcher.
//!
//! ```rust,no_run
//! use tagsync::git::command_builder::GitCommand;
//! use tagsync::runner::CommandRunner;
//! use tagsync::utils::ExecutionEnvironment;
//!
//! # async fn example() -> tagsync::core::UpdateResult<()> {
//! let runner = CommandRunner::new(ExecutionEnvironment::Native, "/home/me/src/app");
//! let head = GitCommand::current_commit().execute_stdout(&runner).await?;
//! # Ok(())
//! # }
//! ```

use crate::constants::GIT_TOOL;
use crate::core::UpdateResult;
use crate::runner::{CommandOutput, CommandRunner, Executor};

/// A git command line, minus the `git` itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommand {
    args: Vec<String>,
}

impl GitCommand {
    fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// `remote get-url <remote>`
    pub fn remote_url(remote: &str) -> Self {
        Self::from_args(["remote", "get-url", remote])
    }

    /// `fetch`: refreshes remote metadata without touching the working tree.
    pub fn fetch() -> Self {
        Self::from_args(["fetch"])
    }

    /// `rev-parse HEAD`
    pub fn current_commit() -> Self {
        Self::from_args(["rev-parse", "HEAD"])
    }

    /// `switch <tag> --detach`
    pub fn switch_detached(tag: &str) -> Self {
        Self::from_args(["switch", tag, "--detach"])
    }

    /// `submodule update --init --recursive`
    pub fn update_submodules() -> Self {
        Self::from_args(["submodule", "update", "--init", "--recursive"])
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Runs the command and returns both output streams.
    pub async fn execute<E: Executor>(self, runner: &CommandRunner<E>) -> UpdateResult<CommandOutput> {
        runner.run(GIT_TOOL, self.args).await
    }

    /// Runs the command and returns trimmed stdout.
    pub async fn execute_stdout<E: Executor>(self, runner: &CommandRunner<E>) -> UpdateResult<String> {
        let output = self.execute(runner).await?;
        Ok(output.stdout.trim().to_string())
    }

    /// Runs the command, discarding its output.
    pub async fn execute_success<E: Executor>(self, runner: &CommandRunner<E>) -> UpdateResult<()> {
        self.execute(runner).await?;
        Ok(())
    }
}
