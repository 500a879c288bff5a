//! tagsync - keep a source checkout on its latest published release
//!
//! tagsync is the self-update engine of an application that ships as a git
//! checkout and is rebuilt in place. It answers three questions, each through
//! the system `git` and the release registry's HTTP API:
//!
//! 1. Which repository does this checkout come from? ([`git::RepoLocator`])
//! 2. Is a newer release published? ([`upgrade::UpdateController::check_for_update`])
//! 3. Move to it and rebuild. ([`upgrade::UpdateController::apply_update`],
//!    [`upgrade::UpdateController::build`])
//!
//! # Architecture Overview
//!
//! ```text
//! cli ──► boundary ──► upgrade::UpdateController
//!                        ├── git::GitRepo / git::RepoLocator ──┐
//!                        ├── release::ReleaseClient            ├──► runner::CommandRunner
//!                        └── build program ────────────────────┘        │
//!                                                          native spawn or flatpak-spawn --host
//! ```
//!
//! Every external tool goes through [`runner::CommandRunner`], which is the
//! only place that knows whether the process runs inside a Flatpak sandbox.
//!
//! # Core Modules
//!
//! - [`boundary`] - serializable success/failure payloads for a presentation layer
//! - [`cli`] - the `tagsync` command-line interface
//! - [`config`] - `~/.tagsync/config.toml`
//! - [`core`] - error types and user-facing error rendering
//! - [`git`] - git commands and remote identification
//! - [`release`] - release registry client
//! - [`runner`] - environment-aware subprocess execution
//! - [`upgrade`] - update state machine, locking and output markers
//! - [`utils`] - platform detection, path helpers, spinners
//!
//! # Example
//!
//! ```rust,no_run
//! use tagsync::release::ReleaseClient;
//! use tagsync::runner::CommandRunner;
//! use tagsync::upgrade::{ControllerSettings, UpdateController};
//! use tagsync::utils::ExecutionEnvironment;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let runner = CommandRunner::new(ExecutionEnvironment::detect(), "/opt/app");
//! let releases = ReleaseClient::new("https://api.github.com")?;
//! let controller = UpdateController::new(runner, releases, ControllerSettings::default());
//!
//! if !controller.check_for_update().await?.is_empty() && controller.apply_update().await? {
//!     controller.build().await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod boundary;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod git;
pub mod release;
pub mod runner;
pub mod upgrade;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
