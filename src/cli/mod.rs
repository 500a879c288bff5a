//! Command-line interface for tagsync.
//!
//! The CLI is the presentation layer over [`UpdateController`]. Each update
//! subcommand maps to one controller operation and reports its [`Outcome`]:
//!
//! | Command | Operation |
//! |---|---|
//! | `tagsync repo` | [`UpdateController::identify_remote`] |
//! | `tagsync check` | [`UpdateController::check_for_update`] |
//! | `tagsync update [--build]` | [`UpdateController::apply_update`], then optionally `build` |
//! | `tagsync build` | [`UpdateController::build`] |
//! | `tagsync status` | environment, source root and remote; no network access |
//!
//! # Global Options
//!
//! - `--verbose` - debug logging on stderr
//! - `--quiet` - no logging at all
//! - `--config <path>` - configuration file (see [`crate::config`])
//! - `--source-root <path>` - checkout to operate on instead of the discovered one
//! - `--json` - print the result payload as JSON on stdout
//! - `--no-progress` - no spinners
//!
//! `RUST_LOG` takes precedence over the default log level:
//!
//! ```bash
//! RUST_LOG=runner=debug tagsync check
//! ```
//!
//! [`UpdateController`]: crate::upgrade::UpdateController
//! [`UpdateController::identify_remote`]: crate::upgrade::UpdateController::identify_remote
//! [`UpdateController::check_for_update`]: crate::upgrade::UpdateController::check_for_update
//! [`UpdateController::apply_update`]: crate::upgrade::UpdateController::apply_update
//! [`UpdateController::build`]: crate::upgrade::UpdateController::build
//! [`Outcome`]: crate::boundary::Outcome

mod build;
mod check;
mod common;
mod repo;
mod status;
mod update;


pub use common::CommandContext;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Runtime options derived from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Default log filter; `None` disables logging.
    pub log_level: Option<String>,
    pub no_progress: bool,
    pub json: bool,
    pub config_path: Option<PathBuf>,
    pub source_root: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether spinners may be drawn.
    #[must_use]
    pub const fn show_progress(&self) -> bool {
        !self.no_progress && !self.json
    }
}

#[derive(Parser)]
#[command(
    name = "tagsync",
    about = "Keep a source checkout on its latest published release",
    version,
    long_about = "tagsync checks a git checkout of an application against the latest release \
                  published for its repository, switches the checkout to that release, and \
                  rebuilds it. It works natively and from inside a Flatpak sandbox."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging on stderr.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Disable all logging.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the configuration file.
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Source checkout to operate on (default: the checkout containing this binary).
    #[arg(long, global = true, value_name = "PATH")]
    source_root: Option<PathBuf>,

    /// Print results as JSON payloads on stdout.
    #[arg(long, global = true)]
    json: bool,

    /// Disable spinners.
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the canonical remote repository.
    Repo(repo::RepoCommand),

    /// Check whether a newer release is published.
    Check(check::CheckCommand),

    /// Switch the checkout to the latest release.
    Update(update::UpdateCommand),

    /// Rebuild the application from the checkout.
    Build(build::BuildCommand),

    /// Show the detected environment and checkout.
    Status(status::StatusCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("warn".to_string())
        };

        CliConfig {
            log_level,
            no_progress: self.no_progress,
            json: self.json,
            config_path: self.config.clone(),
            source_root: self.source_root.clone(),
        }
    }

    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        init_logging(config.log_level.as_deref());

        let ctx = CommandContext::load(config).await?;
        match self.command {
            Commands::Repo(cmd) => cmd.execute(&ctx).await,
            Commands::Check(cmd) => cmd.execute(&ctx).await,
            Commands::Update(cmd) => cmd.execute(&ctx).await,
            Commands::Build(cmd) => cmd.execute(&ctx).await,
            Commands::Status(cmd) => cmd.execute(&ctx).await,
        }
    }
}

/// Installs the stderr subscriber; `RUST_LOG` overrides `level`.
fn init_logging(level: Option<&str>) {
    let Some(level) = level else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
