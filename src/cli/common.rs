//! Shared setup for the update subcommands.

use super::CliConfig;
use crate::boundary::Outcome;
use crate::config::UpdaterConfig;
use crate::release::ReleaseClient;
use crate::runner::CommandRunner;
use crate::upgrade::{ControllerSettings, UpdateController};
use crate::utils::platform::source_root_from_executable;
use crate::utils::progress::Spinner;
use crate::utils::ExecutionEnvironment;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

/// Configuration, environment and source root resolved once per invocation.
pub struct CommandContext {
    pub options: CliConfig,
    pub config: UpdaterConfig,
    pub environment: ExecutionEnvironment,
    pub source_root: PathBuf,
}

impl CommandContext {
    /// Loads the config file and resolves the checkout to operate on.
    ///
    /// The source root is `--source-root`, else `source_root` from the config,
    /// else the checkout containing the running executable.
    pub async fn load(options: CliConfig) -> Result<Self> {
        let config = UpdaterConfig::load_with_optional(options.config_path.clone()).await?;
        let environment = ExecutionEnvironment::detect();

        let source_root = match options.source_root.clone() {
            Some(root) => root,
            None => match config.source_root_override()? {
                Some(root) => root,
                None => source_root_from_executable()?,
            },
        };
        tracing::debug!(
            "Using source root {} ({} environment)",
            source_root.display(),
            environment
        );

        Ok(Self {
            options,
            config,
            environment,
            source_root,
        })
    }

    pub fn runner(&self) -> CommandRunner {
        CommandRunner::new(self.environment, &self.source_root)
            .with_launcher(self.config.sandbox.launcher.clone())
    }

    pub fn controller(&self) -> Result<UpdateController> {
        let releases = ReleaseClient::from_config(&self.config.registry)
            .context("Failed to create the release registry client")?;
        let settings = ControllerSettings::from_config(&self.config)?;
        Ok(UpdateController::new(self.runner(), releases, settings))
    }

    pub fn spinner(&self, msg: impl Into<String>) -> Spinner {
        Spinner::with_visibility(msg, self.options.show_progress())
    }

    /// Prints `outcome` as JSON in `--json` mode and converts it back to a result.
    ///
    /// A failure is returned as an error in both modes so the exit code reflects it.
    pub fn report<T: Serialize>(&self, outcome: Outcome<T>) -> Result<T> {
        if self.options.json {
            let payload =
                serde_json::to_string_pretty(&outcome).context("Failed to serialize result")?;
            println!("{payload}");
        }
        Ok(outcome.into_result()?)
    }

    pub const fn json(&self) -> bool {
        self.options.json
    }
}
