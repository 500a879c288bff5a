use super::CommandContext;
use crate::boundary::serialize_errors;
use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

/// Switch the checkout to the latest release.
///
/// ```bash
/// tagsync update           # switch only
/// tagsync update --build   # switch, then rebuild
/// ```
#[derive(Args, Debug)]
pub struct UpdateCommand {
    /// Rebuild after a successful switch.
    #[arg(long)]
    pub build: bool,
}

/// Result of `tagsync update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    /// Whether the working tree moved to a new release.
    pub changed: bool,
    /// Build result, when `--build` was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub built: Option<bool>,
}

impl UpdateCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let controller = ctx.controller()?;

        let spinner = ctx.spinner("Switching to the latest release...");
        let outcome = serialize_errors(async {
            let changed = controller.apply_update().await?;
            let built = if self.build {
                spinner.set_message("Building...");
                Some(controller.build().await?)
            } else {
                None
            };
            Ok(UpdateReport { changed, built })
        })
        .await;
        spinner.finish_and_clear();

        let report = ctx.report(outcome)?;
        if ctx.json() {
            return Ok(());
        }

        if report.changed {
            let state = controller.state();
            let tag = state.applied_tag().unwrap_or_default();
            println!("{} {}", "Updated to".green(), tag.bold());
        } else {
            println!("{}", "Already on the latest release".green());
        }

        match report.built {
            Some(true) => println!("{}", "Build succeeded".green()),
            Some(false) => {
                bail!("The build reported a failure. Re-run with --verbose to see its output")
            }
            None if report.changed => println!("Run `tagsync build` to rebuild the application"),
            None => {}
        }
        Ok(())
    }
}
