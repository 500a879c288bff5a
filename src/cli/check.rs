use super::CommandContext;
use crate::boundary::serialize_errors;
use anyhow::Result;
use clap::Args;
use colored::Colorize;

/// Compare the checkout with the latest published release.
///
/// Prints nothing but the payload in `--json` mode: an empty list when the
/// checkout is current, else the pending release.
#[derive(Args, Debug)]
pub struct CheckCommand {}

impl CheckCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let controller = ctx.controller()?;

        let spinner = ctx.spinner("Checking for updates...");
        let outcome = serialize_errors(controller.check_for_update()).await;
        spinner.finish_and_clear();

        let updates = ctx.report(outcome)?;
        if ctx.json() {
            return Ok(());
        }

        match updates.first() {
            None => println!("{}", "Already on the latest release".green()),
            Some(release) => {
                println!("{} {}", "Update available:".cyan(), release.tag.bold());
                println!("  {} - {}", release.author, release.summary);
                println!();
                println!("Run `tagsync update --build` to install it");
            }
        }
        Ok(())
    }
}
