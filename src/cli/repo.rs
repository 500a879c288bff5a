use super::CommandContext;
use crate::boundary::serialize_errors;
use anyhow::Result;
use clap::Args;
use colored::Colorize;

/// Show the canonical web URL and identity of the configured remote.
#[derive(Args, Debug)]
pub struct RepoCommand {}

impl RepoCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let controller = ctx.controller()?;
        let outcome = serialize_errors(controller.identify_remote()).await;
        let resolved = ctx.report(outcome)?;

        if !ctx.json() {
            println!("{}", resolved.web_url.cyan());
            println!("  {} {}", "repository:".bold(), resolved.identity);
            println!("  {} {}", "remote:".bold(), controller.settings().remote);
        }
        Ok(())
    }
}
