use super::CommandContext;
use crate::boundary::serialize_errors;
use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;

/// Rebuild the application from the current checkout.
#[derive(Args, Debug)]
pub struct BuildCommand {}

impl BuildCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let controller = ctx.controller()?;

        let spinner = ctx.spinner("Building...");
        let outcome = serialize_errors(controller.build()).await;
        spinner.finish_and_clear();

        let succeeded = ctx.report(outcome)?;
        if ctx.json() {
            return Ok(());
        }

        if !succeeded {
            bail!("The build reported a failure. Re-run with --verbose to see its output");
        }
        println!("{}", "Build succeeded".green());
        Ok(())
    }
}
