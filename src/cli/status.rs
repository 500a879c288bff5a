use super::CommandContext;
use crate::boundary::{Outcome, serialize_errors};
use crate::git::ResolvedRemote;
use crate::utils::ExecutionEnvironment;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

/// Show what tagsync would operate on, without contacting the registry.
#[derive(Args, Debug)]
pub struct StatusCommand {}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub version: &'static str,
    pub environment: ExecutionEnvironment,
    pub source_root: PathBuf,
    pub remote_name: String,
    pub remote: Outcome<ResolvedRemote>,
    pub registry: String,
    pub lock_dir: PathBuf,
    pub dev_build: bool,
}

impl StatusCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let controller = ctx.controller()?;
        let remote = serialize_errors(controller.identify_remote()).await;
        let settings = controller.settings();

        let report = StatusReport {
            version: env!("CARGO_PKG_VERSION"),
            environment: ctx.environment,
            source_root: ctx.source_root.clone(),
            remote_name: settings.remote.clone(),
            remote,
            registry: ctx.config.registry.base_url.clone(),
            lock_dir: settings.lock_dir.clone(),
            dev_build: settings.dev_build,
        };

        // An unresolvable remote is part of the status, not a failure of it
        if ctx.json() {
            ctx.report(Outcome::Success { value: report })?;
            return Ok(());
        }

        println!("{} {}", "tagsync".bold(), report.version);
        println!("  {:<12} {}", "environment:", report.environment);
        println!("  {:<12} {}", "source root:", report.source_root.display());
        match &report.remote {
            Outcome::Success { value } => {
                println!("  {:<12} {} ({})", "remote:", report.remote_name, value.web_url.cyan());
            }
            Outcome::Failure(payload) => {
                println!("  {:<12} {} ({})", "remote:", report.remote_name, payload.message.red());
            }
        }
        println!("  {:<12} {}", "registry:", report.registry);
        println!("  {:<12} {}", "lock dir:", report.lock_dir.display());
        if report.dev_build {
            println!("  {:<12} {}", "build mode:", "development".yellow());
        }
        Ok(())
    }
}
