//! tagsync CLI entry point
//!
//! Parses arguments, runs the subcommand, and renders failures with
//! suggestions:
//! - `repo` - show the canonical remote repository
//! - `check` - check for a newer release
//! - `update` - switch to the latest release, optionally rebuilding
//! - `build` - rebuild the application
//! - `status` - show the detected environment and checkout

use anyhow::Result;
use clap::Parser;
use tagsync::cli;
use tagsync::core::error::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
