//! Bathroom Now CLI - Command-line interface
//!
//! Finds nearby public restrooms, reports their status and adds new ones.

mod cli;
mod commands;
mod config_loader;
mod output;
mod output_types;
mod wiring;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

fn main() -> Result<()> {
    // Logs go to stderr so that --json output stays parseable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(commands::execute(cli))?;

    Ok(())
}
