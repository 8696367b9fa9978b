//! Command implementations

mod add;
mod config;
mod device_id;
mod directions;
mod list;
mod nearby;
mod nearest;
mod report;

use crate::cli::{Cli, Commands};
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use crate::output_types::{ToiletOutput, ToiletRow};
use anyhow::Result;
use bathroom_engine::Notice;
use tokio::sync::broadcast;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config = load_config(cli.config.as_deref(), cli.overrides())?;

    match cli.command {
        Commands::Nearby(args) => nearby::execute(args, &config, &output).await,
        Commands::Nearest(args) => nearest::execute(args, &config, &output).await,
        Commands::Add(args) => add::execute(args, &config, &output).await,
        Commands::Report(args) => report::execute(args, &config, &output).await,
        Commands::List(args) => list::execute(args, &config, &output).await,
        Commands::Config => config::execute(&config, &output),
        Commands::DeviceId => device_id::execute(&config, &output).await,
        Commands::Directions(args) => directions::execute(args, &config, &output).await,
    }
}

/// Show any notices the engine raised while the command ran
fn show_notices(notices: &mut broadcast::Receiver<Notice>, output: &OutputWriter) {
    while let Ok(notice) = notices.try_recv() {
        match notice {
            Notice::WriteFailed { reason, .. } => output.warning(format!("Could not add restroom: {}", reason)),
            Notice::ReportFailed { toilet_id, reason } => {
                output.warning(format!("Could not report {}: {}", toilet_id, reason))
            }
            Notice::LocationDenied => output.warning("Location unavailable; nearest restroom cannot be shown"),
        }
    }
}

fn print_toilets(toilets: &[ToiletOutput], output: &OutputWriter) {
    output.table(toilets.iter().map(ToiletRow::from).collect());
}
