//! List command implementation

use crate::cli::ListArgs;
use crate::output::OutputWriter;
use crate::output_types::{ListOutput, ToiletOutput};
use crate::wiring;
use anyhow::Result;
use bathroom_core::config::LayeredConfig;
use chrono::Utc;

pub async fn execute(args: ListArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let engine = wiring::engine(config).await?;
    let now = Utc::now();

    let toilets: Vec<ToiletOutput> = engine
        .snapshot()
        .iter()
        .map(|t| {
            let status = if args.raw { t.status } else { engine.visual_status(t, now) };
            ToiletOutput::new(t, status, now, None)
        })
        .collect();

    if output.is_json() {
        output.result(ListOutput { count: toilets.len(), toilets })?;
    } else {
        output.section(format!("Cached restrooms ({})", toilets.len()));
        super::print_toilets(&toilets, output);
    }

    Ok(())
}
