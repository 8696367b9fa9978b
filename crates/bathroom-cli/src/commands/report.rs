//! Report command implementation

use crate::cli::ReportArgs;
use crate::output::OutputWriter;
use crate::output_types::ReportOutput;
use crate::wiring;
use anyhow::{Context, Result};
use bathroom_core::config::LayeredConfig;
use bathroom_core::models::{Coordinates, ToiletId};

pub async fn execute(args: ReportArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let location = Coordinates::new(args.position.lat, args.position.lng)?;
    let toilet_id = ToiletId::new(args.id);

    let engine = wiring::writable_engine(config).await?;
    let mut notices = engine.subscribe_notices();

    let result = engine.report_status(&toilet_id, args.status, location).await;
    engine.flush_cache().await;
    super::show_notices(&mut notices, output);

    let report_id = result.context("Report was not submitted")?;

    if output.is_json() {
        output.result(ReportOutput {
            report_id: report_id.to_string(),
            toilet_id: toilet_id.to_string(),
            status: args.status.to_string(),
        })?;
    } else {
        output.success(format!("Reported {} as {}", toilet_id, args.status));
    }

    Ok(())
}
