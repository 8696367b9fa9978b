//! Add command implementation

use crate::cli::AddArgs;
use crate::output::OutputWriter;
use crate::output_types::AddOutput;
use crate::wiring;
use anyhow::{Context, Result};
use bathroom_core::config::LayeredConfig;
use bathroom_core::models::{Coordinates, ToiletStatus};

pub async fn execute(args: AddArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let coordinates = Coordinates::new(args.position.lat, args.position.lng)?;
    let status = ToiletStatus::from(args.status);

    let engine = wiring::writable_engine(config).await?;
    let mut notices = engine.subscribe_notices();

    let result = engine.add_toilet(coordinates, status, args.accessible).await;
    engine.flush_cache().await;
    super::show_notices(&mut notices, output);

    let id = result.context("Restroom was not added")?;

    if output.is_json() {
        output.result(AddOutput {
            id: id.to_string(),
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
            status,
            is_accessible: args.accessible,
        })?;
    } else {
        output.success(format!("Added restroom {}", id));
    }

    Ok(())
}
