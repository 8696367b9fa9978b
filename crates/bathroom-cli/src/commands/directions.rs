//! Directions command implementation

use crate::cli::{DirectionsArgs, Platform};
use crate::output::OutputWriter;
use crate::output_types::DirectionsOutput;
use crate::wiring;
use anyhow::{anyhow, Result};
use bathroom_core::config::LayeredConfig;
use bathroom_core::geodesy::{directions_url, MapPlatform};
use bathroom_core::models::ToiletId;

pub async fn execute(args: DirectionsArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let engine = wiring::engine(config).await?;
    let id = ToiletId::new(args.id);
    let toilet = engine.get(&id).ok_or_else(|| anyhow!("Unknown restroom '{}'", id))?;

    let platform = match args.platform {
        Platform::Ios => MapPlatform::Ios,
        Platform::Android => MapPlatform::Android,
    };
    let url = directions_url(platform, toilet.coordinates);

    if output.is_json() {
        output.result(DirectionsOutput { id: id.to_string(), url })?;
    } else {
        println!("{}", url);
    }

    Ok(())
}
