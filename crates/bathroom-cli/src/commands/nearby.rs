//! Nearby command implementation

use crate::cli::NearbyArgs;
use crate::output::OutputWriter;
use crate::output_types::{NearbyOutput, ToiletOutput};
use crate::wiring;
use anyhow::{Context, Result};
use bathroom_core::config::LayeredConfig;
use bathroom_core::geodesy::haversine_distance;
use bathroom_core::models::{Coordinates, ViewWindow};
use bathroom_engine::FetchOutcome;
use chrono::Utc;

pub async fn execute(args: NearbyArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let center = Coordinates::new(args.position.lat, args.position.lng)?;
    let window = ViewWindow::new(center, args.delta, args.delta).context("Invalid search area")?;

    let engine = wiring::engine(config).await?;
    engine.set_view_window(window);
    let outcome = engine.refresh().await;
    engine.flush_cache().await;

    let fetch = match outcome {
        FetchOutcome::Merged(stats) => format!("{} new, {} updated", stats.added, stats.replaced),
        FetchOutcome::SpanTooWide => {
            output.warning(format!(
                "Area of {}° is wider than {}°; showing cached restrooms only",
                window.span(),
                engine.settings().max_span_degrees
            ));
            "skipped".to_string()
        }
        FetchOutcome::NoWindow => "skipped".to_string(),
    };

    let now = Utc::now();
    let mut toilets: Vec<ToiletOutput> = engine
        .snapshot()
        .iter()
        .filter(|t| window.contains(&t.coordinates))
        .map(|t| {
            let distance = haversine_distance(center, t.coordinates).round() as u64;
            ToiletOutput::new(t, engine.visual_status(t, now), now, Some(distance))
        })
        .collect();
    toilets.sort_by_key(|t| t.distance_meters);

    if output.is_json() {
        output.result(NearbyOutput { window, fetch, toilets })?;
    } else {
        output.section(format!("Restrooms near {:.5}, {:.5}", center.latitude, center.longitude));
        output.kv("Fetch", &fetch);
        super::print_toilets(&toilets, output);
    }

    Ok(())
}
