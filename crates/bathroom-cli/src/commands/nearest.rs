//! Nearest command implementation

use crate::cli::NearestArgs;
use crate::output::OutputWriter;
use crate::output_types::{NearestOutput, ToiletOutput};
use crate::wiring;
use anyhow::Result;
use bathroom_core::config::LayeredConfig;
use bathroom_core::models::{Coordinates, ViewWindow};
use bathroom_engine::LocationFix;
use chrono::Utc;

pub async fn execute(args: NearestArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let engine = wiring::engine(config).await?;
    let mut notices = engine.subscribe_notices();

    let fix = match (args.lat, args.lng) {
        (Some(lat), Some(lng)) => LocationFix::Granted(Coordinates::new(lat, lng)?),
        _ => LocationFix::Denied,
    };
    engine.set_location(fix);

    if let (LocationFix::Granted(position), true) = (fix, args.fetch) {
        engine.set_view_window(ViewWindow::around(position)?);
        engine.refresh().await;
        engine.flush_cache().await;
    }

    let now = Utc::now();
    let nearest = engine.nearest_toilet().map(|n| {
        let status = engine.visual_status(&n.toilet, now);
        ToiletOutput::new(&n.toilet, status, now, Some(n.distance_meters))
    });
    super::show_notices(&mut notices, output);

    if output.is_json() {
        output.result(NearestOutput { toilet: nearest })?;
    } else {
        match nearest {
            Some(toilet) => {
                output.section("Nearest restroom");
                super::print_toilets(std::slice::from_ref(&toilet), output);
            }
            None if engine.location().is_some() => output.info("No restrooms known yet; try --fetch"),
            None => {}
        }
    }

    Ok(())
}
