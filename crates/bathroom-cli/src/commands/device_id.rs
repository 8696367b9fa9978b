//! Device id command implementation

use crate::output::OutputWriter;
use crate::output_types::DeviceIdOutput;
use crate::wiring;
use anyhow::Result;
use bathroom_core::config::LayeredConfig;

pub async fn execute(config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let device_id = wiring::device_id(config).await;
    let store = config.device_store_path.value.display().to_string();

    if output.is_json() {
        output.result(DeviceIdOutput { device_id: device_id.to_string(), store })?;
    } else {
        output.kv("Device ID", &device_id);
        output.kv("Stored in", store);
    }

    Ok(())
}
