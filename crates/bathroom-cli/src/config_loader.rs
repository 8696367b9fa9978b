//! Configuration loading for CLI commands

use anyhow::{Context, Result};
use bathroom_core::config::{CliConfigOverrides, LayeredConfig};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "bathroom.toml";

/// Load defaults, then the config file, then the environment, then CLI overrides
///
/// An explicitly named file must exist; the implicit one is optional.
pub fn load_config(explicit: Option<&Path>, overrides: CliConfigOverrides) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    let file = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.is_file()),
    };
    if let Some(path) = file {
        config = config
            .load_from_file(&path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
    }

    let mut config = config.load_from_env();
    config.update_from_cli(overrides);
    Ok(config)
}
