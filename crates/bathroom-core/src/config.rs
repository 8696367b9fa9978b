use crate::error::{BathroomError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default public Overpass endpoint
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for Bathroom Now
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// Quiet period after the last window change before fetching
    pub debounce_ms: ConfigValue<u64>,
    /// Windows wider than this (degrees) are never fetched
    pub max_span_degrees: ConfigValue<f64>,
    /// Age after which a reported status is shown as unknown
    pub freshness_hours: ConfigValue<u32>,
    pub overpass_url: ConfigValue<String>,
    pub cache_path: ConfigValue<PathBuf>,
    pub device_store_path: ConfigValue<PathBuf>,
    pub firestore_project: ConfigValue<Option<String>>,
    pub firestore_api_key: ConfigValue<Option<String>>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            debounce_ms: ConfigValue::new(1000, ConfigSource::Default),
            max_span_degrees: ConfigValue::new(0.1, ConfigSource::Default),
            freshness_hours: ConfigValue::new(6, ConfigSource::Default),
            overpass_url: ConfigValue::new(DEFAULT_OVERPASS_URL.to_string(), ConfigSource::Default),
            cache_path: ConfigValue::new(PathBuf::from("bathroom.db"), ConfigSource::Default),
            device_store_path: ConfigValue::new(
                PathBuf::from("bathroom-device.json"),
                ConfigSource::Default,
            ),
            firestore_project: ConfigValue::new(None, ConfigSource::Default),
            firestore_api_key: ConfigValue::new(None, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| BathroomError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| BathroomError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(debounce_ms) = file_config.debounce_ms {
            self.debounce_ms.update(debounce_ms, ConfigSource::File);
        }

        if let Some(max_span) = file_config.max_span_degrees {
            self.max_span_degrees.update(validate_span(max_span)?, ConfigSource::File);
        }

        if let Some(hours) = file_config.freshness_hours {
            self.freshness_hours.update(validate_freshness(hours)?, ConfigSource::File);
        }

        if let Some(url) = file_config.overpass_url {
            self.overpass_url.update(url, ConfigSource::File);
        }

        if let Some(path) = file_config.cache_path {
            self.cache_path.update(path, ConfigSource::File);
        }

        if let Some(path) = file_config.device_store_path {
            self.device_store_path.update(path, ConfigSource::File);
        }

        if let Some(project) = file_config.firestore_project {
            self.firestore_project.update(Some(project), ConfigSource::File);
        }

        if let Some(key) = file_config.firestore_api_key {
            self.firestore_api_key.update(Some(key), ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // BATHROOM_DEBOUNCE_MS
        if let Ok(value) = env::var("BATHROOM_DEBOUNCE_MS") {
            match value.parse::<u64>() {
                Ok(ms) => self.debounce_ms.update(ms, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid BATHROOM_DEBOUNCE_MS value '{}': expected milliseconds",
                    value
                ),
            }
        }

        // BATHROOM_MAX_SPAN_DEGREES
        if let Ok(value) = env::var("BATHROOM_MAX_SPAN_DEGREES") {
            match value.parse::<f64>().ok().and_then(|v| validate_span(v).ok()) {
                Some(span) => self.max_span_degrees.update(span, ConfigSource::Environment),
                None => tracing::warn!(
                    "Invalid BATHROOM_MAX_SPAN_DEGREES value '{}': expected positive degrees",
                    value
                ),
            }
        }

        // BATHROOM_FRESHNESS_HOURS
        if let Ok(value) = env::var("BATHROOM_FRESHNESS_HOURS") {
            match value.parse::<u32>().ok().filter(|h| *h > 0) {
                Some(hours) => self.freshness_hours.update(hours, ConfigSource::Environment),
                None => tracing::warn!(
                    "Invalid BATHROOM_FRESHNESS_HOURS value '{}': expected positive whole hours",
                    value
                ),
            }
        }

        if let Ok(url) = env::var("BATHROOM_OVERPASS_URL") {
            self.overpass_url.update(url, ConfigSource::Environment);
        }

        if let Ok(path) = env::var("BATHROOM_CACHE_PATH") {
            self.cache_path.update(PathBuf::from(path), ConfigSource::Environment);
        }

        if let Ok(path) = env::var("BATHROOM_DEVICE_STORE_PATH") {
            self.device_store_path.update(PathBuf::from(path), ConfigSource::Environment);
        }

        if let Ok(project) = env::var("BATHROOM_FIRESTORE_PROJECT") {
            self.firestore_project.update(Some(project), ConfigSource::Environment);
        }

        if let Ok(key) = env::var("BATHROOM_FIRESTORE_API_KEY") {
            self.firestore_api_key.update(Some(key), ConfigSource::Environment);
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(debounce_ms) = overrides.debounce_ms {
            self.debounce_ms.update(debounce_ms, ConfigSource::Cli);
        }

        if let Some(max_span) = overrides.max_span_degrees {
            self.max_span_degrees.update(max_span, ConfigSource::Cli);
        }

        if let Some(hours) = overrides.freshness_hours {
            self.freshness_hours.update(hours, ConfigSource::Cli);
        }

        if let Some(path) = overrides.cache_path {
            self.cache_path.update(path, ConfigSource::Cli);
        }
    }

    /// Firestore project id, required for remote writes
    pub fn require_firestore_project(&self) -> Result<&str> {
        self.firestore_project
            .value
            .as_deref()
            .ok_or_else(|| BathroomError::ConfigMissing { key: "firestore_project".to_string() })
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "debounce_ms".to_string(),
            (self.debounce_ms.value.to_string(), self.debounce_ms.source),
        );

        map.insert(
            "max_span_degrees".to_string(),
            (self.max_span_degrees.value.to_string(), self.max_span_degrees.source),
        );

        map.insert(
            "freshness_hours".to_string(),
            (self.freshness_hours.value.to_string(), self.freshness_hours.source),
        );

        map.insert(
            "overpass_url".to_string(),
            (self.overpass_url.value.clone(), self.overpass_url.source),
        );

        map.insert(
            "cache_path".to_string(),
            (self.cache_path.value.display().to_string(), self.cache_path.source),
        );

        map.insert(
            "device_store_path".to_string(),
            (self.device_store_path.value.display().to_string(), self.device_store_path.source),
        );

        map.insert(
            "firestore_project".to_string(),
            (
                self.firestore_project.value.clone().unwrap_or_else(|| "(unset)".to_string()),
                self.firestore_project.source,
            ),
        );

        // Never echo the key itself
        let api_key = match self.firestore_api_key.value {
            Some(_) => "(set)",
            None => "(unset)",
        };
        map.insert(
            "firestore_api_key".to_string(),
            (api_key.to_string(), self.firestore_api_key.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    debounce_ms: Option<u64>,
    max_span_degrees: Option<f64>,
    freshness_hours: Option<u32>,
    overpass_url: Option<String>,
    cache_path: Option<PathBuf>,
    device_store_path: Option<PathBuf>,
    firestore_project: Option<String>,
    firestore_api_key: Option<String>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub debounce_ms: Option<u64>,
    pub max_span_degrees: Option<f64>,
    pub freshness_hours: Option<u32>,
    pub cache_path: Option<PathBuf>,
}

/// Check a span threshold in degrees
pub fn validate_span(degrees: f64) -> Result<f64> {
    if degrees.is_finite() && degrees > 0.0 {
        Ok(degrees)
    } else {
        Err(BathroomError::ConfigInvalid {
            key: "max_span_degrees".to_string(),
            reason: format!("{} is not a positive number of degrees", degrees),
        })
    }
}

/// Check a freshness threshold in hours
pub fn validate_freshness(hours: u32) -> Result<u32> {
    if hours > 0 {
        Ok(hours)
    } else {
        Err(BathroomError::ConfigInvalid {
            key: "freshness_hours".to_string(),
            reason: "must be at least one hour".to_string(),
        })
    }
}
