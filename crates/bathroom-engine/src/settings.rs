use bathroom_core::config::LayeredConfig;
use bathroom_core::status::DEFAULT_FRESHNESS_HOURS;
use std::time::Duration;

/// Tunables of the reconciliation engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    /// Quiet period after the last window change before fetching
    pub debounce: Duration,

    /// Windows wider than this (in degrees) are never fetched
    pub max_span_degrees: f64,

    /// Age after which a stored status is displayed as unknown
    pub freshness: chrono::Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(1000),
            max_span_degrees: 0.1,
            freshness: chrono::Duration::hours(DEFAULT_FRESHNESS_HOURS),
        }
    }
}

impl From<&LayeredConfig> for EngineSettings {
    fn from(config: &LayeredConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.debounce_ms.value),
            max_span_degrees: config.max_span_degrees.value,
            freshness: chrono::Duration::hours(i64::from(config.freshness_hours.value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bathroom_core::config::CliConfigOverrides;

    #[test]
    fn test_defaults_match_config_defaults() {
        let from_config = EngineSettings::from(&LayeredConfig::with_defaults());
        assert_eq!(from_config, EngineSettings::default());
    }

    #[test]
    fn test_from_config_overrides() {
        let mut config = LayeredConfig::with_defaults();
        config.update_from_cli(CliConfigOverrides {
            debounce_ms: Some(250),
            max_span_degrees: Some(0.5),
            freshness_hours: Some(2),
            ..Default::default()
        });

        let settings = EngineSettings::from(&config);
        assert_eq!(settings.debounce, Duration::from_millis(250));
        assert_eq!(settings.max_span_degrees, 0.5);
        assert_eq!(settings.freshness, chrono::Duration::hours(2));
    }
}
