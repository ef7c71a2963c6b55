use crate::api::DEFAULT_IP_ENDPOINT;
use crate::models::PositionOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub const CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub location: LocationConfig,
    pub strategies: StrategiesConfig,
    pub ui: UiConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SensorBackend {
    Gpsd,   // Local gpsd daemon
    Static, // Fixed static_lat/static_lon
    None,   // No device location at all
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct LocationConfig {
    pub backend: SensorBackend,
    pub gpsd_addr: String,
    pub static_lat: f64,
    pub static_lon: f64,
    pub allow_device_location: bool, // Behaves like a denied permission if false
    pub low_accuracy_fallback: bool, // Retry the device at low accuracy before IP lookup
    pub ip_endpoint: String,
    pub ip_timeout_secs: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            backend: SensorBackend::Gpsd,
            gpsd_addr: "127.0.0.1:2947".to_string(),
            static_lat: 37.7749,
            static_lon: -122.4194,
            allow_device_location: true,
            low_accuracy_fallback: true,
            ip_endpoint: DEFAULT_IP_ENDPOINT.to_string(),
            ip_timeout_secs: 10,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct StrategiesConfig {
    pub high_accuracy: StrategyConfig,
    pub low_accuracy: StrategyConfig,
}

impl Default for StrategiesConfig {
    fn default() -> Self {
        Self {
            high_accuracy: StrategyConfig::from_options(&PositionOptions::HIGH_ACCURACY),
            low_accuracy: StrategyConfig::from_options(&PositionOptions::LOW_ACCURACY),
        }
    }
}

/// Per-strategy overrides. A key left out of the table keeps the value of
/// the strategy's canonical [`PositionOptions`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(default)]
pub struct StrategyConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_age_ms: Option<u64>,
}

impl StrategyConfig {
    fn from_options(options: &PositionOptions) -> Self {
        Self {
            timeout_ms: Some(options.timeout.as_millis() as u64),
            maximum_age_ms: Some(options.maximum_age.as_millis() as u64),
        }
    }

    pub fn to_options(self, base: PositionOptions) -> PositionOptions {
        PositionOptions {
            timeout: self.timeout_ms.map_or(base.timeout, Duration::from_millis),
            maximum_age: self
                .maximum_age_ms
                .map_or(base.maximum_age, Duration::from_millis),
            ..base
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct UiConfig {
    pub tick_rate_ms: u64,
    pub default_view: String, // "Summary" or "Map"
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: 150,
            default_view: "Summary".to_string(),
        }
    }
}

impl Config {
    /// Loads config.toml from the root directory.
    /// If it doesn't exist, creates a default one.
    pub fn load() -> Self {
        Self::load_or_create(CONFIG_PATH)
    }

    pub fn load_or_create(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if path.exists() {
            match Self::read(path) {
                Ok(config) => return config,
                Err(e) => {
                    warn!("Failed to load {}: {}. Using defaults.", path.display(), e);
                    return Config::default();
                }
            }
        }

        // Save default config to disk for the user to edit later
        let default_config = Config::default();
        if let Err(e) = default_config.write(path) {
            warn!("Could not write default {} to disk: {}", path.display(), e);
        }

        info!("Loaded default configuration.");
        default_config
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn high_accuracy_options(&self) -> PositionOptions {
        self.strategies
            .high_accuracy
            .to_options(PositionOptions::HIGH_ACCURACY)
    }

    pub fn low_accuracy_options(&self) -> PositionOptions {
        self.strategies
            .low_accuracy
            .to_options(PositionOptions::LOW_ACCURACY)
    }
}
