//! Device location resolution for geofix.
//!
//! [`LocationResolver::resolve`] runs a fixed cascade and always settles into
//! a [`ResolutionState`]:
//!
//! 1. device fix in high-accuracy mode,
//! 2. device fix in low-accuracy mode (can be switched off),
//! 3. IP geolocation over HTTP.
//!
//! Strategies run one after another, never concurrently. Intermediate
//! failures only reach the debug log; the caller sees a single user-facing
//! message chosen from the most recent device error.

use crate::api::{IpLocator, IpLookupError};
use crate::config::Config;
use crate::models::{LocationSource, PositionError, PositionOptions, ResolutionState};
use crate::sensor::{self, LocationSensor};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const NOT_SUPPORTED: &str = "Geolocation is not supported by your browser";
pub const PERMISSION_DENIED: &str =
    "Location permission denied. Please enable location access in your browser settings.";
pub const POSITION_UNAVAILABLE: &str =
    "Location is currently unavailable. Please check your GPS/WiFi connection and try again.";
pub const TIMED_OUT: &str = "Location request timed out. Please try again.";
pub const UNKNOWN_FAILURE: &str =
    "Unable to determine your location. Please enable location services and try again.";

/// Maps a device error code to the message shown after every strategy failed.
pub fn failure_message(code: Option<u16>) -> &'static str {
    match code {
        Some(PositionError::PERMISSION_DENIED) => PERMISSION_DENIED,
        Some(PositionError::POSITION_UNAVAILABLE) => POSITION_UNAVAILABLE,
        Some(PositionError::TIMEOUT) => TIMED_OUT,
        _ => UNKNOWN_FAILURE,
    }
}

pub struct LocationResolver {
    sensor: Option<Arc<dyn LocationSensor>>,
    ip: IpLocator,
    high_accuracy: PositionOptions,
    low_accuracy: Option<PositionOptions>,
}

impl LocationResolver {
    /// A resolver with the canonical strategy options. `sensor` is `None`
    /// when the host has no location-sensing capability.
    pub fn new(sensor: Option<Arc<dyn LocationSensor>>, ip: IpLocator) -> Self {
        Self {
            sensor,
            ip,
            high_accuracy: PositionOptions::HIGH_ACCURACY,
            low_accuracy: Some(PositionOptions::LOW_ACCURACY),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, IpLookupError> {
        let ip = IpLocator::new(
            config.location.ip_endpoint.clone(),
            Duration::from_secs(config.location.ip_timeout_secs),
        )?;
        let low_accuracy = config
            .location
            .low_accuracy_fallback
            .then(|| config.low_accuracy_options());

        Ok(Self::new(sensor::from_config(&config.location), ip)
            .with_high_accuracy(config.high_accuracy_options())
            .with_low_accuracy(low_accuracy))
    }

    pub fn with_high_accuracy(mut self, options: PositionOptions) -> Self {
        self.high_accuracy = options;
        self
    }

    /// `None` skips the low-accuracy strategy entirely.
    pub fn with_low_accuracy(mut self, options: Option<PositionOptions>) -> Self {
        self.low_accuracy = options;
        self
    }

    /// Runs one full cascade. Never fails; every failure path settles into
    /// [`ResolutionState::Failed`].
    pub async fn resolve(&self) -> ResolutionState {
        let Some(sensor) = self.sensor.as_ref() else {
            warn!("No location-sensing capability configured");
            return ResolutionState::Failed(NOT_SUPPORTED.to_string());
        };

        let high_err = match sensor.current_position(&self.high_accuracy).await {
            Ok(position) => {
                info!("High accuracy fix: {}", position.coordinates);
                return ResolutionState::Located {
                    coordinates: position.coordinates,
                    source: LocationSource::HighAccuracy,
                    accuracy_m: position.accuracy_m,
                };
            }
            Err(e) => {
                debug!("High accuracy location failed, trying low accuracy: {}", e);
                e
            }
        };

        let mut low_err = None;
        if let Some(options) = self.low_accuracy.as_ref() {
            match sensor.current_position(options).await {
                Ok(position) => {
                    info!("Low accuracy fix: {}", position.coordinates);
                    return ResolutionState::Located {
                        coordinates: position.coordinates,
                        source: LocationSource::LowAccuracy,
                        accuracy_m: position.accuracy_m,
                    };
                }
                Err(e) => {
                    debug!("Low accuracy location failed, trying IP lookup: {}", e);
                    low_err = Some(e);
                }
            }
        }

        match self.ip.locate().await {
            Ok(coordinates) => {
                info!("IP geolocation fix: {}", coordinates);
                return ResolutionState::Located {
                    coordinates,
                    source: LocationSource::IpLookup,
                    accuracy_m: None,
                };
            }
            Err(e) => debug!("IP geolocation via {} failed: {}", self.ip.endpoint(), e),
        }

        let relevant = low_err.as_ref().unwrap_or(&high_err);
        warn!("All location strategies failed; last device error: {}", relevant);
        ResolutionState::Failed(failure_message(Some(relevant.code())).to_string())
    }
}
