//! Value types shared by the resolver, the sensors and the UI.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;

/// A latitude/longitude pair in decimal degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_coords(self.latitude, self.longitude))
    }
}

/// Format coordinates with hemisphere letters, e.g. `59.3293°N, 18.0686°E`.
pub fn format_coords(lat: f64, lon: f64) -> String {
    let ns = if lat >= 0.0 { 'N' } else { 'S' };
    let ew = if lon >= 0.0 { 'E' } else { 'W' };
    format!("{:.4}°{}, {:.4}°{}", lat.abs(), ns, lon.abs(), ew)
}

/// Horizontal accuracy for display, e.g. `±9 m`; unknown when not reported.
pub fn format_accuracy(accuracy_m: Option<f64>) -> String {
    match accuracy_m {
        Some(m) if m < 1000.0 => format!("±{:.0} m", m),
        Some(m) => format!("±{:.1} km", m / 1000.0),
        None => "unknown".to_string(),
    }
}

/// Which strategy of the cascade produced a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationSource {
    HighAccuracy,
    LowAccuracy,
    IpLookup,
}

impl fmt::Display for LocationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HighAccuracy => write!(f, "Device (high accuracy)"),
            Self::LowAccuracy => write!(f, "Device (low accuracy)"),
            Self::IpLookup => write!(f, "IP geolocation"),
        }
    }
}

/// Caller-visible result of a resolution.
///
/// Always replaced as a whole value. `Loading` carries neither coordinates nor
/// an error; a settled state carries exactly one of them.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResolutionState {
    #[default]
    Loading,
    Located {
        coordinates: Coordinates,
        source: LocationSource,
        /// Horizontal error in meters, when the source reports one.
        accuracy_m: Option<f64>,
    },
    Failed(String),
}

impl ResolutionState {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Self::Located { coordinates, .. } => Some(*coordinates),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn source(&self) -> Option<LocationSource> {
        match self {
            Self::Located { source, .. } => Some(*source),
            _ => None,
        }
    }

    pub fn accuracy_m(&self) -> Option<f64> {
        match self {
            Self::Located { accuracy_m, .. } => *accuracy_m,
            _ => None,
        }
    }
}

/// Request shape handed to a [`LocationSensor`](crate::sensor::LocationSensor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    /// Upper bound for acquiring a fresh fix.
    pub timeout: Duration,
    /// Oldest cached fix that may be returned instead of a fresh one.
    pub maximum_age: Duration,
}

impl PositionOptions {
    pub const HIGH_ACCURACY: PositionOptions = PositionOptions {
        enable_high_accuracy: true,
        timeout: Duration::from_millis(10_000),
        maximum_age: Duration::from_millis(300_000),
    };

    pub const LOW_ACCURACY: PositionOptions = PositionOptions {
        enable_high_accuracy: false,
        timeout: Duration::from_millis(15_000),
        maximum_age: Duration::from_millis(600_000),
    };
}

/// A fix reported by a sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub coordinates: Coordinates,
    /// Estimated horizontal error in meters, when the sensor reports one.
    pub accuracy_m: Option<f64>,
    pub acquired_at: Instant,
}

impl Position {
    pub fn new(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            accuracy_m: None,
            acquired_at: Instant::now(),
        }
    }
}

/// Failure of a single device-location request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("position unavailable: {0}")]
    PositionUnavailable(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl PositionError {
    pub const PERMISSION_DENIED: u16 = 1;
    pub const POSITION_UNAVAILABLE: u16 = 2;
    pub const TIMEOUT: u16 = 3;

    /// Numeric code as reported by platform location APIs.
    pub fn code(&self) -> u16 {
        match self {
            Self::PermissionDenied(_) => Self::PERMISSION_DENIED,
            Self::PositionUnavailable(_) => Self::POSITION_UNAVAILABLE,
            Self::Timeout(_) => Self::TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_match_platform_numbering() {
        assert_eq!(PositionError::PermissionDenied("x".into()).code(), 1);
        assert_eq!(PositionError::PositionUnavailable("x".into()).code(), 2);
        assert_eq!(PositionError::Timeout(Duration::from_secs(1)).code(), 3);
    }

    #[test]
    fn state_accessors_are_mutually_exclusive() {
        let located = ResolutionState::Located {
            coordinates: Coordinates::new(1.0, 2.0),
            source: LocationSource::IpLookup,
            accuracy_m: None,
        };
        assert_eq!(located.coordinates(), Some(Coordinates::new(1.0, 2.0)));
        assert!(located.error().is_none());
        assert!(!located.is_loading());

        let failed = ResolutionState::Failed("nope".into());
        assert!(failed.coordinates().is_none());
        assert_eq!(failed.error(), Some("nope"));

        let loading = ResolutionState::default();
        assert!(loading.is_loading());
        assert!(loading.coordinates().is_none() && loading.error().is_none());
    }

    #[test]
    fn format_coords_uses_hemispheres() {
        assert_eq!(format_coords(59.3293, 18.0686), "59.3293°N, 18.0686°E");
        assert_eq!(format_coords(-33.8688, -70.6693), "33.8688°S, 70.6693°W");
    }

    #[test]
    fn format_accuracy_scales_units() {
        assert_eq!(format_accuracy(Some(9.1)), "±9 m");
        assert_eq!(format_accuracy(Some(2500.0)), "±2.5 km");
        assert_eq!(format_accuracy(None), "unknown");
    }
}
