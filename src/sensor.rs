//! Device location backends.
//!
//! A [`LocationSensor`] answers one position request at a time, honoring the
//! precision, timeout and cache tolerance in [`PositionOptions`]. The
//! resolver never enforces timeouts itself; each backend owns that.
//!
//! Backends:
//! - [`GpsdSensor`] talks to a local `gpsd` over its JSON line protocol.
//! - [`StaticSensor`] reports fixed coordinates from `config.toml`.
//! - [`DeniedSensor`] stands in when the user has not allowed device location.

use crate::config::{LocationConfig, SensorBackend};
use crate::models::{Coordinates, Position, PositionError, PositionOptions};
use async_trait::async_trait;
use serde::Deserialize;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info};

#[async_trait]
pub trait LocationSensor: Send + Sync {
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<Position, PositionError>;
}

/// Builds the sensor described by `config`, or `None` when the host has no
/// location-sensing capability configured at all.
pub fn from_config(config: &LocationConfig) -> Option<Arc<dyn LocationSensor>> {
    if config.backend == SensorBackend::None {
        return None;
    }
    if !config.allow_device_location {
        info!("Device location not allowed by config; requests will be denied.");
        return Some(Arc::new(DeniedSensor));
    }

    match config.backend {
        SensorBackend::Gpsd => Some(Arc::new(GpsdSensor::new(config.gpsd_addr.clone()))),
        SensorBackend::Static => Some(Arc::new(StaticSensor::new(Coordinates::new(
            config.static_lat,
            config.static_lon,
        )))),
        SensorBackend::None => None,
    }
}

/// Always reports the same coordinates.
pub struct StaticSensor {
    coordinates: Coordinates,
}

impl StaticSensor {
    pub fn new(coordinates: Coordinates) -> Self {
        Self { coordinates }
    }
}

#[async_trait]
impl LocationSensor for StaticSensor {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Position, PositionError> {
        Ok(Position::new(self.coordinates))
    }
}

/// Refuses every request, like a location permission the user has blocked.
pub struct DeniedSensor;

#[async_trait]
impl LocationSensor for DeniedSensor {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Position, PositionError> {
        Err(PositionError::PermissionDenied(
            "device location is disabled (allow_device_location = false)".to_string(),
        ))
    }
}

const WATCH_COMMAND: &[u8] = b"?WATCH={\"enable\":true,\"json\":true};\n";

/// gpsd fix modes: 0/1 no fix, 2 two-dimensional, 3 three-dimensional.
const MODE_2D: u8 = 2;
const MODE_3D: u8 = 3;

#[derive(Debug, Deserialize)]
#[serde(tag = "class")]
enum GpsdReport {
    #[serde(rename = "TPV")]
    Tpv(Tpv),
    #[serde(rename = "DEVICES")]
    Devices {
        #[serde(default)]
        devices: Vec<serde_json::Value>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct Tpv {
    #[serde(default)]
    mode: u8,
    lat: Option<f64>,
    lon: Option<f64>,
    eph: Option<f64>,
    epx: Option<f64>,
    epy: Option<f64>,
}

impl Tpv {
    fn fix(&self, min_mode: u8) -> Option<Fix> {
        if self.mode < min_mode {
            return None;
        }
        let (lat, lon) = (self.lat?, self.lon?);
        let accuracy_m = self.eph.or_else(|| match (self.epx, self.epy) {
            (Some(x), Some(y)) => Some(x.max(y)),
            _ => None,
        });

        let mut position = Position::new(Coordinates::new(lat, lon));
        position.accuracy_m = accuracy_m;
        Some(Fix {
            position,
            mode: self.mode,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Fix {
    position: Position,
    mode: u8,
}

fn parse_report(line: &str) -> Option<GpsdReport> {
    match serde_json::from_str(line) {
        Ok(report) => Some(report),
        Err(e) => {
            debug!("Skipping unparsable gpsd line: {}", e);
            None
        }
    }
}

/// Location from a `gpsd` daemon.
///
/// Each request opens a fresh connection, enables watch mode and reads
/// reports until a TPV fix with the required mode arrives: a 3D fix for
/// high-accuracy requests, 2D or better otherwise. The last fix is kept so
/// requests with a non-zero `maximum_age` can be answered without contacting
/// the daemon.
pub struct GpsdSensor {
    addr: String,
    last_fix: Mutex<Option<Fix>>,
}

impl GpsdSensor {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            last_fix: Mutex::new(None),
        }
    }

    fn cached(&self, min_mode: u8, options: &PositionOptions) -> Option<Position> {
        let fix = (*self.last_fix.lock().unwrap_or_else(PoisonError::into_inner))?;
        // A zero maximum_age never accepts a cached fix.
        let fresh = fix.position.acquired_at.elapsed() < options.maximum_age;
        (fix.mode >= min_mode && fresh).then_some(fix.position)
    }

    fn remember(&self, fix: Fix) {
        *self.last_fix.lock().unwrap_or_else(PoisonError::into_inner) = Some(fix);
    }

    async fn watch_for_fix(&self, min_mode: u8) -> Result<Fix, PositionError> {
        let mut stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|e| position_error(&self.addr, e))?;
        stream
            .write_all(WATCH_COMMAND)
            .await
            .map_err(|e| position_error(&self.addr, e))?;

        let mut lines = BufReader::new(stream).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| position_error(&self.addr, e))?
        {
            match parse_report(&line) {
                Some(GpsdReport::Devices { devices }) if devices.is_empty() => {
                    return Err(PositionError::PositionUnavailable(
                        "gpsd reports no attached GPS devices".to_string(),
                    ));
                }
                Some(GpsdReport::Tpv(tpv)) => {
                    if let Some(fix) = tpv.fix(min_mode) {
                        return Ok(fix);
                    }
                    debug!("gpsd TPV mode {} below required {}", tpv.mode, min_mode);
                }
                _ => {}
            }
        }

        Err(PositionError::PositionUnavailable(
            "gpsd closed the connection before reporting a fix".to_string(),
        ))
    }

}

/// Socket errors talking to gpsd: an OS permission refusal is code 1,
/// anything else means the position is unavailable.
fn position_error(addr: &str, e: io::Error) -> PositionError {
    if e.kind() == io::ErrorKind::PermissionDenied {
        PositionError::PermissionDenied(format!("gpsd at {}: {}", addr, e))
    } else {
        PositionError::PositionUnavailable(format!("gpsd at {}: {}", addr, e))
    }
}

#[async_trait]
impl LocationSensor for GpsdSensor {
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<Position, PositionError> {
        let min_mode = if options.enable_high_accuracy {
            MODE_3D
        } else {
            MODE_2D
        };

        if let Some(position) = self.cached(min_mode, options) {
            debug!("Reusing cached gpsd fix");
            return Ok(position);
        }

        let fix = tokio::time::timeout(options.timeout, self.watch_for_fix(min_mode))
            .await
            .map_err(|_| PositionError::Timeout(options.timeout))??;
        self.remember(fix);
        Ok(fix.position)
    }
}
