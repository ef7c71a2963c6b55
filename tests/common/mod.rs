//! Shared fixtures: a scripted in-memory sensor and IP endpoint helpers.

#![allow(dead_code)]

use async_trait::async_trait;
use geofix_tui::api::IpLocator;
use geofix_tui::models::{Coordinates, Position, PositionError, PositionOptions};
use geofix_tui::sensor::LocationSensor;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Answers requests from a queue and records the options of every call.
pub struct ScriptedSensor {
    answers: Mutex<VecDeque<Result<Position, PositionError>>>,
    pub calls: Mutex<Vec<PositionOptions>>,
}

impl ScriptedSensor {
    pub fn new(answers: Vec<Result<Position, PositionError>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn recorded(&self) -> Vec<PositionOptions> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LocationSensor for ScriptedSensor {
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<Position, PositionError> {
        self.calls.lock().unwrap().push(*options);
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PositionError::PositionUnavailable("script exhausted".into())))
    }
}

pub fn fix(lat: f64, lon: f64) -> Result<Position, PositionError> {
    Ok(Position::new(Coordinates::new(lat, lon)))
}

pub fn denied() -> Result<Position, PositionError> {
    Err(PositionError::PermissionDenied("blocked".into()))
}

pub fn unavailable() -> Result<Position, PositionError> {
    Err(PositionError::PositionUnavailable("no signal".into()))
}

pub fn timed_out() -> Result<Position, PositionError> {
    Err(PositionError::Timeout(Duration::from_secs(10)))
}

pub fn ip_locator(server: &MockServer) -> IpLocator {
    IpLocator::new(format!("{}/json/", server.uri()), Duration::from_secs(5))
        .expect("failed to build test IpLocator")
}

/// Mounts the IP endpoint, asserting on drop that it was hit `times` times.
pub async fn mount_ip(server: &MockServer, response: ResponseTemplate, times: u64) {
    Mock::given(method("GET"))
        .and(path("/json/"))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}

pub fn ip_ok(lat: f64, lon: f64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "ip": "203.0.113.7",
        "city": "Somewhere",
        "latitude": lat,
        "longitude": lon,
    }))
}
