use crate::models::Coordinates;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_IP_ENDPOINT: &str = "https://ipapi.co/json/";

// ipapi.co throttles requests that carry no User-Agent.
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum IpLookupError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service rejected the lookup: {0}")]
    Rejected(String),
    #[error("response has no latitude/longitude")]
    MissingCoordinates,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

/// Approximate location from the caller's public IP address.
pub struct IpLocator {
    client: Client,
    endpoint: String,
}

impl IpLocator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, IpLookupError> {
        Ok(Self {
            client: Client::builder()
                .timeout(timeout)
                .user_agent(USER_AGENT)
                .build()?,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn locate(&self) -> Result<Coordinates, IpLookupError> {
        let res = self
            .client
            .get(&self.endpoint)
            .send()
            .await?
            .error_for_status()?
            .json::<IpApiResponse>()
            .await?;

        // Coordinates win over the error flag when both are present.
        match (res.latitude, res.longitude) {
            (Some(lat), Some(lon)) => Ok(Coordinates::new(lat, lon)),
            _ if res.error => Err(IpLookupError::Rejected(
                res.reason.unwrap_or_else(|| "unknown".to_string()),
            )),
            _ => Err(IpLookupError::MissingCoordinates),
        }
    }
}
