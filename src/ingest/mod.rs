//! Reading ingestion from public air-quality APIs
//!
//! - [`WaqiClient`]: current conditions for a city (one reading per call)
//! - [`OpenMeteoClient`]: hourly history for a coordinate (backfill)
//!
//! Payload parsing is split from the HTTP call so it can be tested offline.

mod open_meteo;
mod waqi;

pub use open_meteo::{parse_air_quality, OpenMeteoClient, OPEN_METEO_URL, PM25_TO_AQI};
pub use waqi::{parse_feed, WaqiClient, WAQI_BASE_URL};

use crate::error::{ForecastError, Result};
use std::time::Duration;

/// HTTP client with a request timeout and a short redirect chain
pub fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .redirect(reqwest::redirect::Policy::limited(5))
        .user_agent(concat!("aqi-forecast/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ForecastError::Fetch(format!("Failed to create HTTP client: {}", e)))
}
