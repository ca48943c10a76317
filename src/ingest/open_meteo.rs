//! Open-Meteo air-quality history

use crate::data::{parse_timestamp, Reading};
use crate::error::{ForecastError, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

pub const OPEN_METEO_URL: &str = "https://air-quality-api.open-meteo.com/v1/air-quality";

/// AQI proxy: Open-Meteo reports concentrations, not an index
pub const PM25_TO_AQI: f64 = 1.5;

const HOURLY_VARIABLES: &str = "pm2_5,pm10,nitrogen_dioxide,sulphur_dioxide,carbon_monoxide";

#[derive(Debug, Deserialize)]
struct AirQualityResponse {
    hourly: HourlySeries,
}

#[derive(Debug, Deserialize)]
struct HourlySeries {
    time: Vec<String>,
    #[serde(default)]
    pm2_5: Vec<Option<f64>>,
    #[serde(default)]
    pm10: Vec<Option<f64>>,
    #[serde(default)]
    nitrogen_dioxide: Vec<Option<f64>>,
    #[serde(default)]
    sulphur_dioxide: Vec<Option<f64>>,
    #[serde(default)]
    carbon_monoxide: Vec<Option<f64>>,
}

#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: reqwest::Client,
    url: String,
}

impl OpenMeteoClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client, url: OPEN_METEO_URL.to_string() }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Hourly readings for the last `past_days` days
    pub async fn fetch_history(&self, latitude: f64, longitude: f64, past_days: u32) -> Result<Vec<Reading>> {
        debug!(latitude, longitude, past_days, "Fetching Open-Meteo history");

        let body = self
            .client
            .get(&self.url)
            .query(&history_query(latitude, longitude, past_days))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let readings = parse_air_quality(&body)?;
        info!(rows = readings.len(), past_days, "Fetched history");
        Ok(readings)
    }
}

/// Query for measured hours only. Open-Meteo appends forecast days unless
/// `forecast_days` is zero, and those must not be stored as readings.
fn history_query(latitude: f64, longitude: f64, past_days: u32) -> [(&'static str, String); 5] {
    [
        ("latitude", latitude.to_string()),
        ("longitude", longitude.to_string()),
        ("hourly", HOURLY_VARIABLES.to_string()),
        ("past_days", past_days.to_string()),
        ("forecast_days", "0".to_string()),
    ]
}

/// Parse an hourly air-quality response. Hours without pm2.5 are skipped.
pub fn parse_air_quality(body: &str) -> Result<Vec<Reading>> {
    let response: AirQualityResponse = serde_json::from_str(body)
        .map_err(|e| ForecastError::Fetch(format!("Malformed Open-Meteo payload: {}", e)))?;
    let hourly = response.hourly;
    let n = hourly.time.len();

    let series = [
        ("pm2_5", &hourly.pm2_5),
        ("pm10", &hourly.pm10),
        ("nitrogen_dioxide", &hourly.nitrogen_dioxide),
        ("sulphur_dioxide", &hourly.sulphur_dioxide),
        ("carbon_monoxide", &hourly.carbon_monoxide),
    ];
    for (name, values) in &series {
        if !values.is_empty() && values.len() != n {
            return Err(ForecastError::Fetch(format!(
                "Open-Meteo '{}' has {} values for {} hours",
                name,
                values.len(),
                n
            )));
        }
    }
    let value = |values: &Vec<Option<f64>>, i: usize| values.get(i).copied().flatten();

    let mut readings = Vec::with_capacity(n);
    let mut skipped = 0usize;
    for (i, time) in hourly.time.iter().enumerate() {
        let Some(pm25) = value(&hourly.pm2_5, i) else {
            skipped += 1;
            continue;
        };
        let timestamp = parse_timestamp(time)
            .map_err(|e| ForecastError::Fetch(format!("Open-Meteo time '{}': {}", time, e)))?;

        readings.push(Reading::new(timestamp, pm25 * PM25_TO_AQI).with_pollutants([
            Some(pm25),
            value(&hourly.pm10, i),
            value(&hourly.nitrogen_dioxide, i),
            value(&hourly.sulphur_dioxide, i),
            value(&hourly.carbon_monoxide, i),
        ]));
    }

    if skipped > 0 {
        warn!(skipped, "Hours without pm2.5 skipped");
    }
    Ok(readings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_query_excludes_forecast_hours() {
        let query = history_query(33.7, 73.0, 30);
        let get = |key: &str| query.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str());

        assert_eq!(get("past_days"), Some("30"));
        assert_eq!(get("forecast_days"), Some("0"));
        assert_eq!(get("hourly"), Some(HOURLY_VARIABLES));
    }

    #[test]
    fn test_parse_hourly() {
        let body = r#"{
            "latitude": 33.7,
            "longitude": 73.0,
            "hourly": {
                "time": ["2024-10-01T00:00", "2024-10-01T01:00", "2024-10-01T02:00"],
                "pm2_5": [40.0, null, 52.5],
                "pm10": [80.0, 81.0, null],
                "nitrogen_dioxide": [10.0, 11.0, 12.0],
                "sulphur_dioxide": [3.0, 3.0, 3.0],
                "carbon_monoxide": [300.0, 310.0, 320.0]
            }
        }"#;

        let readings = parse_air_quality(body).unwrap();
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].aqi, 60.0);
        assert_eq!(readings[0].pm10, Some(80.0));
        assert_eq!(readings[1].aqi, 52.5 * PM25_TO_AQI);
        assert_eq!(readings[1].pm10, None);
        assert_eq!(readings[1].timestamp.to_string(), "2024-10-01 02:00:00");
    }

    #[test]
    fn test_missing_pollutant_series() {
        let body = r#"{"hourly": {"time": ["2024-10-01T00:00"], "pm2_5": [20.0]}}"#;
        let readings = parse_air_quality(body).unwrap();
        assert_eq!(readings[0].co, None);
        assert_eq!(readings[0].aqi, 30.0);
    }

    #[test]
    fn test_malformed_payload() {
        assert!(matches!(parse_air_quality("{\"error\": true}"), Err(ForecastError::Fetch(_))));
        let ragged = r#"{"hourly": {"time": ["2024-10-01T00:00"], "pm2_5": [1.0, 2.0]}}"#;
        assert!(matches!(parse_air_quality(ragged), Err(ForecastError::Fetch(_))));
    }
}
