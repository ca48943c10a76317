//! World Air Quality Index current feed

use crate::data::Reading;
use crate::error::{ForecastError, Result};
use chrono::{DurationRound, NaiveDateTime, TimeDelta, Utc};
use serde_json::Value;
use tracing::{debug, info};

pub const WAQI_BASE_URL: &str = "https://api.waqi.info";

/// `iaqi` keys, in [`crate::data::POLLUTANT_COLUMNS`] order
const IAQI_KEYS: [&str; 5] = ["pm25", "pm10", "no2", "so2", "co"];

#[derive(Debug, Clone)]
pub struct WaqiClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl WaqiClient {
    pub fn new(client: reqwest::Client, token: impl Into<String>) -> Self {
        Self {
            client,
            base_url: WAQI_BASE_URL.to_string(),
            token: token.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Current reading for `city`, stamped with the fetch hour
    pub async fn fetch_current(&self, city: &str) -> Result<Reading> {
        let url = format!("{}/feed/{}/", self.base_url.trim_end_matches('/'), city);
        debug!(%url, "Fetching WAQI feed");

        let body: Value = self
            .client
            .get(&url)
            .query(&[("token", self.token.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let reading = parse_feed(&body, Utc::now().naive_utc())?;
        info!(city, timestamp = %reading.timestamp, aqi = reading.aqi, "Fetched current reading");
        Ok(reading)
    }
}

/// Parse a feed response. The timestamp is `fetched_at` truncated to the hour.
pub fn parse_feed(body: &Value, fetched_at: NaiveDateTime) -> Result<Reading> {
    let status = body.get("status").and_then(Value::as_str).unwrap_or("missing");
    if status != "ok" {
        let detail = body.get("data").map(|d| d.to_string()).unwrap_or_default();
        return Err(ForecastError::Fetch(format!("WAQI status '{}': {}", status, detail)));
    }

    let data = body
        .get("data")
        .ok_or_else(|| ForecastError::Fetch("WAQI response has no data".to_string()))?;
    let aqi = data
        .get("aqi")
        .and_then(Value::as_f64)
        .ok_or_else(|| {
            ForecastError::Fetch(format!(
                "WAQI aqi is not numeric: {}",
                data.get("aqi").map(|v| v.to_string()).unwrap_or_else(|| "absent".to_string())
            ))
        })?;

    let iaqi = data.get("iaqi");
    let pollutant = |key: &str| -> Option<f64> { iaqi?.get(key)?.get("v")?.as_f64() };

    let timestamp = fetched_at
        .duration_trunc(TimeDelta::hours(1))
        .map_err(|e| ForecastError::Data(format!("Cannot truncate {}: {}", fetched_at, e)))?;

    Ok(Reading::new(timestamp, aqi).with_pollutants([
        pollutant(IAQI_KEYS[0]),
        pollutant(IAQI_KEYS[1]),
        pollutant(IAQI_KEYS[2]),
        pollutant(IAQI_KEYS[3]),
        pollutant(IAQI_KEYS[4]),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn fetched_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, 5).unwrap().and_hms_opt(14, 37, 12).unwrap()
    }

    #[test]
    fn test_parse_ok_feed() {
        let body = json!({
            "status": "ok",
            "data": {
                "aqi": 162,
                "iaqi": {
                    "pm25": {"v": 162},
                    "pm10": {"v": 71.5},
                    "no2": {"v": 9.2},
                    "o3": {"v": 30},
                    "co": {"v": 4.1}
                }
            }
        });

        let reading = parse_feed(&body, fetched_at()).unwrap();
        assert_eq!(reading.aqi, 162.0);
        assert_eq!(reading.pm25, Some(162.0));
        assert_eq!(reading.pm10, Some(71.5));
        assert_eq!(reading.so2, None);
        assert_eq!(reading.co, Some(4.1));
        assert_eq!(reading.timestamp.to_string(), "2024-11-05 14:00:00");
    }

    #[test]
    fn test_error_status() {
        let body = json!({"status": "error", "data": "Invalid key"});
        let err = parse_feed(&body, fetched_at()).unwrap_err();
        assert!(matches!(err, ForecastError::Fetch(ref m) if m.contains("Invalid key")));
    }

    #[test]
    fn test_non_numeric_aqi() {
        let body = json!({"status": "ok", "data": {"aqi": "-", "iaqi": {}}});
        assert!(matches!(parse_feed(&body, fetched_at()), Err(ForecastError::Fetch(_))));
    }
}
