//! Pipeline configuration
//!
//! Built once at process entry. Sources, highest precedence first:
//! environment variables, an optional JSON file, defaults.

use crate::error::{ForecastError, Result};
use crate::features::{FeatureConfig, WindowSemantics};
use crate::inference::PredictorConfig;
use crate::training::TrainingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Environment variables holding the WAQI token, first match wins
const TOKEN_VARS: [&str; 2] = ["AQICN_API_KEY", "API_KEY"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    /// WAQI API token
    pub aqicn_token: Option<String>,
    pub data_dir: PathBuf,
    pub raw_table: String,
    pub feature_group: String,
    pub feature_group_version: u32,
    pub model_dir: PathBuf,
    pub model_name: String,
    /// Days of history requested by `backfill`
    pub backfill_days: u32,
    pub http_timeout_secs: u64,
    pub window: WindowSemantics,
    pub training: TrainingConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            city: "Islamabad".to_string(),
            latitude: 33.72148,
            longitude: 73.04329,
            aqicn_token: None,
            data_dir: PathBuf::from("data"),
            raw_table: "raw_aqi".to_string(),
            feature_group: "aqi_features".to_string(),
            feature_group_version: 1,
            model_dir: PathBuf::from("models"),
            model_name: "aqi_predictor".to_string(),
            backfill_days: 30,
            http_timeout_secs: 30,
            window: WindowSemantics::default(),
            training: TrainingConfig::default(),
        }
    }
}

impl ForecastConfig {
    /// Defaults, then `path` if given, then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        debug!(?config.data_dir, ?config.model_dir, city = %config.city, "Loaded configuration");
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ForecastError::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        serde_json::from_str(&json)
            .map_err(|e| ForecastError::Config(format!("Invalid config {}: {}", path.display(), e)))
    }

    /// Override fields from `AQI_*` variables and the token variables
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("AQI_CITY") {
            self.city = v;
        }
        if let Some(v) = var("AQI_LATITUDE") {
            self.latitude = parse_var("AQI_LATITUDE", &v)?;
        }
        if let Some(v) = var("AQI_LONGITUDE") {
            self.longitude = parse_var("AQI_LONGITUDE", &v)?;
        }
        if let Some(token) = TOKEN_VARS.iter().find_map(|key| var(key)) {
            self.aqicn_token = Some(token);
        }
        if let Some(v) = var("AQI_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = var("AQI_RAW_TABLE") {
            self.raw_table = v;
        }
        if let Some(v) = var("AQI_FEATURE_GROUP") {
            self.feature_group = v;
        }
        if let Some(v) = var("AQI_FEATURE_GROUP_VERSION") {
            self.feature_group_version = parse_var("AQI_FEATURE_GROUP_VERSION", &v)?;
        }
        if let Some(v) = var("AQI_MODEL_DIR") {
            self.model_dir = PathBuf::from(v);
        }
        if let Some(v) = var("AQI_MODEL_NAME") {
            self.model_name = v;
        }
        if let Some(v) = var("AQI_BACKFILL_DAYS") {
            self.backfill_days = parse_var("AQI_BACKFILL_DAYS", &v)?;
        }
        if let Some(v) = var("AQI_HTTP_TIMEOUT_SECS") {
            self.http_timeout_secs = parse_var("AQI_HTTP_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = var("AQI_TEST_FRACTION") {
            self.training.test_fraction = parse_var("AQI_TEST_FRACTION", &v)?;
        }
        if let Some(v) = var("AQI_WINDOW") {
            self.window = match v.as_str() {
                "row_index" => WindowSemantics::RowIndex,
                "wall_clock" | "hourly" => WindowSemantics::hourly(),
                other => {
                    return Err(ForecastError::Config(format!(
                        "AQI_WINDOW must be 'row_index' or 'wall_clock', got '{}'",
                        other
                    )))
                }
            };
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.training.validate()?;
        if self.city.trim().is_empty() {
            return Err(ForecastError::Config("city must not be empty".to_string()));
        }
        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ForecastError::Config(format!(
                "coordinates out of range: {}, {}",
                self.latitude, self.longitude
            )));
        }
        if self.http_timeout_secs == 0 {
            return Err(ForecastError::Config("http_timeout_secs must be positive".to_string()));
        }
        if let WindowSemantics::WallClock { step_minutes: 0 } = self.window {
            return Err(ForecastError::Config("window step must be positive".to_string()));
        }
        Ok(())
    }

    /// The WAQI token, required by `fetch`
    pub fn token(&self) -> Result<&str> {
        self.aqicn_token.as_deref().ok_or_else(|| {
            ForecastError::Config(format!("no WAQI token; set {} or {}", TOKEN_VARS[0], TOKEN_VARS[1]))
        })
    }

    pub fn feature_config(&self) -> FeatureConfig {
        FeatureConfig { window: self.window }
    }

    pub fn predictor_config(&self) -> PredictorConfig {
        PredictorConfig {
            model_name: self.model_name.clone(),
            feature_group: self.feature_group.clone(),
            feature_group_version: self.feature_group_version,
            feature_columns: self.training.feature_columns.clone(),
        }
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ForecastError::Config(format!("{}='{}': {}", key, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ForecastConfig::default();
        assert_eq!(config.city, "Islamabad");
        assert_eq!(config.backfill_days, 30);
        assert_eq!(config.window, WindowSemantics::RowIndex);
        assert!(config.validate().is_ok());
        assert!(config.token().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ForecastConfig::default();
        config
            .apply_env(env(&[
                ("AQI_CITY", "Lahore"),
                ("API_KEY", "fallback"),
                ("AQICN_API_KEY", "primary"),
                ("AQI_FEATURE_GROUP_VERSION", "3"),
                ("AQI_WINDOW", "wall_clock"),
            ]))
            .unwrap();

        assert_eq!(config.city, "Lahore");
        assert_eq!(config.token().unwrap(), "primary");
        assert_eq!(config.feature_group_version, 3);
        assert_eq!(config.window, WindowSemantics::hourly());
    }

    #[test]
    fn test_bad_env_value() {
        let mut config = ForecastConfig::default();
        let err = config.apply_env(env(&[("AQI_BACKFILL_DAYS", "many")])).unwrap_err();
        assert!(matches!(err, ForecastError::Config(ref m) if m.contains("AQI_BACKFILL_DAYS")));
    }

    #[test]
    fn test_file_then_env() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"city": "Karachi", "model_name": "from_file", "training": {{"test_fraction": 0.25}}}}"#
        )
        .unwrap();

        let mut config = ForecastConfig::from_file(file.path()).unwrap();
        config.apply_env(env(&[("AQI_MODEL_NAME", "from_env")])).unwrap();

        assert_eq!(config.city, "Karachi");
        assert_eq!(config.model_name, "from_env");
        assert_eq!(config.training.test_fraction, 0.25);
        assert_eq!(config.training.candidates.len(), 3);
        assert_eq!(config.latitude, 33.72148);
    }

    #[test]
    fn test_validation_rejects_bad_fraction() {
        let mut config = ForecastConfig::default();
        config.training.test_fraction = 0.0;
        assert!(matches!(config.validate(), Err(ForecastError::Config(_))));
    }
}
