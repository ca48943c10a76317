//! Latest-row forecasting

use crate::data::{f64_column, timestamps, value_columns};
use crate::error::{ForecastError, Result};
use crate::features::feature_columns;
use crate::registry::ModelRegistry;
use crate::store::FeatureStore;
use crate::training::FeatureVector;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where the predictor reads its model and features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorConfig {
    pub model_name: String,
    pub feature_group: String,
    pub feature_group_version: u32,
    /// Column order of the vector handed to the model
    pub feature_columns: Vec<String>,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            model_name: "aqi_predictor".to_string(),
            feature_group: "aqi_features".to_string(),
            feature_group_version: 1,
            feature_columns: feature_columns(),
        }
    }
}

/// One forecast per target horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Timestamp of the feature row the forecast starts from
    pub based_on: NaiveDateTime,
    pub targets: Vec<String>,
    pub values: Vec<f64>,
    /// Candidate that produced the model
    pub model: String,
}

impl Forecast {
    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

pub struct Predictor {
    store: Arc<dyn FeatureStore>,
    registry: Arc<dyn ModelRegistry>,
    config: PredictorConfig,
}

impl Predictor {
    pub fn new(store: Arc<dyn FeatureStore>, registry: Arc<dyn ModelRegistry>, config: PredictorConfig) -> Self {
        Self { store, registry, config }
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    /// Forecast from the most recent complete feature row
    pub fn predict(&self) -> Result<Forecast> {
        // Load the model before touching the store
        let artifact = self.registry.load(&self.config.model_name)?;

        let df = match self.store.read(&self.config.feature_group, self.config.feature_group_version) {
            Ok(df) => df,
            Err(ForecastError::TableNotFound { name, version }) => {
                return Err(ForecastError::NoData(format!("feature group {} v{} does not exist", name, version)))
            }
            Err(e) => return Err(e),
        };
        if df.height() == 0 {
            return Err(ForecastError::NoData(format!(
                "feature group {} v{} is empty",
                self.config.feature_group, self.config.feature_group_version
            )));
        }

        if self.config.feature_columns != artifact.feature_columns {
            return Err(ForecastError::FeatureMismatch {
                expected: artifact.feature_columns.clone(),
                actual: self.config.feature_columns.clone(),
            });
        }

        let present = value_columns(&df);
        if let Some(column) = self.config.feature_columns.iter().find(|c| !present.contains(c)) {
            return Err(ForecastError::IncompleteFeatures {
                timestamp: "every row".to_string(),
                column: column.clone(),
            });
        }
        let columns = self
            .config
            .feature_columns
            .iter()
            .map(|c| f64_column(&df, c))
            .collect::<Result<Vec<_>>>()?;

        // Newest row with every feature value present
        let keys = timestamps(&df)?;
        let (row, based_on) = keys
            .iter()
            .copied()
            .enumerate()
            .filter(|&(i, _)| columns.iter().all(|c| c[i].is_some()))
            .max_by_key(|&(_, ts)| ts)
            .ok_or_else(|| {
                ForecastError::NoData(format!(
                    "no complete row in feature group {} v{}",
                    self.config.feature_group, self.config.feature_group_version
                ))
            })?;
        let skipped = keys.iter().filter(|ts| **ts > based_on).count();
        if skipped > 0 {
            warn!(skipped, %based_on, "Newer feature rows are incomplete; forecasting from an older row");
        }
        debug!(row, %based_on, "Selected feature row");

        let values: Vec<f64> = columns.iter().map(|c| c[row].unwrap_or_default()).collect();

        let vector = FeatureVector::new(self.config.feature_columns.clone(), values)?;
        let predictions = artifact.predict(&vector)?;

        info!(
            %based_on,
            model = artifact.candidate(),
            predictions = ?predictions,
            "Generated forecast"
        );

        Ok(Forecast {
            based_on,
            targets: artifact.target_columns.clone(),
            values: predictions,
            model: artifact.candidate().to_string(),
        })
    }

    /// `[1h, 24h, 72h]` forecast
    pub fn predict_three_days(&self) -> Result<[f64; 3]> {
        let forecast = self.predict()?;
        <[f64; 3]>::try_from(forecast.values.as_slice()).map_err(|_| ForecastError::ShapeError {
            expected: "3 horizons".to_string(),
            actual: format!("{} horizons", forecast.values.len()),
        })
    }
}
