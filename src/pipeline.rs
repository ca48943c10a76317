//! End-to-end pipeline stages
//!
//! Each stage reads its inputs from the store or registry, does its work and
//! persists the result, so stages can run as separate processes:
//!
//! fetch / backfill → raw table → push_features → feature group → train → registry → predict

use crate::config::ForecastConfig;
use crate::data::{frame_to_readings, readings_to_frame, Reading};
use crate::error::{ForecastError, Result};
use crate::features::FeatureBuilder;
use crate::inference::{Forecast, Predictor};
use crate::ingest::{http_client, OpenMeteoClient, WaqiClient};
use crate::registry::{LocalModelRegistry, ModelCard, ModelRegistry};
use crate::store::{FeatureStore, LocalFeatureStore};
use crate::training::{ModelTrainer, TrainingReport};
use std::sync::Arc;
use tracing::{info, warn};

/// Version of the raw readings table
pub const RAW_TABLE_VERSION: u32 = 1;

/// Row counts and current model, for `status`
#[derive(Debug, Clone)]
pub struct PipelineStatus {
    pub raw_rows: Option<usize>,
    pub feature_rows: Option<usize>,
    pub model: Option<ModelCard>,
}

pub struct Pipeline {
    config: ForecastConfig,
    store: Arc<dyn FeatureStore>,
    registry: Arc<dyn ModelRegistry>,
}

impl Pipeline {
    pub fn new(config: ForecastConfig, store: Arc<dyn FeatureStore>, registry: Arc<dyn ModelRegistry>) -> Self {
        Self { config, store, registry }
    }

    /// CSV tables under `data_dir`, models under `model_dir`
    pub fn local(config: ForecastConfig) -> Self {
        let store = Arc::new(LocalFeatureStore::new(config.data_dir.clone()));
        let registry = Arc::new(LocalModelRegistry::new(config.model_dir.clone()));
        Self::new(config, store, registry)
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn FeatureStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<dyn ModelRegistry> {
        &self.registry
    }

    /// Upsert raw readings; returns the raw table's size afterwards
    pub fn ingest_readings(&self, readings: &[Reading]) -> Result<usize> {
        if readings.is_empty() {
            warn!("No readings to ingest");
            return self.table_rows(&self.config.raw_table, RAW_TABLE_VERSION).map(|n| n.unwrap_or(0));
        }
        let frame = readings_to_frame(readings)?;
        let total = self.store.write(&self.config.raw_table, RAW_TABLE_VERSION, &frame)?;
        info!(table = %self.config.raw_table, incoming = readings.len(), total, "Ingested readings");
        Ok(total)
    }

    /// Poll the WAQI feed once and store the reading
    pub async fn fetch_current(&self) -> Result<Reading> {
        let client = WaqiClient::new(http_client(self.config.http_timeout_secs)?, self.config.token()?);
        let reading = client.fetch_current(&self.config.city).await?;
        self.ingest_readings(std::slice::from_ref(&reading))?;
        Ok(reading)
    }

    /// Pull `backfill_days` of hourly history from Open-Meteo and store it
    pub async fn backfill(&self) -> Result<usize> {
        let client = OpenMeteoClient::new(http_client(self.config.http_timeout_secs)?);
        let readings = client
            .fetch_history(self.config.latitude, self.config.longitude, self.config.backfill_days)
            .await?;
        info!(readings = readings.len(), days = self.config.backfill_days, "Fetched history");
        self.ingest_readings(&readings)?;
        Ok(readings.len())
    }

    /// Rebuild features from the raw table and upsert them into the feature
    /// group. Returns the number of feature rows built.
    pub fn push_features(&self) -> Result<usize> {
        let raw = match self.store.read(&self.config.raw_table, RAW_TABLE_VERSION) {
            Ok(df) => df,
            Err(ForecastError::TableNotFound { name, .. }) => {
                return Err(ForecastError::NoData(format!("raw table {} does not exist", name)))
            }
            Err(e) => return Err(e),
        };
        let readings = frame_to_readings(&raw)?;

        let builder = FeatureBuilder::new(self.config.feature_config());
        let frame = builder.build_frame(&readings)?;
        if frame.height() == 0 {
            warn!(readings = readings.len(), "Not enough history for any feature row");
            return Ok(0);
        }

        let total = self
            .store
            .write(&self.config.feature_group, self.config.feature_group_version, &frame)?;
        info!(
            group = %self.config.feature_group,
            version = self.config.feature_group_version,
            built = frame.height(),
            total,
            "Pushed features"
        );
        Ok(frame.height())
    }

    /// Train on the feature group and register the champion
    pub fn train(&self) -> Result<(TrainingReport, ModelCard)> {
        let df = self
            .store
            .read(&self.config.feature_group, self.config.feature_group_version)?;
        let report = ModelTrainer::new(self.config.training.clone()).train(&df)?;

        let description = format!(
            "{} forecast of AQI at 1h, 24h and 72h for {}",
            report.champion(),
            self.config.city
        );
        let card = ModelCard::for_artifact(&self.config.model_name, &report.artifact, description);
        let card = self.registry.save(&report.artifact, card)?;
        info!(model = %card.name, version = card.version, candidate = %card.candidate, "Registered model");

        Ok((report, card))
    }

    pub fn predictor(&self) -> Predictor {
        Predictor::new(self.store.clone(), self.registry.clone(), self.config.predictor_config())
    }

    pub fn predict(&self) -> Result<Forecast> {
        self.predictor().predict()
    }

    pub fn status(&self) -> Result<PipelineStatus> {
        let raw_rows = self.table_rows(&self.config.raw_table, RAW_TABLE_VERSION)?;
        let feature_rows = self.table_rows(&self.config.feature_group, self.config.feature_group_version)?;
        let model = match self.registry.card(&self.config.model_name) {
            Ok(card) => Some(card),
            Err(ForecastError::ModelNotFound(_)) => None,
            Err(e) => return Err(e),
        };
        Ok(PipelineStatus { raw_rows, feature_rows, model })
    }

    fn table_rows(&self, name: &str, version: u32) -> Result<Option<usize>> {
        if !self.store.exists(name, version) {
            return Ok(None);
        }
        Ok(Some(self.store.read(name, version)?.height()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::InMemoryModelRegistry;
    use crate::store::InMemoryFeatureStore;
    use chrono::{Duration, NaiveDate};

    fn pipeline() -> Pipeline {
        Pipeline::new(
            ForecastConfig::default(),
            Arc::new(InMemoryFeatureStore::new()),
            Arc::new(InMemoryModelRegistry::new()),
        )
    }

    fn hourly(n: usize, aqi: f64) -> Vec<Reading> {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                Reading::new(start + Duration::hours(i as i64), aqi)
                    .with_pollutants([Some(20.0), Some(40.0), Some(8.0), Some(2.0), Some(250.0)])
            })
            .collect()
    }

    #[test]
    fn test_ingest_upserts_by_timestamp() {
        let p = pipeline();
        assert_eq!(p.ingest_readings(&hourly(10, 50.0)).unwrap(), 10);
        assert_eq!(p.ingest_readings(&hourly(12, 60.0)).unwrap(), 12);
        assert_eq!(p.ingest_readings(&[]).unwrap(), 12);
    }

    #[test]
    fn test_push_features_without_raw_table() {
        let err = pipeline().push_features().unwrap_err();
        assert!(matches!(err, ForecastError::NoData(_)));
    }

    #[test]
    fn test_push_features_short_history() {
        let p = pipeline();
        p.ingest_readings(&hourly(50, 50.0)).unwrap();
        assert_eq!(p.push_features().unwrap(), 0);
        assert!(p.status().unwrap().feature_rows.is_none());
    }

    #[test]
    fn test_push_features_constant_series() {
        let p = pipeline();
        p.ingest_readings(&hourly(100, 50.0)).unwrap();
        // 100 readings: rows 2..=27 have rolling history and a 72h target
        assert_eq!(p.push_features().unwrap(), 26);

        let status = p.status().unwrap();
        assert_eq!(status.raw_rows, Some(100));
        assert_eq!(status.feature_rows, Some(26));
        assert!(status.model.is_none());
    }
}
