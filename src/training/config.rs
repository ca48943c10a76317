//! Training configuration

use crate::error::{ForecastError, Result};
use crate::features::{feature_columns, target_columns};
use super::gradient_boosting::GradientBoostingConfig;
use super::random_forest::RandomForestConfig;
use super::xgboost::XGBoostConfig;
use serde::{Deserialize, Serialize};

/// A candidate regressor and its hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model")]
pub enum CandidateSpec {
    #[serde(rename = "random_forest")]
    RandomForest(RandomForestConfig),
    #[serde(rename = "xgboost")]
    XGBoost(XGBoostConfig),
    #[serde(rename = "gradient_boosting")]
    GradientBoosting(GradientBoostingConfig),
}

impl CandidateSpec {
    /// Display name used in logs, errors and the model card
    pub fn name(&self) -> &'static str {
        match self {
            CandidateSpec::RandomForest(_) => "RandomForest",
            CandidateSpec::XGBoost(_) => "XGBoost",
            CandidateSpec::GradientBoosting(_) => "GradientBoosting",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            CandidateSpec::RandomForest(c) => c.validate(),
            CandidateSpec::XGBoost(c) => c.validate(),
            CandidateSpec::GradientBoosting(c) => c.validate(),
        }
    }

    /// Random forest, XGBoost, then gradient boosting
    pub fn defaults() -> Vec<CandidateSpec> {
        vec![
            CandidateSpec::RandomForest(RandomForestConfig::default()),
            CandidateSpec::XGBoost(XGBoostConfig::default()),
            CandidateSpec::GradientBoosting(GradientBoostingConfig::default()),
        ]
    }
}

/// Training configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Fraction of rows held out, taken from the end of the timeline
    pub test_fraction: f64,
    /// Evaluated in order; ties keep the earlier candidate
    pub candidates: Vec<CandidateSpec>,
    pub feature_columns: Vec<String>,
    pub target_columns: Vec<String>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            candidates: CandidateSpec::defaults(),
            feature_columns: feature_columns(),
            target_columns: target_columns(),
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    pub fn with_candidates(mut self, candidates: Vec<CandidateSpec>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_target_columns(mut self, columns: Vec<String>) -> Self {
        self.target_columns = columns;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(ForecastError::Config(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.candidates.is_empty() {
            return Err(ForecastError::Config("at least one candidate model is required".to_string()));
        }
        if self.feature_columns.is_empty() || self.target_columns.is_empty() {
            return Err(ForecastError::Config("feature and target column lists must not be empty".to_string()));
        }
        for spec in &self.candidates {
            spec.validate().map_err(|e| ForecastError::Config(format!("{}: {}", spec.name(), e)))?;
        }
        Ok(())
    }
}
