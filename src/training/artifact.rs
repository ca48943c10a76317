//! Persisted model artifact

use crate::error::{ForecastError, Result};
use super::metrics::MultiOutputMetrics;
use super::multi_output::MultiOutputModel;
use chrono::NaiveDateTime;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Named, ordered model input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub columns: Vec<String>,
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(columns: Vec<String>, values: Vec<f64>) -> Result<Self> {
        if columns.len() != values.len() {
            return Err(ForecastError::ShapeError {
                expected: format!("{} values", columns.len()),
                actual: format!("{} values", values.len()),
            });
        }
        Ok(Self { columns, values })
    }
}

/// Champion model plus the column contract it was trained under
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub model: MultiOutputModel,
    pub feature_columns: Vec<String>,
    pub target_columns: Vec<String>,
    /// Held-out metrics of this model
    pub metrics: MultiOutputMetrics,
    pub n_train: usize,
    pub n_test: usize,
    pub trained_at: NaiveDateTime,
}

impl ModelArtifact {
    pub fn candidate(&self) -> &'static str {
        self.model.name()
    }

    /// Predict one value per target. The vector's columns must match the
    /// training columns exactly, order included.
    pub fn predict(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        if features.columns != self.feature_columns {
            return Err(ForecastError::FeatureMismatch {
                expected: self.feature_columns.clone(),
                actual: features.columns.clone(),
            });
        }

        let x = Array2::from_shape_vec((1, features.values.len()), features.values.clone())?;
        let y = self.model.predict(&x)?;
        Ok(y.row(0).to_vec())
    }

    /// Save the artifact to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load an artifact from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
