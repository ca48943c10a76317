//! Model registry
//!
//! Holds exactly one current model per name. Saving under an existing name
//! overwrites the artifact and bumps the card's version counter.

mod local;
mod memory;

pub use local::LocalModelRegistry;
pub use memory::InMemoryModelRegistry;

use crate::error::Result;
use crate::training::ModelArtifact;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata stored next to a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCard {
    pub name: String,
    /// Starts at 1, incremented on every save
    pub version: u32,
    /// Champion candidate
    pub candidate: String,
    pub metrics: BTreeMap<String, f64>,
    pub description: String,
    pub feature_columns: Vec<String>,
    pub target_columns: Vec<String>,
    /// Champion's feature importances, largest first
    #[serde(default)]
    pub feature_importances: Vec<(String, f64)>,
    pub created_at: DateTime<Utc>,
}

impl ModelCard {
    /// Card for `artifact`; the registry assigns the version on save
    pub fn for_artifact(name: impl Into<String>, artifact: &ModelArtifact, description: impl Into<String>) -> Self {
        let mut metrics = BTreeMap::new();
        metrics.insert("avg_mae".to_string(), artifact.metrics.avg_mae);
        metrics.insert("avg_r2".to_string(), artifact.metrics.avg_r2);
        for (target, m) in &artifact.metrics.per_target {
            metrics.insert(format!("mae_{}", target), m.mae);
            metrics.insert(format!("r2_{}", target), m.r2);
        }

        let mut feature_importances: Vec<(String, f64)> = match artifact.model.feature_importances() {
            Some(imp) => artifact.feature_columns.iter().cloned().zip(imp.iter().copied()).collect(),
            None => Vec::new(),
        };
        feature_importances.sort_by(|a, b| b.1.total_cmp(&a.1));

        Self {
            name: name.into(),
            version: 0,
            candidate: artifact.candidate().to_string(),
            metrics,
            description: description.into(),
            feature_columns: artifact.feature_columns.clone(),
            target_columns: artifact.target_columns.clone(),
            feature_importances,
            created_at: Utc::now(),
        }
    }
}

/// Storage for the current model and its card
pub trait ModelRegistry: Send + Sync {
    /// Store `artifact` under `card.name`, replacing any previous model.
    /// Returns the card as stored, with its version assigned.
    fn save(&self, artifact: &ModelArtifact, card: ModelCard) -> Result<ModelCard>;

    /// Load the current artifact; absent models fail with `ModelNotFound`
    fn load(&self, name: &str) -> Result<ModelArtifact>;

    /// Card of the current model
    fn card(&self, name: &str) -> Result<ModelCard>;
}
