//! In-process model registry

use crate::error::{ForecastError, Result};
use crate::training::ModelArtifact;
use super::{ModelCard, ModelRegistry};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct InMemoryModelRegistry {
    models: Mutex<HashMap<String, (ModelArtifact, ModelCard)>>,
}

impl InMemoryModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModelRegistry for InMemoryModelRegistry {
    fn save(&self, artifact: &ModelArtifact, mut card: ModelCard) -> Result<ModelCard> {
        let mut models = self.models.lock();
        card.version = models.get(&card.name).map_or(1, |(_, c)| c.version + 1);
        models.insert(card.name.clone(), (artifact.clone(), card.clone()));
        Ok(card)
    }

    fn load(&self, name: &str) -> Result<ModelArtifact> {
        self.models
            .lock()
            .get(name)
            .map(|(a, _)| a.clone())
            .ok_or_else(|| ForecastError::ModelNotFound(name.to_string()))
    }

    fn card(&self, name: &str) -> Result<ModelCard> {
        self.models
            .lock()
            .get(name)
            .map(|(_, c)| c.clone())
            .ok_or_else(|| ForecastError::ModelNotFound(name.to_string()))
    }
}
