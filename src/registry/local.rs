//! JSON-file model registry

use crate::error::{ForecastError, Result};
use crate::training::ModelArtifact;
use super::{ModelCard, ModelRegistry};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// `<base_dir>/<name>.json` holds the artifact, `<base_dir>/<name>.card.json` its card
#[derive(Debug, Clone)]
pub struct LocalModelRegistry {
    base_dir: PathBuf,
}

impl LocalModelRegistry {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", name))
    }

    pub fn card_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(format!("{}.card.json", name))
    }
}

impl ModelRegistry for LocalModelRegistry {
    fn save(&self, artifact: &ModelArtifact, mut card: ModelCard) -> Result<ModelCard> {
        fs::create_dir_all(&self.base_dir)?;

        card.version = match self.card(&card.name) {
            Ok(previous) => previous.version + 1,
            Err(ForecastError::ModelNotFound(_)) => 1,
            Err(e) => return Err(e),
        };

        // Atomic replace
        let path = self.artifact_path(&card.name);
        let tmp = path.with_extension("json.tmp");
        artifact.save(&tmp)?;
        fs::rename(&tmp, &path)?;

        fs::write(self.card_path(&card.name), serde_json::to_string_pretty(&card)?)?;

        info!(
            name = %card.name,
            version = card.version,
            candidate = %card.candidate,
            path = %path.display(),
            "Saved model"
        );
        Ok(card)
    }

    fn load(&self, name: &str) -> Result<ModelArtifact> {
        let path = self.artifact_path(name);
        if !path.is_file() {
            return Err(ForecastError::ModelNotFound(format!(
                "no model '{}' at {}",
                name,
                path.display()
            )));
        }
        ModelArtifact::load(&path)
    }

    fn card(&self, name: &str) -> Result<ModelCard> {
        let path = self.card_path(name);
        if !path.is_file() {
            return Err(ForecastError::ModelNotFound(format!(
                "no model card '{}' at {}",
                name,
                path.display()
            )));
        }
        let json = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
