//! AQI Forecast - three-horizon air-quality forecasting
//!
//! This crate provides the full pipeline from raw readings to forecasts:
//! - Ingestion of current and historical readings
//! - Feature engineering with shifted AQI targets
//! - Candidate tree ensembles with held-out model selection
//! - Latest-row inference with health guidance
//!
//! # Modules
//!
//! ## Core
//! - [`data`] - Raw readings and table conversions
//! - [`features`] - Feature and target construction
//! - [`training`] - Candidate models, metrics and champion selection
//! - [`inference`] - Forecasting from the latest feature row
//!
//! ## Storage
//! - [`store`] - Versioned feature tables
//! - [`registry`] - Persisted models and model cards
//!
//! ## Services
//! - [`ingest`] - WAQI and Open-Meteo clients
//! - [`pipeline`] - Stage orchestration
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;
pub mod config;

// Core modules
pub mod data;
pub mod features;
pub mod training;
pub mod inference;

// Storage
pub mod store;
pub mod registry;

// Services
pub mod ingest;
pub mod pipeline;
pub mod cli;

pub use error::{ForecastError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{ForecastError, Result};
    pub use crate::config::ForecastConfig;

    // Data and features
    pub use crate::data::Reading;
    pub use crate::features::{FeatureBuilder, FeatureConfig, WindowSemantics, FEATURE_COLUMNS, TARGET_COLUMNS};

    // Training
    pub use crate::training::{CandidateSpec, ModelArtifact, ModelTrainer, TrainingConfig, TrainingReport};

    // Inference
    pub use crate::inference::{AqiCategory, Forecast, Predictor, PredictorConfig};

    // Storage
    pub use crate::store::{FeatureStore, InMemoryFeatureStore, LocalFeatureStore};
    pub use crate::registry::{InMemoryModelRegistry, LocalModelRegistry, ModelCard, ModelRegistry};

    pub use crate::pipeline::{Pipeline, PipelineStatus};
}
