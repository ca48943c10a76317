//! Forecast generation and health guidance

mod guidance;
mod predictor;

pub use guidance::AqiCategory;
pub use predictor::{Forecast, Predictor, PredictorConfig};
