//! Model training module
//!
//! Fits candidate tree ensembles on the feature table and keeps the one with
//! the lowest held-out MAE:
//! - Random forest (bagged CART trees)
//! - XGBoost-style second-order boosting
//! - First-order gradient boosting
//!
//! Every candidate predicts all horizons through [`MultiOutputModel`], one
//! regressor per target column.

mod artifact;
mod config;
mod engine;
mod metrics;
mod multi_output;
mod sampling;
mod split;
pub mod decision_tree;
pub mod gradient_boosting;
pub mod random_forest;
pub mod xgboost;

pub use artifact::{FeatureVector, ModelArtifact};
pub use config::{CandidateSpec, TrainingConfig};
pub use decision_tree::{DecisionTree, TreeNode};
pub use engine::{CandidateScore, ModelTrainer, TrainingData, TrainingReport};
pub use gradient_boosting::{GradientBoostingConfig, GradientBoostingRegressor};
pub use metrics::{regression_metrics, ModelMetrics, MultiOutputMetrics};
pub use multi_output::{Estimator, MultiOutputModel};
pub use random_forest::{MaxFeatures, RandomForest, RandomForestConfig};
pub use split::{test_size, TrainTestSplit};
pub use xgboost::{XGBoostConfig, XGBoostRegressor};
