//! Regression evaluation metrics

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Metrics for one target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// R-squared
    pub r2: f64,
}

impl ModelMetrics {
    /// Compute regression metrics. A constant `y_true` scores R² = 1 when
    /// predicted exactly and 0 otherwise.
    pub fn compute_regression(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> Self {
        let n = y_true.len() as f64;
        let errors: Vec<f64> = y_true.iter().zip(y_pred.iter()).map(|(t, p)| t - p).collect();

        let mse = errors.iter().map(|e| e * e).sum::<f64>() / n;
        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        let y_mean = y_true.sum() / n;
        let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
        let ss_res: f64 = errors.iter().map(|e| e.powi(2)).sum();

        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };

        Self { mae, mse, rmse: mse.sqrt(), r2 }
    }
}

/// Per-target metrics plus their uniform averages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiOutputMetrics {
    /// One entry per target column, in target order
    pub per_target: Vec<(String, ModelMetrics)>,
    pub avg_mae: f64,
    pub avg_r2: f64,
    /// Rows in the evaluation split
    pub n_samples: usize,
}

impl MultiOutputMetrics {
    /// Column `j` of `y_true`/`y_pred` belongs to `target_names[j]`
    pub fn compute(target_names: &[String], y_true: &Array2<f64>, y_pred: &Array2<f64>) -> Self {
        let per_target: Vec<(String, ModelMetrics)> = target_names
            .iter()
            .enumerate()
            .map(|(j, name)| {
                (name.clone(), ModelMetrics::compute_regression(y_true.column(j), y_pred.column(j)))
            })
            .collect();

        let k = per_target.len().max(1) as f64;
        let avg_mae = per_target.iter().map(|(_, m)| m.mae).sum::<f64>() / k;
        let avg_r2 = per_target.iter().map(|(_, m)| m.r2).sum::<f64>() / k;

        Self { per_target, avg_mae, avg_r2, n_samples: y_true.nrows() }
    }

    pub fn target(&self, name: &str) -> Option<&ModelMetrics> {
        self.per_target.iter().find(|(n, _)| n == name).map(|(_, m)| m)
    }
}

/// Convenience for single-target evaluation
pub fn regression_metrics(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> ModelMetrics {
    ModelMetrics::compute_regression(y_true.view(), y_pred.view())
}
