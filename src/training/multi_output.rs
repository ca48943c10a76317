//! One regressor per target column

use crate::error::{ForecastError, Result};
use super::config::CandidateSpec;
use super::gradient_boosting::GradientBoostingRegressor;
use super::random_forest::RandomForest;
use super::xgboost::XGBoostRegressor;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Single-output estimator variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Estimator {
    RandomForest(RandomForest),
    XGBoost(XGBoostRegressor),
    GradientBoosting(GradientBoostingRegressor),
}

impl Estimator {
    /// Unfitted estimator for a candidate
    pub fn from_spec(spec: &CandidateSpec) -> Self {
        match spec {
            CandidateSpec::RandomForest(c) => Estimator::RandomForest(RandomForest::new(c.clone())),
            CandidateSpec::XGBoost(c) => Estimator::XGBoost(XGBoostRegressor::new(c.clone())),
            CandidateSpec::GradientBoosting(c) => {
                Estimator::GradientBoosting(GradientBoostingRegressor::new(c.clone()))
            }
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self {
            Estimator::RandomForest(m) => m.fit(x, y).map(|_| ()),
            Estimator::XGBoost(m) => m.fit(x, y),
            Estimator::GradientBoosting(m) => m.fit(x, y),
        }
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Estimator::RandomForest(m) => m.predict(x),
            Estimator::XGBoost(m) => m.predict(x),
            Estimator::GradientBoosting(m) => m.predict(x),
        }
    }

    /// Normalized importances, `None` before fitting
    pub fn feature_importances(&self) -> Option<Array1<f64>> {
        match self {
            Estimator::RandomForest(m) => m.feature_importances().cloned(),
            Estimator::XGBoost(m) => m.feature_importances(),
            Estimator::GradientBoosting(m) => {
                let imp = m.feature_importances();
                (!imp.is_empty()).then(|| Array1::from_vec(imp.to_vec()))
            }
        }
    }
}

/// Multi-output regressor: estimator `j` predicts target column `j`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiOutputModel {
    spec: CandidateSpec,
    estimators: Vec<Estimator>,
}

impl MultiOutputModel {
    pub fn new(spec: CandidateSpec) -> Self {
        Self { spec, estimators: Vec::new() }
    }

    pub fn spec(&self) -> &CandidateSpec {
        &self.spec
    }

    pub fn name(&self) -> &'static str {
        self.spec.name()
    }

    pub fn n_outputs(&self) -> usize {
        self.estimators.len()
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array2<f64>) -> Result<()> {
        if x.nrows() != y.nrows() {
            return Err(ForecastError::ShapeError {
                expected: format!("{} target rows", x.nrows()),
                actual: format!("{} target rows", y.nrows()),
            });
        }

        self.estimators = y
            .axis_iter(Axis(1))
            .map(|target| {
                let mut estimator = Estimator::from_spec(&self.spec);
                estimator.fit(x, &target.to_owned())?;
                Ok(estimator)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(())
    }

    /// Predictions with one column per target
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.estimators.is_empty() {
            return Err(ForecastError::ModelNotFitted);
        }

        let mut out = Array2::zeros((x.nrows(), self.estimators.len()));
        for (j, estimator) in self.estimators.iter().enumerate() {
            out.column_mut(j).assign(&estimator.predict(x)?);
        }
        Ok(out)
    }

    /// Importances averaged over the per-target estimators
    pub fn feature_importances(&self) -> Option<Array1<f64>> {
        let all = self.estimators.iter().map(Estimator::feature_importances).collect::<Option<Vec<_>>>()?;
        let n = all.len() as f64;
        let mut iter = all.into_iter();
        let first = iter.next()?;
        Some(iter.fold(first, |acc, imp| acc + imp) / n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::{GradientBoostingConfig, RandomForestConfig};

    fn data() -> (Array2<f64>, Array2<f64>) {
        let x = Array2::from_shape_fn((60, 2), |(i, j)| (i + j) as f64);
        let y = Array2::from_shape_fn((60, 3), |(i, j)| i as f64 * (j + 1) as f64);
        (x, y)
    }

    #[test]
    fn test_one_estimator_per_target() {
        let (x, y) = data();
        let mut model = MultiOutputModel::new(CandidateSpec::GradientBoosting(GradientBoostingConfig {
            n_estimators: 20,
            learning_rate: 0.3,
            ..Default::default()
        }));
        model.fit(&x, &y).unwrap();

        assert_eq!(model.n_outputs(), 3);
        let preds = model.predict(&x).unwrap();
        assert_eq!(preds.dim(), (60, 3));
        // Steeper targets predict larger values at the end of the range
        assert!(preds[[59, 2]] > preds[[59, 1]]);
        assert!(preds[[59, 1]] > preds[[59, 0]]);
    }

    #[test]
    fn test_importances_average_targets() {
        let (x, y) = data();
        for spec in CandidateSpec::defaults() {
            let mut model = MultiOutputModel::new(spec);
            assert!(model.feature_importances().is_none());
            model.fit(&x, &y).unwrap();

            let imp = model.feature_importances().unwrap();
            assert_eq!(imp.len(), 2);
            assert!((imp.sum() - 1.0).abs() < 1e-9, "{} importances sum to {}", model.name(), imp.sum());
        }
    }

    #[test]
    fn test_fit_error_propagates() {
        let (x, y) = data();
        let mut model = MultiOutputModel::new(CandidateSpec::RandomForest(RandomForestConfig {
            n_estimators: 0,
            ..Default::default()
        }));
        assert!(matches!(model.fit(&x, &y), Err(ForecastError::InvalidParameter(_))));
    }

    #[test]
    fn test_unfitted() {
        let model = MultiOutputModel::new(CandidateSpec::defaults().remove(0));
        assert!(matches!(model.predict(&Array2::zeros((1, 2))), Err(ForecastError::ModelNotFitted)));
    }
}
