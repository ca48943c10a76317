//! Random forest regressor

use crate::error::{ForecastError, Result};
use super::decision_tree::DecisionTree;
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Features considered by each tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Square root of n_features
    Sqrt,
    /// Fraction of n_features
    Fraction(f64),
    /// All features
    All,
}

/// Random forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomForestConfig {
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth per tree
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Base seed; tree `i` uses `seed + i`
    pub random_state: u64,
}

impl Default for RandomForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: Some(10),
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            bootstrap: true,
            random_state: 42,
        }
    }
}

impl RandomForestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(ForecastError::InvalidParameter("n_estimators must be at least 1".to_string()));
        }
        if self.max_depth == Some(0) {
            return Err(ForecastError::InvalidParameter("max_depth must be at least 1".to_string()));
        }
        if let MaxFeatures::Fraction(f) = self.max_features {
            if !(f > 0.0 && f <= 1.0) {
                return Err(ForecastError::InvalidParameter(format!(
                    "max_features fraction must be in (0, 1], got {}",
                    f
                )));
            }
        }
        Ok(())
    }
}

/// Random forest model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    config: RandomForestConfig,
    /// Individual trees, each with the columns it was fit on
    trees: Vec<(DecisionTree, Vec<usize>)>,
    feature_importances: Option<Array1<f64>>,
    n_features: usize,
}

impl RandomForest {
    pub fn new(config: RandomForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            feature_importances: None,
            n_features: 0,
        }
    }

    pub fn config(&self) -> &RandomForestConfig {
        &self.config
    }

    fn compute_max_features(&self, n_features: usize) -> usize {
        match self.config.max_features {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
            MaxFeatures::Fraction(f) => (n_features as f64 * f).ceil() as usize,
            MaxFeatures::All => n_features,
        }
        .clamp(1, n_features.max(1))
    }

    /// Fit the forest to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        self.config.validate()?;

        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(ForecastError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(ForecastError::Validation("Cannot fit a forest on zero samples".to_string()));
        }

        self.n_features = n_features;
        let max_features = self.compute_max_features(n_features);
        let config = &self.config;

        // Build trees in parallel; per-tree seeds keep the result independent of scheduling
        let trees: Vec<(DecisionTree, Vec<usize>)> = (0..config.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(config.random_state.wrapping_add(tree_idx as u64));

                let sample_indices: Vec<usize> = if config.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };

                let mut col_indices: Vec<usize> = (0..n_features).collect();
                if max_features < n_features {
                    col_indices.shuffle(&mut rng);
                    col_indices.truncate(max_features);
                    col_indices.sort_unstable();
                }

                let x_boot = x.select(Axis(0), &sample_indices).select(Axis(1), &col_indices);
                let y_boot = y.select(Axis(0), &sample_indices);

                let mut tree = DecisionTree::new()
                    .with_min_samples_split(config.min_samples_split)
                    .with_min_samples_leaf(config.min_samples_leaf);
                if let Some(d) = config.max_depth {
                    tree = tree.with_max_depth(d);
                }

                tree.fit(&x_boot, &y_boot)?;
                Ok((tree, col_indices))
            })
            .collect::<Result<Vec<_>>>()?;

        self.trees = trees;
        self.compute_feature_importances();

        Ok(self)
    }

    fn compute_feature_importances(&mut self) {
        let mut total_importances = vec![0.0; self.n_features];

        for (tree, cols) in &self.trees {
            if let Some(imp) = tree.feature_importances() {
                for (j, &val) in imp.iter().enumerate() {
                    total_importances[cols[j]] += val;
                }
            }
        }

        let total: f64 = total_importances.iter().sum();
        if total > 0.0 {
            for imp in &mut total_importances {
                *imp /= total;
            }
        }

        self.feature_importances = Some(Array1::from_vec(total_importances));
    }

    /// Mean of the tree predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(ForecastError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(ForecastError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        let all_predictions: Vec<Array1<f64>> = self
            .trees
            .par_iter()
            .map(|(tree, cols)| tree.predict(&x.select(Axis(1), cols)))
            .collect::<Result<Vec<_>>>()?;

        let mut sum = Array1::zeros(x.nrows());
        for preds in &all_predictions {
            sum += preds;
        }
        Ok(sum / all_predictions.len() as f64)
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn forest(n_estimators: usize, random_state: u64) -> RandomForest {
        RandomForest::new(RandomForestConfig { n_estimators, random_state, ..Default::default() })
    }

    #[test]
    fn test_regressor() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0];

        let mut rf = forest(10, 42);
        rf.fit(&x, &y).unwrap();

        let predictions = rf.predict(&x).unwrap();
        let mse: f64 = predictions.iter().zip(y.iter())
            .map(|(p, a)| (p - a).powi(2))
            .sum::<f64>() / y.len() as f64;

        assert!(mse < 2.0, "MSE too high: {}", mse);
    }

    #[test]
    fn test_deterministic_with_seed() {
        let x = Array2::from_shape_fn((40, 3), |(i, j)| ((i * 7 + j * 3) % 13) as f64);
        let y = Array1::from_shape_fn(40, |i| (i % 5) as f64 * 2.0);

        let mut a = forest(8, 7);
        let mut b = forest(8, 7);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_feature_subsets_cover_columns() {
        let x = Array2::from_shape_fn((30, 4), |(i, j)| (i * (j + 1)) as f64);
        let y = Array1::from_shape_fn(30, |i| i as f64);

        let mut rf = RandomForest::new(RandomForestConfig {
            n_estimators: 20,
            max_features: MaxFeatures::Sqrt,
            ..Default::default()
        });
        rf.fit(&x, &y).unwrap();

        let importances = rf.feature_importances().unwrap();
        assert_eq!(importances.len(), 4);
        assert!((importances.sum() - 1.0).abs() < 1e-9);
        assert_eq!(rf.predict(&x).unwrap().len(), 30);
    }

    #[test]
    fn test_feature_importances() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = array![1.0, 2.0, 3.0, 4.0];

        let mut rf = forest(10, 42);
        rf.fit(&x, &y).unwrap();

        let importances = rf.feature_importances().unwrap();
        assert!(importances[0] >= importances[1]);
    }

    #[test]
    fn test_zero_estimators_rejected() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0, 2.0];
        let mut rf = forest(0, 42);
        assert!(matches!(rf.fit(&x, &y), Err(ForecastError::InvalidParameter(_))));
    }

    #[test]
    fn test_sqrt_max_features_from_json() {
        let config: RandomForestConfig =
            serde_json::from_str(r#"{"n_estimators": 6, "max_features": "Sqrt", "random_state": 3}"#).unwrap();
        assert_eq!(config.max_features, MaxFeatures::Sqrt);

        let x = Array2::from_shape_fn((25, 9), |(i, j)| ((i + 2 * j) % 11) as f64);
        let y = Array1::from_shape_fn(25, |i| (i % 11) as f64);
        let mut rf = RandomForest::new(config);
        rf.fit(&x, &y).unwrap();

        // Each tree sees ceil(sqrt(9)) = 3 columns
        assert!(rf.trees.iter().all(|(_, cols)| cols.len() == 3));
        assert_eq!(rf.predict(&x).unwrap().len(), 25);
    }

    #[test]
    fn test_bad_fraction_rejected() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0, 2.0];
        let mut rf = RandomForest::new(RandomForestConfig {
            max_features: MaxFeatures::Fraction(1.5),
            ..Default::default()
        });
        assert!(matches!(rf.fit(&x, &y), Err(ForecastError::InvalidParameter(_))));
    }
}
