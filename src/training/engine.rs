//! Candidate training and champion selection

use crate::data::{f64_column, timestamps};
use crate::error::{ForecastError, Result};
use super::artifact::ModelArtifact;
use super::config::{CandidateSpec, TrainingConfig};
use super::metrics::MultiOutputMetrics;
use super::multi_output::MultiOutputModel;
use super::split::TrainTestSplit;
use chrono::{NaiveDateTime, Utc};
use ndarray::Array2;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Held-out score of one candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateScore {
    pub candidate: String,
    pub metrics: MultiOutputMetrics,
    pub training_time_secs: f64,
}

/// Result of a training run
#[derive(Debug, Clone)]
pub struct TrainingReport {
    /// Every candidate, in evaluation order
    pub leaderboard: Vec<CandidateScore>,
    pub artifact: ModelArtifact,
    /// Rows removed for missing targets or features
    pub dropped_rows: usize,
}

impl TrainingReport {
    pub fn champion(&self) -> &str {
        self.artifact.candidate()
    }
}

/// Training matrices extracted from a feature table
#[derive(Debug, Clone)]
pub struct TrainingData {
    pub timestamps: Vec<NaiveDateTime>,
    pub x: Array2<f64>,
    pub y: Array2<f64>,
    pub dropped_rows: usize,
}

/// Fits every configured candidate and keeps the best one
#[derive(Debug, Clone, Default)]
pub struct ModelTrainer {
    config: TrainingConfig,
}

impl ModelTrainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train on a feature table and return the champion with its scores
    pub fn train(&self, df: &DataFrame) -> Result<TrainingReport> {
        self.config.validate()?;
        let start = Instant::now();

        let data = self.prepare_data(df)?;
        let split = TrainTestSplit::chronological(&data.x, &data.y, self.config.test_fraction)?;
        info!(
            train_rows = split.n_train(),
            test_rows = split.n_test(),
            dropped = data.dropped_rows,
            "Prepared training data"
        );

        let mut leaderboard = Vec::with_capacity(self.config.candidates.len());
        let mut champion: Option<(MultiOutputModel, MultiOutputMetrics)> = None;

        for spec in &self.config.candidates {
            let (model, score) = self.evaluate(spec, &split)?;
            info!(
                candidate = %score.candidate,
                avg_mae = score.metrics.avg_mae,
                avg_r2 = score.metrics.avg_r2,
                secs = score.training_time_secs,
                "Evaluated candidate"
            );

            let better = champion
                .as_ref()
                .map_or(true, |(_, best)| score.metrics.avg_mae < best.avg_mae);
            if better {
                champion = Some((model, score.metrics.clone()));
            }
            leaderboard.push(score);
        }

        let (model, metrics) = champion
            .ok_or_else(|| ForecastError::Config("no candidate models configured".to_string()))?;

        info!(
            champion = model.name(),
            avg_mae = metrics.avg_mae,
            elapsed_secs = start.elapsed().as_secs_f64(),
            "Selected champion"
        );

        let artifact = ModelArtifact {
            model,
            feature_columns: self.config.feature_columns.clone(),
            target_columns: self.config.target_columns.clone(),
            metrics,
            n_train: split.n_train(),
            n_test: split.n_test(),
            trained_at: Utc::now().naive_utc(),
        };

        Ok(TrainingReport { leaderboard, artifact, dropped_rows: data.dropped_rows })
    }

    fn evaluate(&self, spec: &CandidateSpec, split: &TrainTestSplit) -> Result<(MultiOutputModel, CandidateScore)> {
        let name = spec.name();
        let start = Instant::now();
        debug!(candidate = name, "Fitting candidate");

        let mut model = MultiOutputModel::new(spec.clone());
        model
            .fit(&split.x_train, &split.y_train)
            .map_err(|e| ForecastError::training(name, e))?;
        let y_pred = model
            .predict(&split.x_test)
            .map_err(|e| ForecastError::training(name, e))?;

        if y_pred.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::training(name, "produced non-finite predictions"));
        }

        let metrics = MultiOutputMetrics::compute(&self.config.target_columns, &split.y_test, &y_pred);
        let score = CandidateScore {
            candidate: name.to_string(),
            metrics,
            training_time_secs: start.elapsed().as_secs_f64(),
        };
        Ok((model, score))
    }

    /// Extract complete, time-ordered rows
    pub fn prepare_data(&self, df: &DataFrame) -> Result<TrainingData> {
        let n = df.height();
        let keys = timestamps(df)?;
        let targets = columns(df, &self.config.target_columns)?;
        let features = columns(df, &self.config.feature_columns)?;

        let with_targets: Vec<usize> = (0..n)
            .filter(|&i| targets.iter().all(|c| c[i].is_some()))
            .collect();
        if with_targets.is_empty() {
            return Err(ForecastError::EmptyDataset(format!(
                "none of {} rows has every target ({})",
                n,
                self.config.target_columns.join(", ")
            )));
        }

        let mut rows: Vec<usize> = with_targets
            .iter()
            .copied()
            .filter(|&i| features.iter().all(|c| c[i].is_some()))
            .collect();
        let missing_features = with_targets.len() - rows.len();
        if missing_features > 0 {
            warn!(rows = missing_features, "Dropping rows with missing feature values");
        }
        if rows.is_empty() {
            return Err(ForecastError::EmptyDataset(format!(
                "none of {} labelled rows has every feature",
                with_targets.len()
            )));
        }

        rows.sort_by_key(|&i| keys[i]);

        let x = Array2::from_shape_fn((rows.len(), features.len()), |(r, c)| {
            features[c][rows[r]].unwrap_or_default()
        });
        let y = Array2::from_shape_fn((rows.len(), targets.len()), |(r, c)| {
            targets[c][rows[r]].unwrap_or_default()
        });

        Ok(TrainingData {
            timestamps: rows.iter().map(|&i| keys[i]).collect(),
            x,
            y,
            dropped_rows: n - rows.len(),
        })
    }
}

fn columns(df: &DataFrame, names: &[String]) -> Result<Vec<Vec<Option<f64>>>> {
    names.iter().map(|name| f64_column(df, name)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Reading;
    use crate::features::{FeatureBuilder, FEATURE_COLUMNS};
    use crate::training::{FeatureVector, GradientBoostingConfig, RandomForestConfig, XGBoostConfig};
    use chrono::{Duration, NaiveDate};

    fn readings(n: usize) -> Vec<Reading> {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                let aqi = 80.0 + 30.0 * ((i as f64) / 6.0).sin() + (i % 7) as f64;
                Reading::new(start + Duration::hours(i as i64), aqi)
                    .with_pollutants([Some(aqi / 1.5), Some(aqi * 0.8), Some(12.0), Some(4.0), Some(300.0)])
            })
            .collect()
    }

    fn small_candidates() -> Vec<CandidateSpec> {
        vec![
            CandidateSpec::RandomForest(RandomForestConfig { n_estimators: 10, ..Default::default() }),
            CandidateSpec::XGBoost(XGBoostConfig { n_estimators: 20, ..Default::default() }),
            CandidateSpec::GradientBoosting(GradientBoostingConfig { n_estimators: 20, ..Default::default() }),
        ]
    }

    #[test]
    fn test_train_selects_min_mae() {
        let df = FeatureBuilder::default().build_frame(&readings(200)).unwrap();
        let trainer = ModelTrainer::new(TrainingConfig::default().with_candidates(small_candidates()));

        let report = trainer.train(&df).unwrap();

        assert_eq!(report.leaderboard.len(), 3);
        let best = report
            .leaderboard
            .iter()
            .map(|s| s.metrics.avg_mae)
            .fold(f64::INFINITY, f64::min);
        assert_eq!(report.artifact.metrics.avg_mae, best);
        // 200 readings → 126 rows → ceil(25.2) held out
        assert_eq!(report.artifact.n_test, 26);
        assert_eq!(report.artifact.n_train, 100);
        assert_eq!(report.artifact.feature_columns.len(), FEATURE_COLUMNS.len());
    }

    #[test]
    fn test_tie_keeps_first_candidate() {
        let df = FeatureBuilder::default().build_frame(&readings(150)).unwrap();
        // Without subsampling the seed has no effect, so both fit the same model
        let first = CandidateSpec::GradientBoosting(GradientBoostingConfig {
            n_estimators: 5,
            random_state: 1,
            ..Default::default()
        });
        let second = CandidateSpec::GradientBoosting(GradientBoostingConfig {
            n_estimators: 5,
            random_state: 2,
            ..Default::default()
        });
        let trainer = ModelTrainer::new(
            TrainingConfig::default().with_candidates(vec![first.clone(), second]),
        );

        let report = trainer.train(&df).unwrap();
        assert_eq!(report.leaderboard[0].metrics.avg_mae, report.leaderboard[1].metrics.avg_mae);
        assert_eq!(report.artifact.model.spec(), &first);
    }

    #[test]
    fn test_short_history_is_empty_dataset() {
        let df = FeatureBuilder::default().build_frame(&readings(50)).unwrap();
        let err = ModelTrainer::default().train(&df).unwrap_err();
        assert!(matches!(err, ForecastError::EmptyDataset(_)));
    }

    #[test]
    fn test_failing_candidate_is_named() {
        // Infinity is a present value, so the row survives preparation and lands in the train split
        let mut rs = readings(150);
        rs[60].so2 = Some(f64::INFINITY);
        let df = FeatureBuilder::default().build_frame(&rs).unwrap();
        let trainer = ModelTrainer::new(TrainingConfig::default().with_candidates(small_candidates()));

        match trainer.train(&df).unwrap_err() {
            ForecastError::Training { candidate, .. } => assert_eq!(candidate, "RandomForest"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_rows_missing_features_are_dropped() {
        let mut rs = readings(150);
        for r in rs.iter_mut().take(40) {
            r.pm10 = None;
        }
        let df = FeatureBuilder::default().build_frame(&rs).unwrap();
        let data = ModelTrainer::default().prepare_data(&df).unwrap();

        // Feature rows start at reading 2; readings 2..40 lack pm10
        assert_eq!(data.dropped_rows, 38);
        assert_eq!(data.x.nrows(), df.height() - 38);
        assert!(data.timestamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_artifact_rejects_reordered_columns() {
        let df = FeatureBuilder::default().build_frame(&readings(150)).unwrap();
        let trainer = ModelTrainer::new(TrainingConfig::default().with_candidates(vec![
            CandidateSpec::GradientBoosting(GradientBoostingConfig { n_estimators: 5, ..Default::default() }),
        ]));
        let artifact = trainer.train(&df).unwrap().artifact;

        let mut columns = artifact.feature_columns.clone();
        let values = vec![1.0; columns.len()];
        let ok = FeatureVector::new(columns.clone(), values.clone()).unwrap();
        assert_eq!(artifact.predict(&ok).unwrap().len(), 3);

        columns.swap(0, 1);
        let swapped = FeatureVector::new(columns, values).unwrap();
        assert!(matches!(
            artifact.predict(&swapped),
            Err(ForecastError::FeatureMismatch { .. })
        ));
    }
}
