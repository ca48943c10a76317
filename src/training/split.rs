//! Chronological train/test split

use crate::error::{ForecastError, Result};
use ndarray::{s, Array2};

/// Held-out rows for `n` samples: `ceil(n * test_fraction)`
pub fn test_size(n: usize, test_fraction: f64) -> usize {
    ((n as f64) * test_fraction).ceil() as usize
}

/// Rows arrive time-ordered; the last `test_size` rows are held out.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array2<f64>,
    pub y_test: Array2<f64>,
}

impl TrainTestSplit {
    pub fn chronological(x: &Array2<f64>, y: &Array2<f64>, test_fraction: f64) -> Result<Self> {
        let n = x.nrows();
        if n != y.nrows() {
            return Err(ForecastError::ShapeError {
                expected: format!("{} target rows", n),
                actual: format!("{} target rows", y.nrows()),
            });
        }

        let n_test = test_size(n, test_fraction);
        if n_test == 0 || n_test >= n {
            return Err(ForecastError::EmptyDataset(format!(
                "{} rows cannot be split into non-empty train and test sets at test fraction {}",
                n, test_fraction
            )));
        }
        let n_train = n - n_test;

        Ok(Self {
            x_train: x.slice(s![..n_train, ..]).to_owned(),
            x_test: x.slice(s![n_train.., ..]).to_owned(),
            y_train: y.slice(s![..n_train, ..]).to_owned(),
            y_test: y.slice(s![n_train.., ..]).to_owned(),
        })
    }

    pub fn n_train(&self) -> usize {
        self.x_train.nrows()
    }

    pub fn n_test(&self) -> usize {
        self.x_test.nrows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hundred_rows() {
        let x = Array2::from_shape_fn((100, 2), |(i, _)| i as f64);
        let y = Array2::from_shape_fn((100, 3), |(i, _)| i as f64);

        let split = TrainTestSplit::chronological(&x, &y, 0.2).unwrap();
        assert_eq!(split.n_train(), 80);
        assert_eq!(split.n_test(), 20);
        assert_eq!(split.x_train[[79, 0]], 79.0);
        assert_eq!(split.x_test[[0, 0]], 80.0);
        assert_eq!(split.y_test[[19, 2]], 99.0);
    }

    #[test]
    fn test_size_rounds_up() {
        assert_eq!(test_size(26, 0.2), 6);
        assert_eq!(test_size(10, 0.2), 2);
        assert_eq!(test_size(1, 0.2), 1);
    }

    #[test]
    fn test_single_row_cannot_split() {
        let x = Array2::zeros((1, 2));
        let y = Array2::zeros((1, 3));
        assert!(matches!(
            TrainTestSplit::chronological(&x, &y, 0.2),
            Err(ForecastError::EmptyDataset(_))
        ));
    }
}
