//! K-nearest-neighbours regression

use super::models::{check_fit_input, check_predict_input, Regressor};
use crate::error::{Result, ScoreError};
use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Uniformly weighted k-NN regressor with Euclidean distance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNeighborsRegressor {
    pub n_neighbors: usize,
    x_train: Option<Array2<f64>>,
    y_train: Option<Array1<f64>>,
}

impl Default for KNeighborsRegressor {
    fn default() -> Self {
        Self::new(5)
    }
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

impl KNeighborsRegressor {
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors,
            x_train: None,
            y_train: None,
        }
    }
}

impl Regressor for KNeighborsRegressor {
    fn name(&self) -> &str {
        "KNeighborsRegressor"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        if self.n_neighbors == 0 || self.n_neighbors > x.nrows() {
            return Err(ScoreError::InvalidParameter {
                name: "n_neighbors".to_string(),
                value: self.n_neighbors.to_string(),
                reason: format!("must be between 1 and n_samples ({})", x.nrows()),
            });
        }
        self.x_train = Some(x.clone());
        self.y_train = Some(y.clone());
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (x_train, y_train) = match (&self.x_train, &self.y_train) {
            (Some(x), Some(y)) => (x, y),
            _ => return Err(ScoreError::ModelNotFitted),
        };
        check_predict_input(x, x_train.ncols())?;
        let k = self.n_neighbors;

        let predictions: Vec<f64> = x
            .outer_iter()
            .into_par_iter()
            .map(|query| {
                let mut distances: Vec<(f64, usize)> = x_train
                    .outer_iter()
                    .enumerate()
                    .map(|(i, row)| (squared_distance(query, row), i))
                    .collect();
                // stable on ties: nearer first, then lower training index
                distances.select_nth_unstable_by(k - 1, |a, b| {
                    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
                });
                distances[..k].iter().map(|&(_, i)| y_train[i]).sum::<f64>() / k as f64
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }
}
