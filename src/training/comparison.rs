//! Side-by-side benchmark of a fixed regressor battery

use super::decision_tree::DecisionTree;
use super::gradient_boosting::GradientBoostingRegressor;
use super::knn::KNeighborsRegressor;
use super::linear_models::{LinearRegression, RidgeRegression};
use super::models::{adjusted_r2, DummyRegressor, RegressionMetrics, Regressor};
use super::random_forest::RandomForestRegressor;
use crate::error::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};

/// One line of the comparison table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub model: String,
    pub r2: f64,
    pub adjusted_r2: f64,
    pub rmse: f64,
    pub fit_time_secs: f64,
}

/// Fits every regressor on the same data and scores it on held-out rows
pub struct ModelComparator {
    models: Vec<Box<dyn Regressor>>,
}

impl Default for ModelComparator {
    fn default() -> Self {
        Self::new(42)
    }
}

impl ModelComparator {
    /// The standard battery, with forest seeds taken from `random_state`
    pub fn new(random_state: u64) -> Self {
        Self {
            models: vec![
                Box::new(DummyRegressor::new()),
                Box::new(LinearRegression::new()),
                Box::new(RidgeRegression::new(1.0)),
                Box::new(KNeighborsRegressor::new(5)),
                Box::new(DecisionTree::new().with_random_state(random_state)),
                Box::new(RandomForestRegressor::new(100).with_random_state(random_state)),
                Box::new(GradientBoostingRegressor::default()),
            ],
        }
    }

    /// Compare a custom set of models
    pub fn with_models(models: Vec<Box<dyn Regressor>>) -> Self {
        Self { models }
    }

    pub fn n_models(&self) -> usize {
        self.models.len()
    }

    /// Fit and score every model. Models that fail are logged and skipped.
    /// Rows are sorted by adjusted R², best first.
    pub fn compare(
        &mut self,
        x_train: &Array2<f64>,
        y_train: &Array1<f64>,
        x_test: &Array2<f64>,
        y_test: &Array1<f64>,
    ) -> Vec<ComparisonRow> {
        let n_features = x_train.ncols();
        let mut rows = Vec::with_capacity(self.models.len());

        for model in self.models.iter_mut() {
            let name = model.name().to_string();
            match fit_and_score(model.as_mut(), x_train, y_train, x_test, y_test) {
                Ok((m, fit_time)) => {
                    info!(model = %name, r2 = m.r2, rmse = m.rmse, fit_time, "Compared model");
                    rows.push(ComparisonRow {
                        model: name,
                        r2: m.r2,
                        adjusted_r2: adjusted_r2(m.r2, m.n_samples, n_features),
                        rmse: m.rmse,
                        fit_time_secs: fit_time,
                    });
                }
                Err(e) => warn!(model = %name, error = %e, "Model failed, skipping"),
            }
        }

        rows.sort_by(|a, b| b.adjusted_r2.total_cmp(&a.adjusted_r2));
        rows
    }
}

fn fit_and_score(
    model: &mut dyn Regressor,
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
    y_test: &Array1<f64>,
) -> Result<(RegressionMetrics, f64)> {
    let start = Instant::now();
    model.fit(x_train, y_train)?;
    let fit_time = start.elapsed().as_secs_f64();
    let pred = model.predict(x_test)?;
    Ok((RegressionMetrics::compute(y_test, &pred)?, fit_time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScoreError;

    struct Failing;

    impl Regressor for Failing {
        fn name(&self) -> &str {
            "Failing"
        }
        fn fit(&mut self, _x: &Array2<f64>, _y: &Array1<f64>) -> Result<()> {
            Err(ScoreError::ComputationError("boom".to_string()))
        }
        fn predict(&self, _x: &Array2<f64>) -> Result<Array1<f64>> {
            Err(ScoreError::ModelNotFitted)
        }
    }

    fn data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((30, 2), |(i, j)| (i * (j + 1)) as f64);
        let y = Array1::from_shape_fn(30, |i| 3.0 * i as f64 + 2.0);
        (x, y)
    }

    #[test]
    fn test_failures_are_skipped_and_rows_sorted() {
        let (x, y) = data();
        let mut cmp = ModelComparator::with_models(vec![
            Box::new(DummyRegressor::new()),
            Box::new(Failing),
            Box::new(LinearRegression::new()),
        ]);
        let rows = cmp.compare(&x, &y, &x, &y);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].model, "LinearRegression");
        assert_eq!(rows[1].model, "DummyRegressor");
        assert!(rows[0].adjusted_r2 >= rows[1].adjusted_r2);
    }

    #[test]
    fn test_default_battery() {
        let (x, y) = data();
        let mut cmp = ModelComparator::new(42);
        assert_eq!(cmp.n_models(), 7);
        let rows = cmp.compare(&x, &y, &x, &y);
        assert_eq!(rows.len(), 7);
        assert!(rows.iter().all(|r| r.rmse >= 0.0 && r.r2 <= 1.0));
    }
}
