//! Regressor trait, baseline model and regression metrics

use crate::error::{Result, ScoreError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Metrics for regression evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Coefficient of determination
    pub r2: f64,
    /// Number of scored samples
    pub n_samples: usize,
}

impl RegressionMetrics {
    /// Compute regression metrics
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        check_lengths(y_true, y_pred)?;
        let n = y_true.len() as f64;

        let errors: Vec<f64> = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| t - p)
            .collect();

        let mse = errors.iter().map(|e| e * e).sum::<f64>() / n;
        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        Ok(Self {
            mae,
            mse,
            rmse: mse.sqrt(),
            r2: r2_score(y_true, y_pred)?,
            n_samples: y_true.len(),
        })
    }
}

fn check_lengths(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(ScoreError::ShapeError {
            expected: format!("{} predictions", y_true.len()),
            actual: format!("{} predictions", y_pred.len()),
        });
    }
    if y_true.is_empty() {
        return Err(ScoreError::ValidationError(
            "cannot score an empty set of predictions".to_string(),
        ));
    }
    Ok(())
}

/// R² score. With a constant target it is 1 for a perfect prediction, else 0.
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    let mean = y_true.sum() / y_true.len() as f64;
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}

/// Adjusted R² for `n_samples` observations and `n_features` predictors.
///
/// Falls back to plain R² when `n_samples <= n_features + 1`.
pub fn adjusted_r2(r2: f64, n_samples: usize, n_features: usize) -> f64 {
    if n_samples <= n_features + 1 {
        return r2;
    }
    let n = n_samples as f64;
    let p = n_features as f64;
    1.0 - (1.0 - r2) * (n - 1.0) / (n - p - 1.0)
}

/// Common interface of the regression models
pub trait Regressor: Send + Sync {
    /// Display name used in comparison tables
    fn name(&self) -> &str;

    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Make predictions
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;
}

pub(crate) fn check_fit_input(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(ScoreError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(ScoreError::ValidationError(
            "cannot fit on zero samples".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn check_predict_input(x: &Array2<f64>, n_features: usize) -> Result<()> {
    if x.ncols() != n_features {
        return Err(ScoreError::ShapeError {
            expected: format!("{} features", n_features),
            actual: format!("{} features", x.ncols()),
        });
    }
    Ok(())
}

/// Predicts the training mean for every sample
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DummyRegressor {
    mean: Option<f64>,
    n_features: usize,
}

impl DummyRegressor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Regressor for DummyRegressor {
    fn name(&self) -> &str {
        "DummyRegressor"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        self.mean = Some(y.sum() / y.len() as f64);
        self.n_features = x.ncols();
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let mean = self.mean.ok_or(ScoreError::ModelNotFitted)?;
        check_predict_input(x, self.n_features)?;
        Ok(Array1::from_elem(x.nrows(), mean))
    }
}
