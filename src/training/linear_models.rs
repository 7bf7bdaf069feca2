//! Linear model implementations

use super::models::{check_fit_input, check_predict_input, Regressor};
use crate::error::{Result, ScoreError};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Solve a symmetric positive-definite system `A x = b` by Cholesky.
///
/// Retries once with a small diagonal jitter when `A` is not positive
/// definite.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    cholesky_solve_inner(a, b).or_else(|| {
        let n = a.nrows();
        let jitter = 1e-8 * a.diag().iter().map(|v| v.abs()).sum::<f64>().max(1.0) / n as f64;
        let mut a_reg = a.clone();
        for k in 0..n {
            a_reg[[k, k]] += jitter;
        }
        cholesky_solve_inner(&a_reg, b)
    })
}

fn cholesky_solve_inner(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    // A = L * L^T
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // L^T x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Some(x)
}

/// Gauss-Jordan inverse with partial pivoting, used when Cholesky fails
fn matrix_inverse(m: &Array2<f64>) -> Option<Array2<f64>> {
    let n = m.nrows();
    if n != m.ncols() {
        return None;
    }

    let mut aug = Array2::<f64>::zeros((n, 2 * n));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = m[[i, j]];
        }
        aug[[i, n + i]] = 1.0;
    }

    for col in 0..n {
        let mut max_row = col;
        for row in col + 1..n {
            if aug[[row, col]].abs() > aug[[max_row, col]].abs() {
                max_row = row;
            }
        }
        if max_row != col {
            for j in 0..2 * n {
                aug.swap([col, j], [max_row, j]);
            }
        }
        if aug[[col, col]].abs() < 1e-10 {
            return None;
        }

        let pivot = aug[[col, col]];
        for j in 0..2 * n {
            aug[[col, j]] /= pivot;
        }
        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                for j in 0..2 * n {
                    aug[[row, j]] -= factor * aug[[col, j]];
                }
            }
        }
    }

    Some(aug.slice(ndarray::s![.., n..]).to_owned())
}

/// Fit centred least squares with an L2 penalty `alpha` on the coefficients.
/// Returns `(coefficients, intercept)`.
fn fit_centered(x: &Array2<f64>, y: &Array1<f64>, alpha: f64) -> Result<(Array1<f64>, f64)> {
    check_fit_input(x, y)?;
    let n_features = x.ncols();

    let x_mean = x
        .mean_axis(Axis(0))
        .ok_or_else(|| ScoreError::ComputationError("empty design matrix".to_string()))?;
    let y_mean = y.sum() / y.len() as f64;
    let x_c = x - &x_mean.view().insert_axis(Axis(0));
    let y_c = y - y_mean;

    let mut xtx = x_c.t().dot(&x_c);
    for i in 0..n_features {
        xtx[[i, i]] += alpha;
    }
    let xty = x_c.t().dot(&y_c);

    let coefficients = match cholesky_solve(&xtx, &xty) {
        Some(coef) => coef,
        None => matrix_inverse(&xtx)
            .map(|inv| inv.dot(&xty))
            .ok_or_else(|| {
                ScoreError::ComputationError(
                    "Matrix is singular, cannot solve least squares".to_string(),
                )
            })?,
    };

    let intercept = y_mean - coefficients.dot(&x_mean);
    Ok((coefficients, intercept))
}

/// Ordinary least squares via the normal equations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Fitted coefficients (weights)
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept (bias)
    pub intercept: f64,
}

impl LinearRegression {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Regressor for LinearRegression {
    fn name(&self) -> &str {
        "LinearRegression"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let (coefficients, intercept) = fit_centered(x, y, 0.0)?;
        self.coefficients = Some(coefficients);
        self.intercept = intercept;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(ScoreError::ModelNotFitted)?;
        check_predict_input(x, coefficients.len())?;
        Ok(x.dot(coefficients) + self.intercept)
    }
}

/// L2-regularised least squares
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RidgeRegression {
    pub coefficients: Option<Array1<f64>>,
    pub intercept: f64,
    /// L2 regularization strength
    pub alpha: f64,
}

impl Default for RidgeRegression {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl RidgeRegression {
    pub fn new(alpha: f64) -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
            alpha,
        }
    }
}

impl Regressor for RidgeRegression {
    fn name(&self) -> &str {
        "Ridge"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if self.alpha < 0.0 {
            return Err(ScoreError::InvalidParameter {
                name: "alpha".to_string(),
                value: self.alpha.to_string(),
                reason: "must be non-negative".to_string(),
            });
        }
        let (coefficients, intercept) = fit_centered(x, y, self.alpha)?;
        self.coefficients = Some(coefficients);
        self.intercept = intercept;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(ScoreError::ModelNotFitted)?;
        check_predict_input(x, coefficients.len())?;
        Ok(x.dot(coefficients) + self.intercept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_linear_regression_exact() {
        let x = array![[1.0, 0.0], [2.0, 1.0], [3.0, 0.0], [4.0, 1.0], [5.0, 3.0]];
        let y = x.column(0).mapv(|v| 2.0 * v) + &x.column(1).mapv(|v| -v) + 3.0;

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let coef = model.coefficients.as_ref().unwrap();
        assert!((coef[0] - 2.0).abs() < 1e-8);
        assert!((coef[1] + 1.0).abs() < 1e-8);
        assert!((model.intercept - 3.0).abs() < 1e-8);
    }

    #[test]
    fn test_collinear_columns_still_fit() {
        let x = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0], [4.0, 8.0]];
        let y = array![1.0, 2.0, 3.0, 4.0];
        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();
        let pred = model.predict(&x).unwrap();
        for (p, t) in pred.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1e-3);
        }
    }

    #[test]
    fn test_ridge_shrinks() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![2.0, 4.0, 6.0, 8.0];
        let mut ols = LinearRegression::new();
        let mut ridge = RidgeRegression::new(1.0);
        ols.fit(&x, &y).unwrap();
        ridge.fit(&x, &y).unwrap();
        let ols_coef = ols.coefficients.as_ref().unwrap()[0];
        let ridge_coef = ridge.coefficients.as_ref().unwrap()[0];
        // centred x has sum of squares 5, so the ridge slope is 2 * 5 / 6
        assert!((ridge_coef - 10.0 / 6.0).abs() < 1e-10);
        assert!(ridge_coef < ols_coef);
    }

    #[test]
    fn test_not_fitted() {
        assert!(matches!(
            RidgeRegression::default().predict(&array![[1.0]]),
            Err(ScoreError::ModelNotFitted)
        ));
    }
}
