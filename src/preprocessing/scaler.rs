//! Standard (z-score) scaling

use crate::data::numeric_column;
use crate::error::{Result, ScoreError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Centre and scale learned for one column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub mean: f64,
    /// Population standard deviation, or 1 for a constant column
    pub scale: f64,
}

/// Standard scaler: `(x - mean) / std` with the population std (ddof 0)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    columns: Vec<String>,
    params: HashMap<String, ScalerParams>,
    is_fitted: bool,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fitted statistics for a column
    pub fn statistics(&self, column: &str) -> Option<ScalerParams> {
        self.params.get(column).copied()
    }

    /// Fit the scaler to the data
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        let mut params = HashMap::with_capacity(columns.len());
        for name in columns {
            let values: Vec<f64> = numeric_column(df, name)?.into_iter().flatten().collect();
            if values.is_empty() {
                return Err(ScoreError::ValidationError(format!(
                    "cannot scale column '{}' with no values",
                    name
                )));
            }
            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();
            params.insert(
                name.clone(),
                ScalerParams {
                    mean,
                    scale: if std == 0.0 { 1.0 } else { std },
                },
            );
        }

        self.columns = columns.to_vec();
        self.params = params;
        self.is_fitted = true;
        Ok(self)
    }

    /// Scale the fitted columns, leaving nulls as nulls
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(ScoreError::ModelNotFitted);
        }

        let mut result = df.clone();
        for name in &self.columns {
            let p = self.params[name];
            let scaled: Float64Chunked = numeric_column(df, name)?
                .into_iter()
                .map(|v| v.map(|x| (x - p.mean) / p.scale))
                .collect();
            result.with_column(scaled.with_name(name.as_str().into()).into_series())?;
        }
        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_standard_scaler() {
        let df = df!("a" => &[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let mut scaler = StandardScaler::new();
        let result = scaler.fit_transform(&df, &cols(&["a"])).unwrap();

        let values: Vec<f64> = numeric_column(&result, "a").unwrap().into_iter().flatten().collect();
        let mean = values.iter().sum::<f64>() / 5.0;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 5.0;
        assert!(mean.abs() < 1e-10);
        assert!((var - 1.0).abs() < 1e-10);

        let params = scaler.statistics("a").unwrap();
        assert!((params.scale - 2.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_constant_column_scale_is_one() {
        let df = df!("a" => &[7.0, 7.0, 7.0]).unwrap();
        let mut scaler = StandardScaler::new();
        let result = scaler.fit_transform(&df, &cols(&["a"])).unwrap();
        assert_eq!(scaler.statistics("a").unwrap().scale, 1.0);
        let values = numeric_column(&result, "a").unwrap();
        assert!(values.iter().all(|v| *v == Some(0.0)));
    }

    #[test]
    fn test_reuses_training_statistics() {
        let train = df!("a" => &[0.0, 10.0]).unwrap();
        let test = df!("a" => &[20.0]).unwrap();
        let mut scaler = StandardScaler::new();
        scaler.fit(&train, &cols(&["a"])).unwrap();
        let out = scaler.transform(&test).unwrap();
        assert_eq!(numeric_column(&out, "a").unwrap(), vec![Some(3.0)]);
    }

    #[test]
    fn test_refit_identical() {
        let df = df!("a" => &[3.0, 1.0, 4.0, 1.0, 5.0]).unwrap();
        let mut a = StandardScaler::new();
        let mut b = StandardScaler::new();
        a.fit(&df, &cols(&["a"])).unwrap();
        b.fit(&df, &cols(&["a"])).unwrap();
        assert_eq!(a.statistics("a"), b.statistics("a"));
    }

    #[test]
    fn test_unfitted() {
        let df = df!("a" => &[1.0]).unwrap();
        assert!(matches!(
            StandardScaler::new().transform(&df),
            Err(ScoreError::ModelNotFitted)
        ));
    }
}
