//! Missing value imputation strategies

use crate::data::{numeric_column, string_column};
use crate::error::{Result, ScoreError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Strategy for imputing missing values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    /// Replace with mean (numeric only)
    Mean,
    /// Replace with median (numeric only)
    Median,
    /// Replace with the most frequent value, ties go to the smallest value
    MostFrequent,
    /// Replace with a constant value (numeric only)
    Constant(f64),
}

impl fmt::Display for ImputeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImputeStrategy::Mean => write!(f, "mean"),
            ImputeStrategy::Median => write!(f, "median"),
            ImputeStrategy::MostFrequent => write!(f, "most_frequent"),
            ImputeStrategy::Constant(v) => write!(f, "constant({})", v),
        }
    }
}

impl std::str::FromStr for ImputeStrategy {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mean" => Ok(ImputeStrategy::Mean),
            "median" => Ok(ImputeStrategy::Median),
            "most_frequent" => Ok(ImputeStrategy::MostFrequent),
            other => Err(ScoreError::InvalidParameter {
                name: "strategy".to_string(),
                value: other.to_string(),
                reason: "expected one of mean, median, most_frequent".to_string(),
            }),
        }
    }
}

/// Learned fill value for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeValue {
    Numeric(f64),
    Text(String),
}

/// Imputer for handling missing values.
///
/// Nulls are always missing. Numeric columns may additionally declare a
/// sentinel value (e.g. `-1`) that is treated as missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    strategy: ImputeStrategy,
    missing_sentinel: Option<f64>,
    columns: Vec<String>,
    fill_values: HashMap<String, ImputeValue>,
    is_fitted: bool,
}

impl Imputer {
    /// Create a new imputer with the specified strategy
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            missing_sentinel: None,
            columns: Vec::new(),
            fill_values: HashMap::new(),
            is_fitted: false,
        }
    }

    /// Treat `value` as missing in numeric columns
    pub fn with_missing_sentinel(mut self, value: f64) -> Self {
        self.missing_sentinel = Some(value);
        self
    }

    pub fn strategy(&self) -> &ImputeStrategy {
        &self.strategy
    }

    /// Learned fill value for a column
    pub fn fill_value(&self, column: &str) -> Option<&ImputeValue> {
        self.fill_values.get(column)
    }

    /// Fit the imputer to the data
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        let mut fill_values = HashMap::with_capacity(columns.len());
        for name in columns {
            let series = df
                .column(name)
                .map_err(|_| ScoreError::FeatureNotFound(name.clone()))?;
            let fill = if series.dtype().is_primitive_numeric() {
                self.numeric_fill(name, &self.observed_numeric(df, name)?)?
            } else {
                self.text_fill(name, df)?
            };
            fill_values.insert(name.clone(), fill);
        }

        self.columns = columns.to_vec();
        self.fill_values = fill_values;
        self.is_fitted = true;
        Ok(self)
    }

    /// Replace missing values in the fitted columns
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(ScoreError::ModelNotFitted);
        }

        let mut result = df.clone();
        for name in &self.columns {
            let filled = match &self.fill_values[name] {
                ImputeValue::Numeric(fill) => {
                    let ca: Float64Chunked = numeric_column(df, name)?
                        .into_iter()
                        .map(|v| Some(self.present(v).unwrap_or(*fill)))
                        .collect();
                    ca.with_name(name.as_str().into()).into_series()
                }
                ImputeValue::Text(fill) => {
                    let ca: StringChunked = string_column(df, name)?
                        .into_iter()
                        .map(|v| Some(v.unwrap_or_else(|| fill.clone())))
                        .collect();
                    ca.with_name(name.as_str().into()).into_series()
                }
            };
            result.with_column(filled)?;
        }
        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    fn present(&self, value: Option<f64>) -> Option<f64> {
        match (value, self.missing_sentinel) {
            (Some(v), Some(s)) if v == s => None,
            (Some(v), _) if v.is_nan() => None,
            (v, _) => v,
        }
    }

    fn observed_numeric(&self, df: &DataFrame, name: &str) -> Result<Vec<f64>> {
        Ok(numeric_column(df, name)?
            .into_iter()
            .filter_map(|v| self.present(v))
            .collect())
    }

    fn numeric_fill(&self, name: &str, observed: &[f64]) -> Result<ImputeValue> {
        if let ImputeStrategy::Constant(v) = self.strategy {
            return Ok(ImputeValue::Numeric(v));
        }
        if observed.is_empty() {
            return Err(ScoreError::ValidationError(format!(
                "column '{}' has no observed values to impute from",
                name
            )));
        }
        let fill = match self.strategy {
            ImputeStrategy::Mean => observed.iter().sum::<f64>() / observed.len() as f64,
            ImputeStrategy::Median => median(observed),
            ImputeStrategy::MostFrequent => most_frequent_numeric(observed),
            ImputeStrategy::Constant(v) => v,
        };
        Ok(ImputeValue::Numeric(fill))
    }

    fn text_fill(&self, name: &str, df: &DataFrame) -> Result<ImputeValue> {
        if self.strategy != ImputeStrategy::MostFrequent {
            return Err(ScoreError::InvalidParameter {
                name: "strategy".to_string(),
                value: self.strategy.to_string(),
                reason: format!("cannot be applied to non-numeric column '{}'", name),
            });
        }
        let mut counts: HashMap<String, usize> = HashMap::new();
        for v in string_column(df, name)?.into_iter().flatten() {
            *counts.entry(v).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .max_by(|(a, ca), (b, cb)| ca.cmp(cb).then_with(|| b.cmp(a)))
            .map(|(v, _)| ImputeValue::Text(v))
            .ok_or_else(|| {
                ScoreError::ValidationError(format!(
                    "column '{}' has no observed values to impute from",
                    name
                ))
            })
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn most_frequent_numeric(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mut best = sorted[0];
    let mut best_count = 0;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i;
        while j < sorted.len() && sorted[j] == sorted[i] {
            j += 1;
        }
        // strictly greater keeps the smallest value on ties
        if j - i > best_count {
            best_count = j - i;
            best = sorted[i];
        }
        i = j;
    }
    best
}
