//! Tabular data access: loading, column extraction and train/test splitting

mod loader;
mod split;

pub use loader::{ColumnSummary, DataLoader, UniqueValues};
pub use split::{train_test_split, TrainTestSplit};

use crate::error::{Result, ScoreError};
use ndarray::{Array1, Array2};
use polars::prelude::*;

fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|c| c.as_materialized_series())
        .map_err(|_| ScoreError::FeatureNotFound(name.to_string()))
}

/// Read a column as optional `f64` values, casting integer columns.
pub fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = column(df, name)?;
    if !series.dtype().is_primitive_numeric() {
        return Err(ScoreError::DataError(format!(
            "column '{}' is not numeric (dtype {})",
            name,
            series.dtype()
        )));
    }
    let casted = series.cast(&DataType::Float64)?;
    Ok(casted.f64()?.into_iter().collect())
}

/// Read a column as optional strings.
pub fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = column(df, name)?;
    let casted = series.cast(&DataType::String)?;
    Ok(casted
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Extract a fully populated numeric column as a target vector.
pub fn target_vector(df: &DataFrame, name: &str) -> Result<Array1<f64>> {
    let values = numeric_column(df, name)?;
    let mut out = Vec::with_capacity(values.len());
    for (row, v) in values.into_iter().enumerate() {
        match v {
            Some(x) => out.push(x),
            None => {
                return Err(ScoreError::DataError(format!(
                    "target column '{}' has a missing value at row {}",
                    name, row
                )))
            }
        }
    }
    Ok(Array1::from_vec(out))
}

/// Stack numeric columns into a dense matrix. Nulls are rejected.
pub fn columns_to_array2(df: &DataFrame, columns: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let mut matrix = Array2::zeros((n_rows, columns.len()));
    for (j, name) in columns.iter().enumerate() {
        let values = numeric_column(df, name)?;
        for (i, v) in values.into_iter().enumerate() {
            matrix[[i, j]] = v.ok_or_else(|| {
                ScoreError::DataError(format!("column '{}' has a missing value at row {}", name, i))
            })?;
        }
    }
    Ok(matrix)
}

/// Select rows by position, preserving the given order.
pub fn take_rows(df: &DataFrame, indices: &[usize]) -> Result<DataFrame> {
    let idx: Vec<IdxSize> = indices.iter().map(|&i| i as IdxSize).collect();
    let idx = IdxCa::from_vec("idx".into(), idx);
    Ok(df.take(&idx)?)
}
