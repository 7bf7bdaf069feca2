//! CSV loading and column diagnostics

use super::string_column;
use crate::error::{Result, ScoreError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Loader for comma-delimited files with a header row.
///
/// The file extension is ignored: a file named `*.xls` that holds CSV text
/// loads like any other CSV file.
#[derive(Debug, Clone)]
pub struct DataLoader {
    infer_schema_length: usize,
    separator: u8,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Distinct values of a categorical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniqueValues {
    pub column: String,
    /// Non-null values in order of first appearance
    pub values: Vec<String>,
    pub has_null: bool,
}

impl std::fmt::Display for UniqueValues {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let quoted: Vec<String> = self.values.iter().map(|v| format!("'{}'", v)).collect();
        write!(f, "[{}", quoted.join(" "))?;
        if self.has_null {
            if quoted.is_empty() {
                write!(f, "null")?;
            } else {
                write!(f, " null")?;
            }
        }
        write!(f, "]")
    }
}

/// Per-column summary used for the dataset overview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: String,
    pub null_count: usize,
    pub n_unique: usize,
}

impl DataLoader {
    /// Create a loader that infers the schema from the first 1000 rows
    pub fn new() -> Self {
        Self {
            infer_schema_length: 1000,
            separator: b',',
        }
    }

    /// Set the number of rows used for schema inference
    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = rows;
        self
    }

    /// Set the field separator
    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    /// Load a CSV file into a DataFrame
    pub fn load_csv<P: AsRef<Path>>(&self, path: P) -> Result<DataFrame> {
        let path = path.as_ref();
        let start = Instant::now();
        let file = File::open(path)?;

        let parse_opts = CsvParseOptions::default().with_separator(self.separator);
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| ScoreError::DataError(format!("{}: {}", path.display(), e)))?;

        info!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded dataset"
        );
        Ok(df)
    }

    /// Check that every listed column exists, reporting the first one missing.
    pub fn require_columns(df: &DataFrame, columns: &[String]) -> Result<()> {
        for name in columns {
            if df.column(name).is_err() {
                return Err(ScoreError::FeatureNotFound(name.clone()));
            }
        }
        debug!(count = columns.len(), "All required columns present");
        Ok(())
    }

    /// Distinct non-null values of a column in order of first appearance
    pub fn unique_values(df: &DataFrame, column: &str) -> Result<UniqueValues> {
        let mut values: Vec<String> = Vec::new();
        let mut has_null = false;
        for v in string_column(df, column)? {
            match v {
                Some(s) => {
                    if !values.contains(&s) {
                        values.push(s);
                    }
                }
                None => has_null = true,
            }
        }
        Ok(UniqueValues {
            column: column.to_string(),
            values,
            has_null,
        })
    }

    /// Dtype, null count and distinct count for every column
    pub fn describe_columns(df: &DataFrame) -> Result<Vec<ColumnSummary>> {
        df.get_columns()
            .iter()
            .map(|col| -> Result<ColumnSummary> {
                let series = col.as_materialized_series();
                Ok(ColumnSummary {
                    name: series.name().to_string(),
                    dtype: series.dtype().to_string(),
                    null_count: series.null_count(),
                    n_unique: series.n_unique()?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str, suffix: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_csv_ignores_extension() {
        let file = write_csv("gender,math score\nfemale,72\nmale,69\n", ".xls");
        let df = DataLoader::new().load_csv(file.path()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = DataLoader::new()
            .load_csv("/definitely/not/here.csv")
            .unwrap_err();
        assert!(matches!(err, ScoreError::IoError(_)));
    }

    #[test]
    fn test_require_columns_reports_first_missing() {
        let df = df!("a" => &[1, 2], "b" => &[3, 4]).unwrap();
        let cols = vec!["a".to_string(), "c".to_string(), "d".to_string()];
        let err = DataLoader::require_columns(&df, &cols).unwrap_err();
        assert!(matches!(err, ScoreError::FeatureNotFound(ref c) if c == "c"));
    }

    #[test]
    fn test_require_columns_is_case_sensitive() {
        let df = df!("Gender" => &["male"]).unwrap();
        assert!(DataLoader::require_columns(&df, &["gender".to_string()]).is_err());
    }

    #[test]
    fn test_unique_values_first_appearance() {
        let df = df!("lunch" => &[Some("standard"), None, Some("free/reduced"), Some("standard")])
            .unwrap();
        let unique = DataLoader::unique_values(&df, "lunch").unwrap();
        assert_eq!(unique.values, vec!["standard", "free/reduced"]);
        assert!(unique.has_null);
        assert_eq!(unique.to_string(), "['standard' 'free/reduced' null]");
    }

    #[test]
    fn test_describe_columns() {
        let df = df!("a" => &[Some(1i64), None, Some(1)]).unwrap();
        let summary = DataLoader::describe_columns(&df).unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].null_count, 1);
        assert_eq!(summary[0].n_unique, 2);
    }
}
