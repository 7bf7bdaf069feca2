//! Workflow configuration

use crate::error::{Result, ScoreError};
use crate::optimizer::SearchGrid;
use crate::preprocessing::CategoricalVocabulary;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Everything the writing-score workflow needs to run.
///
/// `Default` reproduces the student-performance setup; a JSON file can
/// override any subset of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Input CSV (the extension is not checked)
    pub data_path: PathBuf,

    /// Column to predict
    pub target_column: String,

    /// Numeric features: imputed then standardised
    pub numeric_columns: Vec<String>,

    /// Value treated as missing in numeric columns, besides nulls
    pub numeric_missing_sentinel: Option<f64>,

    /// Ordinal features and their category orders
    pub vocabulary: CategoricalVocabulary,

    /// Nominal features: imputed then one-hot encoded
    pub nominal_columns: Vec<String>,

    /// Columns whose distinct values are printed after loading
    pub diagnostic_columns: Vec<String>,

    /// Fraction of rows held out for the final evaluation
    pub test_size: f64,

    /// Seed for the split and the forest
    pub random_state: u64,

    /// Folds for grid-search cross-validation
    pub cv_folds: usize,

    pub search_grid: SearchGrid,

    /// Run the regressor comparison battery
    pub run_comparison: bool,

    /// Print distinct categorical values
    pub show_unique_values: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("./dataset/StudentScore.xls"),
            target_column: "writing score".to_string(),
            numeric_columns: vec!["reading score".to_string(), "math score".to_string()],
            numeric_missing_sentinel: Some(-1.0),
            vocabulary: CategoricalVocabulary::new()
                .declare(
                    "parental level of education",
                    &[
                        "some high school",
                        "high school",
                        "some college",
                        "associate's degree",
                        "bachelor's degree",
                        "master's degree",
                    ],
                )
                .declare("gender", &["male", "female"])
                .infer("lunch")
                .infer("test preparation course"),
            nominal_columns: vec!["race/ethnicity".to_string()],
            diagnostic_columns: vec![
                "gender".to_string(),
                "race/ethnicity".to_string(),
                "parental level of education".to_string(),
                "lunch".to_string(),
                "test preparation course".to_string(),
            ],
            test_size: 0.2,
            random_state: 42,
            cv_folds: 5,
            search_grid: SearchGrid::default(),
            run_comparison: true,
            show_unique_values: true,
        }
    }
}

impl WorkflowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a (partial) configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        Ok(config)
    }

    pub fn with_data_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.data_path = path.into();
        self
    }

    pub fn with_search_grid(mut self, grid: SearchGrid) -> Self {
        self.search_grid = grid;
        self
    }

    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    pub fn with_comparison(mut self, enabled: bool) -> Self {
        self.run_comparison = enabled;
        self
    }

    pub fn with_unique_values(mut self, enabled: bool) -> Self {
        self.show_unique_values = enabled;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Every feature column the preprocessor reads
    pub fn feature_columns(&self) -> Vec<String> {
        self.numeric_columns
            .iter()
            .cloned()
            .chain(self.vocabulary.columns())
            .chain(self.nominal_columns.iter().cloned())
            .collect()
    }

    /// Columns the input file must contain
    pub fn required_columns(&self) -> Vec<String> {
        let mut cols = self.feature_columns();
        cols.push(self.target_column.clone());
        for c in &self.diagnostic_columns {
            if !cols.contains(c) {
                cols.push(c.clone());
            }
        }
        cols
    }

    /// Check ranges and column groups
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(ScoreError::ConfigError(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if self.cv_folds < 2 {
            return Err(ScoreError::ConfigError(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        if self.numeric_columns.is_empty() {
            return Err(ScoreError::ConfigError("no numeric columns configured".to_string()));
        }
        if self.vocabulary.columns().is_empty() {
            return Err(ScoreError::ConfigError("no ordinal columns configured".to_string()));
        }
        if self.nominal_columns.is_empty() {
            return Err(ScoreError::ConfigError("no nominal columns configured".to_string()));
        }
        self.vocabulary.validate()?;
        self.search_grid.validate()?;

        let mut seen = HashSet::new();
        for col in self.feature_columns() {
            if col == self.target_column {
                return Err(ScoreError::ConfigError(format!(
                    "target column '{}' is also listed as a feature",
                    col
                )));
            }
            if !seen.insert(col.clone()) {
                return Err(ScoreError::ConfigError(format!(
                    "column '{}' appears in more than one feature group",
                    col
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_is_valid() {
        let config = WorkflowConfig::default();
        config.validate().unwrap();
        assert_eq!(config.feature_columns().len(), 7);
        assert_eq!(config.required_columns().len(), 8);
        assert_eq!(config.search_grid.len(), 72);
    }

    #[test]
    fn test_partial_json_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"cv_folds": 3, "run_comparison": false}}"#).unwrap();
        let config = WorkflowConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.cv_folds, 3);
        assert!(!config.run_comparison);
        assert_eq!(config.target_column, "writing score");
    }

    #[test]
    fn test_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        assert!(matches!(
            WorkflowConfig::from_json_file(file.path()),
            Err(ScoreError::SerializationError(_))
        ));
    }

    #[test]
    fn test_validate_rejects() {
        let mut c = WorkflowConfig::default();
        c.test_size = 1.0;
        assert!(c.validate().is_err());

        let c = WorkflowConfig::default().with_cv_folds(1);
        assert!(c.validate().is_err());

        let mut c = WorkflowConfig::default();
        c.numeric_columns.push("writing score".to_string());
        assert!(matches!(c.validate(), Err(ScoreError::ConfigError(_))));

        let mut c = WorkflowConfig::default();
        c.nominal_columns.push("gender".to_string());
        assert!(c.validate().is_err());
    }
}
