//! Scorecast - writing-score regression on tabular student data
//!
//! This crate provides the complete workflow:
//! - CSV loading and categorical diagnostics
//! - Seeded train/test splitting
//! - Imputation, scaling, ordinal and one-hot encoding per column group
//! - A baseline comparison over a battery of regressors
//! - Cross-validated grid search over a random-forest pipeline
//! - Held-out evaluation (MAE, MSE, R²)
//!
//! # Modules
//!
//! - [`data`] - Loading, diagnostics and train/test split
//! - [`preprocessing`] - Imputers, scaler, encoders and the column transformer
//! - [`training`] - Regression trees, forests, baselines, CV and metrics
//! - [`optimizer`] - Hyperparameter grid and grid search
//! - [`pipeline`] - Preprocessor + forest as one estimator
//! - [`workflow`] - Configuration, reporting and the end-to-end run
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

pub mod data;
pub mod preprocessing;
pub mod training;
pub mod optimizer;
pub mod pipeline;
pub mod workflow;

// Services
pub mod cli;

pub use error::{Result, ScoreError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, ScoreError};

    // Data
    pub use crate::data::{train_test_split, DataLoader, TrainTestSplit, UniqueValues};

    // Preprocessing
    pub use crate::preprocessing::{
        CategoricalVocabulary, FittedPreprocessor, ImputeStrategy, PreprocessorSpec,
        ResolvedVocabulary,
    };

    // Training
    pub use crate::training::{
        Criterion, ModelComparator, RandomForestRegressor, RegressionMetrics, Regressor,
    };

    // Search
    pub use crate::optimizer::{Candidate, GridSearchCV, GridSearchResult, SearchGrid};
    pub use crate::pipeline::{FittedPipeline, RegressionPipeline};

    // Workflow
    pub use crate::workflow::{
        ConsoleReporter, Reporter, SilentReporter, Workflow, WorkflowConfig, WorkflowReport,
    };
}
