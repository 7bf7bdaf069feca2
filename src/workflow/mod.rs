//! The writing-score workflow
//!
//! Load → diagnostics → split → vocabulary → comparison → grid search →
//! evaluation, run strictly in order. Any error stops the run.

mod config;
mod report;

pub use config::WorkflowConfig;
pub use report::{ConsoleReporter, Reporter, SilentReporter};

use crate::data::{train_test_split, DataLoader, TrainTestSplit, UniqueValues};
use crate::error::Result;
use crate::optimizer::{Candidate, CandidateResult, GridSearchCV};
use crate::pipeline::{FittedPipeline, RegressionPipeline};
use crate::preprocessing::{ImputeStrategy, PreprocessorSpec};
use crate::training::{ComparisonRow, ModelComparator, RandomForestRegressor, RegressionMetrics};
use polars::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct WorkflowReport {
    pub n_rows: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub unique_values: Vec<UniqueValues>,
    /// Empty when the comparison is disabled
    pub comparison: Vec<ComparisonRow>,
    pub best_candidate: Candidate,
    pub best_score: f64,
    pub cv_results: Vec<CandidateResult>,
    pub metrics: RegressionMetrics,
    pub pipeline: FittedPipeline,
}

pub struct Workflow {
    config: WorkflowConfig,
}

impl Workflow {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Load the configured file and run every stage
    pub fn run<R: Reporter>(&self, reporter: &mut R) -> Result<WorkflowReport> {
        self.config.validate()?;
        let df = DataLoader::new().load_csv(&self.config.data_path)?;
        self.run_on_frame(&df, reporter)
    }

    /// Run every stage on an already loaded frame
    pub fn run_on_frame<R: Reporter>(
        &self,
        df: &DataFrame,
        reporter: &mut R,
    ) -> Result<WorkflowReport> {
        let start = Instant::now();
        let config = &self.config;
        config.validate()?;
        DataLoader::require_columns(df, &config.required_columns())?;
        for col in DataLoader::describe_columns(df)? {
            debug!(
                column = %col.name,
                dtype = %col.dtype,
                nulls = col.null_count,
                unique = col.n_unique,
                "Column summary"
            );
        }
        info!(rows = df.height(), columns = df.width(), target = %config.target_column, "Dataset ready");

        let unique_values = if config.show_unique_values {
            let values = config
                .diagnostic_columns
                .iter()
                .map(|c| DataLoader::unique_values(df, c))
                .collect::<Result<Vec<_>>>()?;
            reporter.unique_values(&values)?;
            values
        } else {
            Vec::new()
        };

        let split = train_test_split(df, &config.target_column, config.test_size, config.random_state)?;
        let vocabulary = config.vocabulary.resolve(&split.x_train)?;
        let preprocessor = PreprocessorSpec::new(
            config.numeric_columns.clone(),
            ImputeStrategy::Median,
            config.numeric_missing_sentinel,
            vocabulary,
            config.nominal_columns.clone(),
        );

        let comparison = if config.run_comparison {
            let rows = self.compare_models(&preprocessor, &split)?;
            reporter.comparison(&rows)?;
            rows
        } else {
            Vec::new()
        };

        let pipeline = RegressionPipeline::new(
            preprocessor,
            RandomForestRegressor::default().with_random_state(config.random_state),
        );
        let search = GridSearchCV::new(config.search_grid.clone(), config.cv_folds)
            .fit(&pipeline, &split.x_train, &split.y_train)?;
        reporter.search_result(&search)?;

        let predictions = search.best_pipeline.predict(&split.x_test)?;
        let metrics = RegressionMetrics::compute(&split.y_test, &predictions)?;
        reporter.metrics(&metrics)?;

        info!(
            mae = metrics.mae,
            mse = metrics.mse,
            r2 = metrics.r2,
            elapsed_secs = start.elapsed().as_secs_f64(),
            "Workflow finished"
        );

        Ok(WorkflowReport {
            n_rows: df.height(),
            n_train: split.n_train(),
            n_test: split.n_test(),
            unique_values,
            comparison,
            best_candidate: search.best_candidate,
            best_score: search.best_score,
            cv_results: search.cv_results,
            metrics,
            pipeline: search.best_pipeline,
        })
    }

    /// Baseline battery on the default preprocessing of the split
    fn compare_models(
        &self,
        preprocessor: &PreprocessorSpec,
        split: &TrainTestSplit,
    ) -> Result<Vec<ComparisonRow>> {
        let fitted = preprocessor.fit(&split.x_train)?;
        let x_train = fitted.transform(&split.x_train)?;
        let x_test = fitted.transform(&split.x_test)?;
        let mut comparator = ModelComparator::new(self.config.random_state);
        Ok(comparator.compare(&x_train, &split.y_train, &x_test, &split.y_test))
    }
}

