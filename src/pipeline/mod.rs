//! Preprocessor plus random forest as one estimator
//!
//! [`RegressionPipeline`] is the unfit specification that grid search
//! varies; [`FittedPipeline`] is the immutable result of fitting it and the
//! only value that can predict.

use crate::error::{Result, ScoreError};
use crate::optimizer::Candidate;
use crate::preprocessing::{FittedPreprocessor, PreprocessorSpec};
use crate::training::RandomForestRegressor;
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Unfitted preprocessing + model specification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionPipeline {
    pub preprocessor: PreprocessorSpec,
    pub model: RandomForestRegressor,
}

impl RegressionPipeline {
    pub fn new(preprocessor: PreprocessorSpec, model: RandomForestRegressor) -> Self {
        Self {
            preprocessor,
            model,
        }
    }

    /// Copy of this pipeline with a candidate's hyperparameters applied
    pub fn with_candidate(&self, candidate: &Candidate) -> Self {
        Self {
            preprocessor: self
                .preprocessor
                .clone()
                .with_numeric_strategy(candidate.numeric_imputer_strategy.clone()),
            model: self
                .model
                .clone()
                .with_n_estimators(candidate.n_estimators)
                .with_criterion(candidate.criterion)
                .with_max_depth(candidate.max_depth),
        }
    }

    /// Fit the preprocessor on `x`, then the forest on the transformed rows
    pub fn fit(&self, x: &DataFrame, y: &Array1<f64>) -> Result<FittedPipeline> {
        if x.height() != y.len() {
            return Err(ScoreError::ShapeError {
                expected: format!("{} targets", x.height()),
                actual: format!("{} targets", y.len()),
            });
        }
        let preprocessor = self.preprocessor.fit(x)?;
        let features = preprocessor.transform(x)?;
        let mut model = self.model.clone();
        model.fit(&features, y)?;
        Ok(FittedPipeline {
            preprocessor,
            model,
        })
    }
}

/// Fitted preprocessor and forest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedPipeline {
    preprocessor: FittedPreprocessor,
    model: RandomForestRegressor,
}

impl FittedPipeline {
    /// Predict targets for raw feature rows
    pub fn predict(&self, x: &DataFrame) -> Result<Array1<f64>> {
        let features = self.preprocessor.transform(x)?;
        self.model.predict(&features)
    }

    pub fn preprocessor(&self) -> &FittedPreprocessor {
        &self.preprocessor
    }

    pub fn model(&self) -> &RandomForestRegressor {
        &self.model
    }

    /// Forest importances paired with the preprocessed feature names
    pub fn feature_importances(&self) -> Vec<(String, f64)> {
        match self.model.feature_importances() {
            Some(imp) => self
                .preprocessor
                .feature_names()
                .into_iter()
                .zip(imp.iter().copied())
                .collect(),
            None => Vec::new(),
        }
    }
}
