//! Gradient boosted regression trees with squared loss

use super::decision_tree::{Criterion, DecisionTree};
use super::models::{check_fit_input, check_predict_input, Regressor};
use crate::error::{Result, ScoreError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Gradient Boosting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingConfig {
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Split criterion of the stage trees
    pub criterion: Criterion,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
            criterion: Criterion::FriedmanMse,
        }
    }
}

/// Gradient Boosting Regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    config: GradientBoostingConfig,
    trees: Vec<DecisionTree>,
    initial_prediction: f64,
    n_features: usize,
}

impl Default for GradientBoostingRegressor {
    fn default() -> Self {
        Self::new(GradientBoostingConfig::default())
    }
}

impl GradientBoostingRegressor {
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            initial_prediction: 0.0,
            n_features: 0,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for GradientBoostingRegressor {
    fn name(&self) -> &str {
        "GradientBoostingRegressor"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        if !(self.config.learning_rate > 0.0) {
            return Err(ScoreError::InvalidParameter {
                name: "learning_rate".to_string(),
                value: self.config.learning_rate.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        self.initial_prediction = y.sum() / y.len() as f64;
        let mut predictions = Array1::from_elem(y.len(), self.initial_prediction);
        let mut trees = Vec::with_capacity(self.config.n_estimators);

        for _ in 0..self.config.n_estimators {
            let residuals = y - &predictions;

            let mut tree = DecisionTree::new()
                .with_max_depth(Some(self.config.max_depth))
                .with_min_samples_leaf(self.config.min_samples_leaf)
                .with_criterion(self.config.criterion);
            tree.fit(x, &residuals)?;

            predictions.scaled_add(self.config.learning_rate, &tree.predict(x)?);
            trees.push(tree);
        }

        self.trees = trees;
        self.n_features = x.ncols();
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() && self.n_features == 0 {
            return Err(ScoreError::ModelNotFitted);
        }
        check_predict_input(x, self.n_features)?;

        let mut predictions = Array1::from_elem(x.nrows(), self.initial_prediction);
        for tree in &self.trees {
            predictions.scaled_add(self.config.learning_rate, &tree.predict(x)?);
        }
        Ok(predictions)
    }
}
