//! Hyperparameter grid for the forest pipeline

use crate::error::{Result, ScoreError};
use crate::preprocessing::ImputeStrategy;
use crate::training::Criterion;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

pub const PARAM_CRITERION: &str = "model.criterion";
pub const PARAM_MAX_DEPTH: &str = "model.max_depth";
pub const PARAM_N_ESTIMATORS: &str = "model.n_estimators";
pub const PARAM_IMPUTER_STRATEGY: &str = "preprocessor.numeric.imputer.strategy";

/// One point of the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub criterion: Criterion,
    pub max_depth: Option<usize>,
    pub n_estimators: usize,
    pub numeric_imputer_strategy: ImputeStrategy,
}

impl Candidate {
    /// Parameter name to value, keyed by the dotted parameter path
    pub fn params(&self) -> BTreeMap<&'static str, Value> {
        let mut params = BTreeMap::new();
        params.insert(PARAM_CRITERION, Value::from(self.criterion.as_str()));
        params.insert(
            PARAM_MAX_DEPTH,
            self.max_depth.map_or(Value::Null, Value::from),
        );
        params.insert(PARAM_N_ESTIMATORS, Value::from(self.n_estimators));
        params.insert(
            PARAM_IMPUTER_STRATEGY,
            Value::from(self.numeric_imputer_strategy.to_string()),
        );
        params
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .params()
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Values to try for each tunable parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchGrid {
    pub criterion: Vec<Criterion>,
    pub max_depth: Vec<Option<usize>>,
    pub n_estimators: Vec<usize>,
    pub numeric_imputer_strategy: Vec<ImputeStrategy>,
}

impl Default for SearchGrid {
    fn default() -> Self {
        Self {
            criterion: Criterion::ALL.to_vec(),
            max_depth: vec![None, Some(2), Some(5)],
            n_estimators: vec![100, 200, 300],
            numeric_imputer_strategy: vec![ImputeStrategy::Median, ImputeStrategy::Mean],
        }
    }
}

impl SearchGrid {
    pub fn validate(&self) -> Result<()> {
        let dims = [
            (PARAM_CRITERION, self.criterion.is_empty()),
            (PARAM_MAX_DEPTH, self.max_depth.is_empty()),
            (PARAM_N_ESTIMATORS, self.n_estimators.is_empty()),
            (PARAM_IMPUTER_STRATEGY, self.numeric_imputer_strategy.is_empty()),
        ];
        if let Some((name, _)) = dims.iter().find(|(_, empty)| *empty) {
            return Err(ScoreError::ConfigError(format!(
                "grid dimension '{}' has no values",
                name
            )));
        }
        if self.n_estimators.contains(&0) {
            return Err(ScoreError::ConfigError(
                "n_estimators values must be at least 1".to_string(),
            ));
        }
        if self.max_depth.contains(&Some(0)) {
            return Err(ScoreError::ConfigError(
                "max_depth values must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.criterion.len()
            * self.max_depth.len()
            * self.n_estimators.len()
            * self.numeric_imputer_strategy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All combinations, parameter names in alphabetical order with the
    /// first name varying slowest
    pub fn candidates(&self) -> Vec<Candidate> {
        let mut out = Vec::with_capacity(self.len());
        for &criterion in &self.criterion {
            for &max_depth in &self.max_depth {
                for &n_estimators in &self.n_estimators {
                    for strategy in &self.numeric_imputer_strategy {
                        out.push(Candidate {
                            criterion,
                            max_depth,
                            n_estimators,
                            numeric_imputer_strategy: strategy.clone(),
                        });
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid_size_and_order() {
        let grid = SearchGrid::default();
        let candidates = grid.candidates();
        assert_eq!(candidates.len(), 72);
        assert_eq!(grid.len(), 72);

        assert_eq!(candidates[0].criterion, Criterion::SquaredError);
        assert_eq!(candidates[0].max_depth, None);
        assert_eq!(candidates[0].n_estimators, 100);
        assert_eq!(candidates[0].numeric_imputer_strategy, ImputeStrategy::Median);
        assert_eq!(candidates[1].numeric_imputer_strategy, ImputeStrategy::Mean);
        assert_eq!(candidates[2].n_estimators, 200);
        assert_eq!(candidates[6].max_depth, Some(2));
        assert_eq!(candidates[18].criterion, Criterion::AbsoluteError);
        assert_eq!(candidates[71].criterion, Criterion::Poisson);
    }

    #[test]
    fn test_params_keys_sorted() {
        let c = &SearchGrid::default().candidates()[0];
        let params = c.params();
        let keys: Vec<&str> = params.keys().copied().collect();
        assert_eq!(
            keys,
            vec![PARAM_CRITERION, PARAM_MAX_DEPTH, PARAM_N_ESTIMATORS, PARAM_IMPUTER_STRATEGY]
        );
        assert_eq!(params[PARAM_MAX_DEPTH], Value::Null);
        assert_eq!(
            c.to_string(),
            "model.criterion=\"squared_error\", model.max_depth=null, model.n_estimators=100, preprocessor.numeric.imputer.strategy=\"median\""
        );
    }

    #[test]
    fn test_empty_dimension_rejected() {
        let grid = SearchGrid {
            n_estimators: Vec::new(),
            ..SearchGrid::default()
        };
        assert!(matches!(grid.validate(), Err(ScoreError::ConfigError(_))));
        assert!(grid.is_empty());
    }

    #[test]
    fn test_grid_deserializes_partially() {
        let grid: SearchGrid =
            serde_json::from_str(r#"{"criterion": ["poisson"], "max_depth": [null, 3]}"#).unwrap();
        assert_eq!(grid.criterion, vec![Criterion::Poisson]);
        assert_eq!(grid.max_depth, vec![None, Some(3)]);
        assert_eq!(grid.len(), 1 * 2 * 3 * 2);
    }
}
