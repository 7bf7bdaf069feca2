//! CART regression tree

use super::models::{check_fit_input, check_predict_input, Regressor};
use crate::error::{Result, ScoreError};
use ndarray::{Array1, Array2};
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Node impurity below which a node is treated as pure
const PURITY_EPS: f64 = 1e-12;

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf {
        value: f64,
        n_samples: usize,
    },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// Split quality criterion for regression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// Variance reduction, leaves predict the mean
    SquaredError,
    /// Reduction of mean absolute deviation, leaves predict the median
    AbsoluteError,
    /// Friedman's improvement score, leaves predict the mean
    FriedmanMse,
    /// Reduction of half Poisson deviance, leaves predict the mean
    Poisson,
}

impl Criterion {
    pub const ALL: [Criterion; 4] = [
        Criterion::SquaredError,
        Criterion::AbsoluteError,
        Criterion::FriedmanMse,
        Criterion::Poisson,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::SquaredError => "squared_error",
            Criterion::AbsoluteError => "absolute_error",
            Criterion::FriedmanMse => "friedman_mse",
            Criterion::Poisson => "poisson",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Criterion {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self> {
        Criterion::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ScoreError::InvalidParameter {
                name: "criterion".to_string(),
                value: s.to_string(),
                reason: "expected squared_error, absolute_error, friedman_mse or poisson"
                    .to_string(),
            })
    }
}

/// Require non-negative targets with a positive sum
pub(crate) fn check_poisson_targets(y: &Array1<f64>) -> Result<()> {
    if y.iter().any(|&v| v < 0.0) {
        return Err(ScoreError::ValidationError(
            "poisson criterion requires non-negative targets".to_string(),
        ));
    }
    if y.sum() <= 0.0 {
        return Err(ScoreError::ValidationError(
            "poisson criterion requires targets with a positive sum".to_string(),
        ));
    }
    Ok(())
}

fn x_ln_x(v: f64) -> f64 {
    if v > 0.0 {
        v * v.ln()
    } else {
        0.0
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn mean_abs_deviation_sorted(sorted: &[f64]) -> f64 {
    let m = median_of_sorted(sorted);
    sorted.iter().map(|v| (v - m).abs()).sum::<f64>() / sorted.len() as f64
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Impurity of a node holding `values`
fn node_impurity(criterion: Criterion, values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    match criterion {
        Criterion::SquaredError | Criterion::FriedmanMse => {
            let m = mean(values);
            values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
        }
        Criterion::AbsoluteError => mean_abs_deviation_sorted(&sorted_copy(values)),
        Criterion::Poisson => {
            let m = mean(values);
            values.iter().map(|&v| x_ln_x(v)).sum::<f64>() / values.len() as f64 - x_ln_x(m)
        }
    }
}

fn leaf_value(criterion: Criterion, values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    match criterion {
        Criterion::AbsoluteError => median_of_sorted(&sorted_copy(values)),
        _ => mean(values),
    }
}

/// Best split found for a single feature
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    score: f64,
}

/// Regression tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Tree root
    root: Option<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Number of features sampled at each split, all when `None`
    pub max_features: Option<usize>,
    /// Split criterion
    pub criterion: Criterion,
    /// Seed for feature sampling when fitting on its own
    pub random_state: Option<u64>,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    /// Create a new regression tree with squared error
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            criterion: Criterion::SquaredError,
            random_state: None,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Set criterion
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Limit the features examined at each split
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fit the tree to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state.unwrap_or(0));
        self.fit_with_rng(x, y, &mut rng)
    }

    /// Fit using a caller-owned RNG for feature sampling
    pub fn fit_with_rng(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        rng: &mut ChaCha8Rng,
    ) -> Result<&mut Self> {
        check_fit_input(x, y)?;
        if self.min_samples_split < 2 {
            return Err(ScoreError::InvalidParameter {
                name: "min_samples_split".to_string(),
                value: self.min_samples_split.to_string(),
                reason: "must be at least 2".to_string(),
            });
        }
        if self.min_samples_leaf < 1 {
            return Err(ScoreError::InvalidParameter {
                name: "min_samples_leaf".to_string(),
                value: self.min_samples_leaf.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_depth == Some(0) {
            return Err(ScoreError::InvalidParameter {
                name: "max_depth".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.criterion == Criterion::Poisson {
            check_poisson_targets(y)?;
        }

        let n_features = x.ncols();
        self.n_features = n_features;

        let mut importances = vec![0.0; n_features];
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.root = Some(self.build_tree(x, y, &indices, 0, &mut importances, rng));

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        importances: &mut [f64],
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let y_subset: Vec<f64> = indices.iter().map(|&i| y[i]).collect();
        let impurity = node_impurity(self.criterion, &y_subset);

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || impurity <= PURITY_EPS;

        let leaf = || TreeNode::Leaf {
            value: leaf_value(self.criterion, &y_subset),
            n_samples,
        };

        if should_stop {
            return leaf();
        }

        let features = self.sample_features(x.ncols(), rng);
        let best = match self.find_best_split(x, y, indices, &features, impurity) {
            Some(best) => best,
            None => return leaf(),
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, best.feature_idx]] <= best.threshold);

        let left_y: Vec<f64> = left_indices.iter().map(|&i| y[i]).collect();
        let right_y: Vec<f64> = right_indices.iter().map(|&i| y[i]).collect();
        let weighted_child_impurity = (left_y.len() as f64
            * node_impurity(self.criterion, &left_y)
            + right_y.len() as f64 * node_impurity(self.criterion, &right_y))
            / n_samples as f64;
        importances[best.feature_idx] +=
            (n_samples as f64 * (impurity - weighted_child_impurity)).max(0.0);

        let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1, importances, rng));
        let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1, importances, rng));

        TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            left,
            right,
            n_samples,
            impurity,
        }
    }

    fn sample_features(&self, n_features: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
        match self.max_features {
            Some(k) if k < n_features => {
                let mut chosen = sample(rng, n_features, k.max(1)).into_vec();
                chosen.sort_unstable();
                chosen
            }
            _ => (0..n_features).collect(),
        }
    }

    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        features: &[usize],
        parent_impurity: f64,
    ) -> Option<SplitCandidate> {
        let per_feature: Vec<Option<SplitCandidate>> = features
            .par_iter()
            .map(|&f| self.best_split_for_feature(x, y, indices, f, parent_impurity))
            .collect();

        // first best wins on ties, in feature order
        let mut best: Option<SplitCandidate> = None;
        for candidate in per_feature.into_iter().flatten() {
            if best.map_or(true, |b| candidate.score > b.score) {
                best = Some(candidate);
            }
        }
        best
    }

    /// Sweep the sorted values of one feature and score every valid threshold.
    fn best_split_for_feature(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        feature_idx: usize,
        parent_impurity: f64,
    ) -> Option<SplitCandidate> {
        let mut pairs: Vec<(f64, f64)> = indices
            .iter()
            .map(|&i| (x[[i, feature_idx]], y[i]))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = pairs.len();
        let n_f = n as f64;
        let total_sum: f64 = pairs.iter().map(|p| p.1).sum();
        let total_sq: f64 = pairs.iter().map(|p| p.1 * p.1).sum();
        let total_xlnx: f64 = pairs.iter().map(|p| x_ln_x(p.1)).sum();

        let track_order = self.criterion == Criterion::AbsoluteError;
        let mut left_sorted: Vec<f64> = Vec::new();
        let mut right_sorted: Vec<f64> = if track_order {
            sorted_copy(&pairs.iter().map(|p| p.1).collect::<Vec<_>>())
        } else {
            Vec::new()
        };

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        let mut left_xlnx = 0.0;
        let mut best: Option<(f64, f64)> = None;

        for i in 0..n - 1 {
            let yi = pairs[i].1;
            left_sum += yi;
            left_sq += yi * yi;
            left_xlnx += x_ln_x(yi);
            if track_order {
                let pos = left_sorted.partition_point(|v| *v < yi);
                left_sorted.insert(pos, yi);
                let pos = right_sorted.partition_point(|v| *v < yi);
                right_sorted.remove(pos);
            }

            if pairs[i].0 >= pairs[i + 1].0 {
                continue;
            }
            let n_left = i + 1;
            let n_right = n - n_left;
            if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                continue;
            }

            let nl = n_left as f64;
            let nr = n_right as f64;
            let right_sum = total_sum - left_sum;

            let score = match self.criterion {
                Criterion::SquaredError => {
                    let left_ss = left_sq - left_sum * left_sum / nl;
                    let right_ss = (total_sq - left_sq) - right_sum * right_sum / nr;
                    parent_impurity - (left_ss + right_ss) / n_f
                }
                Criterion::FriedmanMse => {
                    let diff = left_sum / nl - right_sum / nr;
                    nl * nr / n_f * diff * diff
                }
                Criterion::AbsoluteError => {
                    let left_mad = mean_abs_deviation_sorted(&left_sorted);
                    let right_mad = mean_abs_deviation_sorted(&right_sorted);
                    parent_impurity - (nl * left_mad + nr * right_mad) / n_f
                }
                Criterion::Poisson => {
                    if left_sum <= 0.0 || right_sum <= 0.0 {
                        continue;
                    }
                    let left_imp = left_xlnx / nl - x_ln_x(left_sum / nl);
                    let right_imp = (total_xlnx - left_xlnx) / nr - x_ln_x(right_sum / nr);
                    parent_impurity - (nl * left_imp + nr * right_imp) / n_f
                }
            };

            if score > 0.0 && best.map_or(true, |(_, s)| score > s) {
                let (lo, hi) = (pairs[i].0, pairs[i + 1].0);
                let mut threshold = (lo + hi) / 2.0;
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some((threshold, score));
            }
        }

        best.map(|(threshold, score)| SplitCandidate {
            feature_idx,
            threshold,
            score,
        })
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(ScoreError::ModelNotFitted)?;
        check_predict_input(x, self.n_features)?;

        Ok(x.rows()
            .into_iter()
            .map(|row| {
                let mut node = root;
                loop {
                    match node {
                        TreeNode::Leaf { value, .. } => break *value,
                        TreeNode::Split {
                            feature_idx,
                            threshold,
                            left,
                            right,
                            ..
                        } => {
                            node = if row[*feature_idx] <= *threshold {
                                &**left
                            } else {
                                &**right
                            };
                        }
                    }
                }
            })
            .collect())
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Get tree depth, counting edges from the root
    pub fn get_depth(&self) -> usize {
        fn depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        self.root.as_ref().map_or(0, depth)
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        fn leaves(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => leaves(left) + leaves(right),
            }
        }
        self.root.as_ref().map_or(0, leaves)
    }
}

impl Regressor for DecisionTree {
    fn name(&self) -> &str {
        "DecisionTreeRegressor"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        DecisionTree::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        DecisionTree::predict(self, x)
    }
}
