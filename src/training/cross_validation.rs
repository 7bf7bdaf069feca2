//! K-fold cross-validation splitting

use crate::error::{Result, ScoreError};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// A single train/test split
#[derive(Debug, Clone, PartialEq)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// K-fold splitter.
///
/// Without shuffling, folds are contiguous blocks in row order; the first
/// `n_samples % n_splits` folds hold one extra row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossValidator {
    n_splits: usize,
    shuffle: bool,
    random_state: Option<u64>,
}

impl CrossValidator {
    /// Contiguous, unshuffled k-fold
    pub fn k_fold(n_splits: usize) -> Self {
        Self {
            n_splits,
            shuffle: false,
            random_state: None,
        }
    }

    /// Shuffle rows before cutting folds
    pub fn with_shuffle(mut self, seed: u64) -> Self {
        self.shuffle = true;
        self.random_state = Some(seed);
        self
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Generate train/test splits
    pub fn split(&self, n_samples: usize) -> Result<Vec<CVSplit>> {
        let n_splits = self.n_splits;
        if n_splits < 2 {
            return Err(ScoreError::InvalidParameter {
                name: "n_splits".to_string(),
                value: n_splits.to_string(),
                reason: "must be at least 2".to_string(),
            });
        }
        if n_samples < n_splits {
            return Err(ScoreError::ValidationError(format!(
                "n_samples ({}) must be >= n_splits ({})",
                n_samples, n_splits
            )));
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        if self.shuffle {
            let mut rng = ChaCha8Rng::seed_from_u64(self.random_state.unwrap_or(0));
            indices.shuffle(&mut rng);
        }

        let base = n_samples / n_splits;
        let remainder = n_samples % n_splits;

        let mut splits = Vec::with_capacity(n_splits);
        let mut current = 0;
        for fold_idx in 0..n_splits {
            let fold_size = if fold_idx < remainder { base + 1 } else { base };
            let test_indices = indices[current..current + fold_size].to_vec();
            let train_indices: Vec<usize> = indices[..current]
                .iter()
                .chain(indices[current + fold_size..].iter())
                .copied()
                .collect();

            splits.push(CVSplit {
                train_indices,
                test_indices,
                fold_idx,
            });
            current += fold_size;
        }

        Ok(splits)
    }
}

/// Cross-validation results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CVResults {
    /// Scores for each fold
    pub scores: Vec<f64>,
    /// Mean score across folds
    pub mean_score: f64,
    /// Population standard deviation of scores
    pub std_score: f64,
    /// Number of folds
    pub n_folds: usize,
}

impl CVResults {
    /// Create CV results from fold scores
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n_folds = scores.len();
        if n_folds == 0 {
            return Self {
                scores,
                mean_score: f64::NAN,
                std_score: f64::NAN,
                n_folds,
            };
        }
        let mean_score = scores.iter().sum::<f64>() / n_folds as f64;
        let variance =
            scores.iter().map(|s| (s - mean_score).powi(2)).sum::<f64>() / n_folds as f64;

        Self {
            scores,
            mean_score,
            std_score: variance.sqrt(),
            n_folds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_k_fold() {
        let splits = CrossValidator::k_fold(5).split(100).unwrap();
        assert_eq!(splits.len(), 5);

        for split in &splits {
            assert_eq!(split.test_indices.len(), 20);
            assert_eq!(split.train_indices.len(), 80);
        }

        let mut all_test: Vec<usize> = splits.iter().flat_map(|s| s.test_indices.clone()).collect();
        all_test.sort();
        assert_eq!(all_test, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_contiguous_uneven_folds() {
        let splits = CrossValidator::k_fold(3).split(8).unwrap();
        assert_eq!(splits[0].test_indices, vec![0, 1, 2]);
        assert_eq!(splits[1].test_indices, vec![3, 4, 5]);
        assert_eq!(splits[2].test_indices, vec![6, 7]);
        assert_eq!(splits[1].train_indices, vec![0, 1, 2, 6, 7]);
    }

    #[test]
    fn test_shuffle_is_seeded() {
        let a = CrossValidator::k_fold(4).with_shuffle(3).split(20).unwrap();
        let b = CrossValidator::k_fold(4).with_shuffle(3).split(20).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid() {
        assert!(CrossValidator::k_fold(1).split(10).is_err());
        assert!(CrossValidator::k_fold(5).split(3).is_err());
    }

    #[test]
    fn test_cv_results() {
        let r = CVResults::from_scores(vec![0.5, 0.7]);
        assert!((r.mean_score - 0.6).abs() < 1e-12);
        assert!((r.std_score - 0.1).abs() < 1e-12);
        assert_eq!(r.n_folds, 2);
    }
}
