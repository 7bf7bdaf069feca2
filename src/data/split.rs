//! Seeded train/test partitioning

use super::{take_rows, target_vector};
use crate::error::{Result, ScoreError};
use ndarray::Array1;
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

/// Row-aligned train and test subsets.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: DataFrame,
    pub x_test: DataFrame,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
    /// Positions of the training rows in the source frame
    pub train_indices: Vec<usize>,
    /// Positions of the test rows in the source frame
    pub test_indices: Vec<usize>,
}

impl TrainTestSplit {
    pub fn n_train(&self) -> usize {
        self.train_indices.len()
    }

    pub fn n_test(&self) -> usize {
        self.test_indices.len()
    }
}

/// Split `df` into features and target, then into train and test rows.
///
/// Rows are permuted with a `ChaCha8Rng` seeded from `seed`. The first
/// `N - round((1 - test_size) * N)` permuted rows form the test subset and
/// the rest form the training subset.
pub fn train_test_split(
    df: &DataFrame,
    target: &str,
    test_size: f64,
    seed: u64,
) -> Result<TrainTestSplit> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(ScoreError::InvalidParameter {
            name: "test_size".to_string(),
            value: test_size.to_string(),
            reason: "must be strictly between 0 and 1".to_string(),
        });
    }

    let n_samples = df.height();
    let n_train = ((1.0 - test_size) * n_samples as f64).round() as usize;
    let n_test = n_samples.saturating_sub(n_train);
    if n_train == 0 || n_test == 0 {
        return Err(ScoreError::ValidationError(format!(
            "test_size={} with {} rows leaves an empty subset (train={}, test={})",
            test_size, n_samples, n_train, n_test
        )));
    }

    let y = target_vector(df, target)?;
    let features = df.drop(target)?;

    let mut permutation: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    permutation.shuffle(&mut rng);

    let test_indices = permutation[..n_test].to_vec();
    let train_indices = permutation[n_test..].to_vec();

    let x_train = take_rows(&features, &train_indices)?;
    let x_test = take_rows(&features, &test_indices)?;
    let y_train = Array1::from_iter(train_indices.iter().map(|&i| y[i]));
    let y_test = Array1::from_iter(test_indices.iter().map(|&i| y[i]));

    info!(
        train = n_train,
        test = n_test,
        seed,
        "Split dataset"
    );

    Ok(TrainTestSplit {
        x_train,
        x_test,
        y_train,
        y_test,
        train_indices,
        test_indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::numeric_column;

    fn frame(n: usize) -> DataFrame {
        let ids: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let target: Vec<f64> = (0..n).map(|i| (i * 10) as f64).collect();
        df!("id" => &ids, "writing score" => &target).unwrap()
    }

    #[test]
    fn test_split_sizes() {
        let split = train_test_split(&frame(1000), "writing score", 0.2, 42).unwrap();
        assert_eq!(split.n_train(), 800);
        assert_eq!(split.n_test(), 200);

        let split = train_test_split(&frame(7), "writing score", 0.2, 42).unwrap();
        assert_eq!(split.n_train(), 6);
        assert_eq!(split.n_test(), 1);
    }

    #[test]
    fn test_split_is_partition() {
        let split = train_test_split(&frame(53), "writing score", 0.2, 42).unwrap();
        let mut all: Vec<usize> = split
            .train_indices
            .iter()
            .chain(split.test_indices.iter())
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..53).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_deterministic() {
        let a = train_test_split(&frame(40), "writing score", 0.2, 42).unwrap();
        let b = train_test_split(&frame(40), "writing score", 0.2, 42).unwrap();
        assert_eq!(a.train_indices, b.train_indices);
        let c = train_test_split(&frame(40), "writing score", 0.2, 7).unwrap();
        assert_ne!(a.train_indices, c.train_indices);
    }

    #[test]
    fn test_rows_stay_aligned() {
        let split = train_test_split(&frame(30), "writing score", 0.2, 42).unwrap();
        assert!(split.x_train.column("writing score").is_err());
        let ids = numeric_column(&split.x_train, "id").unwrap();
        for (id, y) in ids.iter().zip(split.y_train.iter()) {
            assert_eq!(id.unwrap() * 10.0, *y);
        }
    }

    #[test]
    fn test_empty_subset_rejected() {
        let err = train_test_split(&frame(2), "writing score", 0.1, 42).unwrap_err();
        assert!(matches!(err, ScoreError::ValidationError(_)));
        assert!(train_test_split(&frame(10), "writing score", 1.0, 42).is_err());
    }
}
