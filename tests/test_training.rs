//! Integration test: regressors, cross-validation and grid search

use ndarray::{Array1, Array2};
use polars::prelude::*;
use scorecast::optimizer::{GridSearchCV, SearchGrid};
use scorecast::pipeline::RegressionPipeline;
use scorecast::preprocessing::{CategoricalVocabulary, ImputeStrategy, PreprocessorSpec};
use scorecast::training::{
    adjusted_r2, r2_score, Criterion, CrossValidator, DecisionTree, ModelComparator,
    RandomForestRegressor, RegressionMetrics,
};
use scorecast::ScoreError;

fn regression_data() -> (Array2<f64>, Array1<f64>) {
    let n = 60;
    let x = Array2::from_shape_fn((n, 3), |(i, j)| match j {
        0 => i as f64,
        1 => ((i * 7) % 11) as f64,
        _ => (i % 2) as f64,
    });
    let y = Array1::from_shape_fn(n, |i| 10.0 + 2.0 * i as f64 + 5.0 * (i % 2) as f64);
    (x, y)
}

#[test]
fn test_every_criterion_fits_and_predicts() {
    let (x, y) = regression_data();
    for criterion in Criterion::ALL {
        let mut forest = RandomForestRegressor::new(8)
            .with_criterion(criterion)
            .with_max_depth(Some(5))
            .with_random_state(42);
        forest.fit(&x, &y).unwrap();
        let pred = forest.predict(&x).unwrap();
        let r2 = r2_score(&y, &pred).unwrap();
        assert!(r2 > 0.8, "{} R2 too low: {}", criterion, r2);
    }
}

#[test]
fn test_forest_is_deterministic_for_a_seed() {
    let (x, y) = regression_data();
    let mut a = RandomForestRegressor::new(10).with_random_state(42);
    let mut b = RandomForestRegressor::new(10).with_random_state(42);
    a.fit(&x, &y).unwrap();
    b.fit(&x, &y).unwrap();
    assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
}

#[test]
fn test_poisson_rejects_negative_targets() {
    let (x, mut y) = regression_data();
    y[3] = -1.0;
    let mut tree = DecisionTree::new().with_criterion(Criterion::Poisson);
    assert!(matches!(
        tree.fit(&x, &y),
        Err(ScoreError::ValidationError(_))
    ));
}

#[test]
fn test_unfitted_forest_cannot_predict() {
    let (x, _) = regression_data();
    let forest = RandomForestRegressor::new(5);
    assert!(matches!(forest.predict(&x), Err(ScoreError::ModelNotFitted)));
}

#[test]
fn test_kfold_partitions_training_rows() {
    let splits = CrossValidator::k_fold(5).split(23).unwrap();
    assert_eq!(splits.len(), 5);

    let mut seen = vec![0usize; 23];
    for split in &splits {
        assert_eq!(split.train_indices.len() + split.test_indices.len(), 23);
        for &i in &split.test_indices {
            seen[i] += 1;
            assert!(!split.train_indices.contains(&i));
        }
    }
    assert!(seen.iter().all(|&c| c == 1));
    // contiguous, unshuffled
    assert_eq!(splits[0].test_indices, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_metrics_invariants() {
    let (x, y) = regression_data();
    let mut forest = RandomForestRegressor::new(5).with_random_state(1);
    forest.fit(&x, &y).unwrap();
    let metrics = RegressionMetrics::compute(&y, &forest.predict(&x).unwrap()).unwrap();
    assert!(metrics.mse >= 0.0);
    assert!(metrics.r2 <= 1.0);
    assert!((metrics.rmse - metrics.mse.sqrt()).abs() < 1e-12);
    assert_eq!(adjusted_r2(metrics.r2, 2, 3), metrics.r2);
}

#[test]
fn test_comparator_ranks_by_adjusted_r2() {
    let (x, y) = regression_data();
    let mut comparator = ModelComparator::new(42);
    let rows = comparator.compare(&x, &y, &x, &y);
    assert_eq!(rows.len(), comparator.n_models());
    assert!(rows
        .windows(2)
        .all(|w| w[0].adjusted_r2 >= w[1].adjusted_r2));
    assert!(rows.iter().any(|r| r.model == "RandomForestRegressor"));
}

#[test]
fn test_grid_search_over_frame() {
    let n = 40;
    let math: Vec<f64> = (0..n).map(|i| 40.0 + i as f64).collect();
    let gender: Vec<&str> = (0..n)
        .map(|i| if i % 2 == 0 { "male" } else { "female" })
        .collect();
    let df = df!("math score" => &math, "gender" => &gender).unwrap();
    let y = Array1::from_shape_fn(n, |i| math[i] + if i % 2 == 0 { -3.0 } else { 3.0 });

    let vocab = CategoricalVocabulary::new()
        .declare("gender", &["male", "female"])
        .resolve(&df)
        .unwrap();
    let spec = PreprocessorSpec::new(
        vec!["math score".to_string()],
        ImputeStrategy::Median,
        None,
        vocab,
        Vec::new(),
    );
    let pipeline =
        RegressionPipeline::new(spec, RandomForestRegressor::new(5).with_random_state(42));
    let grid = SearchGrid {
        criterion: vec![Criterion::SquaredError, Criterion::FriedmanMse],
        max_depth: vec![Some(2), None],
        n_estimators: vec![5],
        numeric_imputer_strategy: vec![ImputeStrategy::Median],
    };

    let result = GridSearchCV::new(grid, 4).fit(&pipeline, &df, &y).unwrap();
    assert_eq!(result.cv_results.len(), 4);
    let best = result
        .cv_results
        .iter()
        .map(|r| r.cv.mean_score)
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(result.best_score, best);
    assert_eq!(result.best_pipeline.predict(&df).unwrap().len(), n);
}
