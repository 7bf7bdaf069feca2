//! Exhaustive cross-validated grid search

use super::search_space::{Candidate, SearchGrid};
use crate::data::take_rows;
use crate::error::Result;
use crate::pipeline::{FittedPipeline, RegressionPipeline};
use crate::training::{r2_score, CVResults, CrossValidator};
use ndarray::{Array1, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Cross-validation outcome of one candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateResult {
    pub candidate: Candidate,
    pub cv: CVResults,
    /// Mean wall time of one fold fit
    pub mean_fit_time_secs: f64,
}

/// Winner of the search and the refit pipeline
#[derive(Debug, Clone)]
pub struct GridSearchResult {
    pub best_index: usize,
    pub best_candidate: Candidate,
    pub best_score: f64,
    pub cv_results: Vec<CandidateResult>,
    pub best_pipeline: FittedPipeline,
}

/// Grid search over a [`RegressionPipeline`] scored by R²
#[derive(Debug, Clone)]
pub struct GridSearchCV {
    grid: SearchGrid,
    cv: CrossValidator,
}

impl GridSearchCV {
    pub fn new(grid: SearchGrid, cv_folds: usize) -> Self {
        Self {
            grid,
            cv: CrossValidator::k_fold(cv_folds),
        }
    }

    pub fn grid(&self) -> &SearchGrid {
        &self.grid
    }

    /// Score every candidate with k-fold CV, then refit the best one on all
    /// of `x`. Ties keep the earliest candidate. Any fold error aborts the
    /// search.
    pub fn fit(
        &self,
        pipeline: &RegressionPipeline,
        x: &DataFrame,
        y: &Array1<f64>,
    ) -> Result<GridSearchResult> {
        self.grid.validate()?;
        let splits = self.cv.split(x.height())?;
        let candidates = self.grid.candidates();
        let total = candidates.len();

        info!(
            candidates = total,
            folds = splits.len(),
            fits = total * splits.len(),
            "Starting grid search"
        );

        let mut cv_results = Vec::with_capacity(total);
        let mut best: Option<(usize, f64)> = None;

        for (idx, candidate) in candidates.into_iter().enumerate() {
            let candidate_pipeline = pipeline.with_candidate(&candidate);
            let mut scores = Vec::with_capacity(splits.len());
            let mut fit_time = 0.0;

            for split in &splits {
                let start = Instant::now();
                let x_train = take_rows(x, &split.train_indices)?;
                let y_train = y.select(Axis(0), &split.train_indices);
                let fitted = candidate_pipeline.fit(&x_train, &y_train)?;
                let elapsed = start.elapsed().as_secs_f64();
                fit_time += elapsed;

                let x_val = take_rows(x, &split.test_indices)?;
                let y_val = y.select(Axis(0), &split.test_indices);
                let score = r2_score(&y_val, &fitted.predict(&x_val)?)?;

                info!(
                    candidate = idx + 1,
                    of = total,
                    fold = split.fold_idx + 1,
                    score,
                    elapsed_secs = elapsed,
                    params = %candidate,
                    "CV fold"
                );
                scores.push(score);
            }

            let cv = CVResults::from_scores(scores);
            if best.map_or(true, |(_, s)| cv.mean_score > s) {
                best = Some((idx, cv.mean_score));
            }
            cv_results.push(CandidateResult {
                candidate,
                mean_fit_time_secs: fit_time / splits.len() as f64,
                cv,
            });
        }

        // validate() guarantees at least one candidate
        let (best_index, best_score) = best.unwrap_or((0, f64::NAN));
        let best_candidate = cv_results[best_index].candidate.clone();
        info!(
            best_index,
            best_score,
            params = %best_candidate,
            "Refitting best candidate on full training set"
        );
        let best_pipeline = pipeline.with_candidate(&best_candidate).fit(x, y)?;

        Ok(GridSearchResult {
            best_index,
            best_candidate,
            best_score,
            cv_results,
            best_pipeline,
        })
    }
}
