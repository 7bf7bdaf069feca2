//! Hyperparameter search
//!
//! Exhaustive grid search with k-fold cross-validation over the forest
//! pipeline.

mod grid_search;
mod search_space;

pub use grid_search::{CandidateResult, GridSearchCV, GridSearchResult};
pub use search_space::{
    Candidate, SearchGrid, PARAM_CRITERION, PARAM_IMPUTER_STRATEGY, PARAM_MAX_DEPTH,
    PARAM_N_ESTIMATORS,
};
