//! Model training module
//!
//! Regression models, k-fold cross-validation, metrics and the model
//! comparison battery.

mod comparison;
mod cross_validation;
mod decision_tree;
mod gradient_boosting;
mod knn;
mod linear_models;
mod models;
mod random_forest;

pub use comparison::{ComparisonRow, ModelComparator};
pub use cross_validation::{CVResults, CVSplit, CrossValidator};
pub use decision_tree::{Criterion, DecisionTree, TreeNode};
pub use gradient_boosting::{GradientBoostingConfig, GradientBoostingRegressor};
pub use knn::KNeighborsRegressor;
pub use linear_models::{LinearRegression, RidgeRegression};
pub use models::{adjusted_r2, r2_score, DummyRegressor, RegressionMetrics, Regressor};
pub use random_forest::{MaxFeatures, RandomForestRegressor};
