//! Model training
//!
//! Concrete models (linear regression, decision tree, KNN), k-fold
//! cross-validation, hyperparameter search, and the [`MultiModelEstimator`]
//! that fits a whole registry of named models behind one fit/predict
//! contract.

pub mod cross_validation;
pub mod decision_tree;
pub mod estimator;
pub mod knn;
pub mod linear;
pub mod models;
pub mod presets;
pub mod search;

pub use cross_validation::{CVResults, CVSplit, KFold};
pub use decision_tree::DecisionTree;
pub use estimator::MultiModelEstimator;
pub use knn::KnnRegressor;
pub use linear::LinearRegression;
pub use models::{Model, ModelSpec, ParamValue};
pub use search::{ParamAssignment, ParamGrid, SearchOutcome, SearchStrategy};
