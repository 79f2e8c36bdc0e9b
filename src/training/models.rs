//! Model trait and the name-keyed model registry representation

use crate::error::{Result, TabfitError};
use crate::scoring::TaskType;
use crate::training::decision_tree::DecisionTree;
use crate::training::knn::KnnRegressor;
use crate::training::linear::LinearRegression;
use crate::training::search::ParamAssignment;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// A candidate value for one hyperparameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl ParamValue {
    pub fn as_f64(&self, name: &str) -> Result<f64> {
        match self {
            ParamValue::Float(v) => Ok(*v),
            ParamValue::Int(v) => Ok(*v as f64),
            ParamValue::Bool(_) => Err(TabfitError::ConfigError(format!(
                "parameter '{}' expects a number, got a bool",
                name
            ))),
        }
    }

    pub fn as_usize(&self, name: &str) -> Result<usize> {
        match self {
            ParamValue::Int(v) if *v >= 0 => Ok(*v as usize),
            _ => Err(TabfitError::ConfigError(format!(
                "parameter '{}' expects a non-negative integer",
                name
            ))),
        }
    }

    pub fn as_bool(&self, name: &str) -> Result<bool> {
        match self {
            ParamValue::Bool(v) => Ok(*v),
            _ => Err(TabfitError::ConfigError(format!(
                "parameter '{}' expects a bool",
                name
            ))),
        }
    }
}

/// Trait for trainable models.
pub trait Model {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;
}

/// Registry entry: an untrained estimator of a concrete kind. The enum keeps
/// the registry serializable so the selected fitted model can be persisted
/// as one object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModelSpec {
    Linear(LinearRegression),
    DecisionTree(DecisionTree),
    Knn(KnnRegressor),
}

impl ModelSpec {
    /// Task this model solves; drives which cross-validation score is used.
    pub fn task_type(&self) -> TaskType {
        match self {
            ModelSpec::Linear(_) | ModelSpec::Knn(_) => TaskType::Regression,
            ModelSpec::DecisionTree(tree) => {
                if tree.is_classification() {
                    TaskType::Classification
                } else {
                    TaskType::Regression
                }
            }
        }
    }

    /// Produce a fresh unfitted instance with the given hyperparameters
    /// applied. Unknown parameter names are a configuration error.
    pub fn with_params(&self, params: &ParamAssignment) -> Result<ModelSpec> {
        match self {
            ModelSpec::Linear(base) => {
                let mut model = LinearRegression::new()
                    .with_alpha(base.alpha)
                    .with_fit_intercept(base.fit_intercept);
                for (name, value) in params.iter() {
                    match name.as_str() {
                        "alpha" => model.alpha = value.as_f64(name)?,
                        "fit_intercept" => model.fit_intercept = value.as_bool(name)?,
                        _ => return Err(unknown_param("linear regression", name)),
                    }
                }
                Ok(ModelSpec::Linear(model))
            }
            ModelSpec::DecisionTree(base) => {
                let mut model = if base.is_classification() {
                    DecisionTree::new_classifier()
                } else {
                    DecisionTree::new_regressor()
                };
                model.max_depth = base.max_depth;
                model.min_samples_split = base.min_samples_split;
                model.min_samples_leaf = base.min_samples_leaf;
                for (name, value) in params.iter() {
                    match name.as_str() {
                        "max_depth" => model.max_depth = Some(value.as_usize(name)?),
                        "min_samples_split" => {
                            model.min_samples_split = value.as_usize(name)?.max(2)
                        }
                        "min_samples_leaf" => {
                            model.min_samples_leaf = value.as_usize(name)?.max(1)
                        }
                        _ => return Err(unknown_param("decision tree", name)),
                    }
                }
                Ok(ModelSpec::DecisionTree(model))
            }
            ModelSpec::Knn(base) => {
                let mut model = KnnRegressor::new(base.n_neighbors);
                for (name, value) in params.iter() {
                    match name.as_str() {
                        "n_neighbors" => {
                            model.n_neighbors = value.as_usize(name)?.max(1)
                        }
                        _ => return Err(unknown_param("knn", name)),
                    }
                }
                Ok(ModelSpec::Knn(model))
            }
        }
    }
}

fn unknown_param(model: &str, name: &str) -> TabfitError {
    TabfitError::ConfigError(format!(
        "unknown hyperparameter '{}' for {}",
        name, model
    ))
}

impl Model for ModelSpec {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self {
            ModelSpec::Linear(m) => m.fit(x, y),
            ModelSpec::DecisionTree(m) => m.fit(x, y),
            ModelSpec::Knn(m) => m.fit(x, y),
        }
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            ModelSpec::Linear(m) => m.predict(x),
            ModelSpec::DecisionTree(m) => m.predict(x),
            ModelSpec::Knn(m) => m.predict(x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_with_params_applies_values() {
        let base = ModelSpec::DecisionTree(DecisionTree::new_regressor());
        let mut params = BTreeMap::new();
        params.insert("max_depth".to_string(), ParamValue::Int(4));
        let spec = base.with_params(&ParamAssignment::from(params)).unwrap();

        match spec {
            ModelSpec::DecisionTree(tree) => assert_eq!(tree.max_depth, Some(4)),
            _ => panic!("expected a decision tree"),
        }
    }

    #[test]
    fn test_unknown_param_is_config_error() {
        let base = ModelSpec::Linear(LinearRegression::new());
        let mut params = BTreeMap::new();
        params.insert("learning_rate".to_string(), ParamValue::Float(0.1));
        let result = base.with_params(&ParamAssignment::from(params));
        assert!(matches!(result, Err(TabfitError::ConfigError(_))));
    }

    #[test]
    fn test_param_value_coercions() {
        assert_eq!(ParamValue::Int(3).as_f64("a").unwrap(), 3.0);
        assert_eq!(ParamValue::Int(3).as_usize("a").unwrap(), 3);
        assert!(ParamValue::Bool(true).as_f64("a").is_err());
        assert!(ParamValue::Int(-1).as_usize("a").is_err());
    }
}
