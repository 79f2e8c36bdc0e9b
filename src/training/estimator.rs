//! Composite estimator fitting multiple named models under one contract

use crate::error::{Result, TabfitError};
use crate::training::models::{Model, ModelSpec};
use crate::training::search::{run_search, ParamGrid, SearchStrategy};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Wraps a name-keyed model registry and a matching hyperparameter-grid
/// registry. `fit` runs a cross-validated search per model and retains the
/// best estimator for each name; `predict` returns every retained model's
/// predictions plus the fitted models themselves.
///
/// Models are fit sequentially and independently. The first model whose
/// search produces no usable estimator aborts the whole fit (fail-fast,
/// all-or-nothing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiModelEstimator {
    models: BTreeMap<String, ModelSpec>,
    param_grids: BTreeMap<String, ParamGrid>,
    cv_folds: usize,
    strategy: SearchStrategy,
    random_state: Option<u64>,
    fitted: BTreeMap<String, ModelSpec>,
    is_fitted: bool,
}

impl MultiModelEstimator {
    pub fn new(
        models: BTreeMap<String, ModelSpec>,
        param_grids: BTreeMap<String, ParamGrid>,
    ) -> Self {
        Self {
            models,
            param_grids,
            cv_folds: 3,
            strategy: SearchStrategy::Grid,
            random_state: None,
            fitted: BTreeMap::new(),
            is_fitted: false,
        }
    }

    pub fn with_cv_folds(mut self, cv_folds: usize) -> Self {
        self.cv_folds = cv_folds;
        self
    }

    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    pub fn model_names(&self) -> Vec<&str> {
        self.models.keys().map(|s| s.as_str()).collect()
    }

    /// Registry and grid key sets must be identical, and non-empty.
    /// Checked before any model is fit.
    fn validate_registry(&self) -> Result<()> {
        if self.models.is_empty() {
            return Err(TabfitError::ConfigError(
                "model registry is empty".to_string(),
            ));
        }

        for name in self.models.keys() {
            if !self.param_grids.contains_key(name) {
                return Err(TabfitError::ConfigError(format!(
                    "model '{}' has no hyperparameter grid",
                    name
                )));
            }
        }
        for name in self.param_grids.keys() {
            if !self.models.contains_key(name) {
                return Err(TabfitError::ConfigError(format!(
                    "hyperparameter grid '{}' has no matching model",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Search each model's grid with k-fold cross-validation and retain the
    /// best estimator per name.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        self.validate_registry()?;

        let mut fitted = BTreeMap::new();
        for (name, base) in &self.models {
            let grid = &self.param_grids[name];
            let outcome = run_search(
                name,
                base,
                grid,
                x,
                y,
                self.cv_folds,
                self.strategy,
                self.random_state,
            )?;
            info!(
                model = name.as_str(),
                cv_mean = outcome.cv.mean_score,
                cv_std = outcome.cv.std_score,
                "model search complete"
            );
            fitted.insert(name.clone(), outcome.model);
        }

        self.fitted = fitted;
        self.is_fitted = true;
        Ok(self)
    }

    /// Predictions from every retained model, one column per model name,
    /// row-aligned with the input, together with the fitted model objects.
    pub fn predict(&self, x: &Array2<f64>) -> Result<(DataFrame, BTreeMap<String, ModelSpec>)> {
        if !self.is_fitted {
            return Err(TabfitError::ModelNotFitted);
        }

        let mut columns: Vec<Column> = Vec::with_capacity(self.fitted.len());
        for (name, model) in &self.fitted {
            let predictions = model.predict(x).map_err(|e| TabfitError::TrainingError {
                model: name.clone(),
                reason: format!("prediction failed: {}", e),
            })?;
            columns.push(Column::new(name.as_str().into(), predictions.to_vec()));
        }

        let df = DataFrame::new(columns).map_err(|e| TabfitError::DataError(e.to_string()))?;
        Ok((df, self.fitted.clone()))
    }
}
