//! Training run configuration

use crate::error::{Result, TabfitError};
use crate::preprocessing::ColumnRoles;
use crate::scoring::{Metric, TaskType};
use crate::training::SearchStrategy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for one training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    pub train_path: PathBuf,
    pub test_path: PathBuf,
    pub target_column: String,
    pub task_type: TaskType,
    /// Metric used to pick the best model
    pub selection_metric: Metric,
    pub cv_folds: usize,
    pub strategy: SearchStrategy,
    pub random_state: Option<u64>,
    /// Directory the selected model artifact is written to
    pub output_dir: PathBuf,
    pub roles: ColumnRoles,
}

impl TrainerConfig {
    pub fn new(
        train_path: impl Into<PathBuf>,
        test_path: impl Into<PathBuf>,
        target_column: impl Into<String>,
    ) -> Self {
        Self {
            train_path: train_path.into(),
            test_path: test_path.into(),
            target_column: target_column.into(),
            task_type: TaskType::Regression,
            selection_metric: Metric::R2Score,
            cv_folds: 3,
            strategy: SearchStrategy::Grid,
            random_state: None,
            output_dir: PathBuf::from("artifacts/models"),
            roles: ColumnRoles::default(),
        }
    }

    pub fn with_task_type(mut self, task_type: TaskType) -> Self {
        self.task_type = task_type;
        self
    }

    pub fn with_selection_metric(mut self, metric: Metric) -> Self {
        self.selection_metric = metric;
        self
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

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_roles(mut self, roles: ColumnRoles) -> Self {
        self.roles = roles;
        self
    }

    /// Reject configurations that could only fail later or score wrongly.
    pub fn validate(&self) -> Result<()> {
        if self.target_column.is_empty() {
            return Err(TabfitError::ConfigError(
                "target column name is empty".to_string(),
            ));
        }
        if self.cv_folds < 2 {
            return Err(TabfitError::ConfigError(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        if !self.selection_metric.applies_to(self.task_type) {
            return Err(TabfitError::ConfigError(format!(
                "selection metric '{}' does not apply to {:?} tasks",
                self.selection_metric, self.task_type
            )));
        }
        self.roles.validate()?;
        Ok(())
    }
}
