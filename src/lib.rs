//! tabfit: multi-model training pipeline for tabular data
//!
//! Loads train/test CSV splits, preprocesses columns by role (impute,
//! scale, one-hot or ordinal encode), fits a registry of models with
//! cross-validated hyperparameter search, scores every model on the
//! held-out split, and persists the best one as a timestamped JSON
//! artifact.

pub mod cli;
pub mod error;
pub mod preprocessing;
pub mod scoring;
pub mod trainer;
pub mod training;
pub mod utils;

pub use error::{Result, TabfitError};

/// Common imports for pipeline users.
pub mod prelude {
    pub use crate::error::{Result, TabfitError};
    pub use crate::preprocessing::{ColumnRoles, FeaturePipeline, OrdinalSpec, PipelineConstructor};
    pub use crate::scoring::{Metric, ScoreTable, TaskType};
    pub use crate::trainer::{ModelTrainer, TrainerConfig, TrainingReport};
    pub use crate::training::{
        Model, ModelSpec, MultiModelEstimator, ParamGrid, ParamValue, SearchStrategy,
    };
}
