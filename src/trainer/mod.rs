//! Training run orchestration
//!
//! Wires ingestion output through the preprocessing pipeline and the
//! multi-model estimator, scores all models on the held-out test set,
//! selects the best one by the configured metric, and persists it.

mod config;

pub use config::TrainerConfig;

use crate::error::{Result, TabfitError};
use crate::preprocessing::PipelineConstructor;
use crate::scoring::{score_models, ScoreTable};
use crate::training::{ModelSpec, MultiModelEstimator, ParamGrid};
use crate::utils::{artifact_filename, column_to_target, dataframe_to_matrix, load_csv, save_object};
use chrono::Local;
use ndarray::{Array1, Array2};
use polars::prelude::DataFrame;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{error, info};

/// Result of a completed training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub best_model: String,
    pub best_score: f64,
    pub artifact_path: PathBuf,
    pub scores: ScoreTable,
}

/// Single-run training orchestrator. Each run moves through load, prepare,
/// fit, score, select, and persist; any failure surfaces immediately with
/// the stage logged, no retry.
pub struct ModelTrainer {
    config: TrainerConfig,
    models: BTreeMap<String, ModelSpec>,
    param_grids: BTreeMap<String, ParamGrid>,
}

impl ModelTrainer {
    pub fn new(
        config: TrainerConfig,
        models: BTreeMap<String, ModelSpec>,
        param_grids: BTreeMap<String, ParamGrid>,
    ) -> Self {
        Self {
            config,
            models,
            param_grids,
        }
    }

    /// Run the full training pipeline and return the selection report.
    pub fn train(&self) -> Result<TrainingReport> {
        self.config.validate().map_err(|e| stage_failed("validate", e))?;

        let (df_train, df_test) = self.load().map_err(|e| stage_failed("load", e))?;
        info!(
            train_rows = df_train.height(),
            test_rows = df_test.height(),
            "datasets loaded"
        );

        let (x_train, y_train, x_test, y_test) = self
            .prepare(&df_train, &df_test)
            .map_err(|e| stage_failed("prepare", e))?;
        info!(
            n_features = x_train.ncols(),
            "features prepared through preprocessing pipeline"
        );

        let estimator = self
            .fit(&x_train, &y_train)
            .map_err(|e| stage_failed("fit", e))?;
        info!(n_models = self.models.len(), "all models fit");

        let (predictions, fitted) = estimator
            .predict(&x_test)
            .map_err(|e| stage_failed("score", e))?;
        let scores = score_models(&y_test, &predictions, self.config.task_type)
            .map_err(|e| stage_failed("score", e))?;
        info!(n_models = scores.models().len(), "all models scored on test set");

        let (best_model, best_score) = scores
            .best(self.config.selection_metric)
            .map_err(|e| stage_failed("select", e))?;
        info!(
            model = best_model.as_str(),
            metric = %self.config.selection_metric,
            score = best_score,
            "best model selected"
        );

        let artifact_path = self
            .persist(&best_model, best_score, &fitted)
            .map_err(|e| stage_failed("persist", e))?;
        info!(path = %artifact_path.display(), "best model persisted");

        Ok(TrainingReport {
            best_model,
            best_score,
            artifact_path,
            scores,
        })
    }

    fn load(&self) -> Result<(DataFrame, DataFrame)> {
        let df_train = load_csv(&self.config.train_path)?;
        let df_test = load_csv(&self.config.test_path)?;

        for (df, split) in [(&df_train, "train"), (&df_test, "test")] {
            if df.column(&self.config.target_column).is_err() {
                return Err(TabfitError::DataError(format!(
                    "{} dataset is missing target column '{}'",
                    split, self.config.target_column
                )));
            }
        }

        Ok((df_train, df_test))
    }

    fn prepare(
        &self,
        df_train: &DataFrame,
        df_test: &DataFrame,
    ) -> Result<(Array2<f64>, Array1<f64>, Array2<f64>, Array1<f64>)> {
        let y_train = column_to_target(df_train, &self.config.target_column)?;
        let y_test = column_to_target(df_test, &self.config.target_column)?;

        let x_train_df = df_train.drop(&self.config.target_column)?;
        let x_test_df = df_test.drop(&self.config.target_column)?;

        let mut pipeline = PipelineConstructor::new(self.config.roles.clone()).build()?;
        let train_transformed = pipeline.fit_transform(&x_train_df)?;
        let test_transformed = pipeline.transform(&x_test_df)?;

        // feature order is fixed by the transformed training frame; a test
        // frame missing any of these columns fails here
        let feature_cols: Vec<String> = train_transformed
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();

        let x_train = dataframe_to_matrix(&train_transformed, &feature_cols)?;
        let x_test = dataframe_to_matrix(&test_transformed, &feature_cols)?;

        Ok((x_train, y_train, x_test, y_test))
    }

    fn fit(&self, x_train: &Array2<f64>, y_train: &Array1<f64>) -> Result<MultiModelEstimator> {
        let mut estimator =
            MultiModelEstimator::new(self.models.clone(), self.param_grids.clone())
                .with_cv_folds(self.config.cv_folds)
                .with_strategy(self.config.strategy);
        if let Some(seed) = self.config.random_state {
            estimator = estimator.with_random_state(seed);
        }

        estimator.fit(x_train, y_train)?;
        Ok(estimator)
    }

    fn persist(
        &self,
        best_model: &str,
        best_score: f64,
        fitted: &BTreeMap<String, ModelSpec>,
    ) -> Result<PathBuf> {
        let model = fitted.get(best_model).ok_or_else(|| {
            TabfitError::PersistenceError(format!(
                "selected model '{}' is missing from the fitted set",
                best_model
            ))
        })?;

        let filename = artifact_filename(best_model, best_score, Local::now());
        let path = self.config.output_dir.join(filename);
        save_object(&path, model)?;
        Ok(path)
    }
}

fn stage_failed(stage: &'static str, err: TabfitError) -> TabfitError {
    error!(stage, error = %err, "training run aborted");
    TabfitError::StageError {
        stage,
        source: Box::new(err),
    }
}
