//! Command-line interface

use crate::error::Result;
use crate::scoring::{Metric, TaskType};
use crate::trainer::{ModelTrainer, TrainerConfig};
use crate::training::presets::{default_grids, default_models, housing_column_roles, HOUSING_TARGET};
use crate::training::SearchStrategy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tabfit", about = "Multi-model tabular training pipeline")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train all registry models and persist the best one
    Train {
        /// Path to the training split CSV
        #[arg(long)]
        train: PathBuf,

        /// Path to the held-out test split CSV
        #[arg(long)]
        test: PathBuf,

        /// Target column name
        #[arg(long, default_value = HOUSING_TARGET)]
        target: String,

        /// Task type, restricts applicable metrics
        #[arg(long, value_enum, default_value_t = TaskType::Regression)]
        task: TaskType,

        /// Metric used to select the best model
        #[arg(long, value_enum, default_value_t = Metric::R2Score)]
        metric: Metric,

        /// Number of cross-validation folds
        #[arg(long, default_value_t = 3)]
        cv_folds: usize,

        /// Use randomized search with this many sampled combinations
        /// instead of exhaustive grid search
        #[arg(long)]
        random_search: Option<usize>,

        /// Seed for fold shuffling and randomized search
        #[arg(long)]
        seed: Option<u64>,

        /// Directory for the persisted model artifact
        #[arg(long, default_value = "artifacts/models")]
        output_dir: PathBuf,
    },
}

pub fn cmd_train(
    train: &PathBuf,
    test: &PathBuf,
    target: &str,
    task: TaskType,
    metric: Metric,
    cv_folds: usize,
    random_search: Option<usize>,
    seed: Option<u64>,
    output_dir: &PathBuf,
) -> Result<()> {
    let strategy = match random_search {
        Some(n_iter) => SearchStrategy::Random { n_iter },
        None => SearchStrategy::Grid,
    };

    let mut config = TrainerConfig::new(train, test, target)
        .with_task_type(task)
        .with_selection_metric(metric)
        .with_cv_folds(cv_folds)
        .with_strategy(strategy)
        .with_output_dir(output_dir)
        .with_roles(housing_column_roles());
    if let Some(seed) = seed {
        config = config.with_random_state(seed);
    }

    let trainer = ModelTrainer::new(config, default_models(), default_grids());
    let report = trainer.train()?;

    println!("Test-set scores:");
    for metric in report.scores.metrics() {
        for model in report.scores.models() {
            let score = report.scores.get(metric, model).unwrap_or(f64::NAN);
            println!("  {:<10} {:<10} {:.6}", metric, model, score);
        }
    }
    println!(
        "Best model: {} ({} = {:.6})",
        report.best_model, metric, report.best_score
    );
    println!("Saved to: {}", report.artifact_path.display());

    Ok(())
}
