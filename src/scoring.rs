//! Metric computation and the per-run score table

use crate::error::{Result, TabfitError};
use crate::utils::column_to_target;
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declared task type; restricts which metrics apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum TaskType {
    Regression,
    Classification,
}

/// Supported evaluation metrics. Higher is better for all of them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum Metric {
    #[value(name = "r2_score")]
    R2Score,
    #[value(name = "f1_score")]
    F1Score,
    #[value(name = "accuracy")]
    Accuracy,
    #[value(name = "recall")]
    Recall,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::R2Score => "r2_score",
            Metric::F1Score => "f1_score",
            Metric::Accuracy => "accuracy",
            Metric::Recall => "recall",
        }
    }

    /// Whether this metric is meaningful for the given task. Classification
    /// metrics on a continuous target would be silently wrong, so they are
    /// rejected up front instead of reported.
    pub fn applies_to(&self, task: TaskType) -> bool {
        match self {
            Metric::R2Score => task == TaskType::Regression,
            Metric::F1Score | Metric::Accuracy | Metric::Recall => {
                task == TaskType::Classification
            }
        }
    }

    /// Metrics applicable to a task, in a fixed order.
    pub fn for_task(task: TaskType) -> Vec<Metric> {
        [
            Metric::R2Score,
            Metric::F1Score,
            Metric::Accuracy,
            Metric::Recall,
        ]
        .into_iter()
        .filter(|m| m.applies_to(task))
        .collect()
    }

    pub fn compute(&self, y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
        match self {
            Metric::R2Score => r2_score(y_true, y_pred),
            Metric::F1Score => f1_score(y_true, y_pred),
            Metric::Accuracy => accuracy_score(y_true, y_pred),
            Metric::Recall => recall_score(y_true, y_pred),
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskType::Regression => f.write_str("regression"),
            TaskType::Classification => f.write_str("classification"),
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coefficient of determination.
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len() as f64;
    if n == 0.0 {
        return 0.0;
    }
    let y_mean = y_true.sum() / n;
    let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();

    if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else {
        0.0
    }
}

/// Fraction of matching labels, with predictions rounded at 0.5.
pub fn accuracy_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| (**t - **p).abs() < 0.5)
        .count();
    correct as f64 / y_true.len() as f64
}

fn confusion_counts(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> (usize, usize, usize) {
    let mut tp = 0;
    let mut fp = 0;
    let mut fn_ = 0;

    for (t, p) in y_true.iter().zip(y_pred.iter()) {
        let t_pos = *t > 0.5;
        let p_pos = *p > 0.5;
        match (t_pos, p_pos) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => {}
        }
    }

    (tp, fp, fn_)
}

/// Binary recall at the 0.5 threshold.
pub fn recall_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let (tp, _, fn_) = confusion_counts(y_true, y_pred);
    if tp + fn_ > 0 {
        tp as f64 / (tp + fn_) as f64
    } else {
        0.0
    }
}

/// Binary F1 at the 0.5 threshold.
pub fn f1_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let (tp, fp, fn_) = confusion_counts(y_true, y_pred);
    let precision = if tp + fp > 0 {
        tp as f64 / (tp + fp) as f64
    } else {
        0.0
    };
    let recall = if tp + fn_ > 0 {
        tp as f64 / (tp + fn_) as f64
    } else {
        0.0
    };
    if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}

/// Metric rows by model columns for one training run. Only metrics
/// applicable to the declared task are present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreTable {
    task: TaskType,
    cells: BTreeMap<String, BTreeMap<Metric, f64>>,
}

impl ScoreTable {
    pub fn task(&self) -> TaskType {
        self.task
    }

    /// Metric rows of the table.
    pub fn metrics(&self) -> Vec<Metric> {
        Metric::for_task(self.task)
    }

    /// Model columns of the table, in name order.
    pub fn models(&self) -> Vec<&str> {
        self.cells.keys().map(|s| s.as_str()).collect()
    }

    pub fn get(&self, metric: Metric, model: &str) -> Option<f64> {
        self.cells.get(model).and_then(|row| row.get(&metric)).copied()
    }

    /// One metric row sorted descending by score. Ties keep model-name
    /// order (stable sort over name-ordered columns), so selection is
    /// deterministic: the lexicographically-first model wins a tie.
    pub fn ranked(&self, metric: Metric) -> Result<Vec<(String, f64)>> {
        if !metric.applies_to(self.task) {
            return Err(TabfitError::ConfigError(format!(
                "metric '{}' does not apply to {:?} tasks",
                metric, self.task
            )));
        }

        let mut row: Vec<(String, f64)> = self
            .cells
            .iter()
            .map(|(model, scores)| (model.clone(), scores.get(&metric).copied().unwrap_or(0.0)))
            .collect();
        row.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(row)
    }

    /// Best (model, score) pair for the metric.
    pub fn best(&self, metric: Metric) -> Result<(String, f64)> {
        self.ranked(metric)?
            .into_iter()
            .next()
            .ok_or_else(|| TabfitError::ConfigError("score table has no models".to_string()))
    }
}

/// Score every model's predictions against the true target. `predictions`
/// holds one column per model, row-aligned with `y_true`.
pub fn score_models(
    y_true: &Array1<f64>,
    predictions: &DataFrame,
    task: TaskType,
) -> Result<ScoreTable> {
    if predictions.height() != y_true.len() {
        return Err(TabfitError::ShapeError {
            expected: format!("{} prediction rows", y_true.len()),
            actual: format!("{} prediction rows", predictions.height()),
        });
    }

    let metrics = Metric::for_task(task);
    let mut cells = BTreeMap::new();

    for col_name in predictions.get_column_names() {
        let y_pred = column_to_target(predictions, col_name.as_str())?;
        let row: BTreeMap<Metric, f64> = metrics
            .iter()
            .map(|metric| (*metric, metric.compute(y_true, &y_pred)))
            .collect();
        cells.insert(col_name.to_string(), row);
    }

    Ok(ScoreTable { task, cells })
}
