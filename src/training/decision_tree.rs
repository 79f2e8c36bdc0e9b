//! CART decision tree for regression and classification

use crate::error::{Result, TabfitError};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    score: f64,
}

/// Decision tree. Regression trees split on variance reduction, classifier
/// trees on Gini impurity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    is_classification: bool,
    root: Option<TreeNode>,
    n_features: usize,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new_regressor()
    }
}

impl DecisionTree {
    pub fn new_regressor() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            is_classification: false,
            root: None,
            n_features: 0,
        }
    }

    pub fn new_classifier() -> Self {
        Self {
            is_classification: true,
            ..Self::new_regressor()
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    pub fn is_classification(&self) -> bool {
        self.is_classification
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(TabfitError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(TabfitError::ShapeError {
                expected: "at least one sample".to_string(),
                actual: "0 samples".to_string(),
            });
        }

        self.n_features = x.ncols();
        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_node(x, y, &indices, 0));
        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(TabfitError::ModelNotFitted)?;

        if x.ncols() != self.n_features {
            return Err(TabfitError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        let predictions: Vec<f64> = (0..x.nrows())
            .map(|i| {
                let row = x.row(i);
                let mut node = root;
                loop {
                    match node {
                        TreeNode::Leaf { value, .. } => return *value,
                        TreeNode::Split {
                            feature_idx,
                            threshold,
                            left,
                            right,
                        } => {
                            node = if row[*feature_idx] <= *threshold {
                                left
                            } else {
                                right
                            };
                        }
                    }
                }
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    fn build_node(&self, x: &Array2<f64>, y: &Array1<f64>, indices: &[usize], depth: usize) -> TreeNode {
        let leaf = TreeNode::Leaf {
            value: self.leaf_value(y, indices),
            n_samples: indices.len(),
        };

        if indices.len() < self.min_samples_split {
            return leaf;
        }
        if let Some(max_depth) = self.max_depth {
            if depth >= max_depth {
                return leaf;
            }
        }
        if self.is_pure(y, indices) {
            return leaf;
        }

        let best = match self.best_split(x, y, indices) {
            Some(split) => split,
            None => return leaf,
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, best.feature_idx]] <= best.threshold);

        if left_idx.len() < self.min_samples_leaf || right_idx.len() < self.min_samples_leaf {
            return leaf;
        }

        TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            left: Box::new(self.build_node(x, y, &left_idx, depth + 1)),
            right: Box::new(self.build_node(x, y, &right_idx, depth + 1)),
        }
    }

    /// Scan all features in parallel for the impurity-minimizing split.
    fn best_split(&self, x: &Array2<f64>, y: &Array1<f64>, indices: &[usize]) -> Option<SplitCandidate> {
        (0..x.ncols())
            .into_par_iter()
            .filter_map(|feature_idx| self.best_split_for_feature(x, y, indices, feature_idx))
            .min_by(|a, b| {
                a.score
                    .partial_cmp(&b.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    // deterministic tie-break on feature index
                    .then(a.feature_idx.cmp(&b.feature_idx))
            })
    }

    fn best_split_for_feature(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        feature_idx: usize,
    ) -> Option<SplitCandidate> {
        let mut pairs: Vec<(f64, f64)> = indices
            .iter()
            .map(|&i| (x[[i, feature_idx]], y[i]))
            .collect();
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let n = pairs.len();
        let mut best: Option<SplitCandidate> = None;

        if self.is_classification {
            let mut left_counts: HashMap<i64, usize> = HashMap::new();
            let mut right_counts: HashMap<i64, usize> = HashMap::new();
            for &(_, label) in &pairs {
                *right_counts.entry(label.round() as i64).or_insert(0) += 1;
            }

            for split_pos in 1..n {
                let label = pairs[split_pos - 1].1.round() as i64;
                *left_counts.entry(label).or_insert(0) += 1;
                if let Some(count) = right_counts.get_mut(&label) {
                    *count -= 1;
                }

                if pairs[split_pos].0 <= pairs[split_pos - 1].0 {
                    continue;
                }

                let score = weighted_gini(&left_counts, split_pos)
                    + weighted_gini(&right_counts, n - split_pos);
                let threshold = (pairs[split_pos - 1].0 + pairs[split_pos].0) / 2.0;
                if best.map_or(true, |b| score < b.score) {
                    best = Some(SplitCandidate {
                        feature_idx,
                        threshold,
                        score,
                    });
                }
            }
        } else {
            let total_sum: f64 = pairs.iter().map(|&(_, v)| v).sum();
            let total_sq: f64 = pairs.iter().map(|&(_, v)| v * v).sum();
            let mut left_sum = 0.0;
            let mut left_sq = 0.0;

            for split_pos in 1..n {
                let v = pairs[split_pos - 1].1;
                left_sum += v;
                left_sq += v * v;

                if pairs[split_pos].0 <= pairs[split_pos - 1].0 {
                    continue;
                }

                let left_n = split_pos as f64;
                let right_n = (n - split_pos) as f64;
                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;

                // weighted sum of within-child variances (times n)
                let score = (left_sq - left_sum * left_sum / left_n)
                    + (right_sq - right_sum * right_sum / right_n);
                let threshold = (pairs[split_pos - 1].0 + pairs[split_pos].0) / 2.0;
                if best.map_or(true, |b| score < b.score) {
                    best = Some(SplitCandidate {
                        feature_idx,
                        threshold,
                        score,
                    });
                }
            }
        }

        best
    }

    fn leaf_value(&self, y: &Array1<f64>, indices: &[usize]) -> f64 {
        if self.is_classification {
            let mut counts: HashMap<i64, usize> = HashMap::new();
            for &i in indices {
                *counts.entry(y[i].round() as i64).or_insert(0) += 1;
            }
            counts
                .into_iter()
                .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
                .map(|(label, _)| label as f64)
                .unwrap_or(0.0)
        } else {
            let sum: f64 = indices.iter().map(|&i| y[i]).sum();
            sum / indices.len().max(1) as f64
        }
    }

    fn is_pure(&self, y: &Array1<f64>, indices: &[usize]) -> bool {
        let first = y[indices[0]];
        indices.iter().all(|&i| (y[i] - first).abs() < 1e-12)
    }
}

fn weighted_gini(counts: &HashMap<i64, usize>, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n_f = n as f64;
    let gini = 1.0
        - counts
            .values()
            .map(|&c| {
                let p = c as f64 / n_f;
                p * p
            })
            .sum::<f64>();
    gini * n_f
}
