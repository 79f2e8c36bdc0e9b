//! K-nearest-neighbors regression

use crate::error::{Result, TabfitError};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// KNN regressor: prediction is the mean target of the k nearest training
/// rows under Euclidean distance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnRegressor {
    pub n_neighbors: usize,
    x_train: Option<Array2<f64>>,
    y_train: Option<Array1<f64>>,
}

impl Default for KnnRegressor {
    fn default() -> Self {
        Self::new(5)
    }
}

impl KnnRegressor {
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors: n_neighbors.max(1),
            x_train: None,
            y_train: None,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(TabfitError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if x.nrows() < self.n_neighbors {
            return Err(TabfitError::ShapeError {
                expected: format!("at least {} training samples", self.n_neighbors),
                actual: format!("{} samples", x.nrows()),
            });
        }

        self.x_train = Some(x.clone());
        self.y_train = Some(y.clone());
        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let x_train = self.x_train.as_ref().ok_or(TabfitError::ModelNotFitted)?;
        let y_train = self.y_train.as_ref().ok_or(TabfitError::ModelNotFitted)?;

        if x.ncols() != x_train.ncols() {
            return Err(TabfitError::ShapeError {
                expected: format!("{} features", x_train.ncols()),
                actual: format!("{} features", x.ncols()),
            });
        }

        let predictions: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let query = x.row(i);
                let mut distances: Vec<(f64, f64)> = (0..x_train.nrows())
                    .map(|j| {
                        let row = x_train.row(j);
                        let dist: f64 = query
                            .iter()
                            .zip(row.iter())
                            .map(|(a, b)| (a - b) * (a - b))
                            .sum();
                        (dist, y_train[j])
                    })
                    .collect();

                distances.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
                let k = self.n_neighbors.min(distances.len());
                distances[..k].iter().map(|&(_, y)| y).sum::<f64>() / k as f64
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }
}
