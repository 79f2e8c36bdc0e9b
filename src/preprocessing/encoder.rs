//! Categorical encoding: one-hot for nominal columns, rank encoding for the
//! ordinal column with a caller-declared category order.

use crate::error::{Result, TabfitError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One-hot encoder. The category vocabulary per column is frozen at fit
/// time; unseen categories at transform time encode as all-zero rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    // column name -> sorted category vocabulary
    categories: BTreeMap<String, Vec<String>>,
    is_fitted: bool,
}

impl Default for OneHotEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self {
            categories: BTreeMap::new(),
            is_fitted: false,
        }
    }

    /// Learn the category vocabulary for each column from the training data.
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| TabfitError::FeatureNotFound(col_name.to_string()))?;
            let ca = column
                .str()
                .map_err(|e| TabfitError::PreprocessingError(e.to_string()))?;

            let mut vocab: Vec<String> = ca
                .into_iter()
                .flatten()
                .map(|s| s.to_string())
                .collect();
            vocab.sort();
            vocab.dedup();

            self.categories.insert(col_name.to_string(), vocab);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Expand each encoded column into `{col}_{category}` indicator columns
    /// and drop the source column. Column order is deterministic: sorted
    /// category vocabulary.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(TabfitError::ModelNotFitted);
        }

        let mut result = df.clone();

        for (col_name, vocab) in &self.categories {
            let column = df
                .column(col_name)
                .map_err(|_| TabfitError::FeatureNotFound(col_name.clone()))?;
            let ca = column
                .str()
                .map_err(|e| TabfitError::PreprocessingError(e.to_string()))?;

            for category in vocab {
                let new_col_name = format!("{}_{}", col_name, category);
                let values: Vec<i32> = ca
                    .into_iter()
                    .map(|v| if v == Some(category.as_str()) { 1 } else { 0 })
                    .collect();

                let new_series = Series::new(new_col_name.into(), values);
                result = result
                    .with_column(new_series)
                    .map_err(|e| TabfitError::PreprocessingError(e.to_string()))?
                    .clone();
            }

            result = result
                .drop(col_name)
                .map_err(|e| TabfitError::PreprocessingError(e.to_string()))?;
        }

        Ok(result)
    }

    /// Names of columns this encoder was fitted on.
    pub fn fitted_columns(&self) -> Vec<&str> {
        self.categories.keys().map(|s| s.as_str()).collect()
    }
}

/// Ordinal encoder for a single column with an explicit category order.
/// Maps each category to its rank position 0..N-1. Unseen categories fail
/// loudly: there is no rank to assign them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdinalEncoder {
    column: String,
    order: Vec<String>,
    ranks: HashMap<String, usize>,
    is_fitted: bool,
}

impl OrdinalEncoder {
    pub fn new(column: impl Into<String>, order: Vec<String>) -> Result<Self> {
        let column = column.into();
        if order.is_empty() {
            return Err(TabfitError::ConfigError(format!(
                "ordinal column '{}' has an empty category order",
                column
            )));
        }

        let ranks = Self::build_ranks(&order);
        if ranks.len() != order.len() {
            return Err(TabfitError::ConfigError(format!(
                "ordinal column '{}' has duplicate categories in its order",
                column
            )));
        }

        Ok(Self {
            column,
            order,
            ranks,
            is_fitted: false,
        })
    }

    fn build_ranks(order: &[String]) -> HashMap<String, usize> {
        order
            .iter()
            .enumerate()
            .map(|(rank, cat)| (cat.clone(), rank))
            .collect()
    }

    /// Validate that every category observed in the training data is part of
    /// the declared order. The vocabulary itself comes from the caller, not
    /// from the data.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        let column = df
            .column(&self.column)
            .map_err(|_| TabfitError::FeatureNotFound(self.column.clone()))?;
        let ca = column
            .str()
            .map_err(|e| TabfitError::PreprocessingError(e.to_string()))?;

        for val in ca.into_iter().flatten() {
            if !self.ranks.contains_key(val) {
                return Err(TabfitError::UnknownCategory {
                    column: self.column.clone(),
                    value: val.to_string(),
                });
            }
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Replace the column with integer ranks. Unseen categories error.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(TabfitError::ModelNotFitted);
        }

        let column = df
            .column(&self.column)
            .map_err(|_| TabfitError::FeatureNotFound(self.column.clone()))?;
        let ca = column
            .str()
            .map_err(|e| TabfitError::PreprocessingError(e.to_string()))?;

        let mut values: Vec<i64> = Vec::with_capacity(ca.len());
        for val in ca.into_iter() {
            match val {
                Some(v) => match self.ranks.get(v) {
                    Some(&rank) => values.push(rank as i64),
                    None => {
                        return Err(TabfitError::UnknownCategory {
                            column: self.column.clone(),
                            value: v.to_string(),
                        })
                    }
                },
                None => {
                    return Err(TabfitError::UnknownCategory {
                        column: self.column.clone(),
                        value: "<null>".to_string(),
                    })
                }
            }
        }

        let encoded = Series::new(self.column.clone().into(), values);
        let mut result = df.clone();
        result = result
            .with_column(encoded)
            .map_err(|e| TabfitError::PreprocessingError(e.to_string()))?
            .clone();

        Ok(result)
    }

    /// Encode a single category to its rank.
    pub fn encode(&self, category: &str) -> Option<usize> {
        self.ranks.get(category).copied()
    }

    /// Decode a rank back to its category. Inverse of `encode`.
    pub fn decode(&self, rank: usize) -> Option<&str> {
        self.order.get(rank).map(|s| s.as_str())
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn n_categories(&self) -> usize {
        self.order.len()
    }
}
