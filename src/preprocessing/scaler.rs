//! Standardization of numeric features

use crate::error::{Result, TabfitError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerParams {
    mean: f64,
    std: f64,
}

/// Standard scaler: (x - mean) / std, fit on training data only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    params: BTreeMap<String, ScalerParams>,
    is_fitted: bool,
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardScaler {
    pub fn new() -> Self {
        Self {
            params: BTreeMap::new(),
            is_fitted: false,
        }
    }

    /// Compute per-column mean and standard deviation.
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| TabfitError::FeatureNotFound(col_name.to_string()))?;
            let casted = column
                .cast(&DataType::Float64)
                .map_err(|e| TabfitError::PreprocessingError(e.to_string()))?;
            let ca = casted
                .f64()
                .map_err(|e| TabfitError::PreprocessingError(e.to_string()))?;

            let mean = ca.mean().unwrap_or(0.0);
            let std = ca.std(1).unwrap_or(1.0);
            self.params.insert(
                col_name.to_string(),
                ScalerParams {
                    mean,
                    // constant columns scale by 1.0 instead of dividing by zero
                    std: if std == 0.0 { 1.0 } else { std },
                },
            );
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Scale columns using the fitted parameters.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(TabfitError::ModelNotFitted);
        }

        let replacements: Vec<Series> = self
            .params
            .iter()
            .map(|(col_name, params)| {
                let column = df
                    .column(col_name)
                    .map_err(|_| TabfitError::FeatureNotFound(col_name.clone()))?;
                self.scale_series(column.as_materialized_series(), params)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut result = df.clone();
        for scaled in replacements {
            result = result
                .with_column(scaled)
                .map_err(|e| TabfitError::PreprocessingError(e.to_string()))?
                .clone();
        }

        Ok(result)
    }

    fn scale_series(&self, series: &Series, params: &ScalerParams) -> Result<Series> {
        let casted = series
            .cast(&DataType::Float64)
            .map_err(|e| TabfitError::PreprocessingError(e.to_string()))?;
        let ca = casted
            .f64()
            .map_err(|e| TabfitError::PreprocessingError(e.to_string()))?;

        let scaled: Float64Chunked = ca
            .into_iter()
            .map(|opt| opt.map(|v| (v - params.mean) / params.std))
            .collect();

        Ok(scaled.with_name(series.name().clone()).into_series())
    }
}
