//! Missing value imputation

use crate::error::{Result, TabfitError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Strategy for imputing missing values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Replace with column median (numeric only)
    Median,
    /// Replace with the most frequent value
    MostFrequent,
    /// Replace with a constant value (numeric only)
    Constant(f64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum FillValue {
    Numeric(f64),
    Categorical(String),
}

/// Imputer with per-column fill values computed at fit time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    strategy: ImputeStrategy,
    fill_values: BTreeMap<String, FillValue>,
    is_fitted: bool,
}

impl Imputer {
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            fill_values: BTreeMap::new(),
            is_fitted: false,
        }
    }

    /// Compute fill values for the given columns from the training data.
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| TabfitError::FeatureNotFound(col_name.to_string()))?;
            let series = column.as_materialized_series();

            let fill_value = self.compute_fill_value(series)?;
            self.fill_values.insert(col_name.to_string(), fill_value);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Fill missing values using the fitted per-column statistics.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(TabfitError::ModelNotFitted);
        }

        let mut result = df.clone();
        for (col_name, fill_value) in &self.fill_values {
            let column = df
                .column(col_name)
                .map_err(|_| TabfitError::FeatureNotFound(col_name.clone()))?;
            let series = column.as_materialized_series();
            let filled = self.fill_series(series, fill_value)?;
            result = result
                .with_column(filled)
                .map_err(|e| TabfitError::PreprocessingError(e.to_string()))?
                .clone();
        }

        Ok(result)
    }

    fn compute_fill_value(&self, series: &Series) -> Result<FillValue> {
        match &self.strategy {
            ImputeStrategy::Median => {
                let casted = series
                    .cast(&DataType::Float64)
                    .map_err(|e| TabfitError::PreprocessingError(e.to_string()))?;
                let median = casted
                    .f64()
                    .map_err(|e| TabfitError::PreprocessingError(e.to_string()))?
                    .median()
                    .unwrap_or(0.0);
                Ok(FillValue::Numeric(median))
            }
            ImputeStrategy::MostFrequent => {
                if series.dtype() == &DataType::String {
                    Ok(FillValue::Categorical(Self::mode_string(series)?))
                } else {
                    Ok(FillValue::Numeric(Self::mode_numeric(series)?))
                }
            }
            ImputeStrategy::Constant(val) => Ok(FillValue::Numeric(*val)),
        }
    }

    fn mode_string(series: &Series) -> Result<String> {
        let ca = series
            .str()
            .map_err(|e| TabfitError::PreprocessingError(e.to_string()))?;

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for val in ca.into_iter().flatten() {
            *counts.entry(val).or_insert(0) += 1;
        }

        // BTreeMap iteration makes the tie-break deterministic
        counts
            .into_iter()
            .max_by_key(|(_, count)| *count)
            .map(|(val, _)| val.to_string())
            .ok_or_else(|| {
                TabfitError::PreprocessingError(format!(
                    "column '{}' has no values to compute a mode from",
                    series.name()
                ))
            })
    }

    fn mode_numeric(series: &Series) -> Result<f64> {
        let casted = series
            .cast(&DataType::Float64)
            .map_err(|e| TabfitError::PreprocessingError(e.to_string()))?;
        let ca = casted
            .f64()
            .map_err(|e| TabfitError::PreprocessingError(e.to_string()))?;

        let mut counts: BTreeMap<u64, usize> = BTreeMap::new();
        for val in ca.into_iter().flatten() {
            *counts.entry(val.to_bits()).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .max_by_key(|(_, count)| *count)
            .map(|(bits, _)| f64::from_bits(bits))
            .ok_or_else(|| {
                TabfitError::PreprocessingError(format!(
                    "column '{}' has no values to compute a mode from",
                    series.name()
                ))
            })
    }

    fn fill_series(&self, series: &Series, fill_value: &FillValue) -> Result<Series> {
        match fill_value {
            FillValue::Numeric(val) => {
                let casted = series
                    .cast(&DataType::Float64)
                    .map_err(|e| TabfitError::PreprocessingError(e.to_string()))?;
                let ca = casted
                    .f64()
                    .map_err(|e| TabfitError::PreprocessingError(e.to_string()))?;

                let filled: Float64Chunked = ca
                    .into_iter()
                    .map(|opt| Some(opt.unwrap_or(*val)))
                    .collect();

                Ok(filled.with_name(series.name().clone()).into_series())
            }
            FillValue::Categorical(val) => {
                let ca = series
                    .str()
                    .map_err(|e| TabfitError::PreprocessingError(e.to_string()))?;

                let filled: StringChunked = ca
                    .into_iter()
                    .map(|opt| Some(opt.unwrap_or(val.as_str()).to_string()))
                    .collect();

                Ok(filled.with_name(series.name().clone()).into_series())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_imputation() {
        let df = DataFrame::new(vec![Column::new(
            "a".into(),
            &[Some(1.0), None, Some(3.0), Some(10.0)],
        )])
        .unwrap();

        let mut imputer = Imputer::new(ImputeStrategy::Median);
        imputer.fit(&df, &["a"]).unwrap();
        let result = imputer.transform(&df).unwrap();

        let col = result.column("a").unwrap().f64().unwrap();
        // median of [1, 3, 10] = 3
        assert_eq!(col.get(1).unwrap(), 3.0);
    }

    #[test]
    fn test_most_frequent_string() {
        let df = DataFrame::new(vec![Column::new(
            "cat".into(),
            &[Some("x"), Some("y"), None, Some("y")],
        )])
        .unwrap();

        let mut imputer = Imputer::new(ImputeStrategy::MostFrequent);
        imputer.fit(&df, &["cat"]).unwrap();
        let result = imputer.transform(&df).unwrap();

        let col = result.column("cat").unwrap().str().unwrap();
        assert_eq!(col.get(2).unwrap(), "y");
    }

    #[test]
    fn test_missing_fitted_column_errors() {
        let train = df!("a" => &[1.0, 2.0, 3.0]).unwrap();
        let mut imputer = Imputer::new(ImputeStrategy::Median);
        imputer.fit(&train, &["a"]).unwrap();

        let test = df!("b" => &[1.0, 2.0]).unwrap();
        assert!(matches!(
            imputer.transform(&test),
            Err(TabfitError::FeatureNotFound(col)) if col == "a"
        ));
    }

    #[test]
    fn test_transform_before_fit_errors() {
        let df = df!("a" => &[1.0, 2.0]).unwrap();
        let imputer = Imputer::new(ImputeStrategy::Median);
        assert!(matches!(
            imputer.transform(&df),
            Err(TabfitError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_fill_values_frozen_after_fit() {
        let train = DataFrame::new(vec![Column::new(
            "a".into(),
            &[Some(1.0), Some(2.0), Some(3.0)],
        )])
        .unwrap();
        let test = DataFrame::new(vec![Column::new(
            "a".into(),
            &[None::<f64>, Some(100.0)],
        )])
        .unwrap();

        let mut imputer = Imputer::new(ImputeStrategy::Median);
        imputer.fit(&train, &["a"]).unwrap();
        let result = imputer.transform(&test).unwrap();

        // fill comes from the train median, not from test content
        let col = result.column("a").unwrap().f64().unwrap();
        assert_eq!(col.get(0).unwrap(), 2.0);
    }
}
