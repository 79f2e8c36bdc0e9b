//! Shared utilities: CSV loading, matrix conversion, object persistence

mod data_loader;
mod persistence;

pub use data_loader::load_csv;
pub use persistence::{artifact_filename, save_object};

use crate::error::{Result, TabfitError};
use ndarray::{Array1, Array2};
use polars::prelude::*;

/// Extract named columns from a DataFrame into a row-major `Array2<f64>`.
/// Non-float columns are cast to Float64 first; nulls and values that do
/// not survive the cast are a data error, never a silent zero.
pub fn dataframe_to_matrix(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let column = df
                .column(col_name)
                .map_err(|_| TabfitError::FeatureNotFound(col_name.clone()))?;
            let casted = column
                .cast(&DataType::Float64)
                .map_err(|e| TabfitError::DataError(e.to_string()))?;
            let ca = casted
                .f64()
                .map_err(|e| TabfitError::DataError(e.to_string()))?;
            if ca.null_count() > 0 {
                return Err(TabfitError::DataError(format!(
                    "column '{}' has {} null or non-numeric values",
                    col_name,
                    ca.null_count()
                )));
            }
            Ok(ca.into_iter().flatten().collect::<Vec<f64>>())
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_refs[c][r]))
}

/// Extract a single column as a target vector, cast to Float64. Nulls and
/// unparseable values error rather than degrade into zeros.
pub fn column_to_target(df: &DataFrame, col_name: &str) -> Result<Array1<f64>> {
    let column = df
        .column(col_name)
        .map_err(|_| TabfitError::FeatureNotFound(col_name.to_string()))?;
    let casted = column
        .cast(&DataType::Float64)
        .map_err(|e| TabfitError::DataError(e.to_string()))?;
    let ca = casted
        .f64()
        .map_err(|e| TabfitError::DataError(e.to_string()))?;
    if ca.null_count() > 0 {
        return Err(TabfitError::DataError(format!(
            "column '{}' has {} null or non-numeric values",
            col_name,
            ca.null_count()
        )));
    }
    Ok(ca.into_iter().flatten().collect())
}
