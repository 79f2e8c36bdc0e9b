//! Column-role preprocessing pipeline

use crate::error::{Result, TabfitError};
use crate::preprocessing::{
    ImputeStrategy, Imputer, OneHotEncoder, OrdinalEncoder, StandardScaler,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Declared order for one ordinal categorical column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdinalSpec {
    pub column: String,
    pub categories: Vec<String>,
}

/// Partition of the feature columns into preprocessing roles.
///
/// Columns not named in any role pass through the pipeline unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnRoles {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    pub drop: Vec<String>,
    pub ordinal: Option<OrdinalSpec>,
}

impl ColumnRoles {
    /// Every feature column may carry at most one role.
    pub fn validate(&self) -> Result<()> {
        for col in &self.numeric {
            if self.categorical.contains(col) {
                return Err(TabfitError::ConfigError(format!(
                    "column '{}' is both numeric and categorical",
                    col
                )));
            }
        }
        for col in &self.drop {
            if self.numeric.contains(col) || self.categorical.contains(col) {
                return Err(TabfitError::ConfigError(format!(
                    "column '{}' is dropped but also assigned a transform role",
                    col
                )));
            }
        }
        if let Some(ordinal) = &self.ordinal {
            if self.numeric.contains(&ordinal.column) {
                return Err(TabfitError::ConfigError(format!(
                    "ordinal column '{}' is also listed as numeric",
                    ordinal.column
                )));
            }
            if self.drop.contains(&ordinal.column) {
                return Err(TabfitError::ConfigError(format!(
                    "ordinal column '{}' is also dropped",
                    ordinal.column
                )));
            }
        }
        Ok(())
    }

    /// Categorical columns that get one-hot encoded: everything categorical
    /// except the ordinal column.
    fn onehot_columns(&self) -> Vec<String> {
        let ordinal_col = self.ordinal.as_ref().map(|o| o.column.as_str());
        self.categorical
            .iter()
            .filter(|c| Some(c.as_str()) != ordinal_col)
            .cloned()
            .collect()
    }
}

/// Builds a [`FeaturePipeline`] from column roles.
pub struct PipelineConstructor {
    roles: ColumnRoles,
}

impl PipelineConstructor {
    pub fn new(roles: ColumnRoles) -> Self {
        Self { roles }
    }

    pub fn build(self) -> Result<FeaturePipeline> {
        self.roles.validate()?;

        let ordinal = match &self.roles.ordinal {
            Some(spec) => Some(OrdinalEncoder::new(
                spec.column.clone(),
                spec.categories.clone(),
            )?),
            None => None,
        };

        Ok(FeaturePipeline {
            roles: self.roles,
            numeric_imputer: Imputer::new(ImputeStrategy::Median),
            scaler: StandardScaler::new(),
            categorical_imputer: Imputer::new(ImputeStrategy::MostFrequent),
            onehot: OneHotEncoder::new(),
            ordinal,
            is_fitted: false,
        })
    }
}

/// Composite column transformer with a fit/transform contract.
///
/// All transform state (medians, scale parameters, category vocabularies)
/// is computed exclusively from the data passed to `fit` and reused as-is
/// by `transform`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturePipeline {
    roles: ColumnRoles,
    numeric_imputer: Imputer,
    scaler: StandardScaler,
    categorical_imputer: Imputer,
    onehot: OneHotEncoder,
    ordinal: Option<OrdinalEncoder>,
    is_fitted: bool,
}

impl FeaturePipeline {
    /// Fit all per-column-group state on the training split.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        let df = self.drop_columns(df)?;

        if !self.roles.numeric.is_empty() {
            let cols: Vec<&str> = self.roles.numeric.iter().map(|s| s.as_str()).collect();
            self.numeric_imputer.fit(&df, &cols)?;
            let imputed = self.numeric_imputer.transform(&df)?;
            self.scaler.fit(&imputed, &cols)?;
        }

        if !self.roles.categorical.is_empty() {
            let cols: Vec<&str> = self.roles.categorical.iter().map(|s| s.as_str()).collect();
            self.categorical_imputer.fit(&df, &cols)?;
            let imputed = self.categorical_imputer.transform(&df)?;

            let onehot_cols = self.roles.onehot_columns();
            if !onehot_cols.is_empty() {
                let refs: Vec<&str> = onehot_cols.iter().map(|s| s.as_str()).collect();
                self.onehot.fit(&imputed, &refs)?;
            }

            if let Some(ordinal) = &mut self.ordinal {
                ordinal.fit(&imputed)?;
            }
        } else if let Some(ordinal) = &mut self.ordinal {
            ordinal.fit(&df)?;
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Apply the fitted transforms. Never refits on the input.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(TabfitError::ModelNotFitted);
        }

        let mut result = self.drop_columns(df)?;

        if !self.roles.numeric.is_empty() {
            result = self.numeric_imputer.transform(&result)?;
            result = self.scaler.transform(&result)?;
        }

        if !self.roles.categorical.is_empty() {
            result = self.categorical_imputer.transform(&result)?;
        }

        if let Some(ordinal) = &self.ordinal {
            result = ordinal.transform(&result)?;
        }

        if !self.roles.onehot_columns().is_empty() {
            result = self.onehot.transform(&result)?;
        }

        Ok(result)
    }

    /// Fit on the training split and transform it in one step.
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    pub fn roles(&self) -> &ColumnRoles {
        &self.roles
    }

    fn drop_columns(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();
        for col in &self.roles.drop {
            if result.column(col).is_ok() {
                result = result
                    .drop(col)
                    .map_err(|e| TabfitError::PreprocessingError(e.to_string()))?;
            }
        }
        Ok(result)
    }
}
