//! Default model registry and housing dataset configuration

use crate::preprocessing::{ColumnRoles, OrdinalSpec};
use crate::training::decision_tree::DecisionTree;
use crate::training::knn::KnnRegressor;
use crate::training::linear::LinearRegression;
use crate::training::models::{ModelSpec, ParamValue};
use crate::training::search::ParamGrid;
use std::collections::BTreeMap;

/// Default regression registry: linear, ridge, decision tree, knn.
pub fn default_models() -> BTreeMap<String, ModelSpec> {
    let mut models = BTreeMap::new();
    models.insert(
        "linear".to_string(),
        ModelSpec::Linear(LinearRegression::new()),
    );
    models.insert(
        "ridge".to_string(),
        ModelSpec::Linear(LinearRegression::new().with_alpha(1.0)),
    );
    models.insert(
        "tree".to_string(),
        ModelSpec::DecisionTree(DecisionTree::new_regressor()),
    );
    models.insert("knn".to_string(), ModelSpec::Knn(KnnRegressor::new(5)));
    models
}

/// Hyperparameter grids matching [`default_models`] key for key.
pub fn default_grids() -> BTreeMap<String, ParamGrid> {
    let mut grids = BTreeMap::new();
    grids.insert("linear".to_string(), ParamGrid::new());
    grids.insert(
        "ridge".to_string(),
        ParamGrid::new().with_param(
            "alpha",
            vec![
                ParamValue::Float(0.1),
                ParamValue::Float(1.0),
                ParamValue::Float(10.0),
            ],
        ),
    );
    grids.insert(
        "tree".to_string(),
        ParamGrid::new()
            .with_param(
                "max_depth",
                vec![ParamValue::Int(4), ParamValue::Int(8), ParamValue::Int(12)],
            )
            .with_param(
                "min_samples_leaf",
                vec![ParamValue::Int(1), ParamValue::Int(5)],
            ),
    );
    grids.insert(
        "knn".to_string(),
        ParamGrid::new().with_param(
            "n_neighbors",
            vec![ParamValue::Int(3), ParamValue::Int(5), ParamValue::Int(9)],
        ),
    );
    grids
}

/// Column roles for the California housing dataset.
pub fn housing_column_roles() -> ColumnRoles {
    ColumnRoles {
        numeric: vec![
            "housing_median_age".to_string(),
            "median_income".to_string(),
        ],
        categorical: vec!["ocean_proximity".to_string()],
        drop: vec![
            "longitude".to_string(),
            "latitude".to_string(),
            "population".to_string(),
            "households".to_string(),
            "total_rooms".to_string(),
            "total_bedrooms".to_string(),
        ],
        ordinal: Some(OrdinalSpec {
            column: "ocean_proximity".to_string(),
            categories: vec![
                "Less than 1H from OCEAN".to_string(),
                "NEAR BAY".to_string(),
                "NEAR OCEAN".to_string(),
                "ISLAND".to_string(),
                "INLAND".to_string(),
            ],
        }),
    }
}

/// Target column for the housing dataset.
pub const HOUSING_TARGET: &str = "median_house_value";
