//! Pipeline-level preprocessing tests: fitted state must come from the
//! training split only, and transform must behave per column role.

use polars::prelude::*;
use tabfit::preprocessing::{ColumnRoles, OrdinalSpec, PipelineConstructor};
use tabfit::TabfitError;

fn train_df() -> DataFrame {
    df!(
        "age" => &[10.0, 20.0, 30.0, 40.0],
        "income" => &[1.0, 2.0, 3.0, 4.0],
        "noise" => &[1.0, 1.0, 1.0, 1.0],
        "ocean" => &["INLAND", "NEAR BAY", "INLAND", "NEAR OCEAN"],
        "color" => &["red", "blue", "red", "blue"]
    )
    .unwrap()
}

fn roles() -> ColumnRoles {
    ColumnRoles {
        numeric: vec!["age".to_string(), "income".to_string()],
        categorical: vec!["ocean".to_string(), "color".to_string()],
        drop: vec!["noise".to_string()],
        ordinal: Some(OrdinalSpec {
            column: "ocean".to_string(),
            categories: vec![
                "NEAR OCEAN".to_string(),
                "NEAR BAY".to_string(),
                "INLAND".to_string(),
            ],
        }),
    }
}

#[test]
fn transform_state_comes_from_training_split() {
    let train = train_df();
    let mut pipeline = PipelineConstructor::new(roles()).build().unwrap();
    pipeline.fit(&train).unwrap();

    // train mean(age) = 25; a test value at the train mean scales to zero no
    // matter what else the test split contains
    let test = df!(
        "age" => &[25.0, 25.0],
        "income" => &[1000.0, -1000.0],
        "noise" => &[0.0, 0.0],
        "ocean" => &["INLAND", "INLAND"],
        "color" => &["red", "red"]
    )
    .unwrap();

    let result = pipeline.transform(&test).unwrap();
    let age = result.column("age").unwrap().f64().unwrap();
    assert!(age.get(0).unwrap().abs() < 1e-10);
    assert!(age.get(1).unwrap().abs() < 1e-10);
}

#[test]
fn transform_is_deterministic_for_identical_rows() {
    let train = train_df();
    let mut pipeline = PipelineConstructor::new(roles()).build().unwrap();
    pipeline.fit(&train).unwrap();

    let test = df!(
        "age" => &[15.0, 15.0],
        "income" => &[2.5, 2.5],
        "noise" => &[9.0, 9.0],
        "ocean" => &["NEAR BAY", "NEAR BAY"],
        "color" => &["blue", "blue"]
    )
    .unwrap();

    let result = pipeline.transform(&test).unwrap();
    for name in result.get_column_names() {
        let col = result.column(name.as_str()).unwrap();
        assert_eq!(col.get(0).unwrap(), col.get(1).unwrap(), "column {}", name);
    }
}

#[test]
fn unseen_onehot_category_encodes_all_zero() {
    let train = train_df();
    let mut pipeline = PipelineConstructor::new(roles()).build().unwrap();
    pipeline.fit(&train).unwrap();

    let test = df!(
        "age" => &[20.0],
        "income" => &[2.0],
        "noise" => &[0.0],
        "ocean" => &["INLAND"],
        "color" => &["green"]
    )
    .unwrap();

    let result = pipeline.transform(&test).unwrap();
    let red = result.column("color_red").unwrap().i32().unwrap();
    let blue = result.column("color_blue").unwrap().i32().unwrap();
    assert_eq!(red.get(0).unwrap(), 0);
    assert_eq!(blue.get(0).unwrap(), 0);
}

#[test]
fn unseen_ordinal_category_fails_loudly() {
    let train = train_df();
    let mut pipeline = PipelineConstructor::new(roles()).build().unwrap();
    pipeline.fit(&train).unwrap();

    let test = df!(
        "age" => &[20.0],
        "income" => &[2.0],
        "noise" => &[0.0],
        "ocean" => &["ATLANTIS"],
        "color" => &["red"]
    )
    .unwrap();

    match pipeline.transform(&test) {
        Err(TabfitError::UnknownCategory { column, value }) => {
            assert_eq!(column, "ocean");
            assert_eq!(value, "ATLANTIS");
        }
        other => panic!("expected UnknownCategory, got ok={}", other.is_ok()),
    }
}

#[test]
fn numeric_nulls_filled_with_train_median() {
    let train = df!(
        "age" => &[10.0, 20.0, 30.0],
        "ocean" => &["a", "b", "a"]
    )
    .unwrap();
    let roles = ColumnRoles {
        numeric: vec!["age".to_string()],
        categorical: vec!["ocean".to_string()],
        drop: vec![],
        ordinal: None,
    };

    let mut pipeline = PipelineConstructor::new(roles).build().unwrap();
    pipeline.fit(&train).unwrap();

    let test = df!(
        "age" => &[Some(20.0), None],
        "ocean" => &["a", "b"]
    )
    .unwrap();

    // null imputes to the train median (20), which then scales identically
    // to the explicit 20 in row 0
    let result = pipeline.transform(&test).unwrap();
    let age = result.column("age").unwrap().f64().unwrap();
    assert_eq!(age.get(0).unwrap(), age.get(1).unwrap());
}

#[test]
fn fitted_pipeline_survives_serialization() {
    let train = train_df();
    let mut pipeline = PipelineConstructor::new(roles()).build().unwrap();
    let expected = pipeline.fit_transform(&train).unwrap();

    let json = serde_json::to_string(&pipeline).unwrap();
    let restored: tabfit::preprocessing::FeaturePipeline = serde_json::from_str(&json).unwrap();
    assert!(restored.is_fitted());

    let roundtripped = restored.transform(&train).unwrap();
    assert_eq!(
        expected.get_column_names(),
        roundtripped.get_column_names()
    );
}
