//! End-to-end training run: CSV splits in, one persisted artifact out.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use tabfit::preprocessing::{ColumnRoles, OrdinalSpec};
use tabfit::scoring::{Metric, TaskType};
use tabfit::trainer::{ModelTrainer, TrainerConfig};
use tabfit::training::{DecisionTree, LinearRegression, ModelSpec, ParamGrid, ParamValue};
use tabfit::TabfitError;

const OCEANS: [&str; 3] = ["INLAND", "NEAR BAY", "NEAR OCEAN"];

fn write_split(path: &Path, n_rows: usize, offset: usize) {
    let mut csv = String::from("age,income,ocean,price\n");
    for i in 0..n_rows {
        let row = i + offset;
        let age = 10.0 + row as f64;
        let income = 1.0 + (row % 7) as f64;
        let ocean = OCEANS[row % OCEANS.len()];
        // price is a clean linear function so the linear model wins
        let price = 100.0 + 50.0 * income + 2.0 * age;
        writeln!(csv, "{},{},{},{}", age, income, ocean, price).unwrap();
    }
    fs::write(path, csv).unwrap();
}

fn registry() -> (BTreeMap<String, ModelSpec>, BTreeMap<String, ParamGrid>) {
    let mut models = BTreeMap::new();
    models.insert(
        "linear".to_string(),
        ModelSpec::Linear(LinearRegression::new()),
    );
    models.insert(
        "tree".to_string(),
        ModelSpec::DecisionTree(DecisionTree::new_regressor()),
    );

    let mut grids = BTreeMap::new();
    grids.insert("linear".to_string(), ParamGrid::new());
    grids.insert(
        "tree".to_string(),
        ParamGrid::new().with_param("max_depth", vec![ParamValue::Int(3), ParamValue::Int(6)]),
    );
    (models, grids)
}

fn roles() -> ColumnRoles {
    ColumnRoles {
        numeric: vec!["age".to_string(), "income".to_string()],
        categorical: vec!["ocean".to_string()],
        drop: vec![],
        ordinal: Some(OrdinalSpec {
            column: "ocean".to_string(),
            categories: OCEANS.iter().map(|s| s.to_string()).collect(),
        }),
    }
}

#[test]
fn full_run_persists_exactly_one_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let train_path = dir.path().join("train.csv");
    let test_path = dir.path().join("test.csv");
    let output_dir = dir.path().join("models");
    write_split(&train_path, 30, 0);
    write_split(&test_path, 10, 30);

    let config = TrainerConfig::new(&train_path, &test_path, "price")
        .with_task_type(TaskType::Regression)
        .with_selection_metric(Metric::R2Score)
        .with_cv_folds(3)
        .with_random_state(42)
        .with_output_dir(&output_dir)
        .with_roles(roles());

    let (models, grids) = registry();
    let report = ModelTrainer::new(config, models, grids).train().unwrap();

    // linear target, so the linear model wins with near-perfect r2
    assert_eq!(report.best_model, "linear");
    assert!(report.best_score > 0.99, "r2 = {}", report.best_score);
    assert_eq!(report.scores.models(), vec!["linear", "tree"]);

    let artifacts: Vec<_> = fs::read_dir(&output_dir).unwrap().collect();
    assert_eq!(artifacts.len(), 1);

    let name = artifacts[0]
        .as_ref()
        .unwrap()
        .file_name()
        .to_string_lossy()
        .to_string();
    assert!(name.contains("linear"), "artifact name: {}", name);
    assert!(name.ends_with("_%.json"), "artifact name: {}", name);
    assert_eq!(report.artifact_path, output_dir.join(&name));

    // artifact is a loadable model spec
    let json = fs::read_to_string(&report.artifact_path).unwrap();
    let restored: ModelSpec = serde_json::from_str(&json).unwrap();
    assert!(matches!(restored, ModelSpec::Linear(_)));
}

#[test]
fn missing_target_column_is_a_data_error() {
    let dir = tempfile::tempdir().unwrap();
    let train_path = dir.path().join("train.csv");
    let test_path = dir.path().join("test.csv");
    write_split(&train_path, 12, 0);
    fs::write(&test_path, "age,income,ocean\n20,3,INLAND\n").unwrap();

    let config = TrainerConfig::new(&train_path, &test_path, "price").with_roles(roles());
    let (models, grids) = registry();

    match ModelTrainer::new(config, models, grids).train() {
        Err(TabfitError::StageError { stage, source }) => {
            assert_eq!(stage, "load");
            match *source {
                TabfitError::DataError(msg) => {
                    assert!(msg.contains("test"));
                    assert!(msg.contains("price"));
                }
                other => panic!("expected DataError, got {}", other),
            }
        }
        other => panic!("expected StageError, got ok={}", other.is_ok()),
    }
}

#[test]
fn empty_target_cell_aborts_instead_of_training_on_zeros() {
    let dir = tempfile::tempdir().unwrap();
    let train_path = dir.path().join("train.csv");
    let test_path = dir.path().join("test.csv");
    write_split(&test_path, 6, 12);

    // one row with a missing price
    let mut csv = String::from("age,income,ocean,price\n");
    for i in 0..11 {
        writeln!(csv, "{},{},{},{}", 10 + i, 1 + i % 7, OCEANS[i % 3], 200 + i).unwrap();
    }
    csv.push_str("30,5,INLAND,\n");
    fs::write(&train_path, csv).unwrap();

    let config = TrainerConfig::new(&train_path, &test_path, "price").with_roles(roles());
    let (models, grids) = registry();

    match ModelTrainer::new(config, models, grids).train() {
        Err(TabfitError::StageError { stage, source }) => {
            assert_eq!(stage, "prepare");
            match *source {
                TabfitError::DataError(msg) => assert!(msg.contains("price")),
                other => panic!("expected DataError, got {}", other),
            }
        }
        other => panic!("expected StageError, got ok={}", other.is_ok()),
    }
}

#[test]
fn unseen_test_category_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let train_path = dir.path().join("train.csv");
    let test_path = dir.path().join("test.csv");
    write_split(&train_path, 12, 0);
    fs::write(
        &test_path,
        "age,income,ocean,price\n20,3,ISLAND,260\n",
    )
    .unwrap();

    let config = TrainerConfig::new(&train_path, &test_path, "price").with_roles(roles());
    let (models, grids) = registry();

    match ModelTrainer::new(config, models, grids).train() {
        Err(TabfitError::StageError { stage, source }) => {
            assert_eq!(stage, "prepare");
            assert!(matches!(*source, TabfitError::UnknownCategory { .. }));
        }
        other => panic!("expected StageError, got ok={}", other.is_ok()),
    }
}

#[test]
fn grid_missing_for_model_fails_before_any_fit() {
    let dir = tempfile::tempdir().unwrap();
    let train_path = dir.path().join("train.csv");
    let test_path = dir.path().join("test.csv");
    let output_dir = dir.path().join("models");
    write_split(&train_path, 12, 0);
    write_split(&test_path, 6, 12);

    let config = TrainerConfig::new(&train_path, &test_path, "price")
        .with_output_dir(&output_dir)
        .with_roles(roles());
    let (models, mut grids) = registry();
    grids.remove("tree");

    match ModelTrainer::new(config, models, grids).train() {
        Err(TabfitError::StageError { stage, source }) => {
            assert_eq!(stage, "fit");
            match *source {
                TabfitError::ConfigError(msg) => assert!(msg.contains("tree")),
                other => panic!("expected ConfigError, got {}", other),
            }
        }
        other => panic!("expected StageError, got ok={}", other.is_ok()),
    }
    // nothing was persisted
    assert!(!output_dir.exists());
}
