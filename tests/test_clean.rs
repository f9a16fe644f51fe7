//! Integration tests for cleaning raw passenger data loaded from disk

use lifeboat::pipeline::{clean_dataset, load_dataframe, CATEGORICAL_COLUMNS, NUMERIC_COLUMNS};
use polars::prelude::*;

#[path = "common/mod.rs"]
mod common;

#[test]
fn test_clean_after_csv_load() {
    let mut df = common::create_raw_passengers();
    let (temp_dir, csv_path) = common::create_temp_csv(&mut df);

    let raw = load_dataframe(&csv_path, 100).unwrap();
    let cleaned = clean_dataset(&raw).unwrap();

    assert_eq!(cleaned.features.height(), 12);
    assert_eq!(cleaned.features.width(), 7);
    common::assert_has_columns(
        &cleaned.features,
        &["Pclass", "Sex", "Embarked", "Age", "SibSp", "Parch", "Fare"],
    );
    common::assert_missing_columns(
        &cleaned.features,
        &["PassengerId", "Name", "Ticket", "Cabin", "Survived"],
    );

    drop(temp_dir);
}

#[test]
fn test_clean_coerces_csv_inferred_types() {
    let mut df = common::create_raw_passengers();
    let (temp_dir, csv_path) = common::create_temp_csv(&mut df);

    let raw = load_dataframe(&csv_path, 100).unwrap();
    let cleaned = clean_dataset(&raw).unwrap();

    for name in CATEGORICAL_COLUMNS {
        assert_eq!(
            cleaned.features.column(name).unwrap().dtype(),
            &DataType::String,
            "Column '{}' should be string-typed",
            name
        );
    }
    for name in NUMERIC_COLUMNS {
        assert_eq!(
            cleaned.features.column(name).unwrap().dtype(),
            &DataType::Float64,
            "Column '{}' should be f64-typed",
            name
        );
    }

    // Integer-coded class becomes an explicit level
    let pclass = cleaned.features.column("Pclass").unwrap();
    assert_eq!(pclass.str().unwrap().get(0).unwrap(), "3");

    drop(temp_dir);
}

#[test]
fn test_clean_reports_dropped_identifiers() {
    let cleaned = clean_dataset(&common::create_raw_passengers()).unwrap();

    assert_eq!(
        cleaned.dropped_columns,
        vec!["PassengerId", "Name", "Ticket", "Cabin"]
    );
}

#[test]
fn test_clean_labels_match_fixture() {
    let cleaned = clean_dataset(&common::create_raw_passengers()).unwrap();

    assert_eq!(cleaned.labels.len(), 12);
    assert_eq!(cleaned.labels.iter().filter(|&&l| l == 1).count(), 7);
    assert_eq!(cleaned.labels[0], 0);
    assert_eq!(cleaned.labels[1], 1);
}

#[test]
fn test_clean_works_without_identifier_columns() {
    let raw = common::create_raw_passengers()
        .drop("PassengerId")
        .unwrap()
        .drop("Name")
        .unwrap()
        .drop("Ticket")
        .unwrap()
        .drop("Cabin")
        .unwrap();

    let cleaned = clean_dataset(&raw).unwrap();

    assert!(cleaned.dropped_columns.is_empty());
    assert_eq!(cleaned.features.width(), 7);
}

#[test]
fn test_clean_on_synthetic_generator() {
    let raw = common::synthetic_passengers(200, 7);
    let cleaned = clean_dataset(&raw).unwrap();

    assert_eq!(cleaned.features.height(), 200);
    assert!(cleaned.positive_rate() > 0.1, "Some passengers survive");
    assert!(cleaned.positive_rate() < 0.9, "Some passengers die");
    assert!(
        cleaned.features.column("Age").unwrap().null_count() > 0,
        "Generator should produce missing ages"
    );
}

#[test]
fn test_synthetic_generator_survival_odds_bounded_and_seeded() {
    let cleaned = clean_dataset(&common::synthetic_passengers(500, 13)).unwrap();

    // Survival odds are clamped to [0.02, 0.97] per passenger, so the
    // realized rate over a large sample stays well inside that band
    let rate = cleaned.positive_rate();
    assert!(
        rate > 0.05 && rate < 0.95,
        "Survival rate {} outside the generator's odds band",
        rate
    );

    let again = clean_dataset(&common::synthetic_passengers(500, 13)).unwrap();
    assert_eq!(cleaned.labels, again.labels, "Same seed, same passengers");
}
