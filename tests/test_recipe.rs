//! Integration tests for preprocessing recipes on realistic passenger data

use lifeboat::eval::default_recipes;
use lifeboat::pipeline::{
    clean_dataset, stratified_split, EncodingStyle, ImputeStrategy, RecipeSpec,
};
use polars::prelude::*;

#[path = "common/mod.rs"]
mod common;

#[test]
fn test_default_recipes_cover_impute_by_encoding_grid() {
    let recipes = default_recipes();
    let names: Vec<&str> = recipes.iter().map(|r| r.name.as_str()).collect();

    assert_eq!(
        names,
        vec![
            "mean_dummy",
            "median_dummy",
            "knn_dummy",
            "mean_onehot",
            "median_onehot",
            "knn_onehot"
        ]
    );
}

#[test]
fn test_all_default_recipes_produce_finite_matrices() {
    let cleaned = clean_dataset(&common::synthetic_passengers(300, 41)).unwrap();
    let split = stratified_split(&cleaned.labels, 0.75, 501).unwrap();

    for recipe in default_recipes() {
        let fitted = recipe.fit(&cleaned.features, &split.train).unwrap();

        let train = fitted.transform(&cleaned.features, &split.train).unwrap();
        let test = fitted.transform(&cleaned.features, &split.test).unwrap();

        assert_eq!(train.nrows(), split.train.len());
        assert_eq!(test.nrows(), split.test.len());
        assert_eq!(train.ncols(), fitted.feature_names().len());
        assert!(
            !fitted.feature_names().is_empty(),
            "Recipe '{}' produced no features",
            recipe.name
        );
        assert!(
            train.iter().all(|v| v.is_finite()),
            "Recipe '{}' left non-finite training values",
            recipe.name
        );
        assert!(
            test.iter().all(|v| v.is_finite()),
            "Recipe '{}' left non-finite test values despite missing inputs",
            recipe.name
        );
    }
}

#[test]
fn test_onehot_wider_than_dummy_after_pruning() {
    let cleaned = clean_dataset(&common::synthetic_passengers(300, 43)).unwrap();
    let split = stratified_split(&cleaned.labels, 0.75, 501).unwrap();

    let dummy = RecipeSpec::new(
        "dummy",
        ImputeStrategy::Mean,
        EncodingStyle::Dummy,
        &["Embarked"],
    )
    .fit(&cleaned.features, &split.train)
    .unwrap();
    let onehot = RecipeSpec::new(
        "onehot",
        ImputeStrategy::Mean,
        EncodingStyle::OneHot,
        &["Embarked"],
    )
    .fit(&cleaned.features, &split.train)
    .unwrap();

    assert!(
        dummy.dropped_lincomb().is_empty(),
        "Dummy coding should already be full rank, dropped {:?}",
        dummy.dropped_lincomb()
    );
    assert!(
        !onehot.dropped_lincomb().is_empty(),
        "Complete one-hot groups are linearly dependent"
    );
    assert!(
        onehot.feature_names().len() > dummy.feature_names().len(),
        "One-hot should keep more columns ({} vs {})",
        onehot.feature_names().len(),
        dummy.feature_names().len()
    );
}

#[test]
fn test_missing_port_becomes_unknown_level() {
    let cleaned = clean_dataset(&common::create_raw_passengers()).unwrap();
    let rows: Vec<usize> = (0..cleaned.features.height()).collect();

    let fitted = RecipeSpec::new(
        "mean_dummy",
        ImputeStrategy::Mean,
        EncodingStyle::Dummy,
        &["Embarked"],
    )
    .fit(&cleaned.features, &rows)
    .unwrap();

    assert!(
        fitted
            .feature_names()
            .iter()
            .any(|n| n == "Embarked_unknown"),
        "Missing ports should encode under an explicit level, got {:?}",
        fitted.feature_names()
    );
}

#[test]
fn test_unseen_level_transforms_to_zero_row_block() {
    let df = df! {
        "Port" => ["S", "C", "S", "C", "Q"],
        "Age" => [20.0f64, 30.0, 40.0, 50.0, 60.0],
    }
    .unwrap();

    let fit_rows = vec![0usize, 1, 2, 3];
    let fitted = RecipeSpec::new("t", ImputeStrategy::Mean, EncodingStyle::OneHot, &[])
        .fit(&df, &fit_rows)
        .unwrap();

    // Row 4 carries level "Q", never seen during fitting
    let out = fitted.transform(&df, &[4]).unwrap();
    let port_columns: Vec<usize> = fitted
        .feature_names()
        .iter()
        .enumerate()
        .filter(|(_, n)| n.starts_with("Port_"))
        .map(|(i, _)| i)
        .collect();

    assert!(!port_columns.is_empty());
    for col in port_columns {
        assert_eq!(out[[0, col]], 0.0, "Unseen level should encode as zeros");
    }
}

#[test]
fn test_fit_statistics_come_from_training_rows_only() {
    let mut age: Vec<Option<f64>> = vec![Some(10.0), Some(20.0), Some(30.0), None];
    age.extend([Some(1000.0), Some(1000.0)].iter().copied());
    let df = df! {
        "Sex" => ["male", "female", "male", "female", "male", "female"],
        "Age" => age,
    }
    .unwrap();

    let fit_rows = vec![0usize, 1, 2, 3];
    let fitted = RecipeSpec::new("t", ImputeStrategy::Mean, EncodingStyle::Dummy, &[])
        .fit(&df, &fit_rows)
        .unwrap();

    // Fit-row mean is 20; the 1000.0 rows were held out
    let out = fitted.transform(&df, &[3]).unwrap();
    let age_idx = fitted
        .feature_names()
        .iter()
        .position(|n| n == "Age")
        .unwrap();
    assert!(
        (out[[0, age_idx]] - 20.0).abs() < 1e-9,
        "Imputed value {} should use training-row statistics",
        out[[0, age_idx]]
    );
}
