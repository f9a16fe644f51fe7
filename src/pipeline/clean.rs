//! Dataset cleaning: schema validation, label extraction, and type coercion

use anyhow::{Context, Result};
use polars::prelude::*;

/// Binary survival label column
pub const LABEL_COLUMN: &str = "Survived";

/// Identifier and free-text columns removed before analysis
pub const IDENTIFIER_COLUMNS: [&str; 4] = ["PassengerId", "Name", "Ticket", "Cabin"];

/// Columns treated as categorical predictors
pub const CATEGORICAL_COLUMNS: [&str; 3] = ["Pclass", "Sex", "Embarked"];

/// Columns treated as numeric predictors
pub const NUMERIC_COLUMNS: [&str; 4] = ["Age", "SibSp", "Parch", "Fare"];

/// A cleaned dataset: typed predictor columns plus the extracted label vector
#[derive(Debug, Clone)]
pub struct CleanedDataset {
    /// Predictor columns in canonical order (categoricals as strings, numerics as f64)
    pub features: DataFrame,
    /// Survival label per row (0 or 1)
    pub labels: Vec<i32>,
    /// Identifier/free-text columns that were present and removed
    pub dropped_columns: Vec<String>,
}

impl CleanedDataset {
    pub fn n_rows(&self) -> usize {
        self.features.height()
    }

    /// Fraction of rows with a positive label
    pub fn positive_rate(&self) -> f64 {
        if self.labels.is_empty() {
            return 0.0;
        }
        let positives = self.labels.iter().filter(|&&y| y == 1).count();
        positives as f64 / self.labels.len() as f64
    }
}

/// Validate the raw schema, extract the label, coerce predictor types, and
/// drop identifier columns.
///
/// Categorical predictors are cast to strings (so integer-coded classes such
/// as `Pclass` become explicit levels) and numeric predictors to f64. Missing
/// values survive the casts as nulls.
pub fn clean_dataset(df: &DataFrame) -> Result<CleanedDataset> {
    let column_names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut missing: Vec<&str> = Vec::new();
    for required in std::iter::once(&LABEL_COLUMN)
        .chain(CATEGORICAL_COLUMNS.iter())
        .chain(NUMERIC_COLUMNS.iter())
    {
        if !column_names.contains(&required.to_string()) {
            missing.push(required);
        }
    }
    if !missing.is_empty() {
        anyhow::bail!(
            "Dataset is missing required column(s): {:?}. Available columns: {:?}",
            missing,
            column_names
        );
    }

    let labels = extract_labels(df)?;

    let mut columns: Vec<Column> = Vec::with_capacity(7);
    for name in CATEGORICAL_COLUMNS {
        let cast = df
            .column(name)?
            .cast(&DataType::String)
            .with_context(|| format!("Failed to cast column '{}' to string levels", name))?;
        columns.push(cast);
    }
    for name in NUMERIC_COLUMNS {
        let cast = df
            .column(name)?
            .cast(&DataType::Float64)
            .with_context(|| format!("Failed to cast column '{}' to numeric", name))?;
        columns.push(cast);
    }

    let features = DataFrame::new(columns).context("Failed to assemble cleaned dataset")?;

    let dropped_columns: Vec<String> = IDENTIFIER_COLUMNS
        .iter()
        .filter(|c| column_names.contains(&c.to_string()))
        .map(|c| c.to_string())
        .collect();

    Ok(CleanedDataset {
        features,
        labels,
        dropped_columns,
    })
}

/// Extract the binary label column as an i32 vector, rejecting nulls and
/// non-binary values.
fn extract_labels(df: &DataFrame) -> Result<Vec<i32>> {
    let label_col = df.column(LABEL_COLUMN)?;

    if label_col.null_count() > 0 {
        anyhow::bail!(
            "Label column '{}' contains {} missing value(s)",
            LABEL_COLUMN,
            label_col.null_count()
        );
    }

    let cast = label_col
        .cast(&DataType::Int32)
        .with_context(|| format!("Label column '{}' is not numeric", LABEL_COLUMN))?;
    let values = cast.i32()?;

    let mut labels = Vec::with_capacity(df.height());
    for value in values.into_iter() {
        match value {
            Some(0) => labels.push(0),
            Some(1) => labels.push(1),
            Some(other) => anyhow::bail!(
                "Label column '{}' must be binary (0/1). Found value: {}",
                LABEL_COLUMN,
                other
            ),
            None => anyhow::bail!("Label column '{}' contains a null value", LABEL_COLUMN),
        }
    }

    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_frame() -> DataFrame {
        df! {
            "PassengerId" => [1i64, 2, 3, 4],
            "Survived" => [0i64, 1, 1, 0],
            "Pclass" => [3i64, 1, 3, 2],
            "Name" => ["Braund", "Cumings", "Heikkinen", "Futrelle"],
            "Sex" => ["male", "female", "female", "female"],
            "Age" => [Some(22.0f64), Some(38.0), None, Some(35.0)],
            "SibSp" => [1i64, 1, 0, 1],
            "Parch" => [0i64, 0, 0, 0],
            "Ticket" => ["A/5 21171", "PC 17599", "STON/O2", "113803"],
            "Fare" => [7.25f64, 71.2833, 7.925, 53.1],
            "Cabin" => [None::<&str>, Some("C85"), None, Some("C123")],
            "Embarked" => [Some("S"), Some("C"), None, Some("S")],
        }
        .unwrap()
    }

    #[test]
    fn test_clean_drops_identifier_columns() {
        let cleaned = clean_dataset(&raw_frame()).unwrap();
        let names: Vec<String> = cleaned
            .features
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        for dropped in IDENTIFIER_COLUMNS {
            assert!(!names.contains(&dropped.to_string()), "{} survived", dropped);
        }
        assert!(!names.contains(&LABEL_COLUMN.to_string()));
        assert_eq!(cleaned.dropped_columns.len(), 4);
    }

    #[test]
    fn test_clean_casts_class_to_string_levels() {
        let cleaned = clean_dataset(&raw_frame()).unwrap();
        let pclass = cleaned.features.column("Pclass").unwrap();
        assert_eq!(pclass.dtype(), &DataType::String);
        let first = pclass.str().unwrap().get(0).unwrap();
        assert_eq!(first, "3");
    }

    #[test]
    fn test_clean_preserves_missing_values() {
        let cleaned = clean_dataset(&raw_frame()).unwrap();
        assert_eq!(cleaned.features.column("Age").unwrap().null_count(), 1);
        assert_eq!(cleaned.features.column("Embarked").unwrap().null_count(), 1);
    }

    #[test]
    fn test_labels_extracted_in_row_order() {
        let cleaned = clean_dataset(&raw_frame()).unwrap();
        assert_eq!(cleaned.labels, vec![0, 1, 1, 0]);
        assert!((cleaned.positive_rate() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_missing_required_column_rejected() {
        let df = raw_frame().drop("Fare").unwrap();
        let err = clean_dataset(&df).unwrap_err();
        assert!(err.to_string().contains("Fare"));
    }

    #[test]
    fn test_non_binary_label_rejected() {
        let df = df! {
            "Survived" => [0i64, 2, 1],
            "Pclass" => [1i64, 2, 3],
            "Sex" => ["male", "female", "male"],
            "Age" => [20.0f64, 30.0, 40.0],
            "SibSp" => [0i64, 0, 0],
            "Parch" => [0i64, 0, 0],
            "Fare" => [10.0f64, 20.0, 30.0],
            "Embarked" => ["S", "C", "Q"],
        }
        .unwrap();
        let err = clean_dataset(&df).unwrap_err();
        assert!(err.to_string().contains("binary"));
    }
}
