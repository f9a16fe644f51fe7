//! Shared test utilities and fixture generators

use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a small raw passenger DataFrame as it would arrive from disk
///
/// Includes the identifier columns cleaning should drop, integer-typed
/// numeric columns, and missing values in Age, Cabin, and Embarked.
pub fn create_raw_passengers() -> DataFrame {
    df! {
        "PassengerId" => [1i64, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12],
        "Survived" => [0i64, 1, 1, 1, 0, 0, 0, 1, 1, 1, 0, 1],
        "Pclass" => [3i64, 1, 3, 1, 3, 3, 1, 3, 2, 2, 3, 1],
        "Name" => [
            "Braund, Mr. Owen", "Cumings, Mrs. John", "Heikkinen, Miss Laina",
            "Futrelle, Mrs. Jacques", "Allen, Mr. William", "Moran, Mr. James",
            "McCarthy, Mr. Timothy", "Johnson, Mrs. Oscar", "Nasser, Mrs. Nicholas",
            "Sandstrom, Miss Marguerite", "Saundercock, Mr. William", "Bonnell, Miss Elizabeth"
        ],
        "Sex" => [
            "male", "female", "female", "female", "male", "male",
            "male", "female", "female", "female", "male", "female"
        ],
        "Age" => [
            Some(22.0f64), Some(38.0), Some(26.0), Some(35.0), Some(35.0), None,
            Some(54.0), Some(27.0), Some(14.0), Some(4.0), Some(20.0), Some(58.0)
        ],
        "SibSp" => [1i64, 1, 0, 1, 0, 0, 0, 0, 1, 1, 0, 0],
        "Parch" => [0i64, 0, 0, 0, 0, 0, 0, 2, 0, 1, 0, 0],
        "Ticket" => [
            "A/5 21171", "PC 17599", "STON/O2", "113803", "373450", "330877",
            "17463", "347742", "237736", "PP 9549", "A/5 2151", "113783"
        ],
        "Fare" => [
            7.25f64, 71.2833, 7.925, 53.1, 8.05, 8.4583,
            51.8625, 11.1333, 30.0708, 16.7, 8.05, 26.55
        ],
        "Cabin" => [
            None::<&str>, Some("C85"), None, Some("C123"), None, None,
            Some("E46"), None, None, Some("G6"), None, Some("C103")
        ],
        "Embarked" => [
            Some("S"), Some("C"), Some("S"), Some("S"), Some("S"), Some("Q"),
            Some("S"), Some("S"), Some("C"), None, Some("S"), Some("S")
        ],
    }
    .unwrap()
}

/// Generate a larger raw passenger dataset with a learnable survival signal
///
/// Survival odds are driven by sex and class, so any sensible workflow
/// should beat chance by a wide margin. Roughly 12% of ages and 2% of
/// embarkation ports are missing. Deterministic for a given seed.
pub fn synthetic_passengers(n: usize, seed: u64) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut passenger_id = Vec::with_capacity(n);
    let mut survived = Vec::with_capacity(n);
    let mut pclass = Vec::with_capacity(n);
    let mut name = Vec::with_capacity(n);
    let mut sex = Vec::with_capacity(n);
    let mut age: Vec<Option<f64>> = Vec::with_capacity(n);
    let mut sibsp = Vec::with_capacity(n);
    let mut parch = Vec::with_capacity(n);
    let mut ticket = Vec::with_capacity(n);
    let mut fare = Vec::with_capacity(n);
    let mut cabin: Vec<Option<String>> = Vec::with_capacity(n);
    let mut embarked: Vec<Option<&str>> = Vec::with_capacity(n);

    for i in 0..n {
        let female = rng.gen_bool(0.35);
        let class = rng.gen_range(1i64..=3);
        let fare_value = match class {
            1 => rng.gen_range(30.0..250.0),
            2 => rng.gen_range(10.0..60.0),
            _ => rng.gen_range(4.0..25.0),
        };

        let mut p: f64 = if female { 0.75 } else { 0.18 };
        p += match class {
            1 => 0.12,
            2 => 0.02,
            _ => -0.08,
        };
        let label = if rng.gen_bool(p.clamp(0.02, 0.97)) {
            1i64
        } else {
            0
        };

        passenger_id.push((i + 1) as i64);
        survived.push(label);
        pclass.push(class);
        name.push(format!("Passenger, Mx. Number {}", i + 1));
        sex.push(if female { "female" } else { "male" });
        age.push(if rng.gen_bool(0.12) {
            None
        } else {
            Some(rng.gen_range(1.0f64..70.0))
        });
        sibsp.push(rng.gen_range(0i64..=3));
        parch.push(rng.gen_range(0i64..=2));
        ticket.push(format!("T-{:05}", i + 1));
        fare.push(fare_value);
        cabin.push(if rng.gen_bool(0.25) {
            Some(format!("C{}", rng.gen_range(1..150)))
        } else {
            None
        });
        embarked.push(if rng.gen_bool(0.02) {
            None
        } else {
            match rng.gen_range(0..10) {
                0..=6 => Some("S"),
                7..=8 => Some("C"),
                _ => Some("Q"),
            }
        });
    }

    df! {
        "PassengerId" => passenger_id,
        "Survived" => survived,
        "Pclass" => pclass,
        "Name" => name,
        "Sex" => sex,
        "Age" => age,
        "SibSp" => sibsp,
        "Parch" => parch,
        "Ticket" => ticket,
        "Fare" => fare,
        "Cabin" => cabin,
        "Embarked" => embarked,
    }
    .unwrap()
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("passengers.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("passengers.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// Assert that a DataFrame contains specific columns
pub fn assert_has_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in expected_cols {
        assert!(
            actual_cols.contains(&col.to_string()),
            "Missing expected column: '{}'. Actual columns: {:?}",
            col,
            actual_cols
        );
    }
}

/// Assert that a DataFrame does NOT contain specific columns
pub fn assert_missing_columns(df: &DataFrame, unexpected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in unexpected_cols {
        assert!(
            !actual_cols.contains(&col.to_string()),
            "Unexpected column still present: '{}'",
            col
        );
    }
}
