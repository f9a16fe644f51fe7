//! Command-line argument definitions using clap

use clap::Parser;
use std::path::{Path, PathBuf};

/// Lifeboat - Compare survival-model workflows on passenger data with repeated cross-validation
#[derive(Parser, Debug)]
#[command(name = "lifeboat")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input file path (CSV or Parquet) with one row per passenger
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory for run artifacts (report.json, cv_metrics.json, eda.json, roc_curve.csv).
    /// Defaults to a '<stem>_report' directory next to the input file.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Seed for the train/test split and fold assignment
    #[arg(long, default_value = "501")]
    pub seed: u64,

    /// Number of cross-validation folds per repeat
    #[arg(long, default_value = "10", value_parser = validate_folds)]
    pub folds: usize,

    /// Number of times the fold assignment is repeated with fresh shuffles
    #[arg(long, default_value = "10", value_parser = validate_repeats)]
    pub repeats: usize,

    /// Fraction of passengers assigned to the training partition
    #[arg(long, default_value = "0.75", value_parser = validate_train_fraction)]
    pub train_fraction: f64,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for full table scan (very slow for large files).
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,

    /// Bundle the artifacts into a single zip and remove the originals
    #[arg(long, default_value = "false")]
    pub bundle: bool,

    /// Suppress exploration tables and progress output
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

impl Cli {
    /// Artifact directory, derived from the input path when not given explicitly.
    pub fn artifact_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| {
            let parent = self.input.parent().unwrap_or_else(|| Path::new("."));
            let stem = self
                .input
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("lifeboat");
            parent.join(format!("{}_report", stem))
        })
    }
}

/// Validator for the folds parameter
fn validate_folds(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid fold count", s))?;

    if value < 2 {
        Err(format!("folds must be at least 2, got {}", value))
    } else {
        Ok(value)
    }
}

/// Validator for the repeats parameter
fn validate_repeats(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid repeat count", s))?;

    if value < 1 {
        Err(format!("repeats must be at least 1, got {}", value))
    } else {
        Ok(value)
    }
}

/// Validator for the train_fraction parameter
fn validate_train_fraction(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value <= 0.0 || value >= 1.0 {
        Err(format!(
            "train_fraction must be strictly between 0 and 1, got {}",
            value
        ))
    } else {
        Ok(value)
    }
}
