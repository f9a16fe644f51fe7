//! Exploratory feature summaries: histograms and level counts
//!
//! Side-effect stage only. Nothing downstream reads these summaries; they
//! feed the terminal tables and the `eda.json` artifact.

use anyhow::Result;
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

/// Bin count used for numeric feature histograms
pub const DEFAULT_HISTOGRAM_BINS: usize = 10;

/// One equal-width histogram bin over `[lower, upper)` (last bin inclusive)
#[derive(Debug, Clone, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Distribution summary for a numeric feature
#[derive(Debug, Clone, Serialize)]
pub struct NumericSummary {
    pub name: String,
    pub observed: usize,
    pub missing: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub bins: Vec<HistogramBin>,
}

/// Count of one categorical level, with the survivor share for that level
#[derive(Debug, Clone, Serialize)]
pub struct LevelCount {
    pub level: String,
    pub count: usize,
    pub survivors: usize,
}

impl LevelCount {
    pub fn survival_rate(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.survivors as f64 / self.count as f64
        }
    }
}

/// Distribution summary for a categorical feature
#[derive(Debug, Clone, Serialize)]
pub struct CategoricalSummary {
    pub name: String,
    pub observed: usize,
    pub missing: usize,
    pub levels: Vec<LevelCount>,
}

/// Per-feature distribution summaries for the whole dataset
#[derive(Debug, Clone, Serialize)]
pub struct ExplorationSummary {
    pub numeric: Vec<NumericSummary>,
    pub categorical: Vec<CategoricalSummary>,
}

/// Summarize every predictor column: histograms for numeric columns, level
/// counts (with survivor shares) for categorical columns.
pub fn explore_features(df: &DataFrame, labels: &[i32]) -> Result<ExplorationSummary> {
    if labels.len() != df.height() {
        anyhow::bail!(
            "Label vector length {} does not match dataset rows {}",
            labels.len(),
            df.height()
        );
    }

    let mut numeric = Vec::new();
    let mut categorical = Vec::new();

    for column in df.get_columns() {
        let name = column.name().to_string();
        match column.dtype() {
            DataType::Float64 => {
                let values = column.f64()?;
                let observed: Vec<f64> = values.into_iter().flatten().collect();
                let missing = values.null_count();
                numeric.push(summarize_numeric(&name, &observed, missing));
            }
            DataType::String => {
                let values = column.str()?;
                let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
                let mut missing = 0usize;
                for (value, &label) in values.into_iter().zip(labels.iter()) {
                    match value {
                        Some(level) => {
                            let entry = counts.entry(level.to_string()).or_insert((0, 0));
                            entry.0 += 1;
                            if label == 1 {
                                entry.1 += 1;
                            }
                        }
                        None => missing += 1,
                    }
                }
                categorical.push(summarize_categorical(&name, counts, missing));
            }
            other => anyhow::bail!(
                "Column '{}' has unsupported dtype {:?} after cleaning",
                name,
                other
            ),
        }
    }

    Ok(ExplorationSummary {
        numeric,
        categorical,
    })
}

fn summarize_numeric(name: &str, observed: &[f64], missing: usize) -> NumericSummary {
    let (min, max, mean) = if observed.is_empty() {
        (f64::NAN, f64::NAN, f64::NAN)
    } else {
        let min = observed.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = observed.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let mean = observed.iter().sum::<f64>() / observed.len() as f64;
        (min, max, mean)
    };

    NumericSummary {
        name: name.to_string(),
        observed: observed.len(),
        missing,
        min,
        max,
        mean,
        bins: build_histogram(observed, DEFAULT_HISTOGRAM_BINS),
    }
}

fn summarize_categorical(
    name: &str,
    counts: HashMap<String, (usize, usize)>,
    missing: usize,
) -> CategoricalSummary {
    let observed: usize = counts.values().map(|(count, _)| count).sum();

    let mut levels: Vec<LevelCount> = counts
        .into_iter()
        .map(|(level, (count, survivors))| LevelCount {
            level,
            count,
            survivors,
        })
        .collect();
    // Largest levels first, alphabetical within equal counts
    levels.sort_by(|a, b| b.count.cmp(&a.count).then(a.level.cmp(&b.level)));

    CategoricalSummary {
        name: name.to_string(),
        observed,
        missing,
        levels,
    }
}

/// Build an equal-width histogram over the observed values
pub fn build_histogram(values: &[f64], n_bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || n_bins == 0 {
        return Vec::new();
    }

    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    if (max - min).abs() < f64::EPSILON {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: values.len(),
        }];
    }

    let width = (max - min) / n_bins as f64;
    let mut counts = vec![0usize; n_bins];
    for &v in values {
        let mut idx = ((v - min) / width) as usize;
        // Maximum lands in the last bin
        if idx >= n_bins {
            idx = n_bins - 1;
        }
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + i as f64 * width,
            upper: min + (i + 1) as f64 * width,
            count,
        })
        .collect()
}
