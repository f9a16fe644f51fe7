//! Preprocessing recipes: variance filters, imputation, categorical
//! encoding, and linear-combination removal
//!
//! A recipe is fit on one set of rows and produces a `FittedRecipe` whose
//! parameters (kept columns, fill values, donor rows, level maps, dropped
//! indicator columns) come from those rows alone. Applying the fitted
//! recipe to any other rows reuses the parameters unchanged.

use anyhow::{Context, Result};
use faer::Mat;
use ndarray::Array2;
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

use crate::pipeline::impute::{fit_imputer, is_missing, FittedImputer, ImputeStrategy};

/// Frequency-ratio bound of the near-zero-variance rule
pub const NZV_FREQ_RATIO: f64 = 19.0;

/// Percent-unique bound of the near-zero-variance rule
pub const NZV_UNIQUE_PCT: f64 = 10.0;

/// Explicit level assigned to missing categorical values
pub const UNKNOWN_LEVEL: &str = "unknown";

/// Indicator expansion style for categorical columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingStyle {
    /// Partial dummy coding: the first level becomes the baseline
    Dummy,
    /// Full one-hot coding: one indicator per level
    OneHot,
}

impl EncodingStyle {
    pub fn label(&self) -> &'static str {
        match self {
            EncodingStyle::Dummy => "dummy",
            EncodingStyle::OneHot => "onehot",
        }
    }
}

/// Declaration of one preprocessing recipe
#[derive(Debug, Clone, Serialize)]
pub struct RecipeSpec {
    pub name: String,
    pub impute: ImputeStrategy,
    pub encoding: EncodingStyle,
    /// Categorical columns whose missing values become the "unknown" level
    pub unknown_fill: Vec<String>,
}

impl RecipeSpec {
    pub fn new(
        name: &str,
        impute: ImputeStrategy,
        encoding: EncodingStyle,
        unknown_fill: &[&str],
    ) -> Self {
        Self {
            name: name.to_string(),
            impute,
            encoding,
            unknown_fill: unknown_fill.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Fit every step of this recipe on the given rows
    pub fn fit(&self, df: &DataFrame, rows: &[usize]) -> Result<FittedRecipe> {
        if rows.is_empty() {
            anyhow::bail!("Cannot fit recipe '{}' on an empty partition", self.name);
        }

        let (all_numeric, all_categorical) = feature_columns(df)?;

        // Variance filters run on raw values, before any fill or encoding
        let mut numeric_columns = Vec::new();
        let mut categorical_columns = Vec::new();
        let mut dropped_variance = Vec::new();

        for name in &all_numeric {
            let values = numeric_rows(df, name, rows)?;
            match variance_filter(&numeric_frequencies(&values)) {
                Some(reason) => dropped_variance.push((name.clone(), reason)),
                None => numeric_columns.push(name.clone()),
            }
        }
        for name in &all_categorical {
            let values = categorical_rows(df, name, rows)?;
            match variance_filter(&categorical_frequencies(&values)) {
                Some(reason) => dropped_variance.push((name.clone(), reason)),
                None => categorical_columns.push(name.clone()),
            }
        }

        // Imputation parameters come from the fitting rows only
        let numeric_matrix = numeric_feature_matrix(df, &numeric_columns, rows)?;
        let imputer = fit_imputer(self.impute, &numeric_matrix)
            .with_context(|| format!("Failed to fit '{}' imputation", self.impute.label()))?;

        // Learn the level set of each kept categorical column
        let mut levels: HashMap<String, Vec<String>> = HashMap::new();
        for name in &categorical_columns {
            let fill_unknown = self.unknown_fill.contains(name);
            let values = categorical_rows(df, name, rows)?;
            let mut observed: Vec<String> = Vec::new();
            for value in values {
                let level = match value {
                    Some(v) => v,
                    None if fill_unknown => UNKNOWN_LEVEL.to_string(),
                    None => continue,
                };
                if !observed.contains(&level) {
                    observed.push(level);
                }
            }
            if fill_unknown && !observed.iter().any(|l| l == UNKNOWN_LEVEL) {
                observed.push(UNKNOWN_LEVEL.to_string());
            }
            observed.sort();
            levels.insert(name.clone(), observed);
        }

        let encoded_names = encoded_column_names(
            &numeric_columns,
            &categorical_columns,
            &levels,
            self.encoding,
        );
        if encoded_names.is_empty() {
            anyhow::bail!(
                "Recipe '{}' removed every feature column during fitting",
                self.name
            );
        }

        let mut fitted = FittedRecipe {
            spec: self.clone(),
            numeric_columns,
            categorical_columns,
            dropped_variance,
            imputer,
            levels,
            encoded_names,
            dropped_lincomb: Vec::new(),
            feature_names: Vec::new(),
        };

        // Linear-combination removal is rank-revealing on the fit matrix
        let full = fitted.encoded_matrix(df, rows)?;
        let dependent = find_linear_combinations(&full);
        fitted.dropped_lincomb = dependent
            .iter()
            .map(|&j| fitted.encoded_names[j].clone())
            .collect();
        fitted.feature_names = fitted
            .encoded_names
            .iter()
            .enumerate()
            .filter(|(j, _)| !dependent.contains(j))
            .map(|(_, name)| name.clone())
            .collect();

        if fitted.feature_names.is_empty() {
            anyhow::bail!(
                "Recipe '{}' removed every encoded column as a linear combination",
                self.name
            );
        }

        Ok(fitted)
    }
}

/// A recipe with all step parameters resolved against its fitting rows
#[derive(Debug, Clone)]
pub struct FittedRecipe {
    spec: RecipeSpec,
    numeric_columns: Vec<String>,
    categorical_columns: Vec<String>,
    dropped_variance: Vec<(String, VarianceDrop)>,
    imputer: FittedImputer,
    levels: HashMap<String, Vec<String>>,
    encoded_names: Vec<String>,
    dropped_lincomb: Vec<String>,
    feature_names: Vec<String>,
}

/// Why a column fell to the variance filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceDrop {
    ZeroVariance,
    NearZeroVariance,
}

impl FittedRecipe {
    pub fn spec(&self) -> &RecipeSpec {
        &self.spec
    }

    /// Final output columns, in matrix order
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn dropped_variance(&self) -> &[(String, VarianceDrop)] {
        &self.dropped_variance
    }

    pub fn dropped_lincomb(&self) -> &[String] {
        &self.dropped_lincomb
    }

    /// Apply the fitted steps to the given rows and emit the feature matrix
    pub fn transform(&self, df: &DataFrame, rows: &[usize]) -> Result<Array2<f64>> {
        if rows.is_empty() {
            anyhow::bail!(
                "Cannot apply recipe '{}' to an empty partition",
                self.spec.name
            );
        }

        let full = self.encoded_matrix(df, rows)?;
        if self.dropped_lincomb.is_empty() {
            return Ok(full);
        }

        // Strip the linear-combination columns found at fit time
        let kept: Vec<usize> = self
            .encoded_names
            .iter()
            .enumerate()
            .filter(|(_, name)| !self.dropped_lincomb.contains(name))
            .map(|(j, _)| j)
            .collect();

        let mut result = Array2::zeros((rows.len(), kept.len()));
        for (out_j, &in_j) in kept.iter().enumerate() {
            for i in 0..rows.len() {
                result[[i, out_j]] = full[[i, in_j]];
            }
        }
        Ok(result)
    }

    /// Imputed numerics plus indicator columns, before lincomb removal
    fn encoded_matrix(&self, df: &DataFrame, rows: &[usize]) -> Result<Array2<f64>> {
        let numeric = numeric_feature_matrix(df, &self.numeric_columns, rows)?;
        let imputed = self
            .imputer
            .transform(&numeric)
            .with_context(|| format!("Recipe '{}' imputation failed", self.spec.name))?;

        let n = rows.len();
        let mut matrix = Array2::zeros((n, self.encoded_names.len()));

        for (j, _) in self.numeric_columns.iter().enumerate() {
            for i in 0..n {
                matrix[[i, j]] = imputed[[i, j]];
            }
        }

        let mut offset = self.numeric_columns.len();
        for name in &self.categorical_columns {
            let fitted_levels = self
                .levels
                .get(name)
                .ok_or_else(|| anyhow::anyhow!("No fitted levels for column '{}'", name))?;
            let encoded = encoded_levels(fitted_levels, self.spec.encoding);
            let index_of: HashMap<&str, usize> = encoded
                .iter()
                .enumerate()
                .map(|(i, level)| (level.as_str(), i))
                .collect();
            let fill_unknown = self.spec.unknown_fill.contains(name);

            let values = categorical_rows(df, name, rows)?;
            for (i, value) in values.into_iter().enumerate() {
                let level = match value {
                    Some(v) => v,
                    None if fill_unknown => UNKNOWN_LEVEL.to_string(),
                    // Unfilled missing encodes as all zeros, like an unseen level
                    None => continue,
                };
                if let Some(&idx) = index_of.get(level.as_str()) {
                    matrix[[i, offset + idx]] = 1.0;
                }
            }
            offset += encoded.len();
        }

        Ok(matrix)
    }
}

/// Split the frame's columns into numeric and categorical predictor lists
fn feature_columns(df: &DataFrame) -> Result<(Vec<String>, Vec<String>)> {
    let mut numeric = Vec::new();
    let mut categorical = Vec::new();
    for column in df.get_columns() {
        let name = column.name().to_string();
        match column.dtype() {
            DataType::Float64 => numeric.push(name),
            DataType::String => categorical.push(name),
            other => anyhow::bail!(
                "Column '{}' has unsupported dtype {:?} for recipe fitting",
                name,
                other
            ),
        }
    }
    Ok((numeric, categorical))
}

fn numeric_rows(df: &DataFrame, name: &str, rows: &[usize]) -> Result<Vec<f64>> {
    let ca = df.column(name)?.f64()?;
    let mut values = Vec::with_capacity(rows.len());
    for &row in rows {
        values.push(ca.get(row).unwrap_or(f64::NAN));
    }
    Ok(values)
}

fn categorical_rows(df: &DataFrame, name: &str, rows: &[usize]) -> Result<Vec<Option<String>>> {
    let ca = df.column(name)?.str()?;
    let mut values = Vec::with_capacity(rows.len());
    for &row in rows {
        values.push(ca.get(row).map(|s| s.to_string()));
    }
    Ok(values)
}

fn numeric_feature_matrix(df: &DataFrame, columns: &[String], rows: &[usize]) -> Result<Array2<f64>> {
    let mut matrix = Array2::zeros((rows.len(), columns.len()));
    for (j, name) in columns.iter().enumerate() {
        let values = numeric_rows(df, name, rows)?;
        for (i, v) in values.into_iter().enumerate() {
            matrix[[i, j]] = v;
        }
    }
    Ok(matrix)
}

/// Observed-value frequencies of a numeric column (missing excluded)
fn numeric_frequencies(values: &[f64]) -> Vec<usize> {
    let mut counts: HashMap<u64, usize> = HashMap::new();
    for &v in values {
        if is_missing(v) {
            continue;
        }
        *counts.entry(v.to_bits()).or_insert(0) += 1;
    }
    counts.into_values().collect()
}

/// Observed-value frequencies of a categorical column (missing excluded)
fn categorical_frequencies(values: &[Option<String>]) -> Vec<usize> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values.iter().flatten() {
        *counts.entry(value.as_str()).or_insert(0) += 1;
    }
    counts.into_values().collect()
}

/// The conventional nzv rule: flag a column whose two most common values
/// are wildly imbalanced while distinct values stay rare overall
fn variance_filter(frequencies: &[usize]) -> Option<VarianceDrop> {
    let observed: usize = frequencies.iter().sum();
    let distinct = frequencies.len();

    if distinct <= 1 {
        return Some(VarianceDrop::ZeroVariance);
    }

    let mut sorted = frequencies.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    let freq_ratio = sorted[0] as f64 / sorted[1] as f64;
    let unique_pct = 100.0 * distinct as f64 / observed as f64;

    if freq_ratio >= NZV_FREQ_RATIO && unique_pct <= NZV_UNIQUE_PCT {
        return Some(VarianceDrop::NearZeroVariance);
    }
    None
}

/// Level subset that actually gets an indicator column
fn encoded_levels(levels: &[String], encoding: EncodingStyle) -> Vec<String> {
    match encoding {
        EncodingStyle::Dummy => levels.iter().skip(1).cloned().collect(),
        EncodingStyle::OneHot => levels.to_vec(),
    }
}

fn encoded_column_names(
    numeric_columns: &[String],
    categorical_columns: &[String],
    levels: &HashMap<String, Vec<String>>,
    encoding: EncodingStyle,
) -> Vec<String> {
    let mut names: Vec<String> = numeric_columns.to_vec();
    for column in categorical_columns {
        if let Some(fitted) = levels.get(column) {
            for level in encoded_levels(fitted, encoding) {
                names.push(format!("{}_{}", column, level));
            }
        }
    }
    names
}

/// Indices of columns that are exact linear combinations of earlier columns
///
/// Columns are scaled to unit max-abs, the Gram matrix is built, and a
/// Gaussian elimination with fixed column order reveals the pivotless
/// (dependent) columns. All-zero columns count as dependent.
fn find_linear_combinations(x: &Array2<f64>) -> Vec<usize> {
    let n = x.nrows();
    let p = x.ncols();
    if p == 0 || n == 0 {
        return Vec::new();
    }

    let mut scaled = Mat::<f64>::zeros(n, p);
    for j in 0..p {
        let mut max_abs = 0.0f64;
        for i in 0..n {
            max_abs = max_abs.max(x[[i, j]].abs());
        }
        if max_abs > 0.0 {
            for i in 0..n {
                scaled[(i, j)] = x[[i, j]] / max_abs;
            }
        }
    }

    let mut gram = scaled.transpose() * &scaled;
    let tolerance = 1e-8 * n as f64;

    let mut used_row = vec![false; p];
    let mut dependent = Vec::new();

    for j in 0..p {
        // Best remaining pivot for this column
        let mut pivot_row = None;
        let mut pivot_value = 0.0f64;
        for r in 0..p {
            if used_row[r] {
                continue;
            }
            let candidate = gram[(r, j)];
            if candidate.abs() > pivot_value.abs() {
                pivot_row = Some(r);
                pivot_value = candidate;
            }
        }

        let pivot_row = match pivot_row {
            Some(r) if pivot_value.abs() > tolerance => r,
            _ => {
                dependent.push(j);
                continue;
            }
        };
        used_row[pivot_row] = true;

        for r in 0..p {
            if used_row[r] || r == pivot_row {
                continue;
            }
            let factor = gram[(r, j)] / pivot_value;
            if factor == 0.0 {
                continue;
            }
            for c in 0..p {
                let update = factor * gram[(pivot_row, c)];
                gram[(r, c)] -= update;
            }
        }
    }

    dependent
}
