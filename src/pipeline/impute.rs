//! Numeric missing-value imputation: column statistics and nearest-neighbor
//! donors
//!
//! Imputers are fit on one partition and applied to any partition, so every
//! fill value and donor row comes from the fitting side only. Missing cells
//! are encoded as NaN.

use anyhow::Result;
use ndarray::{Array2, Axis};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Neighbor count used by the distance-weighted imputer
pub const DEFAULT_IMPUTE_NEIGHBORS: usize = 5;

/// Missing-value strategy selected per recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImputeStrategy {
    Mean,
    Median,
    Knn,
}

impl ImputeStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            ImputeStrategy::Mean => "mean",
            ImputeStrategy::Median => "median",
            ImputeStrategy::Knn => "knn",
        }
    }
}

/// Check if value is missing (NaN)
#[inline]
pub fn is_missing(v: f64) -> bool {
    v.is_nan()
}

/// Trait for imputers
pub trait Imputer: Send + Sync {
    /// Fit the imputer on data with missing values
    fn fit(&mut self, x: &Array2<f64>) -> Result<()>;

    /// Transform data by imputing missing values
    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>>;

    /// Fit and transform in one step
    fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }
}

/// Column-statistic imputer (mean or median per column)
#[derive(Debug, Clone)]
pub struct SimpleImputer {
    strategy: ImputeStrategy,
    fill_values: Option<Vec<f64>>,
}

impl SimpleImputer {
    pub fn mean() -> Self {
        Self {
            strategy: ImputeStrategy::Mean,
            fill_values: None,
        }
    }

    pub fn median() -> Self {
        Self {
            strategy: ImputeStrategy::Median,
            fill_values: None,
        }
    }

    /// Fitted fill value per column
    pub fn fill_values(&self) -> Option<&[f64]> {
        self.fill_values.as_deref()
    }
}

impl Imputer for SimpleImputer {
    fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        let mut fill_values = Vec::with_capacity(x.ncols());
        for (j, column) in x.columns().into_iter().enumerate() {
            let observed: Vec<f64> = column.iter().copied().filter(|v| !is_missing(*v)).collect();
            if observed.is_empty() {
                anyhow::bail!(
                    "Column {} has no observed values to impute from",
                    j
                );
            }
            let fill = match self.strategy {
                ImputeStrategy::Mean => observed.iter().sum::<f64>() / observed.len() as f64,
                ImputeStrategy::Median => median(observed),
                ImputeStrategy::Knn => {
                    anyhow::bail!("SimpleImputer cannot carry the knn strategy")
                }
            };
            fill_values.push(fill);
        }
        self.fill_values = Some(fill_values);
        Ok(())
    }

    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let fill_values = self
            .fill_values
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Imputer not fitted"))?;
        if fill_values.len() != x.ncols() {
            anyhow::bail!(
                "Imputer was fitted on {} columns but received {}",
                fill_values.len(),
                x.ncols()
            );
        }

        let mut result = x.clone();
        for ((_, j), value) in result.indexed_iter_mut() {
            if is_missing(*value) {
                *value = fill_values[j];
            }
        }
        Ok(result)
    }
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

/// Ordered float for the neighbor priority queue
#[derive(Debug, Clone, Copy)]
struct DistanceIdx(f64, usize);

impl PartialEq for DistanceIdx {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for DistanceIdx {}

impl PartialOrd for DistanceIdx {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DistanceIdx {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max heap by distance, so the worst neighbor is popped first
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
    }
}

/// Distance-weighted nearest-neighbor imputer
///
/// Donors are the complete rows of the fitting partition. Distances are
/// Euclidean over range-scaled coordinates; query coordinates that are
/// themselves missing are skipped and the distance renormalized by the
/// number of coordinates actually compared.
#[derive(Debug, Clone)]
pub struct KnnImputer {
    n_neighbors: usize,
    donors: Option<Array2<f64>>,
    col_range: Vec<f64>,
    fallback_means: Vec<f64>,
}

impl KnnImputer {
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors: n_neighbors.max(1),
            donors: None,
            col_range: Vec::new(),
            fallback_means: Vec::new(),
        }
    }

    pub fn n_donors(&self) -> usize {
        self.donors.as_ref().map(|d| d.nrows()).unwrap_or(0)
    }

    /// Range-scaled Euclidean distance, skipping missing query coordinates
    fn distance(&self, query: &[f64], donor: &[f64]) -> f64 {
        let mut count = 0usize;
        let mut accum = 0.0f64;

        for j in 0..query.len() {
            if is_missing(query[j]) {
                continue;
            }
            let range = self.col_range[j];
            if range <= 0.0 {
                continue;
            }
            let d = (query[j] - donor[j]) / range;
            accum += d * d;
            count += 1;
        }

        if count == 0 {
            return f64::INFINITY;
        }
        (accum / count as f64).sqrt()
    }

    fn find_neighbors(&self, query: &[f64]) -> Vec<(usize, f64)> {
        let donors = match self.donors.as_ref() {
            Some(d) => d,
            None => return Vec::new(),
        };
        let k = self.n_neighbors;
        let mut heap: BinaryHeap<DistanceIdx> = BinaryHeap::with_capacity(k + 1);

        for (i, row) in donors.rows().into_iter().enumerate() {
            let dist = match row.as_slice() {
                Some(slice) => self.distance(query, slice),
                None => {
                    let row_vec: Vec<f64> = row.iter().copied().collect();
                    self.distance(query, &row_vec)
                }
            };

            if dist.is_finite() {
                if heap.len() < k {
                    heap.push(DistanceIdx(dist, i));
                } else if let Some(&DistanceIdx(max_dist, _)) = heap.peek() {
                    if dist < max_dist {
                        heap.pop();
                        heap.push(DistanceIdx(dist, i));
                    }
                }
            }
        }

        heap.into_iter().map(|DistanceIdx(d, i)| (i, d)).collect()
    }

    /// Inverse-distance weighted average of the neighbors' values
    fn impute_value(&self, neighbors: &[(usize, f64)], feature_idx: usize) -> f64 {
        if neighbors.is_empty() {
            return self.fallback_means[feature_idx];
        }
        let donors = match self.donors.as_ref() {
            Some(d) => d,
            None => return self.fallback_means[feature_idx],
        };

        let mut weighted_sum = 0.0;
        let mut weight_sum = 0.0;
        for &(idx, dist) in neighbors {
            let weight = if dist < 1e-10 { 1e10 } else { 1.0 / dist };
            weighted_sum += donors[[idx, feature_idx]] * weight;
            weight_sum += weight;
        }

        if weight_sum > 0.0 {
            weighted_sum / weight_sum
        } else {
            self.fallback_means[feature_idx]
        }
    }
}

impl Imputer for KnnImputer {
    fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        let complete_rows: Vec<usize> = x
            .rows()
            .into_iter()
            .enumerate()
            .filter(|(_, row)| !row.iter().any(|&v| is_missing(v)))
            .map(|(i, _)| i)
            .collect();

        if complete_rows.is_empty() {
            anyhow::bail!("No complete rows available as imputation donors");
        }

        let n_features = x.ncols();
        let mut donors = Array2::zeros((complete_rows.len(), n_features));
        for (i, &row_idx) in complete_rows.iter().enumerate() {
            for j in 0..n_features {
                donors[[i, j]] = x[[row_idx, j]];
            }
        }

        // Scaling ranges come from observed values of the whole fitting
        // partition, not only the complete rows
        let mut col_min = vec![f64::INFINITY; n_features];
        let mut col_max = vec![f64::NEG_INFINITY; n_features];
        for row in x.rows() {
            for (j, &v) in row.iter().enumerate() {
                if is_missing(v) {
                    continue;
                }
                col_min[j] = col_min[j].min(v);
                col_max[j] = col_max[j].max(v);
            }
        }
        let col_range: Vec<f64> = col_min
            .iter()
            .zip(col_max.iter())
            .map(|(lo, hi)| {
                if hi.is_finite() && lo.is_finite() {
                    hi - lo
                } else {
                    0.0
                }
            })
            .collect();

        let fallback_means = donors
            .mean_axis(Axis(0))
            .ok_or_else(|| anyhow::anyhow!("Failed to compute donor means"))?
            .to_vec();

        self.donors = Some(donors);
        self.col_range = col_range;
        self.fallback_means = fallback_means;
        Ok(())
    }

    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let donors = self
            .donors
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Imputer not fitted"))?;
        if donors.ncols() != x.ncols() {
            anyhow::bail!(
                "Imputer was fitted on {} columns but received {}",
                donors.ncols(),
                x.ncols()
            );
        }

        let n_features = x.ncols();
        let mut result = x.clone();
        let mut row_buf: Vec<f64> = Vec::with_capacity(n_features);

        for (row_idx, row) in x.rows().into_iter().enumerate() {
            if !row.iter().any(|&v| is_missing(v)) {
                continue;
            }

            let row_slice = match row.as_slice() {
                Some(s) => s,
                None => {
                    row_buf.clear();
                    row_buf.extend(row.iter().copied());
                    &row_buf
                }
            };

            let neighbors = self.find_neighbors(row_slice);
            for j in 0..n_features {
                if is_missing(row_slice[j]) {
                    result[[row_idx, j]] = self.impute_value(&neighbors, j);
                }
            }
        }

        Ok(result)
    }
}

/// A fitted imputer of either kind, held by a fitted recipe
#[derive(Debug, Clone)]
pub enum FittedImputer {
    Simple(SimpleImputer),
    Knn(KnnImputer),
}

impl FittedImputer {
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        match self {
            FittedImputer::Simple(imputer) => imputer.transform(x),
            FittedImputer::Knn(imputer) => imputer.transform(x),
        }
    }
}

/// Fit the imputer matching the given strategy
pub fn fit_imputer(strategy: ImputeStrategy, x: &Array2<f64>) -> Result<FittedImputer> {
    match strategy {
        ImputeStrategy::Mean => {
            let mut imputer = SimpleImputer::mean();
            imputer.fit(x)?;
            Ok(FittedImputer::Simple(imputer))
        }
        ImputeStrategy::Median => {
            let mut imputer = SimpleImputer::median();
            imputer.fit(x)?;
            Ok(FittedImputer::Simple(imputer))
        }
        ImputeStrategy::Knn => {
            let mut imputer = KnnImputer::new(DEFAULT_IMPUTE_NEIGHBORS);
            imputer.fit(x)?;
            Ok(FittedImputer::Knn(imputer))
        }
    }
}
