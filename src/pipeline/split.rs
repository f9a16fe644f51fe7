//! Stratified train/test splitting and repeated stratified k-fold assignment
//!
//! All randomness is driven by a caller-supplied seed so a run is fully
//! reproducible. Row indices refer to positions in the cleaned dataset.

use anyhow::Result;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// Row indices of the initial train/test partition
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// One cross-validation fold: analysis rows and held-out assessment rows
#[derive(Debug, Clone)]
pub struct FoldAssignment {
    pub repeat_idx: usize,
    pub fold_idx: usize,
    pub train_indices: Vec<usize>,
    pub validation_indices: Vec<usize>,
}

/// Partition all rows into train/test, preserving the label proportion in
/// both sides. Rows are grouped per class, shuffled, and split at the
/// rounded per-class boundary.
pub fn stratified_split(labels: &[i32], train_fraction: f64, seed: u64) -> Result<TrainTestSplit> {
    if labels.is_empty() {
        anyhow::bail!("Cannot split an empty dataset");
    }
    if !(train_fraction > 0.0 && train_fraction < 1.0) {
        anyhow::bail!(
            "Train fraction must be in the open interval (0, 1), got {}",
            train_fraction
        );
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let groups = group_by_class(labels, &(0..labels.len()).collect::<Vec<_>>());

    let mut train = Vec::new();
    let mut test = Vec::new();
    for (_, mut indices) in groups {
        indices.shuffle(&mut rng);
        let n = indices.len();
        let wanted = (n as f64 * train_fraction).round() as usize;
        // Keep at least one row on each side when the class allows it
        let take = if n >= 2 {
            wanted.clamp(1, n - 1)
        } else {
            wanted.min(n)
        };
        train.extend_from_slice(&indices[..take]);
        test.extend_from_slice(&indices[take..]);
    }

    if train.is_empty() || test.is_empty() {
        anyhow::bail!(
            "Split produced an empty partition ({} train / {} test rows)",
            train.len(),
            test.len()
        );
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok(TrainTestSplit { train, test })
}

/// Assign the given rows to `n_folds` stratified folds, repeated
/// `n_repeats` times with a fresh shuffle per repeat.
///
/// Within one repeat the assessment sets are disjoint and exhaustive over
/// `rows`. Folds are stratified by distributing each class round-robin.
pub fn repeated_stratified_kfold(
    rows: &[usize],
    labels: &[i32],
    n_folds: usize,
    n_repeats: usize,
    seed: u64,
) -> Result<Vec<FoldAssignment>> {
    if n_folds < 2 {
        anyhow::bail!("Cross-validation requires at least 2 folds, got {}", n_folds);
    }
    if n_repeats == 0 {
        anyhow::bail!("Cross-validation requires at least 1 repeat");
    }
    if rows.len() < n_folds {
        anyhow::bail!(
            "Cannot build {} folds from {} rows",
            n_folds,
            rows.len()
        );
    }
    if let Some(&max_row) = rows.iter().max() {
        if max_row >= labels.len() {
            anyhow::bail!(
                "Row index {} is out of bounds for {} labels",
                max_row,
                labels.len()
            );
        }
    }

    let mut assignments = Vec::with_capacity(n_folds * n_repeats);

    for repeat_idx in 0..n_repeats {
        // Separate stream per repeat, offset from the split seed
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1 + repeat_idx as u64));

        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); n_folds];
        for (_, mut indices) in group_by_class(labels, rows) {
            indices.shuffle(&mut rng);
            for (i, idx) in indices.into_iter().enumerate() {
                folds[i % n_folds].push(idx);
            }
        }

        for fold_idx in 0..n_folds {
            let mut validation_indices = folds[fold_idx].clone();
            let mut train_indices: Vec<usize> = folds
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != fold_idx)
                .flat_map(|(_, f)| f.iter().copied())
                .collect();
            validation_indices.sort_unstable();
            train_indices.sort_unstable();

            assignments.push(FoldAssignment {
                repeat_idx,
                fold_idx,
                train_indices,
                validation_indices,
            });
        }
    }

    Ok(assignments)
}

/// Group row indices by their class label, classes in ascending order
fn group_by_class(labels: &[i32], rows: &[usize]) -> BTreeMap<i32, Vec<usize>> {
    let mut groups: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
    for &row in rows {
        groups.entry(labels[row]).or_default().push(row);
    }
    groups
}

/// Fraction of the given rows carrying a positive label
pub fn positive_rate(labels: &[i32], rows: &[usize]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let positives = rows.iter().filter(|&&r| labels[r] == 1).count();
    positives as f64 / rows.len() as f64
}
