//! Classification metrics: accuracy, ROC-AUC, confusion counts, and the
//! derived rate metrics used in the final report

use anyhow::Result;
use serde::Serialize;
use std::cmp::Ordering;

/// Probability threshold of the positive-class decision rule
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Scores within this distance count as tied when ranking
const TIE_TOLERANCE: f64 = 1e-10;

/// Counts of the four confusion-matrix cells
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ConfusionCounts {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

impl ConfusionCounts {
    /// Tally predictions at the 0.5 threshold against 0/1 labels
    pub fn from_scores(scores: &[f64], labels: &[i32]) -> Result<Self> {
        if scores.len() != labels.len() {
            anyhow::bail!(
                "Score count {} does not match label count {}",
                scores.len(),
                labels.len()
            );
        }
        if scores.is_empty() {
            anyhow::bail!("Cannot build a confusion matrix from zero predictions");
        }

        let mut counts = Self {
            true_positives: 0,
            false_positives: 0,
            true_negatives: 0,
            false_negatives: 0,
        };
        for (&score, &label) in scores.iter().zip(labels.iter()) {
            let predicted_positive = score > DECISION_THRESHOLD;
            match (predicted_positive, label) {
                (true, 1) => counts.true_positives += 1,
                (true, _) => counts.false_positives += 1,
                (false, 1) => counts.false_negatives += 1,
                (false, _) => counts.true_negatives += 1,
            }
        }
        Ok(counts)
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positives + self.true_negatives, self.total())
    }

    /// Fraction of actual positives that were predicted positive
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Fraction of positive predictions that were correct
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// Fraction of actual negatives that were predicted negative
    pub fn specificity(&self) -> f64 {
        ratio(self.true_negatives, self.true_negatives + self.false_positives)
    }

    /// Fraction of negative predictions that were correct
    pub fn npv(&self) -> f64 {
        ratio(self.true_negatives, self.true_negatives + self.false_negatives)
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}

/// The rate metrics reported for the final test evaluation
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ClassMetrics {
    pub accuracy: f64,
    pub recall: f64,
    pub precision: f64,
    pub specificity: f64,
    pub npv: f64,
}

impl ClassMetrics {
    pub fn from_confusion(confusion: &ConfusionCounts) -> Self {
        Self {
            accuracy: confusion.accuracy(),
            recall: confusion.recall(),
            precision: confusion.precision(),
            specificity: confusion.specificity(),
            npv: confusion.npv(),
        }
    }
}

/// Area under the ROC curve via the rank-based Mann-Whitney statistic
///
/// Tied scores receive their average rank. Errors when only one class is
/// present, since the statistic is undefined there.
pub fn roc_auc(scores: &[f64], labels: &[i32]) -> Result<f64> {
    if scores.len() != labels.len() {
        anyhow::bail!(
            "Score count {} does not match label count {}",
            scores.len(),
            labels.len()
        );
    }

    let total_pos = labels.iter().filter(|&&l| l == 1).count() as f64;
    let total_neg = labels.len() as f64 - total_pos;
    if total_pos == 0.0 || total_neg == 0.0 {
        anyhow::bail!("ROC AUC is undefined when predictions cover a single class");
    }

    let mut pairs: Vec<(f64, i32)> = scores.iter().copied().zip(labels.iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    let n = pairs.len();
    let mut rank_sum_pos = 0.0;
    let mut cumulative = 0.0;
    let mut i = 0;

    while i < n {
        let current = pairs[i].0;
        let mut j = i;
        while j < n && (pairs[j].0 - current).abs() < TIE_TOLERANCE {
            j += 1;
        }

        let group_size = (j - i) as f64;
        let avg_rank = cumulative + group_size / 2.0;
        for pair in &pairs[i..j] {
            if pair.1 == 1 {
                rank_sum_pos += avg_rank;
            }
        }

        cumulative += group_size;
        i = j;
    }

    let u = rank_sum_pos - total_pos * total_pos / 2.0;
    Ok((u / (total_pos * total_neg)).clamp(0.0, 1.0))
}

/// One operating point of the ROC curve
#[derive(Debug, Clone, Copy)]
pub struct RocPoint {
    pub threshold: f64,
    pub tpr: f64,
    pub fpr: f64,
}

/// The full ROC curve, anchored at (0, 0) and ending at (1, 1)
#[derive(Debug, Clone)]
pub struct RocCurve {
    pub points: Vec<RocPoint>,
}

/// Sweep the decision threshold across every distinct score, highest first
pub fn roc_curve(scores: &[f64], labels: &[i32]) -> Result<RocCurve> {
    if scores.len() != labels.len() {
        anyhow::bail!(
            "Score count {} does not match label count {}",
            scores.len(),
            labels.len()
        );
    }

    let total_pos = labels.iter().filter(|&&l| l == 1).count();
    let total_neg = labels.len() - total_pos;
    if total_pos == 0 || total_neg == 0 {
        anyhow::bail!("ROC curve is undefined when predictions cover a single class");
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(Ordering::Equal)
    });

    let mut points = vec![RocPoint {
        threshold: f64::INFINITY,
        tpr: 0.0,
        fpr: 0.0,
    }];
    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut i = 0;

    while i < order.len() {
        let threshold = scores[order[i]];
        while i < order.len() && (scores[order[i]] - threshold).abs() < TIE_TOLERANCE {
            if labels[order[i]] == 1 {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        points.push(RocPoint {
            threshold,
            tpr: tp as f64 / total_pos as f64,
            fpr: fp as f64 / total_neg as f64,
        });
    }

    Ok(RocCurve { points })
}

/// Mean and standard error of a metric across folds
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricAggregate {
    pub mean: f64,
    pub std_error: f64,
}

/// Aggregate per-fold values as mean and standard error of the mean
pub fn aggregate_metric(values: &[f64]) -> MetricAggregate {
    let n = values.len();
    if n == 0 {
        return MetricAggregate {
            mean: 0.0,
            std_error: 0.0,
        };
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    if n == 1 {
        return MetricAggregate {
            mean,
            std_error: 0.0,
        };
    }

    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);
    MetricAggregate {
        mean,
        std_error: variance.sqrt() / (n as f64).sqrt(),
    }
}
