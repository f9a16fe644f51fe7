//! Cross-validated evaluation of the workflow grid and final test scoring
//!
//! Every workflow is fit and scored on every fold. Fold fits are
//! independent, so they run in parallel; any single failure aborts the
//! whole evaluation with the offending workflow and fold named.

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use polars::prelude::DataFrame;
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;

use crate::eval::metrics::{
    aggregate_metric, roc_auc, roc_curve, ClassMetrics, ConfusionCounts, MetricAggregate, RocCurve,
};
use crate::eval::workflow::Workflow;
use crate::pipeline::FoldAssignment;

/// Metric scores of one workflow on one fold
#[derive(Debug, Clone, Serialize)]
pub struct FoldScore {
    pub workflow_id: String,
    pub repeat_idx: usize,
    pub fold_idx: usize,
    pub accuracy: f64,
    pub roc_auc: f64,
}

/// Aggregated cross-validation metrics of one workflow
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSummary {
    pub workflow_id: String,
    pub recipe_name: String,
    pub model_name: String,
    pub n_folds: usize,
    pub accuracy: MetricAggregate,
    pub roc_auc: MetricAggregate,
    pub rank: usize,
}

/// Test-partition evaluation of the selected workflow
#[derive(Debug, Clone)]
pub struct TestEvaluation {
    pub workflow_id: String,
    pub confusion: ConfusionCounts,
    pub metrics: ClassMetrics,
    pub roc_auc: f64,
    pub roc_curve: RocCurve,
    pub feature_names: Vec<String>,
}

/// Fit and score every workflow on every fold
///
/// Scores come back ordered by workflow declaration, then fold.
pub fn evaluate_grid(
    df: &DataFrame,
    labels: &[i32],
    folds: &[FoldAssignment],
    grid: &[Workflow],
    progress: Option<&ProgressBar>,
) -> Result<Vec<FoldScore>> {
    if labels.len() != df.height() {
        anyhow::bail!(
            "Label count {} does not match row count {}",
            labels.len(),
            df.height()
        );
    }
    if folds.is_empty() || grid.is_empty() {
        anyhow::bail!("Grid evaluation needs at least one workflow and one fold");
    }

    let tasks: Vec<(usize, usize)> = (0..grid.len())
        .flat_map(|w| (0..folds.len()).map(move |f| (w, f)))
        .collect();

    let results: Vec<Result<FoldScore>> = tasks
        .par_iter()
        .map(|&(w, f)| {
            let result = score_fold(df, labels, &grid[w], &folds[f]).with_context(|| {
                format!(
                    "Workflow '{}' failed on repeat {} fold {}",
                    grid[w].id(),
                    folds[f].repeat_idx + 1,
                    folds[f].fold_idx + 1
                )
            });
            if let Some(bar) = progress {
                bar.inc(1);
            }
            result
        })
        .collect();

    let mut scores = Vec::with_capacity(results.len());
    for result in results {
        scores.push(result?);
    }
    Ok(scores)
}

/// Fit one workflow on a fold's training rows and score its validation rows
fn score_fold(
    df: &DataFrame,
    labels: &[i32],
    workflow: &Workflow,
    fold: &FoldAssignment,
) -> Result<FoldScore> {
    let fitted_recipe = workflow.recipe.fit(df, &fold.train_indices)?;
    let x_train = fitted_recipe.transform(df, &fold.train_indices)?;
    let x_val = fitted_recipe.transform(df, &fold.validation_indices)?;

    let y_train: Vec<i32> = fold.train_indices.iter().map(|&i| labels[i]).collect();
    let y_val: Vec<i32> = fold.validation_indices.iter().map(|&i| labels[i]).collect();

    let model = workflow.model.fit(&x_train, &y_train)?;
    let scores = model.predict_proba(&x_val)?.to_vec();

    let confusion = ConfusionCounts::from_scores(&scores, &y_val)?;
    let auc = roc_auc(&scores, &y_val)?;

    Ok(FoldScore {
        workflow_id: workflow.id(),
        repeat_idx: fold.repeat_idx,
        fold_idx: fold.fold_idx,
        accuracy: confusion.accuracy(),
        roc_auc: auc,
    })
}

/// Aggregate fold scores per workflow, in grid declaration order
pub fn summarize_scores(grid: &[Workflow], scores: &[FoldScore]) -> Vec<WorkflowSummary> {
    grid.iter()
        .map(|workflow| {
            let id = workflow.id();
            let accuracies: Vec<f64> = scores
                .iter()
                .filter(|s| s.workflow_id == id)
                .map(|s| s.accuracy)
                .collect();
            let aucs: Vec<f64> = scores
                .iter()
                .filter(|s| s.workflow_id == id)
                .map(|s| s.roc_auc)
                .collect();
            WorkflowSummary {
                workflow_id: id,
                recipe_name: workflow.recipe.name.clone(),
                model_name: workflow.model.name(),
                n_folds: aucs.len(),
                accuracy: aggregate_metric(&accuracies),
                roc_auc: aggregate_metric(&aucs),
                rank: 0,
            }
        })
        .collect()
}

/// Sort descending by mean AUC and assign ranks
///
/// The sort is stable, so equal means keep their declaration order and
/// the earliest-declared workflow wins ties.
pub fn rank_workflows(mut summaries: Vec<WorkflowSummary>) -> Vec<WorkflowSummary> {
    summaries.sort_by(|a, b| {
        b.roc_auc
            .mean
            .partial_cmp(&a.roc_auc.mean)
            .unwrap_or(Ordering::Equal)
    });
    for (position, summary) in summaries.iter_mut().enumerate() {
        summary.rank = position + 1;
    }
    summaries
}

/// Refit the selected workflow on the whole training split and score the
/// held-out test split
pub fn fit_and_score_final(
    df: &DataFrame,
    labels: &[i32],
    workflow: &Workflow,
    train: &[usize],
    test: &[usize],
) -> Result<TestEvaluation> {
    if labels.len() != df.height() {
        anyhow::bail!(
            "Label count {} does not match row count {}",
            labels.len(),
            df.height()
        );
    }

    let fitted_recipe = workflow
        .recipe
        .fit(df, train)
        .with_context(|| format!("Final recipe fit failed for workflow '{}'", workflow.id()))?;
    let x_train = fitted_recipe.transform(df, train)?;
    let x_test = fitted_recipe.transform(df, test)?;

    let y_train: Vec<i32> = train.iter().map(|&i| labels[i]).collect();
    let y_test: Vec<i32> = test.iter().map(|&i| labels[i]).collect();

    let model = workflow
        .model
        .fit(&x_train, &y_train)
        .with_context(|| format!("Final model fit failed for workflow '{}'", workflow.id()))?;
    let scores = model.predict_proba(&x_test)?.to_vec();

    let confusion = ConfusionCounts::from_scores(&scores, &y_test)?;
    let metrics = ClassMetrics::from_confusion(&confusion);
    let auc = roc_auc(&scores, &y_test)?;
    let curve = roc_curve(&scores, &y_test)?;

    Ok(TestEvaluation {
        workflow_id: workflow.id(),
        confusion,
        metrics,
        roc_auc: auc,
        roc_curve: curve,
        feature_names: fitted_recipe.feature_names().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelSpec;
    use crate::pipeline::{EncodingStyle, ImputeStrategy, RecipeSpec};
    use polars::prelude::*;

    fn summary(id: &str, mean_auc: f64) -> WorkflowSummary {
        WorkflowSummary {
            workflow_id: id.to_string(),
            recipe_name: "r".to_string(),
            model_name: "m".to_string(),
            n_folds: 10,
            accuracy: MetricAggregate {
                mean: 0.8,
                std_error: 0.01,
            },
            roc_auc: MetricAggregate {
                mean: mean_auc,
                std_error: 0.01,
            },
            rank: 0,
        }
    }

    #[test]
    fn test_rank_orders_descending() {
        let ranked = rank_workflows(vec![
            summary("low", 0.70),
            summary("high", 0.90),
            summary("mid", 0.80),
        ]);
        assert_eq!(ranked[0].workflow_id, "high");
        assert_eq!(ranked[1].workflow_id, "mid");
        assert_eq!(ranked[2].workflow_id, "low");
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn test_rank_tie_keeps_declaration_order() {
        let ranked = rank_workflows(vec![
            summary("first", 0.85),
            summary("second", 0.85),
            summary("third", 0.85),
        ]);
        assert_eq!(ranked[0].workflow_id, "first");
        assert_eq!(ranked[1].workflow_id, "second");
        assert_eq!(ranked[2].workflow_id, "third");
    }

    #[test]
    fn test_score_fold_on_separable_data() {
        let ages: Vec<f64> = (0..20)
            .map(|i| if i < 10 { 1.0 + i as f64 } else { 41.0 + i as f64 })
            .collect();
        let fares: Vec<f64> = (0..20).map(|i| 5.0 + (i % 7) as f64).collect();
        let df = df! {
            "Age" => ages,
            "Fare" => fares,
        }
        .unwrap();
        let labels: Vec<i32> = (0..20).map(|i| if i < 10 { 0 } else { 1 }).collect();

        let workflow = Workflow::new(
            RecipeSpec::new("mean_dummy", ImputeStrategy::Mean, EncodingStyle::Dummy, &[]),
            ModelSpec::Logistic,
        );
        let fold = FoldAssignment {
            repeat_idx: 0,
            fold_idx: 0,
            train_indices: vec![0, 1, 2, 3, 4, 10, 11, 12, 13, 14],
            validation_indices: vec![5, 6, 7, 8, 9, 15, 16, 17, 18, 19],
        };

        let score = score_fold(&df, &labels, &workflow, &fold).unwrap();
        assert!((score.roc_auc - 1.0).abs() < 1e-9);
        assert!((score.accuracy - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_summarize_groups_by_workflow() {
        let grid = vec![
            Workflow::new(
                RecipeSpec::new("a", ImputeStrategy::Mean, EncodingStyle::Dummy, &[]),
                ModelSpec::Logistic,
            ),
            Workflow::new(
                RecipeSpec::new("b", ImputeStrategy::Mean, EncodingStyle::OneHot, &[]),
                ModelSpec::Knn { k: 5 },
            ),
        ];
        let scores = vec![
            FoldScore {
                workflow_id: "a_logreg".to_string(),
                repeat_idx: 0,
                fold_idx: 0,
                accuracy: 0.8,
                roc_auc: 0.9,
            },
            FoldScore {
                workflow_id: "a_logreg".to_string(),
                repeat_idx: 0,
                fold_idx: 1,
                accuracy: 0.6,
                roc_auc: 0.7,
            },
            FoldScore {
                workflow_id: "b_knn5".to_string(),
                repeat_idx: 0,
                fold_idx: 0,
                accuracy: 0.5,
                roc_auc: 0.6,
            },
        ];

        let summaries = summarize_scores(&grid, &scores);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].n_folds, 2);
        assert!((summaries[0].accuracy.mean - 0.7).abs() < 1e-12);
        assert!((summaries[0].roc_auc.mean - 0.8).abs() < 1e-12);
        assert_eq!(summaries[1].n_folds, 1);
        assert_eq!(summaries[1].roc_auc.std_error, 0.0);
    }
}
