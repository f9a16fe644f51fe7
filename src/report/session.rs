//! Session report assembly and artifact export
//!
//! The JSON report captures everything needed to reproduce a run: input,
//! seed, resampling settings, the full leaderboard, and the test metrics
//! of the selected workflow.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::eval::{
    ClassMetrics, ConfusionCounts, FoldScore, RocCurve, TestEvaluation, WorkflowSummary,
};
use crate::pipeline::ExplorationSummary;
use crate::report::summary::RunSummary;

/// Run provenance: when, what input, which settings
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub timestamp: String,
    pub lifeboat_version: String,
    pub input_file: String,
    pub seed: u64,
    pub folds: usize,
    pub repeats: usize,
    pub train_fraction: f64,
}

/// Row counts and class balance of the cleaned dataset
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub n_rows: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub survival_rate: f64,
    pub dropped_columns: Vec<String>,
}

/// Wall-clock milliseconds per pipeline step
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TimingInfo {
    pub load_ms: u64,
    pub explore_ms: u64,
    pub split_ms: u64,
    pub evaluate_ms: u64,
    pub final_fit_ms: u64,
    pub save_ms: u64,
    pub total_ms: u64,
}

/// Test metrics of the selected workflow, without the ROC curve
///
/// The curve goes to its own CSV artifact; its infinite anchor threshold
/// does not survive a JSON round trip.
#[derive(Debug, Clone, Serialize)]
pub struct TestReport {
    pub workflow_id: String,
    pub confusion: ConfusionCounts,
    pub metrics: ClassMetrics,
    pub roc_auc: f64,
    pub feature_names: Vec<String>,
}

/// The complete session report written to `report.json`
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub metadata: ReportMetadata,
    pub dataset: DatasetSummary,
    pub leaderboard: Vec<WorkflowSummary>,
    pub test: TestReport,
    pub timing: TimingInfo,
}

/// Run settings captured at construction time
#[derive(Debug, Clone)]
pub struct SessionParams {
    pub input_file: String,
    pub seed: u64,
    pub folds: usize,
    pub repeats: usize,
    pub train_fraction: f64,
}

/// Accumulates report sections as the pipeline produces them
pub struct SessionReportBuilder {
    params: SessionParams,
    dataset: Option<DatasetSummary>,
    leaderboard: Vec<WorkflowSummary>,
    test: Option<TestReport>,
    timing: TimingInfo,
}

impl SessionReportBuilder {
    pub fn new(params: SessionParams) -> Self {
        Self {
            params,
            dataset: None,
            leaderboard: Vec::new(),
            test: None,
            timing: TimingInfo::default(),
        }
    }

    pub fn set_dataset(
        &mut self,
        n_rows: usize,
        n_train: usize,
        n_test: usize,
        survival_rate: f64,
        dropped_columns: Vec<String>,
    ) {
        self.dataset = Some(DatasetSummary {
            n_rows,
            n_train,
            n_test,
            survival_rate,
            dropped_columns,
        });
    }

    pub fn set_leaderboard(&mut self, summaries: &[WorkflowSummary]) {
        self.leaderboard = summaries.to_vec();
    }

    pub fn set_test_evaluation(&mut self, evaluation: &TestEvaluation) {
        self.test = Some(TestReport {
            workflow_id: evaluation.workflow_id.clone(),
            confusion: evaluation.confusion,
            metrics: evaluation.metrics,
            roc_auc: evaluation.roc_auc,
            feature_names: evaluation.feature_names.clone(),
        });
    }

    pub fn set_timing(&mut self, summary: &RunSummary) {
        self.timing = TimingInfo {
            load_ms: summary.load_time.as_millis() as u64,
            explore_ms: summary.explore_time.as_millis() as u64,
            split_ms: summary.split_time.as_millis() as u64,
            evaluate_ms: summary.evaluate_time.as_millis() as u64,
            final_fit_ms: summary.final_fit_time.as_millis() as u64,
            save_ms: summary.save_time.as_millis() as u64,
            total_ms: summary.total_time().as_millis() as u64,
        };
    }

    /// Assemble the final report. Errors if the dataset summary, the
    /// leaderboard, or the test evaluation was never set.
    pub fn build(self) -> Result<SessionReport> {
        let dataset = self
            .dataset
            .ok_or_else(|| anyhow::anyhow!("Session report is missing the dataset summary"))?;
        let test = self
            .test
            .ok_or_else(|| anyhow::anyhow!("Session report is missing the test evaluation"))?;
        if self.leaderboard.is_empty() {
            anyhow::bail!("Session report is missing the cross-validation leaderboard");
        }

        Ok(SessionReport {
            metadata: ReportMetadata {
                timestamp: Utc::now().to_rfc3339(),
                lifeboat_version: env!("CARGO_PKG_VERSION").to_string(),
                input_file: self.params.input_file,
                seed: self.params.seed,
                folds: self.params.folds,
                repeats: self.params.repeats,
                train_fraction: self.params.train_fraction,
            },
            dataset,
            leaderboard: self.leaderboard,
            test,
            timing: self.timing,
        })
    }
}

/// Write the session report as pretty-printed JSON
pub fn export_session_report(report: &SessionReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .context("Failed to serialize session report to JSON")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report file: {}", path.display()))?;
    Ok(())
}

#[derive(Serialize)]
struct CvMetricsExport<'a> {
    workflows: &'a [WorkflowSummary],
    fold_scores: &'a [FoldScore],
}

/// Write per-fold scores and per-workflow aggregates as JSON
pub fn export_cv_metrics(
    workflows: &[WorkflowSummary],
    fold_scores: &[FoldScore],
    path: &Path,
) -> Result<()> {
    let export = CvMetricsExport {
        workflows,
        fold_scores,
    };
    let json = serde_json::to_string_pretty(&export)
        .context("Failed to serialize cross-validation metrics to JSON")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write metrics file: {}", path.display()))?;
    Ok(())
}

/// Write the feature distribution summaries as JSON
pub fn export_exploration(summary: &ExplorationSummary, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)
        .context("Failed to serialize exploration summary to JSON")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write exploration file: {}", path.display()))?;
    Ok(())
}

/// Write the ROC curve as CSV, one operating point per row
pub fn export_roc_curve_csv(curve: &RocCurve, path: &Path) -> Result<()> {
    use std::io::Write;

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create ROC curve file: {}", path.display()))?;
    writeln!(file, "threshold,tpr,fpr").context("Failed to write CSV header")?;
    for point in &curve.points {
        writeln!(file, "{},{},{}", point.threshold, point.tpr, point.fpr)
            .context("Failed to write ROC curve row")?;
    }
    Ok(())
}

/// Bundle the run artifacts into a single zip and remove the originals
pub fn package_report_bundle(artifact_paths: &[PathBuf], zip_path: &Path) -> Result<()> {
    use std::io::{Read, Write};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    let zip_file = std::fs::File::create(zip_path)
        .with_context(|| format!("Failed to create zip file: {}", zip_path.display()))?;

    let mut zip = ZipWriter::new(zip_file);
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for path in artifact_paths {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("Artifact path has no file name: {}", path.display()))?;
        zip.start_file(filename, options)
            .with_context(|| format!("Failed to add {} to zip", filename))?;
        let mut content = Vec::new();
        std::fs::File::open(path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?
            .read_to_end(&mut content)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        zip.write_all(&content)
            .with_context(|| format!("Failed to write {} into zip", filename))?;
    }

    zip.finish().context("Failed to finalize zip file")?;

    // Originals are superseded by the bundle
    for path in artifact_paths {
        std::fs::remove_file(path).ok();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::MetricAggregate;

    fn sample_params() -> SessionParams {
        SessionParams {
            input_file: "titanic.csv".to_string(),
            seed: 501,
            folds: 10,
            repeats: 10,
            train_fraction: 0.75,
        }
    }

    fn sample_summary(id: &str, rank: usize) -> WorkflowSummary {
        WorkflowSummary {
            workflow_id: id.to_string(),
            recipe_name: "mean_dummy".to_string(),
            model_name: "logreg".to_string(),
            n_folds: 100,
            accuracy: MetricAggregate {
                mean: 0.8,
                std_error: 0.01,
            },
            roc_auc: MetricAggregate {
                mean: 0.85,
                std_error: 0.01,
            },
            rank,
        }
    }

    fn sample_test_evaluation() -> TestEvaluation {
        let confusion = ConfusionCounts {
            true_positives: 60,
            false_positives: 15,
            true_negatives: 130,
            false_negatives: 18,
        };
        TestEvaluation {
            workflow_id: "mean_dummy_logreg".to_string(),
            metrics: ClassMetrics::from_confusion(&confusion),
            confusion,
            roc_auc: 0.86,
            roc_curve: RocCurve { points: Vec::new() },
            feature_names: vec!["Age".to_string(), "Sex_male".to_string()],
        }
    }

    #[test]
    fn test_builder_assembles_all_sections() {
        let mut builder = SessionReportBuilder::new(sample_params());
        builder.set_dataset(891, 668, 223, 0.38, vec!["Name".to_string()]);
        builder.set_leaderboard(&[sample_summary("mean_dummy_logreg", 1)]);
        builder.set_test_evaluation(&sample_test_evaluation());

        let built = builder.build().unwrap();
        assert_eq!(built.metadata.seed, 501);
        assert_eq!(built.metadata.folds, 10);
        assert_eq!(built.dataset.n_rows, 891);
        assert_eq!(built.dataset.n_train + built.dataset.n_test, 891);
        assert_eq!(built.leaderboard.len(), 1);
        assert_eq!(built.test.workflow_id, "mean_dummy_logreg");
        assert!(!built.metadata.timestamp.is_empty());
    }

    #[test]
    fn test_builder_requires_dataset() {
        let mut builder = SessionReportBuilder::new(sample_params());
        builder.set_leaderboard(&[sample_summary("mean_dummy_logreg", 1)]);
        builder.set_test_evaluation(&sample_test_evaluation());

        let err = builder.build().unwrap_err();
        assert!(err.to_string().contains("dataset summary"));
    }

    #[test]
    fn test_builder_requires_test_evaluation() {
        let mut builder = SessionReportBuilder::new(sample_params());
        builder.set_dataset(891, 668, 223, 0.38, Vec::new());
        builder.set_leaderboard(&[sample_summary("mean_dummy_logreg", 1)]);

        let err = builder.build().unwrap_err();
        assert!(err.to_string().contains("test evaluation"));
    }

    #[test]
    fn test_builder_requires_leaderboard() {
        let mut builder = SessionReportBuilder::new(sample_params());
        builder.set_dataset(891, 668, 223, 0.38, Vec::new());
        builder.set_test_evaluation(&sample_test_evaluation());

        let err = builder.build().unwrap_err();
        assert!(err.to_string().contains("leaderboard"));
    }

    #[test]
    fn test_timing_converts_to_milliseconds() {
        use std::time::Duration;

        let mut builder = SessionReportBuilder::new(sample_params());
        let run = RunSummary {
            load_time: Duration::from_millis(120),
            evaluate_time: Duration::from_millis(3400),
            ..RunSummary::default()
        };
        builder.set_timing(&run);

        assert_eq!(builder.timing.load_ms, 120);
        assert_eq!(builder.timing.evaluate_ms, 3400);
        assert_eq!(builder.timing.total_ms, 3520);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let mut builder = SessionReportBuilder::new(sample_params());
        builder.set_dataset(891, 668, 223, 0.38, Vec::new());
        builder.set_leaderboard(&[sample_summary("mean_dummy_logreg", 1)]);
        builder.set_test_evaluation(&sample_test_evaluation());

        let report = builder.build().unwrap();
        let json = serde_json::to_string_pretty(&report).unwrap();
        assert!(json.contains("\"lifeboat_version\""));
        assert!(json.contains("\"mean_dummy_logreg\""));
        assert!(json.contains("\"true_positives\": 60"));
    }
}
