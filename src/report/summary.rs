//! Terminal report rendering: distribution bars, the cross-validation
//! leaderboard, test metrics, and the run summary

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;
use std::time::Duration;

use crate::eval::{TestEvaluation, WorkflowSummary};
use crate::pipeline::ExplorationSummary;

/// Widest distribution bar, in characters
const MAX_BAR_WIDTH: usize = 30;

/// Per-step timings and headline results of one run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub load_time: Duration,
    pub explore_time: Duration,
    pub split_time: Duration,
    pub evaluate_time: Duration,
    pub final_fit_time: Duration,
    pub save_time: Duration,
    pub n_rows: usize,
    pub n_workflows: usize,
    pub n_fold_fits: usize,
    pub best_workflow: String,
    pub best_cv_auc: f64,
    pub test_auc: f64,
    pub test_accuracy: f64,
}

impl RunSummary {
    pub fn total_time(&self) -> Duration {
        self.load_time
            + self.explore_time
            + self.split_time
            + self.evaluate_time
            + self.final_fit_time
            + self.save_time
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("RUN SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![Cell::new("🚢 Passengers"), Cell::new(self.n_rows)]);
        table.add_row(vec![
            Cell::new("🧪 Workflows evaluated"),
            Cell::new(self.n_workflows),
        ]);
        table.add_row(vec![Cell::new("🔁 Fold fits"), Cell::new(self.n_fold_fits)]);
        table.add_row(vec![
            Cell::new("🏆 Best workflow"),
            Cell::new(&self.best_workflow)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("📈 CV ROC AUC"),
            Cell::new(format!("{:.4}", self.best_cv_auc)),
        ]);
        table.add_row(vec![
            Cell::new("🎯 Test ROC AUC"),
            Cell::new(format!("{:.4}", self.test_auc))
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("✅ Test accuracy"),
            Cell::new(format!("{:.4}", self.test_accuracy)),
        ]);
        table.add_row(vec![
            Cell::new("⏱️  Total time"),
            Cell::new(format!("{:.2}s", self.total_time().as_secs_f64())),
        ]);

        for line in table.to_string().lines() {
            println!("    {}", line);
        }
    }
}

/// Print per-feature distributions: a stats table for numeric columns,
/// then scaled count bars per feature
pub fn display_exploration(summary: &ExplorationSummary) {
    println!();
    println!(
        "    {} {}",
        style("📊").cyan(),
        style("FEATURE DISTRIBUTIONS").white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Numeric Feature").add_attribute(Attribute::Bold),
        Cell::new("Observed").add_attribute(Attribute::Bold),
        Cell::new("Missing").add_attribute(Attribute::Bold),
        Cell::new("Min").add_attribute(Attribute::Bold),
        Cell::new("Mean").add_attribute(Attribute::Bold),
        Cell::new("Max").add_attribute(Attribute::Bold),
    ]);
    for feature in &summary.numeric {
        table.add_row(vec![
            Cell::new(&feature.name),
            Cell::new(feature.observed),
            Cell::new(feature.missing).fg(if feature.missing == 0 {
                Color::White
            } else {
                Color::Yellow
            }),
            Cell::new(format!("{:.2}", feature.min)),
            Cell::new(format!("{:.2}", feature.mean)),
            Cell::new(format!("{:.2}", feature.max)),
        ]);
    }
    for line in table.to_string().lines() {
        println!("    {}", line);
    }

    for feature in &summary.numeric {
        println!();
        println!(
            "      {} {}",
            style(&feature.name).cyan().bold(),
            style("distribution").dim()
        );
        let rows: Vec<(String, usize, Option<f64>)> = feature
            .bins
            .iter()
            .map(|bin| {
                (
                    format!("{:.1}-{:.1}", bin.lower, bin.upper),
                    bin.count,
                    None,
                )
            })
            .collect();
        print_count_bars(&rows);
    }

    for feature in &summary.categorical {
        println!();
        println!(
            "      {} {}",
            style(&feature.name).cyan().bold(),
            style(format!("({} levels, {} missing)", feature.levels.len(), feature.missing)).dim()
        );
        let rows: Vec<(String, usize, Option<f64>)> = feature
            .levels
            .iter()
            .map(|level| (level.level.clone(), level.count, Some(level.survival_rate())))
            .collect();
        print_count_bars(&rows);
    }
}

/// Scaled count bars, widest bar capped at `MAX_BAR_WIDTH`
fn print_count_bars(rows: &[(String, usize, Option<f64>)]) {
    let max_count = rows.iter().map(|(_, c, _)| *c).max().unwrap_or(1).max(1);
    for (label, count, survival) in rows {
        let width = (count * MAX_BAR_WIDTH) / max_count;
        let bar = "█".repeat(width);
        match survival {
            Some(rate) => println!(
                "        {:>12} │ {:<5} {} {}",
                label,
                count,
                style(bar).cyan(),
                style(format!("{:.0}% survived", rate * 100.0)).dim()
            ),
            None => println!(
                "        {:>12} │ {:<5} {}",
                label,
                count,
                style(bar).cyan()
            ),
        }
    }
}

/// Print the ranked cross-validation leaderboard
pub fn display_leaderboard(summaries: &[WorkflowSummary]) {
    println!();
    println!(
        "    {} {}",
        style("🏁").cyan(),
        style("CROSS-VALIDATION LEADERBOARD").white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Rank").add_attribute(Attribute::Bold),
        Cell::new("Workflow").add_attribute(Attribute::Bold),
        Cell::new("ROC AUC").add_attribute(Attribute::Bold),
        Cell::new("Accuracy").add_attribute(Attribute::Bold),
        Cell::new("Folds").add_attribute(Attribute::Bold),
    ]);

    for summary in summaries {
        let auc = format!(
            "{:.4} ± {:.4}",
            summary.roc_auc.mean, summary.roc_auc.std_error
        );
        let accuracy = format!(
            "{:.4} ± {:.4}",
            summary.accuracy.mean, summary.accuracy.std_error
        );
        if summary.rank == 1 {
            table.add_row(vec![
                Cell::new("🏆 1")
                    .fg(Color::Green)
                    .add_attribute(Attribute::Bold),
                Cell::new(&summary.workflow_id)
                    .fg(Color::Green)
                    .add_attribute(Attribute::Bold),
                Cell::new(auc).fg(Color::Green).add_attribute(Attribute::Bold),
                Cell::new(accuracy).fg(Color::Green),
                Cell::new(summary.n_folds),
            ]);
        } else {
            table.add_row(vec![
                Cell::new(summary.rank),
                Cell::new(&summary.workflow_id),
                Cell::new(auc),
                Cell::new(accuracy),
                Cell::new(summary.n_folds),
            ]);
        }
    }

    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

/// Print the confusion matrix and rate metrics of the final evaluation
pub fn display_test_metrics(evaluation: &TestEvaluation) {
    println!();
    println!(
        "    {} {}",
        style("🎯").cyan(),
        style("TEST SET EVALUATION").white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
    println!();

    let confusion = &evaluation.confusion;
    let mut matrix = Table::new();
    matrix.load_preset(UTF8_FULL_CONDENSED);
    matrix.set_header(vec![
        Cell::new("Actual \\ Predicted").add_attribute(Attribute::Bold),
        Cell::new("Survived").add_attribute(Attribute::Bold),
        Cell::new("Died").add_attribute(Attribute::Bold),
    ]);
    matrix.add_row(vec![
        Cell::new("Survived").add_attribute(Attribute::Bold),
        Cell::new(confusion.true_positives).fg(Color::Green),
        Cell::new(confusion.false_negatives).fg(Color::Red),
    ]);
    matrix.add_row(vec![
        Cell::new("Died").add_attribute(Attribute::Bold),
        Cell::new(confusion.false_positives).fg(Color::Red),
        Cell::new(confusion.true_negatives).fg(Color::Green),
    ]);
    for line in matrix.to_string().lines() {
        println!("    {}", line);
    }

    println!();
    let metrics = &evaluation.metrics;
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Metric").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![
        Cell::new("Accuracy"),
        Cell::new(format!("{:.4}", metrics.accuracy)),
    ]);
    table.add_row(vec![
        Cell::new("Recall"),
        Cell::new(format!("{:.4}", metrics.recall)),
    ]);
    table.add_row(vec![
        Cell::new("Precision"),
        Cell::new(format!("{:.4}", metrics.precision)),
    ]);
    table.add_row(vec![
        Cell::new("Specificity"),
        Cell::new(format!("{:.4}", metrics.specificity)),
    ]);
    table.add_row(vec![
        Cell::new("NPV"),
        Cell::new(format!("{:.4}", metrics.npv)),
    ]);
    table.add_row(vec![
        Cell::new("ROC AUC"),
        Cell::new(format!("{:.4}", evaluation.roc_auc))
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
    ]);
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}
