//! Lifeboat: Survival Model Selection CLI Tool
//!
//! Compares imputation, encoding, and classifier workflows on passenger
//! survival data with repeated stratified cross-validation, then reports
//! test-set metrics for the selected workflow.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use lifeboat::cli::Cli;
use lifeboat::eval::{
    build_workflow_grid, evaluate_grid, fit_and_score_final, rank_workflows, summarize_scores,
};
use lifeboat::pipeline::{
    clean_dataset, estimated_memory_mb, explore_features, load_dataframe, positive_rate,
    repeated_stratified_kfold, stratified_split,
};
use lifeboat::report::{
    display_exploration, display_leaderboard, display_test_metrics, export_cv_metrics,
    export_exploration, export_roc_curve_csv, export_session_report, package_report_bundle,
    RunSummary, SessionParams, SessionReportBuilder,
};
use lifeboat::utils::{
    create_fit_progress_bar, create_spinner, finish_with_success, print_banner, print_completion,
    print_config, print_count, print_step_header, print_step_time, print_success, TROPHY,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let artifact_dir = cli.artifact_dir();
    let quiet = cli.quiet;

    if !quiet {
        print_banner(env!("CARGO_PKG_VERSION"));
        print_config(
            &cli.input,
            &artifact_dir,
            cli.seed,
            cli.folds,
            cli.repeats,
            cli.train_fraction,
        );
    }

    let mut run = RunSummary::default();
    let mut builder = SessionReportBuilder::new(SessionParams {
        input_file: cli.input.display().to_string(),
        seed: cli.seed,
        folds: cli.folds,
        repeats: cli.repeats,
        train_fraction: cli.train_fraction,
    });

    // Step 1: Load and clean the dataset
    if !quiet {
        print_step_header(1, "Load and Clean");
    }
    let step_start = Instant::now();
    let spinner = (!quiet).then(|| create_spinner("Loading dataset..."));
    let raw = load_dataframe(&cli.input, cli.infer_schema_length)?;
    let dataset = clean_dataset(&raw).context("Failed to clean dataset")?;
    if let Some(pb) = &spinner {
        finish_with_success(pb, "Dataset loaded and cleaned");
    }

    let n_rows = dataset.features.height();
    let survival_rate =
        dataset.labels.iter().filter(|&&l| l == 1).count() as f64 / n_rows as f64;
    if !quiet {
        println!("\n    {} Dataset Statistics:", style("✧").cyan());
        println!("      Passengers: {}", n_rows);
        println!("      Predictors: {}", dataset.features.width());
        println!("      Survival rate: {:.1}%", survival_rate * 100.0);
        println!(
            "      Estimated memory: {:.2} MB",
            estimated_memory_mb(&dataset.features)
        );
        if !dataset.dropped_columns.is_empty() {
            println!(
                "      Dropped identifiers: {}",
                dataset.dropped_columns.join(", ")
            );
        }
    }
    run.n_rows = n_rows;
    run.load_time = step_start.elapsed();
    if !quiet {
        print_step_time(run.load_time);
    }

    // Step 2: Feature exploration
    if !quiet {
        print_step_header(2, "Explore Features");
    }
    let step_start = Instant::now();
    let exploration = explore_features(&dataset.features, &dataset.labels)
        .context("Feature exploration failed")?;
    if !quiet {
        display_exploration(&exploration);
    }
    run.explore_time = step_start.elapsed();
    if !quiet {
        print_step_time(run.explore_time);
    }

    // Step 3: Train/test partition and fold plan
    if !quiet {
        print_step_header(3, "Partition Passengers");
    }
    let step_start = Instant::now();
    let split = stratified_split(&dataset.labels, cli.train_fraction, cli.seed)?;
    let folds = repeated_stratified_kfold(
        &split.train,
        &dataset.labels,
        cli.folds,
        cli.repeats,
        cli.seed,
    )?;
    if !quiet {
        println!(
            "      Training:   {} passengers ({:.1}% survived)",
            style(split.train.len()).yellow().bold(),
            positive_rate(&dataset.labels, &split.train) * 100.0
        );
        println!(
            "      Test:       {} passengers ({:.1}% survived)",
            style(split.test.len()).yellow().bold(),
            positive_rate(&dataset.labels, &split.test) * 100.0
        );
        println!(
            "      Fold plan:  {} folds × {} repeats",
            cli.folds, cli.repeats
        );
    }
    builder.set_dataset(
        n_rows,
        split.train.len(),
        split.test.len(),
        survival_rate,
        dataset.dropped_columns.clone(),
    );
    run.split_time = step_start.elapsed();
    if !quiet {
        print_step_time(run.split_time);
    }

    // Step 4: Cross-validate every workflow
    if !quiet {
        print_step_header(4, "Evaluate Workflow Grid");
    }
    let step_start = Instant::now();
    let grid = build_workflow_grid();
    let total_fits = (grid.len() * folds.len()) as u64;
    let progress = (!quiet).then(|| create_fit_progress_bar(total_fits));
    let scores = evaluate_grid(
        &dataset.features,
        &dataset.labels,
        &folds,
        &grid,
        progress.as_ref(),
    )?;
    if let Some(pb) = &progress {
        finish_with_success(pb, "Cross-validation complete");
    }
    let ranked = rank_workflows(summarize_scores(&grid, &scores));
    if !quiet {
        print_count("workflow fits", scores.len(), None);
    }
    run.n_workflows = grid.len();
    run.n_fold_fits = scores.len();
    run.evaluate_time = step_start.elapsed();
    if !quiet {
        print_step_time(run.evaluate_time);
    }

    // Step 5: Pick the winner and refit on the full training partition
    if !quiet {
        print_step_header(5, "Select and Refit");
    }
    let step_start = Instant::now();
    let best = ranked
        .first()
        .ok_or_else(|| anyhow::anyhow!("No workflow produced cross-validation scores"))?;
    let winner = grid
        .iter()
        .find(|w| w.id() == best.workflow_id)
        .ok_or_else(|| anyhow::anyhow!("Ranked workflow '{}' not in grid", best.workflow_id))?;
    if !quiet {
        display_leaderboard(&ranked);
        println!();
        println!(
            "    {}Selected workflow: {} (CV ROC AUC {:.4})",
            TROPHY,
            style(&best.workflow_id).green().bold(),
            best.roc_auc.mean
        );
    }

    let evaluation = fit_and_score_final(
        &dataset.features,
        &dataset.labels,
        winner,
        &split.train,
        &split.test,
    )?;
    if !quiet {
        display_test_metrics(&evaluation);
    }
    builder.set_leaderboard(&ranked);
    builder.set_test_evaluation(&evaluation);
    run.best_workflow = best.workflow_id.clone();
    run.best_cv_auc = best.roc_auc.mean;
    run.test_auc = evaluation.roc_auc;
    run.test_accuracy = evaluation.metrics.accuracy;
    run.final_fit_time = step_start.elapsed();
    if !quiet {
        print_step_time(run.final_fit_time);
    }

    // Step 6: Write artifacts
    if !quiet {
        print_step_header(6, "Save Artifacts");
    }
    let step_start = Instant::now();
    std::fs::create_dir_all(&artifact_dir).with_context(|| {
        format!(
            "Failed to create artifact directory: {}",
            artifact_dir.display()
        )
    })?;

    let eda_path = artifact_dir.join("eda.json");
    let cv_path = artifact_dir.join("cv_metrics.json");
    let roc_path = artifact_dir.join("roc_curve.csv");
    let report_path = artifact_dir.join("report.json");

    export_exploration(&exploration, &eda_path)?;
    export_cv_metrics(&ranked, &scores, &cv_path)?;
    export_roc_curve_csv(&evaluation.roc_curve, &roc_path)?;

    // Timings are frozen here; the report write itself is not counted
    run.save_time = step_start.elapsed();
    builder.set_timing(&run);
    let report = builder.build()?;
    export_session_report(&report, &report_path)?;

    if cli.bundle {
        let stem = cli
            .input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("lifeboat");
        let zip_path = artifact_dir.join(format!("{}_report.zip", stem));
        package_report_bundle(
            &[eda_path, cv_path, roc_path, report_path],
            &zip_path,
        )?;
        if !quiet {
            print_success(&format!("Bundled artifacts into {}", zip_path.display()));
        }
    } else if !quiet {
        print_success(&format!("Artifacts written to {}", artifact_dir.display()));
    }
    run.save_time = step_start.elapsed();
    if !quiet {
        print_step_time(run.save_time);
    }

    if !quiet {
        run.display();
        print_completion();
    }

    Ok(())
}
