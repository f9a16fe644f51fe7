//! Terminal styling utilities for a modern, visually appealing CLI

use console::{style, Emoji};
use std::path::Path;
use std::time::Duration;

// Emoji icons with fallbacks for terminals that don't support them
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static TARGET: Emoji<'_, '_> = Emoji("🎯 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static DICE: Emoji<'_, '_> = Emoji("🎲 ", "");
pub static TROPHY: Emoji<'_, '_> = Emoji("🏆 ", "** ");

/// Print the application banner with ASCII art
pub fn print_banner(version: &str) {
    let banner = r#"
    ██╗     ██╗███████╗███████╗██████╗  ██████╗  █████╗ ████████╗
    ██║     ██║██╔════╝██╔════╝██╔══██╗██╔═══██╗██╔══██╗╚══██╔══╝
    ██║     ██║█████╗  █████╗  ██████╔╝██║   ██║███████║   ██║
    ██║     ██║██╔══╝  ██╔══╝  ██╔══██╗██║   ██║██╔══██║   ██║
    ███████╗██║██║     ███████╗██████╔╝╚██████╔╝██║  ██║   ██║
    ╚══════╝╚═╝╚═╝     ╚══════╝╚═════╝  ╚═════╝ ╚═╝  ╚═╝   ╚═╝
    "#;

    println!();
    println!("{}", style(banner).cyan().bold());
    println!(
        "    {} {}",
        style("⚓").magenta().bold(),
        style("Survival model selection for the unsinkable dataset").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(61)).dim());
    println!();
}

/// Print configuration card
pub fn print_config(
    input: &Path,
    output_dir: &Path,
    seed: u64,
    folds: usize,
    repeats: usize,
    train_fraction: f64,
) {
    let box_width = 58;
    let line = "─".repeat(box_width - 2);

    println!("    ┌{}┐", line);
    println!(
        "    │ {}{}│",
        style("⚙️  Configuration").cyan().bold(),
        " ".repeat(box_width - 20)
    );
    println!("    ├{}┤", line);
    println!(
        "    │  {} Input:   {:<41}│",
        FOLDER,
        truncate_path(input, 40)
    );
    println!(
        "    │  {} Reports: {:<41}│",
        SAVE,
        truncate_path(output_dir, 40)
    );
    println!("    ├{}┤", line);
    println!(
        "    │  {} Seed:           {:<34}│",
        DICE,
        style(seed).yellow()
    );
    println!(
        "    │  {} Resampling:     {:<34}│",
        CHART,
        style(format!("{} folds × {} repeats", folds, repeats)).yellow()
    );
    println!(
        "    │  {} Train fraction: {:<34}│",
        TARGET,
        style(format!("{:.2}", train_fraction)).yellow()
    );
    println!("    └{}┘", line);
    println!();
}

/// Print a step header with styling
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print elapsed time for a completed step
pub fn print_step_time(elapsed: Duration) {
    println!(
        "    {}",
        style(format!("⏱  {:.2}s", elapsed.as_secs_f64())).dim()
    );
}

/// Print the final completion message
pub fn print_completion() {
    println!();
    println!(
        "    {} {}",
        ROCKET,
        style("Lifeboat analysis complete!").green().bold()
    );
    println!();
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize, detail: Option<&str>) {
    if let Some(info) = detail {
        println!(
            "      Found {} {} {}",
            style(count).yellow().bold(),
            description,
            style(info).dim()
        );
    } else {
        println!(
            "      Found {} {}",
            style(count).yellow().bold(),
            description
        );
    }
}

// Helper functions

fn truncate_path(path: &Path, max_len: usize) -> String {
    let path_str = path.display().to_string();
    truncate_string(&path_str, max_len)
}

fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("...{}", &s[s.len() - max_len + 3..])
    }
}
