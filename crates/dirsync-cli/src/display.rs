//! Display utilities for the dirsync CLI

use console::style;
use dirsync_sync::ScheduleSummary;
use std::time::Duration;

/// Print what a scheduler run did
pub fn print_schedule_summary(summary: &ScheduleSummary) {
    let totals = &summary.totals;

    println!();
    println!("{}", style("Synchronization Summary:").bold().underlined());
    println!("  Passes: {}", style(summary.passes).cyan());
    if summary.failed_passes > 0 {
        println!("  Failed passes: {}", style(summary.failed_passes).red());
    }
    if let Some(reason) = &summary.fatal_error {
        println!("  Stopped early: {}", style(reason).red());
    }
    println!(
        "  Directories created: {}",
        style(totals.directories_created).green()
    );
    println!(
        "  Directories deleted: {}",
        style(totals.directories_deleted).green()
    );
    println!("  Files copied: {}", style(totals.files_copied).green());
    println!("  Files moved: {}", style(totals.files_moved).green());
    println!("  Files deleted: {}", style(totals.files_deleted).green());
    println!(
        "  Failed actions: {}",
        if totals.failed > 0 {
            style(totals.failed).red()
        } else {
            style(totals.failed).green()
        }
    );
    println!(
        "  Time spent syncing: {}",
        style(format_duration(totals.duration)).blue()
    );
}

/// Format duration in human-readable format
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{:.2}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

/// Display a warning message with proper formatting
pub fn display_warning(message: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), style(message).yellow());
}

/// Display an error message with proper formatting
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), style(message).red());
}

/// Display an info message with proper formatting
pub fn display_info(message: &str) {
    println!("{} {}", style("ℹ").blue().bold(), style(message).blue());
}
