//! Shared helpers for CLI commands.

use std::time::Duration;

use anyhow::Result;
use clap::ValueEnum;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use bitflip_hal::Counts;
use bitflip_ir::{Circuit, draw_lines};
use bitflip_qec::SuccessTier;

/// Output format for commands that can emit JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables.
    Table,
    /// One JSON document on stdout.
    Json,
}

/// Print a section banner.
pub fn print_header(title: &str) {
    let rule = "=".repeat(60);
    println!("\n{rule}");
    println!("{}", style(title).cyan().bold());
    println!("{rule}");
}

/// Print the text drawing of a circuit.
pub fn print_circuit(circuit: &Circuit) {
    println!("\nCircuit:");
    for line in draw_lines(circuit) {
        println!("  {line}");
    }
}

/// Print a counts histogram, most frequent first.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn print_counts(counts: &Counts) {
    let total = counts.total_shots() as f64;
    println!("\nResults ({} shots):", counts.total_shots());

    for (bitstring, count) in counts.sorted() {
        let prob = *count as f64 / total * 100.0;
        let bar_len = (prob / 2.0).round() as usize;
        let bar: String = "█".repeat(bar_len);

        println!(
            "  |{}⟩: {:>6} ({:>5.1}%) {}",
            style(bitstring).cyan(),
            count,
            prob,
            style(bar).green()
        );
    }
}

/// Print the success rate with its tier.
pub fn print_success(rate: f64) {
    println!("\nSuccess Rate: {}", style(format!("{rate:.1}%")).bold());
    match SuccessTier::classify(rate) {
        SuccessTier::Perfect => println!("{} Perfect correction!", style("✓").green().bold()),
        SuccessTier::High => println!("{} High success rate", style("✓").yellow().bold()),
        SuccessTier::Low => println!("{} Low success rate", style("⚠").red().bold()),
    }
}

/// Spinner shown while a job runs.
pub fn spinner(message: impl Into<String>) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

/// Print any serializable value as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
