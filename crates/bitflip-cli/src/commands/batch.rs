//! Batch command implementation.

use anyhow::Result;
use console::style;

use bitflip_adapter_sim::SimulatorBackend;
use bitflip_qec::{SuccessTier, run_batch};

use super::common::{OutputFormat, print_header, print_json, spinner};

#[allow(clippy::cast_precision_loss)]
fn share(n: usize, total: usize) -> f64 {
    n as f64 / total as f64 * 100.0
}

/// Run randomized pipelines and summarize their success rates.
pub async fn execute(trials: usize, shots: u32, format: OutputFormat) -> Result<()> {
    let backend = SimulatorBackend::new();

    let spin = spinner(format!("Running {trials} random tests..."))?;
    let summary = run_batch(&backend, trials, shots).await?;
    spin.finish_and_clear();

    if format == OutputFormat::Json {
        return print_json(&summary);
    }

    print_header(&format!("BATCH TESTING: {trials} random tests"));
    for t in &summary.trials {
        let status = match t.tier {
            SuccessTier::Perfect => style("✓ 100%").green(),
            SuccessTier::High => style("✓ >95%").yellow(),
            SuccessTier::Low => style("✗ FAIL").red(),
        };
        println!(
            "Test {:2}: State=|{}⟩, Error={:6}, Success={:5.1}% → {}",
            t.trial, t.initial, t.selection, t.success_rate, status
        );
    }

    print_header("BATCH TEST SUMMARY");
    let n = summary.trials.len();
    println!("Total Tests:          {n}");
    println!("100% Success:         {} ({:.0}%)", summary.perfect, share(summary.perfect, n));
    println!("95%+ Success:         {} ({:.0}%)", summary.high, share(summary.high, n));
    println!("Failed (<95%):        {} ({:.0}%)", summary.failed, share(summary.failed, n));
    println!("\nAverage Success Rate: {:.1}%", summary.average);
    println!("Min Success Rate:     {:.1}%", summary.min);
    println!("Max Success Rate:     {:.1}%", summary.max);
    Ok(())
}
