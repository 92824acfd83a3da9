//! Correct command implementation.

use anyhow::Result;
use console::style;

use bitflip_adapter_sim::SimulatorBackend;
use bitflip_qec::{CorrectionMode, ErrorSelection, InitialState, Recipe, SuccessTier, run_recipe};

use super::common::{print_circuit, print_counts, print_header};

/// Execute the correct command: encode, flip, correct, measure.
pub async fn execute(
    state: InitialState,
    error: ErrorSelection,
    mode: CorrectionMode,
    shots: u32,
    show_circuit: bool,
) -> Result<()> {
    print_header("ERROR CORRECTION SIMULATION");

    let recipe = Recipe::with_correction(state, error, mode)?;
    let backend = SimulatorBackend::new();

    println!("Initial state: |{state}⟩");
    if let Some(q) = recipe.error_qubit() {
        println!("Error on qubit: {q}");
    }
    println!("Correction:    {mode}");

    if show_circuit {
        print_circuit(&recipe.to_circuit()?);
    }

    let report = run_recipe(&backend, &recipe, shots).await?;
    print_counts(&report.counts);

    let observed = report
        .counts
        .most_frequent()
        .map_or_else(String::new, |(bits, _)| bits.clone());
    println!("\nExpected: |{}⟩", report.expected);
    println!("Result:   |{observed}⟩");

    if report.tier() == SuccessTier::Perfect {
        println!("\n{} Error corrected!", style("✓").green().bold());
    } else {
        println!(
            "\n{} Error not corrected ({:.1}% success)",
            style("✗").red().bold(),
            report.success_rate
        );
    }
    Ok(())
}
