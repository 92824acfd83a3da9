//! Compare command implementation.

use anyhow::Result;
use console::style;

use bitflip_adapter_sim::SimulatorBackend;
use bitflip_qec::{ErrorSelection, InitialState, Recipe, run_recipe};

use super::common::{print_counts, print_header};

/// Run the same error with and without correction side by side.
pub async fn execute(state: InitialState, qubit: usize, shots: u32) -> Result<()> {
    print_header("COMPARISON: With vs Without Error Correction");
    let backend = SimulatorBackend::new();
    let error = ErrorSelection::fixed(qubit)?;

    let without = run_recipe(&backend, &Recipe::with_error(state, error)?, shots).await?;
    let with = run_recipe(&backend, &Recipe::pipeline(state, error)?, shots).await?;

    println!("\n{}", style("Without correction").red().bold());
    print_counts(&without.counts);
    println!("  Success rate: {:.1}%", without.success_rate);

    println!("\n{}", style("With correction").green().bold());
    print_counts(&with.counts);
    println!("  Success rate: {:.1}%", with.success_rate);

    println!(
        "\nImprovement: {:+.1} percentage points",
        with.success_rate - without.success_rate
    );
    Ok(())
}
