//! Encode command implementation.

use anyhow::Result;
use console::style;

use bitflip_adapter_sim::SimulatorBackend;
use bitflip_hal::StatevectorBackend;
use bitflip_qec::{InitialState, Recipe, Stage, format_ket, run_recipe};

use super::common::{print_circuit, print_counts, print_header};

/// Execute the encode command.
pub async fn execute(state: InitialState, shots: u32, show_circuit: bool) -> Result<()> {
    print_header("ENCODING");

    let recipe = Recipe::encode_only(state)?;
    let backend = SimulatorBackend::new();

    println!("Initial state: |{state}⟩");
    println!("Encoded state: |{}⟩", style(recipe.expected()).green());

    if show_circuit {
        print_circuit(&recipe.to_circuit()?);
    }

    let amplitudes = backend
        .statevector(&recipe.circuit_through(Stage::Encode)?)
        .await?;
    println!("\nStatevector: {}", format_ket(&amplitudes));

    let report = run_recipe(&backend, &recipe, shots).await?;
    print_counts(&report.counts);
    Ok(())
}
