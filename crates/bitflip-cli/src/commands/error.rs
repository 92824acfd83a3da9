//! Error command implementation.

use anyhow::Result;
use console::style;

use bitflip_adapter_sim::SimulatorBackend;
use bitflip_qec::{ErrorSelection, InitialState, MajorityVote, Recipe, run_recipe};

use super::common::{print_circuit, print_counts, print_header};

/// Execute the error command: encode, flip one qubit, measure.
pub async fn execute(
    state: InitialState,
    error: ErrorSelection,
    shots: u32,
    show_circuit: bool,
) -> Result<()> {
    print_header("ERROR SIMULATION");

    let recipe = Recipe::with_error(state, error)?;
    let backend = SimulatorBackend::new();

    println!("Initial state: |{state}⟩");
    if let Some(q) = recipe.error_qubit() {
        let how = if recipe.randomly_selected() { " (random)" } else { "" };
        println!("Error introduced on qubit {}{how}", style(q).red().bold());
    }

    if show_circuit {
        print_circuit(&recipe.to_circuit()?);
    }

    let report = run_recipe(&backend, &recipe, shots).await?;
    print_counts(&report.counts);

    if let Some((bits, _)) = report.counts.most_frequent() {
        let vote = MajorityVote::from_bits(bits)?;
        match vote.error_position() {
            Some(pos) => println!(
                "\nMajority vote on |{bits}⟩: '{}' wins, error on qubit {}",
                vote.majority(),
                style(pos).yellow()
            ),
            None => println!("\nMajority vote on |{bits}⟩: no error detected"),
        }
    }
    Ok(())
}
