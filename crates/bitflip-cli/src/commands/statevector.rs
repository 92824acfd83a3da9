//! Statevector command implementation.

use anyhow::Result;
use console::style;

use bitflip_adapter_sim::SimulatorBackend;
use bitflip_qec::{
    InitialState, Similarity, StageSnapshot, basis_label, fidelity, format_complex,
    stage_snapshots,
};

use super::common::print_header;

const THRESHOLD: f64 = 1e-10;

fn print_snapshot(title: &str, snapshot: &StageSnapshot) {
    println!("\n{}", style(title).bold());
    println!("  |ψ⟩ = {}", snapshot.ket);
    for (i, amp) in snapshot.amplitudes.iter().enumerate() {
        if amp.norm() > THRESHOLD {
            println!(
                "    |{}⟩: {:>20} (prob: {:.4})",
                basis_label(i, 3),
                format_complex(*amp, 4),
                snapshot.probabilities[i]
            );
        }
    }
}

fn print_fidelity(label: &str, value: f64) {
    let verdict = match Similarity::classify(value) {
        Similarity::Identical => style("identical").green(),
        Similarity::VerySimilar => style("very similar").yellow(),
        Similarity::Different => style("different").red(),
    };
    println!("  {label:<28} {value:.6} ({verdict})");
}

/// Execute the statevector command.
pub async fn execute(state: InitialState, qubit: usize) -> Result<()> {
    print_header("STATEVECTOR ANALYSIS");
    println!("Initial state: |{state}⟩, error on qubit {qubit}");

    let backend = SimulatorBackend::new();
    let snaps = stage_snapshots(&backend, state, qubit).await?;

    print_snapshot("1. Initial", &snaps.initial);
    print_snapshot("2. Encoded", &snaps.encoded);
    print_snapshot(&format!("3. Error on qubit {qubit}"), &snaps.with_error);
    print_snapshot("4. Corrected", &snaps.corrected);

    println!("\nFidelity:");
    print_fidelity(
        "encoded vs with error",
        fidelity(&snaps.encoded.amplitudes, &snaps.with_error.amplitudes),
    );
    print_fidelity(
        "encoded vs corrected",
        fidelity(&snaps.encoded.amplitudes, &snaps.corrected.amplitudes),
    );
    Ok(())
}
