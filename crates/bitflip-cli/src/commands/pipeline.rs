//! Pipeline command implementation.

use anyhow::Result;
use serde::Serialize;

use bitflip_adapter_sim::SimulatorBackend;
use bitflip_qec::{
    CorrectionMode, ErrorSelection, InitialState, RecipeBuilder, RunReport, run_recipe,
};

use super::common::{
    OutputFormat, print_circuit, print_counts, print_header, print_json, print_success, spinner,
};

/// Options of the pipeline command.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub state: InitialState,
    pub error: ErrorSelection,
    pub mode: CorrectionMode,
    pub decode: bool,
    pub shots: u32,
    pub quiet: bool,
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct PipelineOutput<'a> {
    initial_state: InitialState,
    mode: CorrectionMode,
    decode: bool,
    #[serde(flatten)]
    report: &'a RunReport,
}

/// Execute the full encode → error → correct → measure pipeline.
pub async fn execute(opts: PipelineOptions) -> Result<()> {
    let recipe = RecipeBuilder::new(opts.state)
        .error(opts.error)
        .correction(opts.mode)
        .decode(opts.decode)
        .build()?;
    tracing::debug!(stages = ?recipe.stages(), error = ?recipe.error_qubit(), "Built pipeline recipe");
    let backend = SimulatorBackend::new();

    if opts.format == OutputFormat::Json {
        let report = run_recipe(&backend, &recipe, opts.shots).await?;
        return print_json(&PipelineOutput {
            initial_state: opts.state,
            mode: opts.mode,
            decode: opts.decode,
            report: &report,
        });
    }

    print_header("FULL ERROR CORRECTION PIPELINE");

    let error_text = recipe
        .error_qubit()
        .map_or_else(|| "none".to_string(), |q| format!("qubit {q}"));
    println!("\nPipeline stages:");
    println!("  1. ENCODING:     Encode |{}⟩ into 3 qubits", opts.state);
    println!("  2. ERROR:        Introduce bit-flip on {error_text}");
    println!("  3. DETECTION:    Use majority-vote to detect error");
    println!("  4. CORRECTION:   {} correction", opts.mode);
    if opts.decode {
        println!("  5. DECODING:     Move the logical value back to qubit 0");
    }
    println!("  *. VERIFICATION: Measure and verify restoration");

    if !opts.quiet {
        print_circuit(&recipe.to_circuit()?);
    }

    let spin = spinner(format!("Running {} shots...", opts.shots))?;
    let report = run_recipe(&backend, &recipe, opts.shots).await?;
    spin.finish_and_clear();

    print_counts(&report.counts);
    println!("\nExpected: |{}⟩", report.expected);
    print_success(report.success_rate);
    Ok(())
}
