//! The 3-qubit bit-flip code.
//!
//! One logical bit is copied onto three physical qubits with two CNOTs.
//! Any single bit flip leaves two carriers holding the original value, so
//! a majority vote over the readout locates and undoes it.
//!
//! - [`majority`]: the classical decoder on 3-bit readouts
//! - [`recipe`]: the ordered operations of one experiment and their
//!   lowering to a circuit
//! - [`execution`]: running a recipe on a backend and scoring the readout
//! - [`statevector`]: per-stage state snapshots and their rendering
//!
//! # Example
//!
//! ```ignore
//! use bitflip_adapter_sim::SimulatorBackend;
//! use bitflip_qec::{ErrorSelection, InitialState, Recipe, run_recipe};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = SimulatorBackend::new();
//!     let recipe = Recipe::pipeline(InitialState::One, ErrorSelection::Fixed(2))?;
//!     let report = run_recipe(&backend, &recipe, 1000).await?;
//!     assert_eq!(report.counts.get("111"), 1000);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod execution;
pub mod majority;
pub mod recipe;
pub mod state;
pub mod statevector;

pub use error::{QecError, QecResult};
pub use execution::{
    BATCH_SHOTS, BatchSummary, CORRECTED_THRESHOLD, RunReport, SuccessTier, TrialRecord,
    run_batch, run_recipe, success_rate,
};
pub use majority::{
    CODE_LENGTH, Correction, CountsAnalysis, MajorityVote, OutcomeRow, analyze_counts,
    correction_table,
};
pub use recipe::{Operation, Recipe, RecipeBuilder, Stage, Step};
pub use state::{CorrectionMode, ErrorSelection, ExpectedOutcome, InitialState};
pub use statevector::{
    Similarity, StageSnapshot, StageSnapshots, basis_label, basis_labels, fidelity,
    format_complex, format_ket, stage_snapshots,
};
