//! Local statevector simulator.
//!
//! Exact statevector simulation with shot sampling, suitable for the
//! handful of qubits a repetition code needs and usable up to
//! [`MAX_QUBITS`].
//!
//! # Features
//!
//! - **Exact amplitudes** through [`StatevectorBackend`](bitflip_hal::StatevectorBackend)
//! - **Mid-circuit measurement** with state collapse
//! - **Classically conditioned gates** evaluated per shot
//! - **Reproducible sampling** via [`SimulatorBackend::with_seed`]
//!
//! # Example
//!
//! ```ignore
//! use bitflip_adapter_sim::SimulatorBackend;
//! use bitflip_hal::Backend;
//! use bitflip_ir::{Circuit, QubitId};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = SimulatorBackend::new();
//!
//!     let mut circuit = Circuit::with_size("encode", 3, 3);
//!     circuit.x(QubitId(0))?;
//!     circuit.cx(QubitId(0), QubitId(1))?.cx(QubitId(0), QubitId(2))?;
//!     circuit.measure_all()?;
//!
//!     let job_id = backend.submit(&circuit, 1000).await?;
//!     let result = backend.wait(&job_id).await?;
//!     assert_eq!(result.counts.get("111"), 1000);
//!     Ok(())
//! }
//! ```

mod simulator;
mod statevector;

pub use simulator::{MAX_QUBITS, SimulatorBackend};
pub use statevector::Statevector;
