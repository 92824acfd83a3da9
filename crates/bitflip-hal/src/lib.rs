//! Backend Abstraction Layer
//!
//! This crate provides the interface between circuit construction and
//! circuit execution:
//! - A common [`Backend`] trait for job submission and management
//! - [`StatevectorBackend`] for backends that expose final amplitudes
//! - [`Capabilities`] to describe gate support and limits
//! - Unified result handling via [`ExecutionResult`] and [`Counts`]
//!
//! # Example: Running a Circuit
//!
//! ```ignore
//! use bitflip_hal::Backend;
//! use bitflip_adapter_sim::SimulatorBackend;
//! use bitflip_ir::{Circuit, QubitId};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut circuit = Circuit::with_size("encode", 3, 3);
//!     circuit.cx(QubitId(0), QubitId(1))?.cx(QubitId(0), QubitId(2))?;
//!     circuit.measure_all()?;
//!
//!     let backend = SimulatorBackend::new();
//!     let job_id = backend.submit(&circuit, 1000).await?;
//!     let result = backend.wait(&job_id).await?;
//!
//!     assert_eq!(result.counts.get("000"), 1000);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod capability;
pub mod error;
pub mod job;
pub mod result;

pub use backend::{Backend, StatevectorBackend};
pub use capability::{
    Capabilities, FEATURE_CLASSICAL_CONTROL, FEATURE_MID_CIRCUIT_MEASUREMENT,
    FEATURE_STATEVECTOR, GateSet,
};
pub use error::{HalError, HalResult};
pub use job::{Job, JobId, JobStatus};
pub use result::{Counts, ExecutionResult};
