//! Backend capability introspection.
//!
//! Describes what a backend can do: qubit count, supported gates, shot
//! limits and feature flags.

use serde::{Deserialize, Serialize};

use bitflip_ir::StandardGate;

/// Feature flag: the backend can return final statevectors.
pub const FEATURE_STATEVECTOR: &str = "statevector";
/// Feature flag: measurements may appear before the end of the circuit.
pub const FEATURE_MID_CIRCUIT_MEASUREMENT: &str = "mid_circuit_measurement";
/// Feature flag: gates may be conditioned on classical bits.
pub const FEATURE_CLASSICAL_CONTROL: &str = "classical_control";

/// Capabilities of a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    /// Name of the backend.
    pub name: String,
    /// Number of qubits available.
    pub num_qubits: u32,
    /// Supported gate set.
    pub gate_set: GateSet,
    /// Maximum number of shots per job.
    pub max_shots: u32,
    /// Whether this is a simulator.
    pub is_simulator: bool,
    /// Additional capability flags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

impl Capabilities {
    /// Create capabilities for a statevector simulator.
    pub fn simulator(num_qubits: u32) -> Self {
        Self {
            name: "simulator".into(),
            num_qubits,
            gate_set: GateSet::standard(),
            max_shots: 100_000,
            is_simulator: true,
            features: vec![
                FEATURE_STATEVECTOR.into(),
                FEATURE_MID_CIRCUIT_MEASUREMENT.into(),
                FEATURE_CLASSICAL_CONTROL.into(),
            ],
        }
    }

    /// Check whether a feature flag is present.
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }
}

/// Gate set supported by a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateSet {
    /// Single-qubit gates supported.
    pub single_qubit: Vec<String>,
    /// Two-qubit gates supported.
    pub two_qubit: Vec<String>,
    /// Three-qubit gates supported.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub three_qubit: Vec<String>,
}

impl GateSet {
    /// Every gate of the IR's standard set.
    pub fn standard() -> Self {
        let names = |gates: &[StandardGate]| gates.iter().map(|g| g.name().to_string()).collect();
        Self {
            single_qubit: names(&[
                StandardGate::I,
                StandardGate::X,
                StandardGate::Y,
                StandardGate::Z,
                StandardGate::H,
                StandardGate::S,
                StandardGate::Sdg,
                StandardGate::T,
                StandardGate::Tdg,
            ]),
            two_qubit: names(&[
                StandardGate::CX,
                StandardGate::CY,
                StandardGate::CZ,
                StandardGate::Swap,
            ]),
            three_qubit: names(&[StandardGate::CCX]),
        }
    }

    /// Check if a gate is supported.
    pub fn contains(&self, gate: &str) -> bool {
        self.single_qubit.iter().any(|g| g == gate)
            || self.two_qubit.iter().any(|g| g == gate)
            || self.three_qubit.iter().any(|g| g == gate)
    }
}
