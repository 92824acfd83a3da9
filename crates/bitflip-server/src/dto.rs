//! Data Transfer Objects for the REST API.
//!
//! These types bridge the error-correction core to JSON request and response
//! bodies. Every successful response is wrapped in [`Envelope`], which adds
//! `"success": true`.

use std::collections::BTreeMap;

use num_complex::Complex64;
use serde::{Deserialize, Deserializer, Serialize};

use bitflip_hal::Counts;
use bitflip_ir::{Circuit, CircuitDag, Instruction, InstructionKind, QubitId};
use bitflip_qec::{
    Correction, CorrectionMode, ExpectedOutcome, InitialState, MajorityVote, StageSnapshot,
    format_complex,
};

use crate::blob::{BlobInfo, StoredBlob};

/// Successful response body.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

impl<T> Envelope<T> {
    pub fn ok(body: T) -> Self {
        Self {
            success: true,
            body,
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Body accepted by the circuit endpoints.
///
/// Every field is optional; `state` and `error_qubit` accept either JSON
/// strings or numbers.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CircuitRequest {
    #[serde(deserialize_with = "string_or_number")]
    pub state: Option<String>,
    pub error_qubit: Option<i64>,
    pub shots: Option<u32>,
    pub random_error: bool,
    pub decode: bool,
    pub mode: Option<CorrectionMode>,
}

impl CircuitRequest {
    /// Requested initial state, `"0"` when absent.
    pub fn initial_state(&self) -> Result<InitialState, bitflip_qec::QecError> {
        self.state.as_deref().unwrap_or("0").parse()
    }

    /// Requested error qubit, `default` when absent.
    pub fn error_qubit_or(&self, default: usize) -> Result<usize, bitflip_qec::QecError> {
        match self.error_qubit {
            None => Ok(default),
            Some(q) => usize::try_from(q)
                .ok()
                .filter(|q| *q < bitflip_qec::CODE_LENGTH)
                .ok_or_else(|| {
                    bitflip_qec::QecError::invalid(format!(
                        "Invalid qubit {q}: must be 0, 1 or 2"
                    ))
                }),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(i64),
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<StringOrNumber>::deserialize(deserializer)?.map(|v| match v {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }),
    )
}

/// Body of `/majority`.
#[derive(Debug, Deserialize)]
pub struct MajorityRequest {
    pub bits: String,
}

// ============================================================================
// Circuit responses
// ============================================================================

/// `/encode`
#[derive(Debug, Serialize)]
pub struct EncodeResponse {
    pub initial_state: InitialState,
    pub encoded_state: ExpectedOutcome,
    pub circuit: Vec<String>,
    pub measurements: Counts,
    pub shots: u32,
}

/// `/error`, `/add_error`, `/error/random`
#[derive(Debug, Serialize)]
pub struct ErrorRunResponse {
    pub initial_state: InitialState,
    pub error_qubit: Option<usize>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub randomly_selected: bool,
    pub circuit: Vec<String>,
    pub measurements: Counts,
    pub shots: u32,
}

/// `/correct`, `/correct_error`
#[derive(Debug, Serialize)]
pub struct CorrectResponse {
    pub initial_state: InitialState,
    pub error_qubit: Option<usize>,
    pub mode: CorrectionMode,
    pub expected_state: ExpectedOutcome,
    pub success_rate: f64,
    pub circuit: Vec<String>,
    pub measurements: Counts,
    pub shots: u32,
}

/// Summary block of `/pipeline`.
#[derive(Debug, Serialize)]
pub struct PipelineSummary {
    pub initial_state: InitialState,
    pub error_qubit: Option<usize>,
    pub randomly_selected: bool,
    pub mode: CorrectionMode,
    pub decoded: bool,
    pub expected_state: ExpectedOutcome,
    pub success_rate: f64,
    pub corrected: bool,
}

/// `/pipeline`
#[derive(Debug, Serialize)]
pub struct PipelineResponse {
    pub pipeline: PipelineSummary,
    pub circuit: Vec<String>,
    pub measurements: Counts,
    pub shots: u32,
}

/// A statevector entry: plain number when real, string otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AmplitudeView {
    Real(f64),
    Complex(String),
}

impl From<Complex64> for AmplitudeView {
    fn from(c: Complex64) -> Self {
        if c.im == 0.0 {
            AmplitudeView::Real(c.re)
        } else {
            AmplitudeView::Complex(format_complex(c, 4))
        }
    }
}

/// One stage of `/statevector`.
#[derive(Debug, Serialize)]
pub struct StageView {
    pub statevector: Vec<AmplitudeView>,
    pub probabilities: Vec<f64>,
    pub ket: String,
}

impl From<&StageSnapshot> for StageView {
    fn from(s: &StageSnapshot) -> Self {
        Self {
            statevector: s.amplitudes.iter().copied().map(AmplitudeView::from).collect(),
            probabilities: s.probabilities.clone(),
            ket: s.ket.clone(),
        }
    }
}

/// `/statevector`
#[derive(Debug, Serialize)]
pub struct StatevectorResponse {
    pub initial_state: InitialState,
    pub error_qubit: usize,
    pub randomly_selected: bool,
    pub stages: BTreeMap<&'static str, StageView>,
    pub basis_states: Vec<String>,
}

/// `/visualize_circuit`
#[derive(Debug, Serialize)]
pub struct CircuitVisualization {
    pub name: String,
    pub circuit: Vec<String>,
    pub depth: usize,
    pub gate_count: usize,
    pub num_qubits: usize,
    pub num_clbits: usize,
    pub operations: BTreeMap<String, usize>,
    /// Operations organized by time layer for visualization.
    pub layers: Vec<CircuitLayer>,
}

/// A single time layer in the circuit.
#[derive(Debug, Serialize)]
pub struct CircuitLayer {
    /// Depth index (0-based).
    pub depth: usize,
    /// Operations at this depth.
    pub operations: Vec<OperationView>,
}

/// A single operation for visualization.
#[derive(Debug, Serialize)]
pub struct OperationView {
    /// Gate name (e.g., "h", "cx", "measure").
    pub gate: String,
    /// Display label (e.g., "H", "CX", "Error@q1").
    pub label: String,
    /// Qubit indices this operation acts on.
    pub qubits: Vec<u32>,
    /// Classical bit indices (measurements and conditions).
    pub clbits: Vec<u32>,
    pub is_measurement: bool,
    pub is_barrier: bool,
    pub is_conditional: bool,
}

impl CircuitVisualization {
    /// Create a visualization from a Circuit.
    pub fn from_circuit(circuit: &Circuit) -> Self {
        Self {
            name: circuit.name().to_string(),
            circuit: bitflip_ir::draw_lines(circuit),
            depth: circuit.depth(),
            gate_count: circuit.count_ops().values().sum(),
            num_qubits: circuit.num_qubits(),
            num_clbits: circuit.num_clbits(),
            operations: circuit.count_ops(),
            layers: circuit_to_layers(circuit.dag()),
        }
    }
}

/// Group operations by the earliest layer they can occupy.
fn circuit_to_layers(dag: &CircuitDag) -> Vec<CircuitLayer> {
    let mut layers: Vec<CircuitLayer> = vec![];
    let mut qubit_depth: BTreeMap<QubitId, usize> = BTreeMap::new();

    for (_, instruction) in dag.topological_ops() {
        let op_depth = instruction
            .qubits
            .iter()
            .map(|q| qubit_depth.get(q).copied().unwrap_or(0))
            .max()
            .unwrap_or(0);

        while layers.len() <= op_depth {
            layers.push(CircuitLayer {
                depth: layers.len(),
                operations: vec![],
            });
        }
        layers[op_depth]
            .operations
            .push(instruction_to_view(instruction));

        for q in &instruction.qubits {
            qubit_depth.insert(*q, op_depth + 1);
        }
    }

    layers
}

fn instruction_to_view(instruction: &Instruction) -> OperationView {
    let (gate, label) = match &instruction.kind {
        InstructionKind::Gate(g) => (g.name().to_string(), g.name().to_uppercase()),
        InstructionKind::Measure => ("measure".to_string(), "M".to_string()),
        InstructionKind::Reset => ("reset".to_string(), "|0⟩".to_string()),
        InstructionKind::Barrier { label } => (
            "barrier".to_string(),
            label.clone().unwrap_or_else(|| "║".to_string()),
        ),
    };

    let clbits = match instruction.condition() {
        Some(cond) => cond.clbits.iter().map(|c| c.0).collect(),
        None => instruction.clbits.iter().map(|c| c.0).collect(),
    };

    OperationView {
        gate,
        label,
        qubits: instruction.qubits.iter().map(|q| q.0).collect(),
        clbits,
        is_measurement: instruction.is_measure(),
        is_barrier: instruction.is_barrier(),
        is_conditional: instruction.condition().is_some(),
    }
}

/// `/majority`
#[derive(Debug, Serialize)]
pub struct MajorityResponse {
    #[serde(flatten)]
    pub vote: MajorityVote,
    pub correction: Correction,
}

// ============================================================================
// System responses
// ============================================================================

/// `/health`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub simulator: String,
    pub version: String,
}

impl HealthResponse {
    pub fn healthy(simulator: &str) -> Self {
        Self {
            status: "healthy".to_string(),
            service: "quantum-error-correction".to_string(),
            simulator: simulator.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// ============================================================================
// Blob responses
// ============================================================================

/// `/upload`
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    #[serde(flatten)]
    pub blob: StoredBlob,
    pub size_formatted: String,
    pub download_url: String,
}

/// `/files`
#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub count: usize,
    pub files: Vec<BlobInfo>,
}

/// `/delete/{filename}`
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub filename: String,
}
