//! Quantum gate types.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::qubit::ClbitId;

/// Standard gates with known semantics.
///
/// Only the fixed (non-parametric) gate set is modelled; the bit-flip code
/// never needs continuous rotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StandardGate {
    // Single-qubit Pauli gates
    /// Identity gate.
    I,
    /// Pauli-X gate (bit flip).
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate (phase flip).
    Z,

    // Single-qubit Clifford gates
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,

    // Two-qubit gates
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Y gate.
    CY,
    /// Controlled-Z gate.
    CZ,
    /// SWAP gate.
    Swap,

    // Three-qubit gates
    /// Toffoli gate (CCX).
    CCX,
}

impl StandardGate {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::I => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::T => "t",
            StandardGate::Tdg => "tdg",
            StandardGate::CX => "cx",
            StandardGate::CY => "cy",
            StandardGate::CZ => "cz",
            StandardGate::Swap => "swap",
            StandardGate::CCX => "ccx",
        }
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            StandardGate::I
            | StandardGate::X
            | StandardGate::Y
            | StandardGate::Z
            | StandardGate::H
            | StandardGate::S
            | StandardGate::Sdg
            | StandardGate::T
            | StandardGate::Tdg => 1,

            StandardGate::CX | StandardGate::CY | StandardGate::CZ | StandardGate::Swap => 2,

            StandardGate::CCX => 3,
        }
    }

    /// Symbol used by the text drawer for the target of this gate.
    pub fn symbol(&self) -> &'static str {
        match self {
            StandardGate::I => "I",
            StandardGate::X | StandardGate::CX | StandardGate::CCX => "X",
            StandardGate::Y | StandardGate::CY => "Y",
            StandardGate::Z | StandardGate::CZ => "Z",
            StandardGate::H => "H",
            StandardGate::S => "S",
            StandardGate::Sdg => "Sdg",
            StandardGate::T => "T",
            StandardGate::Tdg => "Tdg",
            StandardGate::Swap => "x",
        }
    }

    /// Number of leading control qubits.
    pub fn num_controls(&self) -> usize {
        match self {
            StandardGate::CX | StandardGate::CY | StandardGate::CZ => 1,
            StandardGate::CCX => 2,
            _ => 0,
        }
    }
}

/// Classical condition for conditional gates.
///
/// The gate fires when the listed classical bits, read as an unsigned
/// integer with `clbits[0]` as the least significant bit, equal `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassicalCondition {
    /// The classical bits the condition reads.
    pub clbits: Vec<ClbitId>,
    /// The value to compare against.
    pub value: u64,
}

impl ClassicalCondition {
    /// Create a new classical condition.
    pub fn new(clbits: impl IntoIterator<Item = ClbitId>, value: u64) -> IrResult<Self> {
        let clbits: Vec<_> = clbits.into_iter().collect();
        let width = clbits.len();
        if width < 64 && value >> width != 0 {
            return Err(IrError::ConditionOverflow { value, width });
        }
        Ok(Self { clbits, value })
    }

    /// Condition on a bit pattern, one character per condition bit in
    /// `clbits` order (`'1'` means set).
    pub fn from_pattern(clbits: impl IntoIterator<Item = ClbitId>, pattern: &str) -> IrResult<Self> {
        let value = pattern
            .chars()
            .enumerate()
            .filter(|&(_, c)| c == '1')
            .fold(0u64, |acc, (i, _)| acc | (1 << i));
        Self::new(clbits, value)
    }

    /// Render the expected value as a bit pattern in `clbits` order.
    pub fn pattern(&self) -> String {
        (0..self.clbits.len())
            .map(|i| if (self.value >> i) & 1 == 1 { '1' } else { '0' })
            .collect()
    }

    /// Evaluate the condition against a classical register.
    pub fn is_satisfied(&self, register: &[bool]) -> bool {
        self.clbits.iter().enumerate().all(|(i, clbit)| {
            let expected = (self.value >> i) & 1 == 1;
            register.get(clbit.0 as usize).copied().unwrap_or(false) == expected
        })
    }
}

/// A gate with associated metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    /// The kind of gate.
    pub kind: StandardGate,
    /// Optional label for the gate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Optional classical condition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<ClassicalCondition>,
}

impl Gate {
    /// Create a new gate from a standard gate.
    pub fn standard(gate: StandardGate) -> Self {
        Self {
            kind: gate,
            label: None,
            condition: None,
        }
    }

    /// Add a label to the gate.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Add a classical condition to the gate.
    #[must_use]
    pub fn with_condition(mut self, condition: ClassicalCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Get the name of this gate.
    pub fn name(&self) -> &str {
        self.kind.name()
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> u32 {
        self.kind.num_qubits()
    }
}

impl From<StandardGate> for Gate {
    fn from(gate: StandardGate) -> Self {
        Gate::standard(gate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_gate_properties() {
        assert_eq!(StandardGate::H.num_qubits(), 1);
        assert_eq!(StandardGate::CX.num_qubits(), 2);
        assert_eq!(StandardGate::CCX.num_qubits(), 3);
        assert_eq!(StandardGate::CX.num_controls(), 1);
        assert_eq!(StandardGate::X.num_controls(), 0);
    }

    #[test]
    fn test_gate_creation() {
        let x = Gate::standard(StandardGate::X);
        assert_eq!(x.name(), "x");
        assert_eq!(x.num_qubits(), 1);
        assert!(x.label.is_none());
        assert!(x.condition.is_none());

        let labeled = Gate::standard(StandardGate::X).with_label("error");
        assert_eq!(labeled.label.as_deref(), Some("error"));
    }

    #[test]
    fn test_condition_pattern() {
        let cond = ClassicalCondition::from_pattern([ClbitId(3), ClbitId(4), ClbitId(5)], "010")
            .unwrap();
        assert_eq!(cond.value, 0b010);
        assert_eq!(cond.pattern(), "010");

        let cond = ClassicalCondition::from_pattern([ClbitId(0), ClbitId(1), ClbitId(2)], "110")
            .unwrap();
        assert_eq!(cond.value, 0b011);
        assert_eq!(cond.pattern(), "110");
    }

    #[test]
    fn test_condition_evaluation() {
        let cond = ClassicalCondition::from_pattern([ClbitId(1), ClbitId(2)], "01").unwrap();
        assert!(cond.is_satisfied(&[true, false, true]));
        assert!(!cond.is_satisfied(&[false, true, true]));
        assert!(!cond.is_satisfied(&[false, false, false]));
    }

    #[test]
    fn test_condition_overflow() {
        let err = ClassicalCondition::new([ClbitId(0)], 2).unwrap_err();
        assert!(matches!(err, IrError::ConditionOverflow { value: 2, width: 1 }));
    }
}
