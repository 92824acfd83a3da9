//! Experiment inputs: logical state, error selection and correction mode.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QecError;
use crate::majority::CODE_LENGTH;

/// Logical input state prepared on qubit 0 before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InitialState {
    /// |0⟩
    #[serde(rename = "0")]
    Zero,
    /// |1⟩, prepared with X.
    #[serde(rename = "1")]
    One,
    /// |+⟩, prepared with H.
    #[serde(rename = "+")]
    Plus,
    /// |−⟩, prepared with X then H.
    #[serde(rename = "-")]
    Minus,
}

impl InitialState {
    /// All four inputs.
    pub const ALL: [InitialState; 4] = [Self::Zero, Self::One, Self::Plus, Self::Minus];

    /// The two computational basis inputs.
    pub const BASIS: [InitialState; 2] = [Self::Zero, Self::One];

    /// Short symbol as accepted by [`FromStr`].
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Zero => "0",
            Self::One => "1",
            Self::Plus => "+",
            Self::Minus => "-",
        }
    }

    /// Whether the input is a superposition of the basis states.
    pub fn is_superposition(&self) -> bool {
        matches!(self, Self::Plus | Self::Minus)
    }
}

impl fmt::Display for InitialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for InitialState {
    type Err = QecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" => Ok(Self::Zero),
            "1" => Ok(Self::One),
            "+" => Ok(Self::Plus),
            "-" => Ok(Self::Minus),
            other => Err(QecError::invalid(format!(
                "unknown initial state '{other}', expected one of 0, 1, +, -"
            ))),
        }
    }
}

/// Where a bit-flip error is injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorSelection {
    /// No error.
    #[default]
    None,
    /// Flip this qubit.
    Fixed(usize),
    /// Flip a qubit drawn uniformly from {0, 1, 2}.
    Random,
}

impl ErrorSelection {
    /// Select a fixed qubit, rejecting indices outside the code.
    pub fn fixed(qubit: usize) -> Result<Self, QecError> {
        check_qubit(qubit)?;
        Ok(Self::Fixed(qubit))
    }

    /// `Random` when `random` is set, otherwise the given qubit.
    pub fn from_request(qubit: Option<usize>, random: bool) -> Result<Self, QecError> {
        match (random, qubit) {
            (true, _) => Ok(Self::Random),
            (false, Some(q)) => Self::fixed(q),
            (false, None) => Ok(Self::None),
        }
    }
}

impl fmt::Display for ErrorSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Fixed(q) => write!(f, "q{q}"),
            Self::Random => f.write_str("random"),
        }
    }
}

/// Reject qubit indices outside {0, 1, 2}.
pub fn check_qubit(qubit: usize) -> Result<usize, QecError> {
    if qubit < CODE_LENGTH {
        Ok(qubit)
    } else {
        Err(QecError::invalid(format!(
            "error qubit must be 0, 1 or 2, got {qubit}"
        )))
    }
}

/// How the injected error is undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrectionMode {
    /// Leave the error in place.
    None,
    /// Flip the injected qubit back without reading a syndrome.
    #[default]
    Mirror,
    /// Read the data qubits mid-circuit and flip the qubit the majority
    /// vote blames. Collapses superposition inputs onto a codeword.
    Syndrome,
}

impl CorrectionMode {
    /// Lowercase name as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Mirror => "mirror",
            Self::Syndrome => "syndrome",
        }
    }
}

impl fmt::Display for CorrectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CorrectionMode {
    type Err = QecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "mirror" => Ok(Self::Mirror),
            "syndrome" => Ok(Self::Syndrome),
            other => Err(QecError::invalid(format!(
                "unknown correction mode '{other}', expected none, mirror or syndrome"
            ))),
        }
    }
}

/// Readout that counts as a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedOutcome {
    /// Exactly this readout.
    Exact(String),
    /// Either codeword, for superposition inputs.
    Either(String, String),
}

impl ExpectedOutcome {
    /// Whether `bits` counts as a success.
    pub fn matches(&self, bits: &str) -> bool {
        match self {
            Self::Exact(e) => e == bits,
            Self::Either(a, b) => a == bits || b == bits,
        }
    }

    /// The accepted readouts.
    pub fn outcomes(&self) -> Vec<&str> {
        match self {
            Self::Exact(e) => vec![e.as_str()],
            Self::Either(a, b) => vec![a.as_str(), b.as_str()],
        }
    }
}

impl fmt::Display for ExpectedOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(e) => f.write_str(e),
            Self::Either(a, b) => write!(f, "{a}|{b}"),
        }
    }
}

impl Serialize for ExpectedOutcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
