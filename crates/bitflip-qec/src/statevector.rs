//! Statevector snapshots of the pipeline and their text rendering.
//!
//! Basis labels put qubit 0 first: amplitude index `k` is labelled by the
//! bits of `k` read from least to most significant, so index 1 is `100`.

use num_complex::Complex64;
use serde::Serialize;
use tracing::instrument;

use bitflip_hal::StatevectorBackend;

use crate::error::QecResult;
use crate::majority::CODE_LENGTH;
use crate::recipe::{Recipe, RecipeBuilder, Stage};
use crate::state::{CorrectionMode, ErrorSelection, InitialState};

/// Magnitudes below this are printed as zero and left out of kets.
pub const DISPLAY_EPSILON: f64 = 1e-10;

/// Basis label of amplitude index `index` over `num_qubits` qubits.
pub fn basis_label(index: usize, num_qubits: usize) -> String {
    (0..num_qubits)
        .map(|q| if index & (1 << q) != 0 { '1' } else { '0' })
        .collect()
}

/// Labels of all basis states in amplitude order.
pub fn basis_labels(num_qubits: usize) -> Vec<String> {
    (0..1usize << num_qubits)
        .map(|i| basis_label(i, num_qubits))
        .collect()
}

/// State after one stage of the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct StageSnapshot {
    /// Stage the snapshot was taken after.
    pub stage: &'static str,
    /// Amplitudes in basis-index order.
    pub amplitudes: Vec<Complex64>,
    /// `|a|²` for each amplitude.
    pub probabilities: Vec<f64>,
    /// Dirac rendering.
    pub ket: String,
}

impl StageSnapshot {
    fn new(stage: &'static str, amplitudes: Vec<Complex64>) -> Self {
        let probabilities = amplitudes.iter().map(Complex64::norm_sqr).collect();
        let ket = format_ket(&amplitudes);
        Self {
            stage,
            amplitudes,
            probabilities,
            ket,
        }
    }
}

/// The four pipeline snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct StageSnapshots {
    /// After state preparation.
    pub initial: StageSnapshot,
    /// After encoding.
    pub encoded: StageSnapshot,
    /// After the bit flip.
    pub with_error: StageSnapshot,
    /// After mirror correction.
    pub corrected: StageSnapshot,
}

impl StageSnapshots {
    /// Snapshots in pipeline order.
    pub fn iter(&self) -> impl Iterator<Item = &StageSnapshot> {
        [&self.initial, &self.encoded, &self.with_error, &self.corrected].into_iter()
    }
}

/// Evolve the pipeline for `initial` with a flip on `error_qubit` and
/// capture the state after each stage.
#[instrument(skip(backend))]
pub async fn stage_snapshots(
    backend: &dyn StatevectorBackend,
    initial: InitialState,
    error_qubit: usize,
) -> QecResult<StageSnapshots> {
    let recipe = RecipeBuilder::new(initial)
        .error(ErrorSelection::fixed(error_qubit)?)
        .correction(CorrectionMode::Mirror)
        .measure(false)
        .barriers(false)
        .build()?;

    Ok(StageSnapshots {
        initial: snapshot(backend, &recipe, "initial", Stage::Init).await?,
        encoded: snapshot(backend, &recipe, "encoded", Stage::Encode).await?,
        with_error: snapshot(backend, &recipe, "with_error", Stage::Error).await?,
        corrected: snapshot(backend, &recipe, "corrected", Stage::Correct).await?,
    })
}

async fn snapshot(
    backend: &dyn StatevectorBackend,
    recipe: &Recipe,
    name: &'static str,
    stage: Stage,
) -> QecResult<StageSnapshot> {
    let circuit = recipe.circuit_through(stage)?;
    let amplitudes = backend.statevector(&circuit).await?;
    Ok(StageSnapshot::new(name, amplitudes))
}

/// Render a complex amplitude.
///
/// Parts below [`DISPLAY_EPSILON`] are dropped; a pure imaginary unit
/// prints as `i` or `-i`.
pub fn format_complex(value: Complex64, precision: usize) -> String {
    let re = if value.re.abs() < DISPLAY_EPSILON { 0.0 } else { value.re };
    let im = if value.im.abs() < DISPLAY_EPSILON { 0.0 } else { value.im };

    if im == 0.0 {
        format!("{re:.precision$}")
    } else if re == 0.0 {
        if (im - 1.0).abs() < DISPLAY_EPSILON {
            "i".to_string()
        } else if (im + 1.0).abs() < DISPLAY_EPSILON {
            "-i".to_string()
        } else {
            format!("{im:.precision$}i")
        }
    } else {
        let sign = if im >= 0.0 { "+" } else { "" };
        format!("{re:.precision$}{sign}{im:.precision$}i")
    }
}

/// Dirac notation of the non-zero terms, e.g. `1/√2|000⟩ + 1/√2|111⟩`.
pub fn format_ket(amplitudes: &[Complex64]) -> String {
    let num_qubits = amplitudes.len().max(1).trailing_zeros() as usize;
    let mut terms: Vec<(String, String)> = amplitudes
        .iter()
        .enumerate()
        .filter(|(_, a)| a.norm() > DISPLAY_EPSILON)
        .map(|(i, a)| (basis_label(i, num_qubits), coefficient(*a)))
        .collect();

    if terms.is_empty() {
        return format!("|{}⟩", "0".repeat(num_qubits.max(CODE_LENGTH)));
    }
    terms.sort();

    let joined = terms
        .iter()
        .map(|(label, coeff)| format!("{coeff}|{label}⟩"))
        .collect::<Vec<_>>()
        .join(" + ");
    joined.replace(" + -", " - ")
}

fn coefficient(amplitude: Complex64) -> String {
    let text = format_complex(amplitude, 4);
    match text.as_str() {
        "0.7071" => "1/√2".to_string(),
        "-0.7071" => "-1/√2".to_string(),
        "1.0000" => String::new(),
        "-1.0000" => "-".to_string(),
        _ => text,
    }
}

/// `|⟨a|b⟩|²`.
pub fn fidelity(a: &[Complex64], b: &[Complex64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.conj() * y)
        .sum::<Complex64>()
        .norm_sqr()
}

/// Coarse reading of a fidelity value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Similarity {
    /// Above 0.9999.
    Identical,
    /// Above 0.99.
    VerySimilar,
    /// Anything lower.
    Different,
}

impl Similarity {
    /// Classify a fidelity.
    pub fn classify(fidelity: f64) -> Self {
        if fidelity > 0.9999 {
            Self::Identical
        } else if fidelity > 0.99 {
            Self::VerySimilar
        } else {
            Self::Different
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitflip_adapter_sim::SimulatorBackend;

    const H: f64 = std::f64::consts::FRAC_1_SQRT_2;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    #[test]
    fn test_basis_labels_put_qubit_zero_first() {
        assert_eq!(basis_label(1, 3), "100");
        assert_eq!(basis_label(6, 3), "011");
        assert_eq!(basis_labels(3).len(), 8);
    }

    #[test]
    fn test_format_complex() {
        assert_eq!(format_complex(c(1.0, 0.0), 4), "1.0000");
        assert_eq!(format_complex(c(1e-12, 0.0), 4), "0.0000");
        assert_eq!(format_complex(c(0.0, 1.0), 4), "i");
        assert_eq!(format_complex(c(0.0, -1.0), 4), "-i");
        assert_eq!(format_complex(c(0.0, 0.5), 2), "0.50i");
        assert_eq!(format_complex(c(0.5, -0.5), 3), "0.500-0.500i");
        assert_eq!(format_complex(c(0.5, 0.25), 2), "0.50+0.25i");
    }

    #[test]
    fn test_format_ket() {
        let mut ghz = vec![c(0.0, 0.0); 8];
        ghz[0] = c(H, 0.0);
        ghz[7] = c(-H, 0.0);
        assert_eq!(format_ket(&ghz), "1/√2|000⟩ - 1/√2|111⟩");

        let mut one = vec![c(0.0, 0.0); 8];
        one[1] = c(1.0, 0.0);
        assert_eq!(format_ket(&one), "|100⟩");

        one[1] = c(-1.0, 0.0);
        assert_eq!(format_ket(&one), "-|100⟩");

        assert_eq!(format_ket(&[c(0.0, 0.0); 8]), "|000⟩");
    }

    #[test]
    fn test_fidelity() {
        let a = [c(1.0, 0.0), c(0.0, 0.0)];
        let b = [c(H, 0.0), c(H, 0.0)];
        assert!((fidelity(&a, &a) - 1.0).abs() < 1e-12);
        assert!((fidelity(&a, &b) - 0.5).abs() < 1e-12);
        assert_eq!(Similarity::classify(fidelity(&a, &a)), Similarity::Identical);
        assert_eq!(Similarity::classify(0.995), Similarity::VerySimilar);
        assert_eq!(Similarity::classify(0.5), Similarity::Different);
    }

    #[tokio::test]
    async fn test_correction_restores_encoded_state() {
        let backend = SimulatorBackend::new();
        for initial in InitialState::ALL {
            for q in 0..3 {
                let snaps = stage_snapshots(&backend, initial, q).await.unwrap();
                let restored = fidelity(&snaps.encoded.amplitudes, &snaps.corrected.amplitudes);
                assert_eq!(Similarity::classify(restored), Similarity::Identical);
            }
        }
    }

    #[tokio::test]
    async fn test_error_is_orthogonal_for_basis_inputs() {
        let backend = SimulatorBackend::new();
        let snaps = stage_snapshots(&backend, InitialState::One, 2).await.unwrap();
        assert_eq!(snaps.initial.ket, "|100⟩");
        assert_eq!(snaps.encoded.ket, "|111⟩");
        assert_eq!(snaps.with_error.ket, "|110⟩");
        assert!(fidelity(&snaps.encoded.amplitudes, &snaps.with_error.amplitudes) < 1e-12);
        assert!((snaps.with_error.probabilities[0b011] - 1.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_plus_snapshot_ket() {
        let backend = SimulatorBackend::new();
        let snaps = stage_snapshots(&backend, InitialState::Plus, 0).await.unwrap();
        assert_eq!(snaps.encoded.ket, "1/√2|000⟩ + 1/√2|111⟩");
        assert_eq!(snaps.iter().count(), 4);
    }

    #[tokio::test]
    async fn test_invalid_qubit() {
        let backend = SimulatorBackend::new();
        let err = stage_snapshots(&backend, InitialState::Zero, 5).await.unwrap_err();
        assert!(err.is_invalid_input());
    }
}
