//! Circuit recipes for the 3-qubit bit-flip code.
//!
//! A [`Recipe`] is the ordered list of abstract operations for one
//! experiment. Stages run in a fixed order and each appears at most once:
//!
//! ```text
//!   Init ──→ Encode ──→ (Error) ──→ (Correct) ──→ (Decode) ──→ Measure
//! ```
//!
//! [`Recipe::to_circuit`] lowers the recipe to a [`Circuit`] for a backend.

use std::fmt;

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use bitflip_ir::{Circuit, ClassicalCondition, ClbitId, QubitId};

use crate::error::{QecError, QecResult};
use crate::majority::{CODE_LENGTH, correction_table};
use crate::state::{CorrectionMode, ErrorSelection, ExpectedOutcome, InitialState, check_qubit};

/// Name of the final readout register.
pub const RESULT_REGISTER: &str = "c";
/// Name of the mid-circuit readout register used by syndrome correction.
pub const SYNDROME_REGISTER: &str = "syndrome";

/// Pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// State preparation on the logical qubit.
    Init,
    /// Copy the logical qubit onto the two carriers.
    Encode,
    /// Bit-flip injection.
    Error,
    /// Undo the injected flip.
    Correct,
    /// Move the logical value back onto qubit 0.
    Decode,
    /// Read out all three qubits.
    Measure,
}

/// Abstract operation of a recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Bit flip (X).
    Flip(usize),
    /// Hadamard.
    Superpose(usize),
    /// Controlled copy (CX).
    Copy {
        /// Control.
        from: usize,
        /// Target.
        to: usize,
    },
    /// Read every data qubit into the syndrome register.
    MeasureSyndrome,
    /// Flip `qubit` when the syndrome register reads `syndrome`.
    ConditionalFlip {
        /// Qubit to flip.
        qubit: usize,
        /// Syndrome pattern, character `i` for qubit `i`.
        syndrome: String,
    },
    /// Read one qubit into the result register.
    Measure(usize),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flip(q) => write!(f, "x q{q}"),
            Self::Superpose(q) => write!(f, "h q{q}"),
            Self::Copy { from, to } => write!(f, "cx q{from}, q{to}"),
            Self::MeasureSyndrome => f.write_str("measure q -> syndrome"),
            Self::ConditionalFlip { qubit, syndrome } => {
                write!(f, "if (syndrome == {syndrome}) x q{qubit}")
            }
            Self::Measure(q) => write!(f, "measure q{q} -> c{q}"),
        }
    }
}

/// One operation tagged with its stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Stage the operation belongs to.
    pub stage: Stage,
    /// The operation.
    pub op: Operation,
}

/// Fluent builder for [`Recipe`].
#[derive(Debug, Clone)]
pub struct RecipeBuilder {
    initial: InitialState,
    error: ErrorSelection,
    error_probability: f64,
    correction: CorrectionMode,
    decode: bool,
    measure: bool,
    barriers: bool,
}

impl RecipeBuilder {
    /// Start a recipe for `initial`: no error, no correction, measured,
    /// with stage barriers.
    pub fn new(initial: InitialState) -> Self {
        Self {
            initial,
            error: ErrorSelection::None,
            error_probability: 1.0,
            correction: CorrectionMode::None,
            decode: false,
            measure: true,
            barriers: true,
        }
    }

    /// Where to inject the bit flip.
    #[must_use]
    pub fn error(mut self, error: ErrorSelection) -> Self {
        self.error = error;
        self
    }

    /// Probability that the selected error is actually injected.
    #[must_use]
    pub fn error_probability(mut self, p: f64) -> Self {
        self.error_probability = p;
        self
    }

    /// How the error is undone.
    #[must_use]
    pub fn correction(mut self, mode: CorrectionMode) -> Self {
        self.correction = mode;
        self
    }

    /// Append the decoding CNOT pair.
    #[must_use]
    pub fn decode(mut self, decode: bool) -> Self {
        self.decode = decode;
        self
    }

    /// Append the final readout.
    #[must_use]
    pub fn measure(mut self, measure: bool) -> Self {
        self.measure = measure;
        self
    }

    /// Close each stage with a labelled barrier when lowering.
    #[must_use]
    pub fn barriers(mut self, barriers: bool) -> Self {
        self.barriers = barriers;
        self
    }

    /// Validate the options and resolve random choices.
    pub fn build(self) -> QecResult<Recipe> {
        self.build_with_rng(&mut rand::thread_rng())
    }

    /// [`build`](Self::build) with a caller-supplied random source.
    pub fn build_with_rng<R: Rng + ?Sized>(self, rng: &mut R) -> QecResult<Recipe> {
        if !(0.0..=1.0).contains(&self.error_probability) {
            return Err(QecError::invalid(format!(
                "error probability must be within [0, 1], got {}",
                self.error_probability
            )));
        }

        let (selected, randomly_selected) = match self.error {
            ErrorSelection::None => (None, false),
            ErrorSelection::Fixed(q) => (Some(check_qubit(q)?), false),
            ErrorSelection::Random => (Some(rng.gen_range(0..CODE_LENGTH)), true),
        };
        let error_qubit = match selected {
            Some(_) if rng.r#gen::<f64>() >= self.error_probability => {
                debug!("error on {:?} skipped by probability draw", selected);
                None
            }
            other => other,
        };

        let mut steps = Vec::new();
        let mut push = |stage, op| steps.push(Step { stage, op });

        match self.initial {
            InitialState::Zero => {}
            InitialState::One => push(Stage::Init, Operation::Flip(0)),
            InitialState::Plus => push(Stage::Init, Operation::Superpose(0)),
            InitialState::Minus => {
                push(Stage::Init, Operation::Flip(0));
                push(Stage::Init, Operation::Superpose(0));
            }
        }

        push(Stage::Encode, Operation::Copy { from: 0, to: 1 });
        push(Stage::Encode, Operation::Copy { from: 0, to: 2 });

        if let Some(q) = error_qubit {
            push(Stage::Error, Operation::Flip(q));
            match self.correction {
                CorrectionMode::None => {}
                CorrectionMode::Mirror => push(Stage::Correct, Operation::Flip(q)),
                CorrectionMode::Syndrome => {
                    push(Stage::Correct, Operation::MeasureSyndrome);
                    for (syndrome, position) in correction_table() {
                        if let Some(qubit) = position {
                            push(Stage::Correct, Operation::ConditionalFlip { qubit, syndrome });
                        }
                    }
                }
            }
        }

        if self.decode {
            push(Stage::Decode, Operation::Copy { from: 0, to: 2 });
            push(Stage::Decode, Operation::Copy { from: 0, to: 1 });
        }

        if self.measure {
            for q in 0..CODE_LENGTH {
                push(Stage::Measure, Operation::Measure(q));
            }
        }

        let one = if self.decode { "100" } else { "111" };
        let expected = match self.initial {
            InitialState::Zero => ExpectedOutcome::Exact("000".into()),
            InitialState::One => ExpectedOutcome::Exact(one.into()),
            InitialState::Plus | InitialState::Minus => {
                ExpectedOutcome::Either("000".into(), one.into())
            }
        };

        debug!(
            initial = %self.initial,
            error = ?error_qubit,
            correction = %self.correction,
            steps = steps.len(),
            "built recipe"
        );

        Ok(Recipe {
            initial: self.initial,
            steps,
            error_qubit,
            randomly_selected,
            correction: self.correction,
            decode: self.decode,
            barriers: self.barriers,
            expected,
        })
    }
}

/// Ordered operations of one experiment, with its resolved parameters.
#[derive(Debug, Clone)]
pub struct Recipe {
    initial: InitialState,
    steps: Vec<Step>,
    error_qubit: Option<usize>,
    randomly_selected: bool,
    correction: CorrectionMode,
    decode: bool,
    barriers: bool,
    expected: ExpectedOutcome,
}

impl Recipe {
    /// Encode and measure.
    pub fn encode_only(initial: InitialState) -> QecResult<Self> {
        RecipeBuilder::new(initial).build()
    }

    /// Encode, inject an error and measure.
    pub fn with_error(initial: InitialState, error: ErrorSelection) -> QecResult<Self> {
        RecipeBuilder::new(initial).error(error).build()
    }

    /// Encode, inject an error, correct it and measure.
    pub fn with_correction(
        initial: InitialState,
        error: ErrorSelection,
        mode: CorrectionMode,
    ) -> QecResult<Self> {
        RecipeBuilder::new(initial)
            .error(error)
            .correction(mode)
            .build()
    }

    /// The full pipeline with mirror correction.
    pub fn pipeline(initial: InitialState, error: ErrorSelection) -> QecResult<Self> {
        Self::with_correction(initial, error, CorrectionMode::Mirror)
    }

    /// Input state.
    pub fn initial(&self) -> InitialState {
        self.initial
    }

    /// Operations in execution order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Qubit the error was injected on.
    pub fn error_qubit(&self) -> Option<usize> {
        self.error_qubit
    }

    /// Whether the error qubit was drawn at random.
    pub fn randomly_selected(&self) -> bool {
        self.randomly_selected
    }

    /// Correction mode in effect.
    pub fn correction(&self) -> CorrectionMode {
        self.correction
    }

    /// Whether the decode stage is present.
    pub fn decodes(&self) -> bool {
        self.decode
    }

    /// Readout that counts as success.
    pub fn expected(&self) -> &ExpectedOutcome {
        &self.expected
    }

    /// Whether the recipe ends with a readout.
    pub fn is_measured(&self) -> bool {
        self.steps.iter().any(|s| s.stage == Stage::Measure)
    }

    /// Stages present, in order.
    pub fn stages(&self) -> Vec<Stage> {
        let mut stages: Vec<Stage> = self.steps.iter().map(|s| s.stage).collect();
        stages.dedup();
        stages
    }

    /// Barrier label for a stage.
    pub fn stage_label(&self, stage: Stage) -> String {
        match (stage, self.error_qubit) {
            (Stage::Init, _) => "Init".into(),
            (Stage::Encode, _) => "Encode".into(),
            (Stage::Error, Some(q)) => format!("Error@q{q}"),
            (Stage::Error, None) => "Error".into(),
            (Stage::Correct, _) if self.correction == CorrectionMode::Syndrome => "Syndrome".into(),
            (Stage::Correct, Some(q)) => format!("Correct@q{q}"),
            (Stage::Correct, None) => "Correct".into(),
            (Stage::Decode, _) => "Decode".into(),
            (Stage::Measure, _) => "Measure".into(),
        }
    }

    /// Lower the whole recipe.
    pub fn to_circuit(&self) -> QecResult<Circuit> {
        self.lower(|_| true)
    }

    /// Lower the steps up to and including `last`, without readout.
    ///
    /// Used for per-stage statevector snapshots.
    pub fn circuit_through(&self, last: Stage) -> QecResult<Circuit> {
        self.lower(|stage| stage <= last && stage != Stage::Measure)
    }

    fn lower(&self, keep: impl Fn(Stage) -> bool) -> QecResult<Circuit> {
        let mut circuit = Circuit::new(self.circuit_name());
        let q: Vec<QubitId> = circuit.add_qreg("q", CODE_LENGTH as u32);

        let steps: Vec<&Step> = self.steps.iter().filter(|s| keep(s.stage)).collect();
        let measured = steps.iter().any(|s| s.stage == Stage::Measure);
        let result: Vec<ClbitId> = if measured {
            circuit.add_creg(RESULT_REGISTER, CODE_LENGTH as u32)
        } else {
            Vec::new()
        };
        let mut syndrome: Vec<ClbitId> = Vec::new();
        let mut current = None;

        if self.barriers && steps.first().is_some_and(|s| s.stage != Stage::Init) && keep(Stage::Init) {
            circuit.labeled_barrier(self.stage_label(Stage::Init))?;
        }

        for step in steps {
            if let Some(prev) = current.filter(|&p| p != step.stage) {
                self.close_stage(&mut circuit, prev)?;
            }
            current = Some(step.stage);

            match &step.op {
                Operation::Flip(i) => {
                    circuit.x(q[*i])?;
                }
                Operation::Superpose(i) => {
                    circuit.h(q[*i])?;
                }
                Operation::Copy { from, to } => {
                    circuit.cx(q[*from], q[*to])?;
                }
                Operation::MeasureSyndrome => {
                    syndrome = circuit.add_creg(SYNDROME_REGISTER, CODE_LENGTH as u32);
                    for (qubit, clbit) in q.iter().zip(&syndrome) {
                        circuit.measure(*qubit, *clbit)?;
                    }
                }
                Operation::ConditionalFlip { qubit, syndrome: pattern } => {
                    let cond = ClassicalCondition::from_pattern(syndrome.iter().copied(), pattern)?;
                    circuit.x_if(q[*qubit], cond)?;
                }
                Operation::Measure(i) => {
                    circuit.measure(q[*i], result[*i])?;
                }
            }
        }
        if let Some(last) = current {
            self.close_stage(&mut circuit, last)?;
        }

        Ok(circuit)
    }

    /// Every stage but the readout ends with a barrier carrying its label.
    fn close_stage(&self, circuit: &mut Circuit, stage: Stage) -> QecResult<()> {
        if self.barriers && stage != Stage::Measure {
            circuit.labeled_barrier(self.stage_label(stage))?;
        }
        Ok(())
    }

    fn circuit_name(&self) -> String {
        let error = self
            .error_qubit
            .map_or_else(|| "none".to_string(), |q| format!("q{q}"));
        format!("bitflip_{}_{}_{}", self.initial.symbol(), error, self.correction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn ops(recipe: &Recipe) -> Vec<Operation> {
        recipe.steps().iter().map(|s| s.op.clone()).collect()
    }

    #[test]
    fn test_encode_only_zero() {
        let recipe = Recipe::encode_only(InitialState::Zero).unwrap();
        assert_eq!(
            ops(&recipe),
            vec![
                Operation::Copy { from: 0, to: 1 },
                Operation::Copy { from: 0, to: 2 },
                Operation::Measure(0),
                Operation::Measure(1),
                Operation::Measure(2),
            ]
        );
        assert_eq!(recipe.error_qubit(), None);
        assert_eq!(recipe.expected(), &ExpectedOutcome::Exact("000".into()));
        assert_eq!(recipe.stages(), vec![Stage::Encode, Stage::Measure]);
    }

    #[test]
    fn test_minus_prepares_flip_then_superpose() {
        let recipe = RecipeBuilder::new(InitialState::Minus).measure(false).build().unwrap();
        assert_eq!(
            &ops(&recipe)[..2],
            &[Operation::Flip(0), Operation::Superpose(0)]
        );
        assert!(!recipe.is_measured());
        assert_eq!(
            recipe.expected(),
            &ExpectedOutcome::Either("000".into(), "111".into())
        );
    }

    #[test]
    fn test_pipeline_mirrors_injected_flip() {
        let recipe = Recipe::pipeline(InitialState::One, ErrorSelection::Fixed(2)).unwrap();
        let steps = recipe.steps();
        let error: Vec<_> = steps.iter().filter(|s| s.stage == Stage::Error).collect();
        let correct: Vec<_> = steps.iter().filter(|s| s.stage == Stage::Correct).collect();
        assert_eq!(error.len(), 1);
        assert_eq!(error[0].op, Operation::Flip(2));
        assert_eq!(correct.len(), 1);
        assert_eq!(correct[0].op, Operation::Flip(2));
        assert_eq!(recipe.expected(), &ExpectedOutcome::Exact("111".into()));
    }

    #[test]
    fn test_invalid_error_qubit() {
        let err = Recipe::with_error(InitialState::Zero, ErrorSelection::Fixed(3)).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_invalid_probability() {
        for p in [-0.1, 1.5, f64::NAN] {
            let err = RecipeBuilder::new(InitialState::Zero)
                .error_probability(p)
                .build()
                .unwrap_err();
            assert!(err.is_invalid_input());
        }
    }

    #[test]
    fn test_zero_probability_skips_error() {
        let recipe = RecipeBuilder::new(InitialState::One)
            .error(ErrorSelection::Fixed(0))
            .error_probability(0.0)
            .correction(CorrectionMode::Mirror)
            .build()
            .unwrap();
        assert_eq!(recipe.error_qubit(), None);
        assert!(!recipe.stages().contains(&Stage::Error));
        assert!(!recipe.stages().contains(&Stage::Correct));
    }

    #[test]
    fn test_random_error_in_range() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            let recipe = RecipeBuilder::new(InitialState::Zero)
                .error(ErrorSelection::Random)
                .build_with_rng(&mut rng)
                .unwrap();
            assert!(recipe.randomly_selected());
            assert!(recipe.error_qubit().is_some_and(|q| q < 3));
        }
    }

    #[test]
    fn test_syndrome_correction_table() {
        let recipe = Recipe::with_correction(
            InitialState::Zero,
            ErrorSelection::Fixed(1),
            CorrectionMode::Syndrome,
        )
        .unwrap();
        let correct: Vec<_> = recipe
            .steps()
            .iter()
            .filter(|s| s.stage == Stage::Correct)
            .map(|s| s.op.clone())
            .collect();
        assert_eq!(correct[0], Operation::MeasureSyndrome);
        assert_eq!(correct.len(), 7);
        assert!(correct.contains(&Operation::ConditionalFlip {
            qubit: 1,
            syndrome: "010".into()
        }));
        assert_eq!(recipe.stage_label(Stage::Correct), "Syndrome");
    }

    #[test]
    fn test_decode_expectation() {
        let recipe = RecipeBuilder::new(InitialState::Plus)
            .decode(true)
            .build()
            .unwrap();
        assert_eq!(
            recipe.expected(),
            &ExpectedOutcome::Either("000".into(), "100".into())
        );
        let decode: Vec<_> = recipe
            .steps()
            .iter()
            .filter(|s| s.stage == Stage::Decode)
            .map(|s| s.op.clone())
            .collect();
        assert_eq!(
            decode,
            vec![
                Operation::Copy { from: 0, to: 2 },
                Operation::Copy { from: 0, to: 1 }
            ]
        );
    }

    #[test]
    fn test_to_circuit_registers_and_labels() {
        let recipe = Recipe::pipeline(InitialState::One, ErrorSelection::Fixed(1)).unwrap();
        let circuit = recipe.to_circuit().unwrap();
        assert_eq!(circuit.num_qubits(), 3);
        assert_eq!(circuit.num_clbits(), 3);
        assert_eq!(circuit.creg(RESULT_REGISTER).len(), 3);

        let labels: Vec<String> = circuit
            .dag()
            .topological_ops()
            .filter_map(|(_, inst)| inst.barrier_label().map(str::to_string))
            .collect();
        assert_eq!(labels, vec!["Init", "Encode", "Error@q1", "Correct@q1"]);

        let ops = circuit.count_ops();
        assert_eq!(ops.get("x"), Some(&3));
        assert_eq!(ops.get("cx"), Some(&2));
        assert_eq!(ops.get("measure"), Some(&3));
    }

    #[test]
    fn test_zero_state_still_opens_with_init_barrier() {
        let recipe = Recipe::encode_only(InitialState::Zero).unwrap();
        let circuit = recipe.to_circuit().unwrap();
        let first = circuit.dag().topological_ops().next().map(|(_, inst)| inst.clone());
        assert_eq!(first.and_then(|i| i.barrier_label().map(str::to_string)).as_deref(), Some("Init"));
    }

    #[test]
    fn test_syndrome_circuit_has_two_registers() {
        let recipe = Recipe::with_correction(
            InitialState::One,
            ErrorSelection::Fixed(0),
            CorrectionMode::Syndrome,
        )
        .unwrap();
        let circuit = recipe.to_circuit().unwrap();
        assert_eq!(circuit.num_clbits(), 6);
        assert_eq!(circuit.creg(SYNDROME_REGISTER).len(), 3);
        assert_eq!(circuit.creg_names(), vec![RESULT_REGISTER, SYNDROME_REGISTER]);
    }

    #[test]
    fn test_circuit_through_stops_before_readout() {
        let recipe = Recipe::pipeline(InitialState::Zero, ErrorSelection::Fixed(0)).unwrap();
        let encoded = recipe.circuit_through(Stage::Encode).unwrap();
        assert!(!encoded.has_measurements());
        assert_eq!(encoded.num_clbits(), 0);
        assert_eq!(encoded.count_ops().get("x"), None);

        let full = recipe.circuit_through(Stage::Measure).unwrap();
        assert!(!full.has_measurements());
        assert_eq!(full.count_ops().get("x"), Some(&2));
    }
}
