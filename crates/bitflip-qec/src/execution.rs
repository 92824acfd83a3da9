//! Running recipes on a backend and scoring the outcome.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{debug, info, instrument};

use bitflip_hal::{Backend, Counts};

use crate::error::{QecError, QecResult};
use crate::recipe::{RESULT_REGISTER, Recipe, SYNDROME_REGISTER};
use crate::state::{ErrorSelection, ExpectedOutcome, InitialState};

/// Success rate, in percent, at or above which a run counts as corrected.
pub const CORRECTED_THRESHOLD: f64 = 99.0;

/// Shots per trial in [`run_batch`].
pub const BATCH_SHOTS: u32 = 500;

/// Coarse classification of a success rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessTier {
    /// Every shot matched.
    Perfect,
    /// At least 95% matched.
    High,
    /// Below 95%.
    Low,
}

impl SuccessTier {
    /// Classify a rate given in percent.
    pub fn classify(rate: f64) -> Self {
        if rate >= 100.0 {
            Self::Perfect
        } else if rate >= 95.0 {
            Self::High
        } else {
            Self::Low
        }
    }
}

/// Outcome of one recipe execution.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Histogram over the final readout register.
    pub counts: Counts,
    /// Shots requested.
    pub shots: u32,
    /// Readout that counts as success.
    pub expected: ExpectedOutcome,
    /// Shots matching `expected`.
    pub success_count: u64,
    /// `success_count / shots * 100`.
    pub success_rate: f64,
    /// Whether the rate reached [`CORRECTED_THRESHOLD`].
    pub corrected: bool,
    /// Qubit the error was injected on.
    pub error_qubit: Option<usize>,
    /// Whether that qubit was drawn at random.
    pub randomly_selected: bool,
    /// Backend-reported execution time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
}

impl RunReport {
    /// Tier of the success rate.
    pub fn tier(&self) -> SuccessTier {
        SuccessTier::classify(self.success_rate)
    }
}

/// Share of `shots` that match `expected`, in percent.
#[allow(clippy::cast_precision_loss)]
pub fn success_rate(counts: &Counts, expected: &ExpectedOutcome, shots: u32) -> (u64, f64) {
    let success_count: u64 = counts
        .iter()
        .filter(|(bits, _)| expected.matches(bits))
        .map(|(_, &n)| n)
        .sum();
    let rate = if shots == 0 {
        0.0
    } else {
        success_count as f64 / f64::from(shots) * 100.0
    };
    (success_count, rate)
}

/// Execute `recipe` and score the readout.
///
/// Fails with `InvalidInput` before submission when `shots` is zero or the
/// recipe has no readout; backend errors are passed through unchanged.
#[instrument(skip(backend, recipe), fields(initial = %recipe.initial(), error = ?recipe.error_qubit()))]
pub async fn run_recipe(backend: &dyn Backend, recipe: &Recipe, shots: u32) -> QecResult<RunReport> {
    if shots == 0 {
        return Err(QecError::invalid("shots must be greater than zero"));
    }
    if !recipe.is_measured() {
        return Err(QecError::invalid("recipe has no measurement stage"));
    }

    let circuit = recipe.to_circuit()?;
    let job_id = backend.submit(&circuit, shots).await?;
    let result = backend.wait(&job_id).await?;
    debug!(job = %job_id, outcomes = result.counts.len(), "job finished");

    let counts = if circuit.creg_names().contains(&SYNDROME_REGISTER) {
        let positions: Vec<usize> = circuit
            .creg(RESULT_REGISTER)
            .iter()
            .map(|c| c.0 as usize)
            .collect();
        result.counts.marginal(&positions)
    } else {
        result.counts
    };

    let expected = recipe.expected().clone();
    let (success_count, success_rate) = success_rate(&counts, &expected, shots);

    Ok(RunReport {
        counts,
        shots,
        expected,
        success_count,
        success_rate,
        corrected: success_rate >= CORRECTED_THRESHOLD,
        error_qubit: recipe.error_qubit(),
        randomly_selected: recipe.randomly_selected(),
        execution_time_ms: result.execution_time_ms,
    })
}

/// One randomized trial of [`run_batch`].
#[derive(Debug, Clone, Serialize)]
pub struct TrialRecord {
    /// 1-based trial number.
    pub trial: usize,
    /// Input state.
    pub initial: InitialState,
    /// Error selection as requested (`q0`, `q1`, `q2` or `random`).
    pub selection: String,
    /// Qubit actually flipped.
    pub error_qubit: Option<usize>,
    /// Success rate in percent.
    pub success_rate: f64,
    /// Tier of the rate.
    pub tier: SuccessTier,
}

/// Aggregate of a batch of trials.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    /// Individual trials in order.
    pub trials: Vec<TrialRecord>,
    /// Trials at 100%.
    pub perfect: usize,
    /// Trials at 95% or more but below 100%.
    pub high: usize,
    /// Trials below 95%.
    pub failed: usize,
    /// Mean success rate.
    pub average: f64,
    /// Lowest success rate.
    pub min: f64,
    /// Highest success rate.
    pub max: f64,
}

/// Run `trials` pipelines with random basis inputs and error selections.
#[instrument(skip(backend))]
pub async fn run_batch(backend: &dyn Backend, trials: usize, shots: u32) -> QecResult<BatchSummary> {
    if trials == 0 {
        return Err(QecError::invalid("batch needs at least one trial"));
    }
    let selections = [
        ErrorSelection::Fixed(0),
        ErrorSelection::Fixed(1),
        ErrorSelection::Fixed(2),
        ErrorSelection::Random,
    ];

    let mut records = Vec::with_capacity(trials);
    for trial in 1..=trials {
        let (initial, selection, recipe) = {
            let mut rng = rand::thread_rng();
            let initial = InitialState::BASIS[rng.gen_range(0..InitialState::BASIS.len())];
            let selection = selections
                .choose(&mut rng)
                .copied()
                .unwrap_or(ErrorSelection::Random);
            let recipe = Recipe::pipeline(initial, selection)?;
            (initial, selection, recipe)
        };
        let report = run_recipe(backend, &recipe, shots).await?;
        debug!(trial, rate = report.success_rate, "trial finished");
        records.push(TrialRecord {
            trial,
            initial,
            selection: selection.to_string(),
            error_qubit: report.error_qubit,
            success_rate: report.success_rate,
            tier: report.tier(),
        });
    }

    let summary = summarize(records);
    info!(
        trials,
        average = summary.average,
        failed = summary.failed,
        "batch finished"
    );
    Ok(summary)
}

#[allow(clippy::cast_precision_loss)]
fn summarize(trials: Vec<TrialRecord>) -> BatchSummary {
    let count = |tier| trials.iter().filter(|t| t.tier == tier).count();
    let rates: Vec<f64> = trials.iter().map(|t| t.success_rate).collect();
    let average = if rates.is_empty() {
        0.0
    } else {
        rates.iter().sum::<f64>() / rates.len() as f64
    };
    BatchSummary {
        perfect: count(SuccessTier::Perfect),
        high: count(SuccessTier::High),
        failed: count(SuccessTier::Low),
        average,
        min: rates.iter().copied().fold(f64::INFINITY, f64::min),
        max: rates.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        trials,
    }
}
