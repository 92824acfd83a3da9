//! Circuit endpoints: encoding, error injection, correction and analysis.

use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection};

use bitflip_ir::draw_lines;
use bitflip_qec::{
    CorrectionMode, ErrorSelection, MajorityVote, Recipe, RecipeBuilder, basis_labels,
    run_recipe, stage_snapshots,
};

use crate::dto::{
    CircuitRequest, CircuitVisualization, CorrectResponse, EncodeResponse, Envelope,
    ErrorRunResponse, MajorityRequest, MajorityResponse, PipelineResponse, PipelineSummary,
    StageView, StatevectorResponse,
};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// JSON body whose rejection is reported in the API's error format.
type Body<T> = Result<Json<T>, JsonRejection>;

/// Error qubit used when a request does not name one.
const DEFAULT_ERROR_QUBIT: usize = 1;

/// POST /encode
pub async fn encode(
    State(state): State<Arc<AppState>>,
    body: Body<CircuitRequest>,
) -> ApiResult<Json<Envelope<EncodeResponse>>> {
    let Json(req) = body?;
    let initial = req.initial_state()?;
    let shots = state.shots(req.shots)?;

    let recipe = Recipe::encode_only(initial)?;
    let report = run_recipe(state.backend.as_ref(), &recipe, shots).await?;

    Ok(Json(Envelope::ok(EncodeResponse {
        initial_state: initial,
        encoded_state: report.expected,
        circuit: draw_lines(&recipe.to_circuit()?),
        measurements: report.counts,
        shots,
    })))
}

/// POST /error and /add_error
pub async fn error(
    State(state): State<Arc<AppState>>,
    body: Body<CircuitRequest>,
) -> ApiResult<Json<Envelope<ErrorRunResponse>>> {
    let Json(req) = body?;
    let selection = if req.random_error {
        ErrorSelection::Random
    } else {
        ErrorSelection::Fixed(req.error_qubit_or(DEFAULT_ERROR_QUBIT)?)
    };
    run_error(&state, &req, selection).await
}

/// POST /error/random
pub async fn random_error(
    State(state): State<Arc<AppState>>,
    body: Body<CircuitRequest>,
) -> ApiResult<Json<Envelope<ErrorRunResponse>>> {
    let Json(req) = body?;
    run_error(&state, &req, ErrorSelection::Random).await
}

async fn run_error(
    state: &AppState,
    req: &CircuitRequest,
    selection: ErrorSelection,
) -> ApiResult<Json<Envelope<ErrorRunResponse>>> {
    let initial = req.initial_state()?;
    let shots = state.shots(req.shots)?;

    let recipe = Recipe::with_error(initial, selection)?;
    let report = run_recipe(state.backend.as_ref(), &recipe, shots).await?;

    Ok(Json(Envelope::ok(ErrorRunResponse {
        initial_state: initial,
        error_qubit: report.error_qubit,
        randomly_selected: report.randomly_selected,
        circuit: draw_lines(&recipe.to_circuit()?),
        measurements: report.counts,
        shots,
    })))
}

/// POST /correct and /correct_error
pub async fn correct(
    State(state): State<Arc<AppState>>,
    body: Body<CircuitRequest>,
) -> ApiResult<Json<Envelope<CorrectResponse>>> {
    let Json(req) = body?;
    let initial = req.initial_state()?;
    let qubit = req.error_qubit_or(DEFAULT_ERROR_QUBIT)?;
    let mode = req.mode.unwrap_or_default();
    let shots = state.shots(req.shots)?;

    let recipe = Recipe::with_correction(initial, ErrorSelection::Fixed(qubit), mode)?;
    let report = run_recipe(state.backend.as_ref(), &recipe, shots).await?;

    Ok(Json(Envelope::ok(CorrectResponse {
        initial_state: initial,
        error_qubit: report.error_qubit,
        mode,
        expected_state: report.expected,
        success_rate: report.success_rate,
        circuit: draw_lines(&recipe.to_circuit()?),
        measurements: report.counts,
        shots,
    })))
}

/// POST /pipeline
pub async fn pipeline(
    State(state): State<Arc<AppState>>,
    body: Body<CircuitRequest>,
) -> ApiResult<Json<Envelope<PipelineResponse>>> {
    let Json(req) = body?;
    let initial = req.initial_state()?;
    let selection = if req.random_error {
        ErrorSelection::Random
    } else {
        ErrorSelection::Fixed(req.error_qubit_or(DEFAULT_ERROR_QUBIT)?)
    };
    let mode = req.mode.unwrap_or_default();
    let shots = state.shots(req.shots)?;

    let recipe = RecipeBuilder::new(initial)
        .error(selection)
        .correction(mode)
        .decode(req.decode)
        .build()?;
    let report = run_recipe(state.backend.as_ref(), &recipe, shots).await?;

    tracing::info!(
        initial = %initial,
        error = ?report.error_qubit,
        %mode,
        rate = report.success_rate,
        "Pipeline finished"
    );

    Ok(Json(Envelope::ok(PipelineResponse {
        pipeline: PipelineSummary {
            initial_state: initial,
            error_qubit: report.error_qubit,
            randomly_selected: report.randomly_selected,
            mode,
            decoded: recipe.decodes(),
            expected_state: report.expected,
            success_rate: report.success_rate,
            corrected: report.corrected,
        },
        circuit: draw_lines(&recipe.to_circuit()?),
        measurements: report.counts,
        shots,
    })))
}

/// POST /statevector
pub async fn statevector(
    State(state): State<Arc<AppState>>,
    body: Body<CircuitRequest>,
) -> ApiResult<Json<Envelope<StatevectorResponse>>> {
    let Json(req) = body?;
    let initial = req.initial_state()?;

    let (qubit, randomly_selected) = if req.random_error {
        let drawn = RecipeBuilder::new(initial)
            .error(ErrorSelection::Random)
            .measure(false)
            .build()?
            .error_qubit()
            .ok_or_else(|| ApiError::Internal("random error selection drew no qubit".into()))?;
        (drawn, true)
    } else {
        (req.error_qubit_or(DEFAULT_ERROR_QUBIT)?, false)
    };

    let snapshots = stage_snapshots(state.backend.as_ref(), initial, qubit).await?;

    Ok(Json(Envelope::ok(StatevectorResponse {
        initial_state: initial,
        error_qubit: qubit,
        randomly_selected,
        stages: snapshots
            .iter()
            .map(|s| (s.stage, StageView::from(s)))
            .collect(),
        basis_states: basis_labels(bitflip_qec::CODE_LENGTH),
    })))
}

/// POST /visualize_circuit
///
/// Draws encode, error and the decoding CX pair followed by measurement.
pub async fn visualize_circuit(
    body: Body<CircuitRequest>,
) -> ApiResult<Json<Envelope<CircuitVisualization>>> {
    let Json(req) = body?;
    let initial = req.initial_state()?;
    let qubit = req.error_qubit_or(0)?;

    let recipe = RecipeBuilder::new(initial)
        .error(ErrorSelection::Fixed(qubit))
        .correction(CorrectionMode::None)
        .decode(true)
        .build()?;

    Ok(Json(Envelope::ok(CircuitVisualization::from_circuit(
        &recipe.to_circuit()?,
    ))))
}

/// POST /majority
pub async fn majority(body: Body<MajorityRequest>) -> ApiResult<Json<Envelope<MajorityResponse>>> {
    let Json(req) = body?;
    let vote = MajorityVote::from_bits(&req.bits)?;
    let correction = vote.corrected();
    Ok(Json(Envelope::ok(MajorityResponse { vote, correction })))
}
