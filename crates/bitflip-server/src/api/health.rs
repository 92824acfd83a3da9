//! Health check endpoint.

use std::sync::Arc;

use axum::{Json, extract::State};
use bitflip_hal::Backend;

use crate::dto::HealthResponse;
use crate::state::AppState;

/// GET /health - Health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.backend.name()))
}
