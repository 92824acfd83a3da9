//! Endpoint documentation served at `/` and `/api`.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::state::AppState;

fn endpoint(method: &str, description: &str, input: Value, output: &str) -> Value {
    json!({
        "method": method,
        "description": description,
        "input": input,
        "output": output,
    })
}

/// GET /api - API documentation.
#[allow(clippy::cast_precision_loss)]
pub async fn api_docs(State(state): State<Arc<AppState>>) -> Json<Value> {
    let config = &state.config;
    let circuit_input = json!({ "state": "0, 1, + or -", "error_qubit": "0, 1 or 2", "shots": "int" });

    Json(json!({
        "name": "3-Qubit Bit-Flip Error Correction API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Bit-flip code simulation with a local blob store",
        "endpoints": {
            "quantum_operations": {
                "/encode": endpoint("POST", "Encode a single qubit into 3 qubits",
                    json!({ "state": "0, 1, + or -", "shots": "int" }), "Encoded state and circuit"),
                "/error": endpoint("POST", "Introduce a bit-flip error on the given qubit",
                    circuit_input.clone(), "Measurements after error"),
                "/add_error": endpoint("POST", "Alias for /error",
                    circuit_input.clone(), "Measurements after error"),
                "/error/random": endpoint("POST", "Introduce a bit-flip error on a random qubit",
                    json!({ "state": "0, 1, + or -", "shots": "int" }),
                    "Measurements with the randomly selected error qubit"),
                "/correct": endpoint("POST", "Encode, flip and correct",
                    json!({ "state": "0, 1, + or -", "error_qubit": "0, 1 or 2", "mode": "mirror or syndrome", "shots": "int" }),
                    "Correction results and success rate"),
                "/correct_error": endpoint("POST", "Alias for /correct",
                    circuit_input.clone(), "Correction results and success rate"),
                "/pipeline": endpoint("POST", "Run the full error correction pipeline",
                    json!({ "state": "0, 1, + or -", "error_qubit": "0-2", "random_error": "bool", "decode": "bool", "mode": "mirror or syndrome", "shots": "int" }),
                    "Pipeline summary with measurements"),
                "/statevector": endpoint("POST", "Statevector after each stage",
                    json!({ "state": "0, 1, + or -", "error_qubit": "0, 1 or 2", "random_error": "bool" }),
                    "Amplitudes and probabilities per stage"),
                "/visualize_circuit": endpoint("POST", "Circuit drawing with metadata",
                    json!({ "state": "0, 1, + or -", "error_qubit": "0, 1 or 2" }),
                    "Circuit drawing, depth, gate count, layers"),
                "/majority": endpoint("POST", "Majority-vote decode a 3-bit readout",
                    json!({ "bits": "e.g. 010" }), "Majority value and error position"),
            },
            "blob_api": {
                "/upload": {
                    "method": "POST",
                    "description": "Upload a file",
                    "input": "multipart/form-data with a 'file' field",
                    "output": "Upload confirmation with download URL",
                    "max_size": format!("{:.0} MB", config.max_upload_bytes as f64 / (1024.0 * 1024.0)),
                    "allowed_types": config.allowed_extensions,
                },
                "/download/{filename}": endpoint("GET", "Download a file", json!("filename in URL"), "File download"),
                "/files": endpoint("GET", "List uploaded files, newest first", Value::Null, "File metadata"),
                "/delete/{filename}": endpoint("DELETE", "Delete a file", json!("filename in URL"), "Deletion confirmation"),
            },
            "system": {
                "/health": endpoint("GET", "Health check", Value::Null, "Service status"),
                "/api": endpoint("GET", "This documentation", Value::Null, "API reference"),
            },
        },
        "configuration": {
            "upload_folder": config.upload_dir.display().to_string(),
            "max_upload_size": format!("{:.0} MB", config.max_upload_bytes as f64 / (1024.0 * 1024.0)),
            "allowed_extensions": config.allowed_extensions,
            "default_shots": config.default_shots,
            "max_shots": state.max_shots(),
            "cors_enabled": config.cors_enabled,
        },
    }))
}
