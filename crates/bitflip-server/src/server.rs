//! Axum server setup and routing.

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::api;
use crate::state::AppState;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the Axum router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD;

    let quantum_routes = Router::new()
        .route("/encode", post(api::qec::encode))
        .route("/error", post(api::qec::error))
        .route("/add_error", post(api::qec::error))
        .route("/error/random", post(api::qec::random_error))
        .route("/correct", post(api::qec::correct))
        .route("/correct_error", post(api::qec::correct))
        .route("/pipeline", post(api::qec::pipeline))
        .route("/statevector", post(api::qec::statevector))
        .route("/visualize_circuit", post(api::qec::visualize_circuit))
        .route("/majority", post(api::qec::majority));

    let blob_routes = Router::new()
        .route(
            "/upload",
            post(api::blobs::upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/download/{filename}", get(api::blobs::download))
        .route("/files", get(api::blobs::list))
        .route("/delete/{filename}", delete(api::blobs::delete));

    let system_routes = Router::new()
        .route("/health", get(api::health::health))
        .route("/api", get(api::docs::api_docs))
        .route("/", get(api::docs::api_docs));

    let router = Router::new()
        .merge(quantum_routes)
        .merge(blob_routes)
        .merge(system_routes)
        .layer(CompressionLayer::new());

    let router = if state.config.cors_enabled {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use super::*;
    use crate::config::ServerConfig;

    fn router(cors_enabled: bool, dir: &std::path::Path) -> Router {
        let config = ServerConfig {
            upload_dir: dir.to_path_buf(),
            cors_enabled,
            ..ServerConfig::default()
        };
        create_router(Arc::new(AppState::new(config).unwrap()))
    }

    fn health_request() -> Request<Body> {
        Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "http://example.com")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_cors_header_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let response = router(true, dir.path())
            .oneshot(health_request())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        );
    }

    #[tokio::test]
    async fn test_no_cors_header_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let response = router(false, dir.path())
            .oneshot(health_request())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            !response
                .headers()
                .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        );
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let response = router(true, dir.path())
            .oneshot(
                Request::builder()
                    .uri("/jobs")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
