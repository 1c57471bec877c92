//! geoel service library
//!
//! HTTP handlers, routing and OpenAPI description for the elevation service.
//! This library is used by both the geoel-service binary and integration tests.

pub mod handlers;

use std::sync::Arc;

use axum::{routing::get, Router};
use geoel::ElevationLayer;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across handlers.
pub struct AppState {
    /// Multi-resolution elevation source.
    pub layer: ElevationLayer,
}

/// OpenAPI documentation for the elevation service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "geoel Elevation Service",
        version = "0.1.0",
        description = "REST API for multi-resolution terrain elevation lookups over ETOPO, GLOBE and SRTM tiles.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        handlers::get_elevation,
        handlers::post_elevation,
        handlers::health_check,
        handlers::get_stats,
    ),
    components(
        schemas(
            handlers::ElevationQuery,
            handlers::ElevationResponse,
            handlers::Point,
            handlers::BatchRequest,
            handlers::BatchResponse,
            handlers::ErrorResponse,
            handlers::HealthResponse,
            handlers::DatasetStats,
            handlers::StatsResponse,
        )
    ),
    tags(
        (name = "elevation", description = "Elevation query endpoints"),
        (name = "system", description = "System and health endpoints")
    )
)]
pub struct ApiDoc;

/// All routes with docs, tracing and permissive CORS.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route(
            "/elevation",
            get(handlers::get_elevation).post(handlers::post_elevation),
        )
        .route("/health", get(handlers::health_check))
        .route("/stats", get(handlers::get_stats))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

// Re-export commonly used types for convenience
pub use handlers::{
    BatchRequest, BatchResponse, DatasetStats, ElevationQuery, ElevationResponse, ErrorResponse,
    HealthResponse, StatsResponse,
};
