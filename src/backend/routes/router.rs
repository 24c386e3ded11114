/**
 * Router Configuration
 *
 * Combines the API routes with the cross-cutting layers: request tracing and
 * CORS. Unknown paths get a JSON 404 in the same shape as every other error.
 */

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method, StatusCode,
    },
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::backend::error::BackendError;
use crate::backend::middleware::INVITE_TOKEN_HEADER;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

async fn not_found() -> BackendError {
    BackendError::handler(StatusCode::NOT_FOUND, "not found")
}

/// Create the Axum router with all routes configured
///
/// # Arguments
///
/// * `app_state` - engines and content stores shared by every handler
///
/// # Returns
///
/// Configured Axum Router ready to serve requests
pub fn create_router(app_state: AppState) -> Router<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, INVITE_TOKEN_HEADER.clone()]);

    Router::new()
        .nest("/api/v1", configure_api_routes(app_state.clone()))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}
