/**
 * API Routes
 *
 * Every endpoint lives under `/api/v1` (the prefix is added by the router).
 *
 * # Public
 * - `GET /health`
 * - `POST /register`, `POST /login`
 * - `GET /notes/{id}`, `GET /pdfs/{id}` - optional authentication
 * - `GET /invites/{token}`, `GET /invites` - validate an invite
 * - `GET /notes/invite/{token}`, `GET /notes/invite`, and the `/pdfs` equivalents
 *
 * # Authenticated (bearer token, checked by `auth_middleware`)
 * - `POST /logout`
 * - `GET|PUT /profile`, `POST /change-password`
 * - `POST /notes`, `POST /pdfs` (multipart upload)
 * - `DELETE /notes/{id}`, `DELETE /pdfs/{id}` - owner only
 * - `POST|GET /notes/{id}/invites`, `POST|GET /pdfs/{id}/invites`
 * - `DELETE /invites/{id}`
 */

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde_json::{json, Value};

use crate::backend::auth::handlers::{
    change_password, get_profile, login, logout, register, update_profile,
};
use crate::backend::content::handlers::{
    create_note, delete_note, delete_pdf, get_note, get_pdf, upload_pdf, MAX_PDF_BYTES,
};
use crate::backend::invites::handlers::{
    create_note_invite, create_pdf_invite, deactivate_invite, list_note_invites,
    list_pdf_invites, read_note_via_invite, read_pdf_via_invite, validate_invite,
};
use crate::backend::middleware::auth_middleware;
use crate::backend::server::state::AppState;

/// Liveness plus a round trip to the database when one is configured
async fn health(State(app_state): State<AppState>) -> (StatusCode, Json<Value>) {
    let Some(pool) = &app_state.db_pool else {
        return (StatusCode::OK, Json(json!({ "status": "ok", "database": "memory" })));
    };

    match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ok", "database": "connected" }))),
        Err(e) => {
            tracing::error!("Health check database query failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "database": "unreachable" })),
            )
        }
    }
}

/// Configure API routes
///
/// # Arguments
///
/// * `app_state` - needed up front by the authentication layer
///
/// # Returns
///
/// Router with public and protected routes merged; paths shared by both
/// (`/notes/{id}`, `/pdfs/{id}`, `/invites/{token}`) dispatch on method.
pub fn configure_api_routes(app_state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/health", get(health))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/notes/{id}", get(get_note))
        .route("/pdfs/{id}", get(get_pdf))
        .route("/invites", get(validate_invite))
        .route("/invites/{token}", get(validate_invite))
        .route("/notes/invite", get(read_note_via_invite))
        .route("/notes/invite/{token}", get(read_note_via_invite))
        .route("/pdfs/invite", get(read_pdf_via_invite))
        .route("/pdfs/invite/{token}", get(read_pdf_via_invite));

    let protected = Router::new()
        .route("/logout", post(logout))
        .route("/profile", get(get_profile).put(update_profile))
        .route("/change-password", post(change_password))
        .route("/notes", post(create_note))
        .route(
            "/pdfs",
            post(upload_pdf).layer(DefaultBodyLimit::max(MAX_PDF_BYTES)),
        )
        .route("/notes/{id}", delete(delete_note))
        .route("/pdfs/{id}", delete(delete_pdf))
        .route(
            "/notes/{id}/invites",
            post(create_note_invite).get(list_note_invites),
        )
        .route(
            "/pdfs/{id}/invites",
            post(create_pdf_invite).get(list_pdf_invites),
        )
        // Same pattern as the public validate route; the segment is an invite id here
        .route("/invites/{token}", delete(deactivate_invite))
        .route_layer(middleware::from_fn_with_state(app_state, auth_middleware));

    public.merge(protected)
}
