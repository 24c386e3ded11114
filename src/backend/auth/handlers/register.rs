/**
 * Registration Handler
 *
 * POST /api/v1/register
 *
 * # Errors
 *
 * * `400 Bad Request` - missing fields or malformed email
 * * `409 Conflict` - email or username already taken
 */

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Json};

use crate::backend::auth::handlers::types::{MessageResponse, RegisterRequest};
use crate::backend::auth::service::{AuthService, Registration};
use crate::backend::error::BackendError;

/// Register handler
///
/// # Example Request
///
/// ```http
/// POST /api/v1/register HTTP/1.1
/// Content-Type: application/json
///
/// {
///   "username": "ayse",
///   "email": "ayse@example.com",
///   "password": "correct horse",
///   "university": "METU"
/// }
/// ```
pub async fn register(
    State(auth): State<Arc<AuthService>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), BackendError> {
    request.validate()?;

    auth.register(Registration {
        username: request.username,
        email: request.email,
        password: request.password,
        profile: request.profile,
    })
    .await?;

    Ok((StatusCode::CREATED, Json(MessageResponse::new("user registered"))))
}
