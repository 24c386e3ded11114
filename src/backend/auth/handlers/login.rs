/**
 * Login Handler
 *
 * POST /api/v1/login
 *
 * The rate-limit key is the client address together with the email, so the
 * handler resolves the address before calling the engine.
 *
 * # Errors
 *
 * * `401 Unauthorized` - unknown email or wrong password (same response for both)
 * * `429 Too Many Requests` - too many recent failures from this address for this email
 */

use std::sync::Arc;

use axum::{extract::State, response::Json};

use crate::backend::auth::handlers::types::{LoginRequest, TokenResponse};
use crate::backend::auth::service::AuthService;
use crate::backend::error::BackendError;
use crate::backend::middleware::ClientIp;

/// Login handler
///
/// # Example Response
///
/// ```json
/// { "token": "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9..." }
/// ```
pub async fn login(
    State(auth): State<Arc<AuthService>>,
    ClientIp(ip): ClientIp,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, BackendError> {
    request.validate()?;

    let token = auth.login(&request.email, &request.password, &ip).await?;
    Ok(Json(TokenResponse { token }))
}
