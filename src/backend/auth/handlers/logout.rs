/**
 * Logout Handler
 *
 * POST /api/v1/logout (authenticated). Revokes the bearer token the request
 * was authenticated with; later requests presenting it get 401.
 */

use std::sync::Arc;

use axum::{extract::State, response::Json};

use crate::backend::auth::handlers::types::MessageResponse;
use crate::backend::auth::service::AuthService;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;

pub async fn logout(
    State(auth): State<Arc<AuthService>>,
    AuthUser(user): AuthUser,
) -> Result<Json<MessageResponse>, BackendError> {
    auth.revoke_token(&user.token).await?;
    Ok(Json(MessageResponse::new("logged out")))
}
