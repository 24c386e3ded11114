/**
 * Profile Handlers
 *
 * GET and PUT /api/v1/profile for the authenticated user. The password hash
 * is never serialized, and a profile update cannot change it.
 */

use std::sync::Arc;

use axum::{extract::State, response::Json};

use crate::backend::auth::service::AuthService;
use crate::backend::auth::users::{Profile, User};
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;

/// Get current user handler
///
/// # Errors
///
/// * `401 Unauthorized` - no valid session
/// * `404 Not Found` - the session's user no longer exists
pub async fn get_profile(
    State(auth): State<Arc<AuthService>>,
    AuthUser(user): AuthUser,
) -> Result<Json<User>, BackendError> {
    let profile = auth.get_profile(user.user_id).await?;
    Ok(Json(profile))
}

pub async fn update_profile(
    State(auth): State<Arc<AuthService>>,
    AuthUser(user): AuthUser,
    Json(profile): Json<Profile>,
) -> Result<Json<User>, BackendError> {
    let updated = auth.update_profile(user.user_id, profile).await?;
    Ok(Json(updated))
}
