/**
 * Change Password Handler
 *
 * POST /api/v1/change-password (authenticated). A wrong current password
 * yields 401. Existing sessions stay valid after the change.
 */

use std::sync::Arc;

use axum::{extract::State, response::Json};

use crate::backend::auth::handlers::types::{ChangePasswordRequest, MessageResponse};
use crate::backend::auth::service::AuthService;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;

pub async fn change_password(
    State(auth): State<Arc<AuthService>>,
    AuthUser(user): AuthUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, BackendError> {
    request.validate()?;

    auth.change_password(user.user_id, &request.old_password, &request.new_password)
        .await?;
    Ok(Json(MessageResponse::new("password changed")))
}
