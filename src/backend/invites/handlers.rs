/**
 * Invite Handlers
 *
 * # Routes (under /api/v1)
 *
 * Authenticated:
 * - `POST /notes/{id}/invites`, `POST /pdfs/{id}/invites` - create (owner only)
 * - `GET /notes/{id}/invites`, `GET /pdfs/{id}/invites` - list (owner only)
 * - `DELETE /invites/{id}` - deactivate (creator only)
 *
 * Public, the token being the credential:
 * - `GET /invites/{token}`, `GET /invites` - validate
 * - `GET /notes/invite/{token}`, `GET /notes/invite` - read a note through an invite
 * - `GET /pdfs/invite/{token}`, `GET /pdfs/invite` - read a PDF through an invite
 *
 * The token-less forms take the token from `X-Invite-Token`. Invite reads
 * skip the owner-or-public rule that governs `GET /notes/{id}`.
 */

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::content::{ContentRecord, ContentType};
use crate::backend::error::{BackendError, InviteError};
use crate::backend::invites::model::Invite;
use crate::backend::invites::service::InviteService;
use crate::backend::middleware::{AuthUser, InviteToken};
use crate::backend::store::{ContentId, InviteId, UserId};

/// Body of an invite creation request; may be omitted entirely
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInviteRequest {
    pub expires_at: Option<DateTime<Utc>>,
}

/// What a token holder learns from validation; the token itself, the
/// creator and the activity flags stay private
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateInviteResponse {
    pub valid: bool,
    pub content_id: ContentId,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub expires_at: DateTime<Utc>,
}

impl From<Invite> for ValidateInviteResponse {
    fn from(invite: Invite) -> Self {
        Self {
            valid: true,
            content_id: invite.content_id,
            content_type: invite.content_type,
            expires_at: invite.expires_at,
        }
    }
}

async fn create_for(
    invites: &InviteService,
    content_type: ContentType,
    content_id: ContentId,
    user_id: UserId,
    request: Option<Json<CreateInviteRequest>>,
) -> Result<(StatusCode, Json<Invite>), BackendError> {
    let request = request.map(|Json(body)| body).unwrap_or_default();
    let invite = invites
        .create_invite(content_id, content_type.as_str(), user_id, request.expires_at)
        .await?;
    Ok((StatusCode::CREATED, Json(invite)))
}

async fn list_for(
    invites: &InviteService,
    content_type: ContentType,
    content_id: ContentId,
    user_id: UserId,
) -> Result<Json<Vec<Invite>>, BackendError> {
    let content = invites.resolve_content(content_id, content_type).await?;
    if content.owner_id != user_id {
        return Err(InviteError::NotAuthorized.into());
    }

    let listed = invites
        .get_invites_by_content(content_id, content_type.as_str())
        .await?;
    Ok(Json(listed))
}

async fn read_through_invite(
    invites: &InviteService,
    expected: ContentType,
    token: &str,
) -> Result<Json<ContentRecord>, BackendError> {
    let invite = invites.validate_invite(token).await?;
    if invite.content_type != expected {
        return Err(InviteError::InvalidContentType.into());
    }

    let content = invites
        .resolve_content(invite.content_id, invite.content_type)
        .await?;
    Ok(Json(content))
}

pub async fn create_note_invite(
    State(invites): State<Arc<InviteService>>,
    AuthUser(user): AuthUser,
    Path(content_id): Path<ContentId>,
    request: Option<Json<CreateInviteRequest>>,
) -> Result<(StatusCode, Json<Invite>), BackendError> {
    create_for(&invites, ContentType::Note, content_id, user.user_id, request).await
}

pub async fn create_pdf_invite(
    State(invites): State<Arc<InviteService>>,
    AuthUser(user): AuthUser,
    Path(content_id): Path<ContentId>,
    request: Option<Json<CreateInviteRequest>>,
) -> Result<(StatusCode, Json<Invite>), BackendError> {
    create_for(&invites, ContentType::Pdf, content_id, user.user_id, request).await
}

pub async fn list_note_invites(
    State(invites): State<Arc<InviteService>>,
    AuthUser(user): AuthUser,
    Path(content_id): Path<ContentId>,
) -> Result<Json<Vec<Invite>>, BackendError> {
    list_for(&invites, ContentType::Note, content_id, user.user_id).await
}

pub async fn list_pdf_invites(
    State(invites): State<Arc<InviteService>>,
    AuthUser(user): AuthUser,
    Path(content_id): Path<ContentId>,
) -> Result<Json<Vec<Invite>>, BackendError> {
    list_for(&invites, ContentType::Pdf, content_id, user.user_id).await
}

pub async fn deactivate_invite(
    State(invites): State<Arc<InviteService>>,
    AuthUser(user): AuthUser,
    Path(invite_id): Path<InviteId>,
) -> Result<Json<Invite>, BackendError> {
    let invite = invites.deactivate_invite(invite_id, user.user_id).await?;
    Ok(Json(invite))
}

/// Validate an invite token
///
/// # Example Response
///
/// ```json
/// {
///   "valid": true,
///   "contentId": 10,
///   "type": "note",
///   "expiresAt": "2025-05-08T09:00:00Z"
/// }
/// ```
///
/// Failures carry the specific reason: 404 not found, 403 inactive or
/// expired, 404 when the content is gone.
pub async fn validate_invite(
    State(invites): State<Arc<InviteService>>,
    InviteToken(token): InviteToken,
) -> Result<Json<ValidateInviteResponse>, BackendError> {
    let invite = invites.validate_invite(&token).await?;
    Ok(Json(invite.into()))
}

pub async fn read_note_via_invite(
    State(invites): State<Arc<InviteService>>,
    InviteToken(token): InviteToken,
) -> Result<Json<ContentRecord>, BackendError> {
    read_through_invite(&invites, ContentType::Note, &token).await
}

pub async fn read_pdf_via_invite(
    State(invites): State<Arc<InviteService>>,
    InviteToken(token): InviteToken,
) -> Result<Json<ContentRecord>, BackendError> {
    read_through_invite(&invites, ContentType::Pdf, &token).await
}
