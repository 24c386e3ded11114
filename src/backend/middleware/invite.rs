/**
 * Invite Token Resolution
 *
 * Invite tokens arrive either as the `{token}` path segment or in the
 * `X-Invite-Token` header. `InviteToken` tries the path first, then the
 * header, and hands the engine a plain string.
 */

use axum::{
    extract::{FromRequestParts, RawPathParams},
    http::{request::Parts, HeaderName, StatusCode},
};

use crate::backend::error::BackendError;

pub static INVITE_TOKEN_HEADER: HeaderName = HeaderName::from_static("x-invite-token");

/// Invite token taken from the path or the `X-Invite-Token` header
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InviteToken(pub String);

impl<S> FromRequestParts<S> for InviteToken
where
    S: Send + Sync,
{
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Ok(params) = RawPathParams::from_request_parts(parts, state).await {
            let from_path = params
                .iter()
                .find(|(name, _)| *name == "token")
                .map(|(_, value)| value.trim().to_string())
                .filter(|value| !value.is_empty());
            if let Some(token) = from_path {
                return Ok(Self(token));
            }
        }

        parts
            .headers
            .get(&INVITE_TOKEN_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| Self(t.to_string()))
            .ok_or_else(|| BackendError::handler(StatusCode::BAD_REQUEST, "invite token required"))
    }
}
