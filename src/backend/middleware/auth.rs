/**
 * Authentication Middleware
 *
 * Protects routes that require a session. The bearer token is taken from the
 * `Authorization` header and resolved through the Auth Engine, which checks
 * revocation before signature and expiry. The resolved identity is attached
 * to the request extensions for the `AuthUser` extractor.
 */

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::backend::auth::service::AuthService;
use crate::backend::error::{AuthError, BackendError};
use crate::backend::server::state::AppState;
use crate::backend::store::UserId;

/// Authenticated user data extracted from the session token
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub username: String,
    /// The presented bearer token, kept for logout
    pub token: String,
}

/// Token part of an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

async fn authenticate(auth: &AuthService, token: &str) -> Result<AuthenticatedUser, AuthError> {
    let claims = auth.validate_token(token).await?;
    Ok(AuthenticatedUser {
        user_id: claims.user_id,
        username: claims.username,
        token: token.to_string(),
    })
}

/// Authentication middleware
///
/// Returns 401 when the header is missing or malformed, or when the token is
/// invalid, expired or revoked.
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    let token = bearer_token(request.headers()).ok_or_else(|| {
        tracing::debug!("missing or malformed Authorization header");
        BackendError::handler(StatusCode::UNAUTHORIZED, "authorization header required")
    })?;

    let user = authenticate(&app_state.auth, token).await?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Axum extractor for the user attached by [`auth_middleware`]
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| {
                tracing::warn!("AuthenticatedUser not found in request extensions");
                BackendError::handler(StatusCode::UNAUTHORIZED, "authentication required")
            })
    }
}

/// Identity for routes that serve anonymous callers too
///
/// A missing, invalid or revoked token yields `None` rather than a rejection.
#[derive(Clone, Debug)]
pub struct OptionalAuthUser(pub Option<AuthenticatedUser>);

impl<S> FromRequestParts<S> for OptionalAuthUser
where
    S: Send + Sync,
    Arc<AuthService>: FromRef<S>,
{
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(Self(Some(user.clone())));
        }

        let Some(token) = bearer_token(&parts.headers) else {
            return Ok(Self(None));
        };

        let auth = Arc::<AuthService>::from_ref(state);
        match authenticate(&auth, token).await {
            Ok(user) => Ok(Self(Some(user))),
            Err(err) if err.is_internal() => Err(err.into()),
            Err(err) => {
                tracing::debug!(error = %err, "ignoring unusable bearer token");
                Ok(Self(None))
            }
        }
    }
}

impl OptionalAuthUser {
    pub fn user_id(&self) -> Option<UserId> {
        self.0.as_ref().map(|u| u.user_id)
    }
}
