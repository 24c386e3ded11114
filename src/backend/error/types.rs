/**
 * Backend Error Types
 *
 * This module defines the error kinds surfaced by the two engines and the
 * `BackendError` wrapper that HTTP handlers return.
 *
 * # Error Types
 *
 * - `AuthError` - registration, login, session token and profile failures
 * - `InviteError` - invite creation, lookup, validation and deactivation failures
 * - `InviteRejection` - a failed invite validation together with the invite, if one was found
 * - `ContentError` - note creation, PDF upload and content deletion failures
 * - `BackendError` - everything a handler can fail with, mapped onto a status code
 *
 * Storage failures the engines do not recognise are wrapped with a short
 * context string and carried opaquely; their detail is logged, never returned
 * to the client.
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::invites::model::Invite;
use crate::backend::store::StoreError;
use crate::shared::SharedError;

/// Auth Engine failures
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password; deliberately indistinguishable
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("user already exists")]
    UserAlreadyExists,

    #[error("invalid token")]
    InvalidToken,

    #[error("token has expired")]
    ExpiredToken,

    #[error("token has been revoked")]
    TokenRevoked,

    #[error("too many failed login attempts, try again later")]
    TooManyAttempts,

    /// Profile lookup for an id with no user row
    #[error("user not found")]
    UserNotFound,

    #[error("{context}: {source}")]
    Storage {
        context: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

impl AuthError {
    /// Wrap a storage failure with the operation that hit it
    ///
    /// ```ignore
    /// users.find_by_email(email).await.map_err(AuthError::storage("looking up user"))?;
    /// ```
    pub fn storage(context: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Storage { context, source }
    }

    /// True for failures of the server rather than of the request
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::Hashing(_) | Self::Signing(_))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials
            | Self::InvalidToken
            | Self::ExpiredToken
            | Self::TokenRevoked => StatusCode::UNAUTHORIZED,
            Self::UserAlreadyExists => StatusCode::CONFLICT,
            Self::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::Storage { .. } | Self::Hashing(_) | Self::Signing(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Invite Engine failures
#[derive(Debug, Error)]
pub enum InviteError {
    #[error("invite not found")]
    InviteNotFound,

    #[error("invite has expired")]
    InviteExpired,

    #[error("invite is not active")]
    InviteNotActive,

    #[error("content not found")]
    ContentNotFound,

    #[error("invalid content type")]
    InvalidContentType,

    #[error("not authorized")]
    NotAuthorized,

    #[error("{context}: {source}")]
    Storage {
        context: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("invite token generation failed: {0}")]
    TokenGeneration(#[source] rand::Error),
}

impl InviteError {
    /// Wrap a storage failure with the operation that hit it
    pub fn storage(context: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Storage { context, source }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::TokenGeneration(_))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InviteNotFound | Self::ContentNotFound => StatusCode::NOT_FOUND,
            Self::InviteExpired | Self::InviteNotActive | Self::NotAuthorized => {
                StatusCode::FORBIDDEN
            }
            Self::InvalidContentType => StatusCode::BAD_REQUEST,
            Self::Storage { .. } | Self::TokenGeneration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Content write-path failures
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content not found")]
    ContentNotFound,

    #[error("not authorized")]
    NotAuthorized,

    #[error("title is required")]
    MissingTitle,

    #[error("a non-empty file is required")]
    MissingFile,

    #[error("{context}: {source}")]
    Storage {
        context: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ContentError {
    /// Wrap a storage failure with the operation that hit it
    pub fn storage(context: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Storage { context, source }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ContentNotFound => StatusCode::NOT_FOUND,
            Self::NotAuthorized => StatusCode::FORBIDDEN,
            Self::MissingTitle | Self::MissingFile => StatusCode::BAD_REQUEST,
            Self::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Outcome of a failed invite validation
///
/// `invite` is present whenever the token resolved to a row, so callers can
/// still report which content an inactive or expired invite pointed at.
#[derive(Debug, Error)]
#[error("{reason}")]
pub struct InviteRejection {
    #[source]
    pub reason: InviteError,
    pub invite: Option<Invite>,
}

impl InviteRejection {
    pub fn new(reason: InviteError, invite: Option<Invite>) -> Self {
        Self { reason, invite }
    }
}

impl From<InviteError> for InviteRejection {
    fn from(reason: InviteError) -> Self {
        Self::new(reason, None)
    }
}

impl From<InviteRejection> for InviteError {
    fn from(rejection: InviteRejection) -> Self {
        rejection.reason
    }
}

/// Backend-specific error types
///
/// Every handler returns `Result<_, BackendError>`. Each variant knows its
/// HTTP status; internal failures collapse to a generic message.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error (e.g., missing headers, invalid request)
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Invite(#[from] InviteError),

    #[error(transparent)]
    Content(#[from] ContentError),

    /// Shared error (request validation)
    #[error(transparent)]
    SharedError(#[from] SharedError),
}

impl From<InviteRejection> for BackendError {
    fn from(rejection: InviteRejection) -> Self {
        Self::Invite(rejection.reason)
    }
}

impl BackendError {
    /// Create a new handler error with a status code
    ///
    /// # Arguments
    ///
    /// * `status` - HTTP status code
    /// * `message` - Error message
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::Auth(err) => err.status_code(),
            Self::Invite(err) => err.status_code(),
            Self::Content(err) => err.status_code(),
            Self::SharedError(SharedError::ValidationError { .. }) => StatusCode::BAD_REQUEST,
        }
    }

    /// True when the failure is on the server side
    pub fn is_internal(&self) -> bool {
        match self {
            Self::Auth(err) => err.is_internal(),
            Self::Invite(err) => err.is_internal(),
            Self::Content(err) => err.is_internal(),
            Self::HandlerError { status, .. } => status.is_server_error(),
            Self::SharedError(_) => false,
        }
    }

    /// Get the error message
    ///
    /// Internal failures are reported with a fixed message; their detail
    /// only reaches the logs.
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::Auth(err) if err.is_internal() => "internal server error".to_string(),
            Self::Invite(err) if err.is_internal() => "internal server error".to_string(),
            Self::Content(err) if err.is_internal() => "internal server error".to_string(),
            Self::Auth(err) => err.to_string(),
            Self::Invite(err) => err.to_string(),
            Self::Content(err) => err.to_string(),
            Self::SharedError(err) => err.to_string(),
        }
    }
}
