//! Backend Error Module
//!
//! Error types for both engines and the HTTP boundary.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions and status mapping
//! └── conversion.rs - IntoResponse implementation
//! ```
//!
//! # Status Mapping
//!
//! | Kind | Status |
//! |------|--------|
//! | InvalidCredentials, InvalidToken, ExpiredToken, TokenRevoked | 401 |
//! | UserAlreadyExists | 409 |
//! | TooManyAttempts | 429 |
//! | InviteNotFound, ContentNotFound, UserNotFound | 404 |
//! | InviteExpired, InviteNotActive, NotAuthorized | 403 |
//! | InvalidContentType, MissingTitle, MissingFile, validation errors | 400 |
//! | storage, hashing, signing | 500 |

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

pub use types::{AuthError, BackendError, ContentError, InviteError, InviteRejection};
