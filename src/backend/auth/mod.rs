//! Authentication Module
//!
//! The Auth Engine and its HTTP surface.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs       - Module exports and documentation
//! ├── users.rs     - User model, UserRepository, Postgres implementation
//! ├── ledger.rs    - Revoked-token and login-attempt ledgers
//! ├── sessions.rs  - JWT claims, minting and verification
//! ├── service.rs   - AuthService: register, login, validate, revoke, ...
//! └── handlers/    - HTTP handlers
//! ```
//!
//! # Authentication Flow
//!
//! 1. **Register**: email and username must both be free; the password is
//!    stored as a bcrypt hash
//! 2. **Login**: rate-limit check for (ip, email), credential check, attempt
//!    recorded, HS256 session token returned
//! 3. **Authenticated request**: the token is checked against the revocation
//!    ledger, then signature and expiry
//! 4. **Logout**: the token is added to the revocation ledger
//!
//! # Security
//!
//! - Unknown email and wrong password produce the same error
//! - Only HS256 tokens are accepted
//! - Plaintext passwords and token strings are never logged

/// User data model and database operations
pub mod users;

/// Revoked-token and login-attempt persistence
pub mod ledger;

/// JWT token generation and validation
pub mod sessions;

/// The Auth Engine
pub mod service;

/// HTTP handlers for authentication endpoints
pub mod handlers;

pub use service::{AuthService, AuthStores, Registration};
pub use sessions::Claims;
pub use users::{Profile, User};
