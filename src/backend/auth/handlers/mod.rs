//! Authentication Handlers Module
//!
//! HTTP handlers for the auth endpoints. Each handler validates its body,
//! calls the Auth Engine and lets `BackendError` pick the status code.
//!
//! # Module Structure
//!
//! ```text
//! handlers/
//! ├── mod.rs       - Module exports and documentation
//! ├── types.rs     - Request and response types
//! ├── register.rs  - POST /register
//! ├── login.rs     - POST /login
//! ├── logout.rs    - POST /logout
//! ├── profile.rs   - GET|PUT /profile
//! └── password.rs  - POST /change-password
//! ```

/// Request and response types
pub mod types;

pub mod login;
pub mod logout;
pub mod password;
pub mod profile;
pub mod register;

pub use types::{ChangePasswordRequest, LoginRequest, MessageResponse, RegisterRequest, TokenResponse};

pub use login::login;
pub use logout::logout;
pub use password::change_password;
pub use profile::{get_profile, update_profile};
pub use register::register;
