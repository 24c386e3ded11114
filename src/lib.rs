//! Noteshare - Main Library
//!
//! Backend for a note and PDF sharing service: user accounts with JWT
//! sessions, and invite tokens that grant read access to a single note or
//! PDF without an account.
//!
//! # Module Structure
//!
//! - **`shared`** - Configuration and request validation errors
//! - **`backend`** - Auth and Invite engines, stores, and the Axum server
//!
//! # Usage
//!
//! ```rust,no_run
//! use noteshare::backend::server::init::create_app;
//! use noteshare::shared::AppConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::from_env()?;
//! let app = create_app(&config).await?;
//! // Serve `app` with axum::serve
//! # Ok(())
//! # }
//! ```
//!
//! # Storage
//!
//! With `DATABASE_URL` set, every repository is backed by PostgreSQL and the
//! schema in `migrations/` is applied at startup. Without it, in-memory
//! stores are used and nothing survives a restart.
//!
//! # Error Handling
//!
//! - `AuthError` and `InviteError` are the engines' failure sets
//! - `BackendError` wraps them and renders `{"error", "status"}` JSON
//! - Storage failures surface as 500 with a generic message; details go to
//!   the log only

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
pub mod backend;
