//! Server Module
//!
//! Startup plumbing for the HTTP server.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs           - Module exports and documentation
//! ├── state.rs         - AppState and FromRef implementations
//! ├── config.rs        - Database pool and migrations
//! ├── init.rs          - Store selection, engine wiring, app creation
//! └── housekeeping.rs  - Periodic purge of expired auth records
//! ```
//!
//! # Initialization Flow
//!
//! 1. **Configuration**: `AppConfig` is read from the environment by the binary
//! 2. **Stores**: PostgreSQL when `DATABASE_URL` is set, in-memory otherwise
//! 3. **Engines**: Auth and Invite engines share one clock
//! 4. **Background Tasks**: housekeeping runs on a fixed interval
//! 5. **Router Creation**: routes, tracing and CORS layers

/// Application state management
pub mod state;

/// Database connection and migrations
pub mod config;

/// Server initialization
pub mod init;

/// Periodic cleanup of revoked tokens and login attempts
pub mod housekeeping;

pub use init::{build_state, create_app, Stores};
pub use state::AppState;
