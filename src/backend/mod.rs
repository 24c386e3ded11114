//! Backend Module
//!
//! All server-side code: the two engines, their storage adapters and the
//! HTTP surface that exposes them.
//!
//! # Architecture
//!
//! - **`auth`** - Auth Engine: registration, login rate limiting, session
//!   tokens, revocation, password and profile management
//! - **`invites`** - Invite Engine: share tokens for notes and PDFs
//! - **`content`** - Read-only view of notes and PDFs (owner, visibility)
//! - **`store`** - Storage error type and the in-memory stores
//! - **`clock`** - Injected time source
//! - **`server`** - Store selection, engine wiring, housekeeping
//! - **`routes`** - `/api/v1` route table and router layers
//! - **`middleware`** - Bearer authentication and request extractors
//! - **`error`** - Engine error enums and their HTTP mapping
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── auth/           - Auth Engine, handlers, PostgreSQL repositories
//! ├── invites/        - Invite Engine, handlers, PostgreSQL repository
//! ├── content/        - Content catalog and read handlers
//! ├── store/          - StoreError, in-memory stores
//! ├── clock.rs        - Clock trait, system and manual clocks
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── middleware/     - Request middleware and extractors
//! └── error/          - Error types
//! ```
//!
//! # State Management
//!
//! Engines are shared through `AppState` behind `Arc`. Stores hold their own
//! synchronization (a connection pool, or a mutex per in-memory table), so
//! the engines carry no locks of their own.

/// Time source
pub mod clock;

/// Storage errors and in-memory stores
pub mod store;

/// Authentication and user management
pub mod auth;

/// Notes and PDFs as seen by the sharing rules
pub mod content;

/// Invite tokens
pub mod invites;

/// Backend error types
pub mod error;

/// Middleware for request processing
pub mod middleware;

/// Route configuration
pub mod routes;

/// Server setup and configuration
pub mod server;

/// Re-export commonly used types
pub use error::BackendError;
pub use server::create_app;
