//! Invite Module
//!
//! Share links for notes and PDFs.
//!
//! - **`model`** - `Invite`, `InviteRepository`, Postgres implementation
//! - **`service`** - the Invite Engine: create, get, list, validate, deactivate
//! - **`handlers`** - HTTP handlers
//!
//! An invite's token is 32 random bytes in URL-safe base64 (43 characters).
//! Presenting a valid token grants read access to the referenced content
//! regardless of its owner or visibility.

pub mod handlers;
pub mod model;
pub mod service;

pub use model::{Invite, InviteRepository, PgInviteRepository};
pub use service::{generate_token, InviteService, DEFAULT_INVITE_TTL_DAYS};
