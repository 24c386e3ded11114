//! Storage contracts shared by every repository.
//!
//! Repository traits live next to the model they persist
//! (`auth::users`, `auth::ledger`, `content`, `content::files`,
//! `invites::model`). This module
//! holds what they have in common: identifier aliases, the uniform
//! [`StoreError`], and the in-memory backends in [`memory`].
//!
//! Every lookup returns `Ok(None)` when no row matches; `Err` is reserved for
//! failures of the store itself.

use thiserror::Error;

/// In-process implementations of every repository contract
pub mod memory;

/// Primary key of a user row
pub type UserId = i64;
/// Primary key of a note or PDF row
pub type ContentId = i64;
/// Primary key of an invite row
pub type InviteId = i64;

/// Uniform error type for all storage backends
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database driver reported a failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A unique constraint rejected the write
    #[error("duplicate entry: {0}")]
    Conflict(String),

    /// A row could not be mapped onto its model
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// Reading or writing an uploaded file failed
    #[error("file storage error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Translate unique-constraint violations into [`StoreError::Conflict`]
    pub(crate) fn from_write(err: sqlx::Error) -> Self {
        match err.as_database_error() {
            Some(db) if db.is_unique_violation() => {
                Self::Conflict(db.constraint().unwrap_or("unique").to_string())
            }
            _ => Self::Database(err),
        }
    }
}
