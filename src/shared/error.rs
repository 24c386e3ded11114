//! Shared Error Types
//!
//! Request-level validation failures that are independent of any engine.
//! The backend maps every variant to `400 Bad Request`.
//!
//! # Usage
//!
//! ```rust
//! use noteshare::shared::error::SharedError;
//!
//! let error = SharedError::validation("email", "Invalid email format");
//! assert!(error.to_string().contains("email"));
//! ```
use thiserror::Error;

/// Input validation errors raised at the HTTP boundary
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}
