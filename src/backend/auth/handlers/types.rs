/**
 * Authentication Handler Types
 *
 * Request and response bodies for the auth endpoints. Field names are
 * camelCase on the wire.
 */

use serde::{Deserialize, Serialize};

use crate::backend::auth::users::Profile;
use crate::shared::SharedError;

/// Registration request
#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    /// Plaintext; hashed before storage and never logged
    pub password: String,
    #[serde(flatten)]
    pub profile: Profile,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), SharedError> {
        require("username", &self.username)?;
        require("email", &self.email)?;
        require("password", &self.password)?;
        if !self.email.contains('@') {
            return Err(SharedError::validation("email", "invalid email format"));
        }
        Ok(())
    }
}

/// Login request
#[derive(Deserialize, Serialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), SharedError> {
        require("email", &self.email)?;
        require("password", &self.password)
    }
}

/// Password change request
#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> Result<(), SharedError> {
        require("newPassword", &self.new_password)
    }
}

/// Returned by login
#[derive(Serialize, Deserialize, Debug)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

fn require(field: &str, value: &str) -> Result<(), SharedError> {
    if value.trim().is_empty() {
        return Err(SharedError::validation(field, "must not be empty"));
    }
    Ok(())
}
