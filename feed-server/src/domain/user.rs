use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use super::error::DomainError;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 64;
const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 128;

#[derive(Debug, Clone)]
pub(crate) struct User {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) created_at: DateTime<Utc>,
}

impl User {
    pub(crate) fn new(
        id: i64,
        username: impl Into<String>,
        email: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if id <= 0 {
            return Err(DomainError::Validation {
                field: "id",
                message: "must be > 0",
            });
        }

        Ok(Self {
            id,
            username: clean_username(&username.into())?,
            email: clean_email(&email.into())?,
            created_at,
        })
    }
}

/// Signup input. `validate` normalizes the username and email and checks the
/// password length window before any hashing happens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RegisterRequest {
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password: String,
}

impl RegisterRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let username = clean_username(&self.username)?;
        let email = clean_email(&self.email)?;
        check_password_length(&self.password)?;

        Ok(Self {
            username,
            email,
            password: self.password,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct LoginRequest {
    pub(crate) username: String,
    pub(crate) password: String,
}

impl LoginRequest {
    /// Login is intentionally laxer than signup: any non-empty username is
    /// looked up, so stale accounts predating a rule change can still log in.
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let username = self.username.trim().to_string();
        let username_ok = !username.is_empty() && username.len() <= USERNAME_MAX;
        if !username_ok {
            return Err(DomainError::Validation {
                field: "username",
                message: "must be 1..64 chars",
            });
        }
        if self.password.is_empty() {
            return Err(DomainError::Validation {
                field: "password",
                message: "must not be empty",
            });
        }

        Ok(Self {
            username,
            password: self.password,
        })
    }
}

fn clean_username(raw: &str) -> Result<String, DomainError> {
    let username = raw.trim();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&username.len()) {
        return Err(DomainError::Validation {
            field: "username",
            message: "must be 3..64 chars",
        });
    }
    Ok(username.to_string())
}

fn clean_email(raw: &str) -> Result<String, DomainError> {
    let email = raw.trim().to_lowercase();
    if !email.validate_email() {
        return Err(DomainError::Validation {
            field: "email",
            message: "must be a valid email",
        });
    }
    Ok(email)
}

fn check_password_length(raw: &str) -> Result<(), DomainError> {
    if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&raw.chars().count()) {
        return Err(DomainError::Validation {
            field: "password",
            message: "must be 8..128 chars",
        });
    }
    Ok(())
}
