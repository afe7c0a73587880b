//! Error taxonomy shared by the session store, HTTP client and ticket service.
//!
//! DESIGN
//! ======
//! Form-level callers display `user_message()`: the server's `detail` text
//! verbatim when the backend sent one, otherwise a fixed fallback sentence.
//! `Unauthorized` is the one variant with a global side effect (the session
//! is expired wherever it is observed); it is still returned to the caller
//! so no path is left waiting.

use serde::{Deserialize, Serialize};

pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection and try again.";
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please login again.";
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please check your credentials.";
pub const SIGNUP_FAILED_MESSAGE: &str = "Registration failed. Please try again.";
pub const LOGIN_CANCELLED_MESSAGE: &str = "You were signed out while logging in. Please login again.";

/// A single field-level validation message (`loc` path + `msg`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name, e.g. `"email"`. Nested paths are joined with `.`.
    pub field: String,
    pub message: String,
}

/// Errors surfaced by every client-side operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Email/password pair rejected by the backend.
    #[error("invalid credentials")]
    InvalidCredentials { detail: Option<String> },

    /// Request body rejected; `fields` holds per-field messages when the
    /// backend provided them.
    #[error("validation failed: {}", .detail.as_deref().unwrap_or("see field errors"))]
    Validation { detail: Option<String>, fields: Vec<FieldError> },

    /// Token missing, invalid or expired.
    #[error("unauthorized")]
    Unauthorized,

    /// A sign-out happened while the login was in flight; its result was discarded.
    #[error("login cancelled by sign-out")]
    Cancelled,

    /// Requested resource does not exist.
    #[error("not found: {}", .detail.as_deref().unwrap_or("resource"))]
    NotFound { detail: Option<String> },

    /// Transport-level failure (connect, timeout, unreadable body).
    #[error("network error: {0}")]
    Network(String),

    /// Durable storage could not be updated.
    #[error("storage error: {0}")]
    Storage(String),

    /// Anything else, including unexpected HTTP statuses.
    #[error("unexpected error (status {status:?}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Unknown { status: Option<u16>, detail: Option<String> },
}

impl SessionError {
    /// Grepable error code for logs and CLI output.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials { .. } => "E_INVALID_CREDENTIALS",
            Self::Validation { .. } => "E_VALIDATION",
            Self::Unauthorized => "E_UNAUTHORIZED",
            Self::Cancelled => "E_CANCELLED",
            Self::NotFound { .. } => "E_NOT_FOUND",
            Self::Network(_) => "E_NETWORK",
            Self::Storage(_) => "E_STORAGE",
            Self::Unknown { .. } => "E_UNKNOWN",
        }
    }

    /// `true` for errors the global recovery path handles instead of a form.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Message suitable for display next to a form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCredentials { detail } => detail.clone().unwrap_or_else(|| LOGIN_FAILED_MESSAGE.to_owned()),
            Self::Validation { detail, fields } => {
                if let Some(detail) = detail {
                    return detail.clone();
                }
                if fields.is_empty() {
                    return SIGNUP_FAILED_MESSAGE.to_owned();
                }
                fields
                    .iter()
                    .map(|f| format!("{}: {}", f.field, f.message))
                    .collect::<Vec<_>>()
                    .join("; ")
            }
            Self::Unauthorized => SESSION_EXPIRED_MESSAGE.to_owned(),
            Self::Cancelled => LOGIN_CANCELLED_MESSAGE.to_owned(),
            Self::NotFound { detail } | Self::Unknown { detail, .. } => {
                detail.clone().unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_owned())
            }
            Self::Network(_) => NETWORK_ERROR_MESSAGE.to_owned(),
            Self::Storage(_) => GENERIC_ERROR_MESSAGE.to_owned(),
        }
    }
}

impl From<reqwest::Error> for SessionError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
