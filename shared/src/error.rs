//! Unified error taxonomy
//!
//! Errors are constructed at the adapter boundaries (store client, auth
//! client, local validation) and carried as this one sum type; downstream
//! code matches on the variant, never on message contents.

use thiserror::Error;

/// Unified error type for the app core
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Store rejected the read/write due to access rules
    #[error("Permission denied")]
    PermissionDenied,

    /// Connectivity failure reaching the store
    #[error("Network unavailable")]
    NetworkUnavailable,

    /// Local form/domain check failed; nothing was written
    #[error("Validation failed: {message}")]
    Validation {
        /// Form field to annotate, when the check maps to one
        field: Option<String>,
        message: String,
    },

    /// Client-side budget exceeded waiting on a save
    #[error("Operation timed out")]
    Timeout,

    /// Anything else, message passed through
    #[error("{0}")]
    Unknown(String),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            field: None,
            message: message.into(),
        }
    }

    pub fn field_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// Human-readable message for end users
    pub fn user_message(&self) -> String {
        match self {
            Error::PermissionDenied => "You do not have permission to do that.".to_string(),
            Error::NetworkUnavailable => {
                "Network unavailable. Check your connection and try again.".to_string()
            }
            Error::Validation { message, .. } => message.clone(),
            Error::Timeout => "The operation timed out. It may still complete.".to_string(),
            Error::Unknown(message) => message.clone(),
        }
    }
}

/// Result type for app operations
pub type Result<T> = std::result::Result<T, Error>;
