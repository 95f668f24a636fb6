//! Store client error types

use thiserror::Error;

/// Store error type
///
/// Constructed by the backend from whatever the underlying service
/// reports; never inspected ad hoc downstream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Store rejected the operation due to access rules
    #[error("Permission denied")]
    PermissionDenied,

    /// Connectivity / fetch failure
    #[error("Network unavailable")]
    NetworkUnavailable,

    /// Anything else, message passed through
    #[error("Store error: {0}")]
    Unknown(String),
}

impl StoreError {
    pub(crate) fn serialization(err: serde_json::Error) -> Self {
        StoreError::Unknown(format!("Serialization error: {err}"))
    }

    pub(crate) fn invalid_path(path: &str) -> Self {
        StoreError::Unknown(format!("Invalid store path: {path}"))
    }
}

impl From<StoreError> for shared::Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::PermissionDenied => shared::Error::PermissionDenied,
            StoreError::NetworkUnavailable => shared::Error::NetworkUnavailable,
            StoreError::Unknown(message) => shared::Error::Unknown(message),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
