//! Store error handling
//!
//! Typed errors returned by store operations. The HTTP layer maps each
//! variant to a status code; `Internal` details are logged but never sent to
//! clients.

use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The referenced snippet does not exist
    #[error("snippet not found: '{id}'")]
    NotFound { id: String },

    /// A request payload could not be decoded
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unexpected failure (serialization, etc.)
    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Build a `NotFound` for `id`
    pub fn not_found(id: impl Into<String>) -> Self {
        StoreError::NotFound { id: id.into() }
    }

    /// Check if this is a missing-record error
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// HTTP status code this error maps to
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::NotFound { .. } => 404,
            StoreError::InvalidInput(_) => 400,
            StoreError::Internal(_) => 500,
        }
    }

    /// Message safe to show to a client
    pub fn public_message(&self) -> String {
        match self {
            StoreError::Internal(_) => "an internal server error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        if error.is_io() {
            StoreError::Internal(error.to_string())
        } else {
            StoreError::InvalidInput(error.to_string())
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
