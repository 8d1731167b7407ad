//! Unified error types for Cellar.
//!
//! This module provides a clean error type that wraps the errors of the
//! workspace crates and presents a consistent interface to users.

use thiserror::Error;

/// All Cellar errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Cell holds a value of another type
    #[error("wrong type for '{key}': expected {expected}")]
    WrongType {
        /// Key of the cell
        key: String,
        /// Requested type
        expected: String,
    },

    /// Invalid key format
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Entity not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Request body or payload is not a JSON object
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Configuration rejected
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Internal error (bug or invariant violation)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for Cellar operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Check if this is a wrong-type error.
    pub fn is_wrong_type(&self) -> bool {
        matches!(self, Error::WrongType { .. })
    }

    /// Check if the caller sent something unusable (bad key or body).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidKey(_) | Error::InvalidDocument(_) | Error::Serialization(_)
        )
    }

    /// Check if this is a serious/unrecoverable error.
    pub fn is_serious(&self) -> bool {
        matches!(self, Error::Internal(_))
    }
}

// Convert from internal core errors
impl From<cellar_core::Error> for Error {
    fn from(e: cellar_core::Error) -> Self {
        use cellar_core::Error as CoreError;
        match e {
            CoreError::WrongType { key, expected } => Error::WrongType {
                key,
                expected: expected.to_string(),
            },
            CoreError::InvalidKey(msg) => Error::InvalidKey(msg),
            CoreError::NotFound(msg) => Error::NotFound(msg),
            CoreError::InvalidDocument(msg) => Error::InvalidDocument(msg),
            CoreError::Config(msg) => Error::Config(msg),
            CoreError::Serialization(msg) => Error::Serialization(msg),
            CoreError::Internal(msg) => Error::Internal(msg),
        }
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
