//! Error types for Cellar
//!
//! Errors raised by the cell store and the guarded documents. Race
//! resolution on a cell is never an error; a losing candidate is simply
//! discarded.

use thiserror::Error;

/// Result type alias for Cellar operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the core cell and document operations
#[derive(Debug, Error)]
pub enum Error {
    /// The cell holds a value of a different type than the one requested
    #[error("wrong type for cell '{key}': expected {expected}")]
    WrongType {
        /// Key of the cell
        key: String,
        /// Name of the requested type
        expected: &'static str,
    },

    /// Key syntax invalid (empty key, empty namespace segment)
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// No cell exists for the key
    #[error("not found: {0}")]
    NotFound(String),

    /// Document payload is not a JSON object
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Configuration rejected
    #[error("invalid configuration: {0}")]
    Config(String),

    /// JSON rendering or parsing failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Bug or invariant violation
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build a `WrongType` error for `T`
    pub fn wrong_type<T: ?Sized>(key: impl Into<String>) -> Self {
        Error::WrongType {
            key: key.into(),
            expected: std::any::type_name::<T>(),
        }
    }

    /// Check if this is a wrong-type error.
    pub fn is_wrong_type(&self) -> bool {
        matches!(self, Error::WrongType { .. })
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Check if this is a serious/unrecoverable error.
    pub fn is_serious(&self) -> bool {
        matches!(self, Error::Internal(_))
    }
}
