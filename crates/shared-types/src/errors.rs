//! # Error Types
//!
//! Errors shared by storage adapters and canonical encoding.

use thiserror::Error;

/// Failure of a persistence adapter.
///
/// Subsystem errors wrap this with `#[from]`; a `StoreError` always means the
/// outcome of the attempted operation is unknown to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// An I/O operation failed.
    #[error("Storage I/O error: {0}")]
    Io(String),

    /// A stored record could not be decoded.
    #[error("Stored record is corrupt: {0}")]
    Corrupt(String),

    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("Storage lock poisoned")]
    LockPoisoned,
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

/// Failure to produce a canonical encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanonicalError {
    #[error("Value cannot be canonicalized: {0}")]
    Serialization(String),

    #[error("Invalid hex digest: {0}")]
    InvalidHash(String),
}

impl From<serde_json::Error> for CanonicalError {
    fn from(err: serde_json::Error) -> Self {
        CanonicalError::Serialization(err.to_string())
    }
}
