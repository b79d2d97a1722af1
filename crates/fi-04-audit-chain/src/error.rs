//! Error types for the audit chain.

use shared_types::{CanonicalError, StoreError};
use thiserror::Error;

/// Audit chain errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditError {
    /// The record could not be staged. Fatal to the enclosing mutation.
    #[error("Audit append failed: {reason}")]
    AppendFailed { reason: String },

    /// A second append was staged while one is still pending.
    #[error("Out-of-order append: expected sequence {expected}, got {found}")]
    OutOfOrder { expected: u64, found: u64 },

    /// Verification found a divergence.
    #[error("Audit chain broken at record {broken_at} ({checked} records checked)")]
    IntegrityViolation { broken_at: u64, checked: u64 },

    #[error("Canonical encoding failed: {0}")]
    Canonical(#[from] CanonicalError),

    #[error("Audit store error: {0}")]
    Store(#[from] StoreError),
}

impl AuditError {
    pub(crate) fn append_failed(err: impl std::fmt::Display) -> Self {
        Self::AppendFailed {
            reason: err.to_string(),
        }
    }
}

/// Result type for audit chain operations.
pub type AuditResult<T> = Result<T, AuditError>;
