//! Errors surfaced by the mutation-commit pipeline.

use fi_01_access_scope::ScopeError;
use fi_02_optimistic_concurrency::ConcurrencyError;
use fi_03_material_ledger::LedgerError;
use fi_04_audit_chain::AuditError;
use thiserror::Error;

/// Transport-independent classification of a [`CommitError`].
///
/// Callers map this exhaustively to their status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ScopeDenied,
    /// The only conflict-class outcome.
    VersionConflict,
    NotFound,
    LedgerExceeded,
    /// The mutation was abandoned; nothing was written.
    ChainAppendFailure,
    /// Operational alert from verification, never from a write.
    ChainIntegrityViolation,
    /// Outcome unknown; re-query before retrying.
    Storage,
    Invalid,
}

/// Any failure of a pipeline operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error(transparent)]
    Concurrency(#[from] ConcurrencyError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Audit(#[from] AuditError),

    #[error("Invalid mutation: {0}")]
    Invalid(String),
}

impl CommitError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    /// Classify the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Scope(e) => scope_kind(e),
            Self::Concurrency(e) => match e {
                ConcurrencyError::Conflict { .. } => ErrorKind::VersionConflict,
                ConcurrencyError::NotFound { .. } => ErrorKind::NotFound,
                ConcurrencyError::AlreadyExists { .. } | ConcurrencyError::InvalidVersion { .. } => {
                    ErrorKind::Invalid
                }
                ConcurrencyError::Store(_) => ErrorKind::Storage,
            },
            Self::Ledger(e) => match e {
                LedgerError::Exceeded { .. } | LedgerError::AdjustmentExceedsReturned { .. } => {
                    ErrorKind::LedgerExceeded
                }
                LedgerError::IssueNotFound { .. } => ErrorKind::NotFound,
                LedgerError::ZeroQuantity | LedgerError::IssueExists { .. } => ErrorKind::Invalid,
                LedgerError::Scope(e) => scope_kind(e),
                LedgerError::Inconsistent { .. } | LedgerError::Store(_) => ErrorKind::Storage,
            },
            Self::Audit(e) => match e {
                AuditError::IntegrityViolation { .. } => ErrorKind::ChainIntegrityViolation,
                AuditError::Store(_) => ErrorKind::Storage,
                AuditError::AppendFailed { .. }
                | AuditError::OutOfOrder { .. }
                | AuditError::Canonical(_) => ErrorKind::ChainAppendFailure,
            },
            Self::Invalid(_) => ErrorKind::Invalid,
        }
    }

    /// Current stored version carried by a conflict.
    #[must_use]
    pub fn current_version(&self) -> Option<u64> {
        match self {
            Self::Concurrency(e) => e.current_version(),
            _ => None,
        }
    }

    /// Available quantity carried by a ledger rejection.
    #[must_use]
    pub fn available(&self) -> Option<u64> {
        match self {
            Self::Ledger(e) => e.available(),
            _ => None,
        }
    }
}

fn scope_kind(e: &ScopeError) -> ErrorKind {
    match e {
        ScopeError::Denied { .. } => ErrorKind::ScopeDenied,
        ScopeError::Store(_) => ErrorKind::Storage,
    }
}

/// Result type for pipeline operations.
pub type CommitResult<T> = Result<T, CommitError>;
