//! Error types for the material ledger.

use fi_01_access_scope::ScopeError;
use shared_types::{EntityId, Quantity, StoreError};
use thiserror::Error;

/// Material ledger errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The return would push the returned total past the issued quantity.
    #[error("{available} units available of {issued} issued, {returned} already returned")]
    Exceeded {
        issue_id: EntityId,
        requested: Quantity,
        available: Quantity,
        issued: Quantity,
        returned: Quantity,
    },

    /// The reversal is larger than the net quantity returned so far.
    #[error("Cannot reverse {requested} units: only {net_returned} returned")]
    AdjustmentExceedsReturned {
        issue_id: EntityId,
        requested: Quantity,
        net_returned: Quantity,
    },

    #[error("Quantity must be greater than zero")]
    ZeroQuantity,

    #[error("Material issue not found: {issue_id}")]
    IssueNotFound { issue_id: EntityId },

    #[error("Material issue already registered: {issue_id}")]
    IssueExists { issue_id: EntityId },

    /// Stored rows violate the ledger invariant or overflow.
    #[error("Ledger for issue {issue_id} is inconsistent: {detail}")]
    Inconsistent { issue_id: EntityId, detail: String },

    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error("Ledger store error: {0}")]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// Available quantity carried by a rejection.
    #[must_use]
    pub fn available(&self) -> Option<Quantity> {
        match self {
            Self::Exceeded { available, .. } => Some(*available),
            _ => None,
        }
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
