//! Error types for the concurrency controller.

use shared_types::{EntityId, StoreError};
use thiserror::Error;

/// Concurrency controller errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConcurrencyError {
    /// The stored version moved past the one the caller read.
    ///
    /// This is the only path to a 409-class response.
    #[error("Version conflict on {entity_id}: expected {expected_version}, current {current_version}")]
    Conflict {
        entity_id: EntityId,
        expected_version: u64,
        current_version: u64,
    },

    #[error("Record not found: {entity_id}")]
    NotFound { entity_id: EntityId },

    #[error("Record already exists: {entity_id}")]
    AlreadyExists { entity_id: EntityId },

    /// Versions start at 1 and must have a successor, so 0 and `u64::MAX`
    /// can never match.
    #[error("Invalid expected version {version} for {entity_id}")]
    InvalidVersion { entity_id: EntityId, version: u64 },

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl ConcurrencyError {
    /// Current stored version, for conflicts.
    #[must_use]
    pub fn current_version(&self) -> Option<u64> {
        match self {
            Self::Conflict {
                current_version, ..
            } => Some(*current_version),
            _ => None,
        }
    }
}

/// Result type for concurrency operations.
pub type ConcurrencyResult<T> = Result<T, ConcurrencyError>;
