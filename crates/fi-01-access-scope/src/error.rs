//! Error types for the scope evaluator.

use shared_types::{ActorId, PartitionId, Role, StoreError};
use thiserror::Error;

/// Scope evaluation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    /// The actor may not write to the partition.
    #[error("Actor {actor_id} ({role}) is not authorized for partition {partition_id}")]
    Denied {
        actor_id: ActorId,
        role: Role,
        partition_id: PartitionId,
    },

    /// Assignments could not be loaded.
    #[error("Assignment lookup failed: {0}")]
    Store(#[from] StoreError),
}

/// Result type for scope operations.
pub type ScopeResult<T> = Result<T, ScopeError>;
