//! # Outbound Ports (Driven Ports)
//!
//! Dependencies the scope evaluator needs from the host application.

use async_trait::async_trait;
use shared_types::{ActorId, PartitionAssignment, StoreError};

/// Source of partition assignments.
#[async_trait]
pub trait AssignmentProvider: Send + Sync {
    /// All assignments of an actor, active or not.
    async fn assignments_for(&self, actor_id: ActorId)
        -> Result<Vec<PartitionAssignment>, StoreError>;
}
