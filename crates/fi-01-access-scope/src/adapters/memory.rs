//! In-memory assignment store.

use crate::ports::outbound::AssignmentProvider;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{ActorId, PartitionAssignment, PartitionId, StoreError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Assignment store backed by a `HashMap`.
///
/// Assignments can change at runtime; each evaluation reads the current set.
#[derive(Debug, Default)]
pub struct InMemoryAssignmentStore {
    assignments: RwLock<HashMap<ActorId, Vec<PartitionAssignment>>>,
    unavailable: AtomicBool,
}

impl InMemoryAssignmentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant (or re-activate) access to a partition.
    pub fn assign(&self, actor_id: ActorId, partition_id: PartitionId) {
        let mut map = self.assignments.write();
        let rows = map.entry(actor_id).or_default();
        match rows.iter_mut().find(|a| a.partition_id == partition_id) {
            Some(existing) => existing.is_active = true,
            None => rows.push(PartitionAssignment {
                actor_id,
                partition_id,
                is_active: true,
            }),
        }
        debug!(actor_id = %actor_id, partition_id = %partition_id, "Partition assigned");
    }

    /// Deactivate an assignment. Returns `false` if none existed.
    pub fn deactivate(&self, actor_id: ActorId, partition_id: PartitionId) -> bool {
        let mut map = self.assignments.write();
        let Some(row) = map
            .get_mut(&actor_id)
            .and_then(|rows| rows.iter_mut().find(|a| a.partition_id == partition_id))
        else {
            return false;
        };
        row.is_active = false;
        debug!(actor_id = %actor_id, partition_id = %partition_id, "Partition assignment deactivated");
        true
    }

    /// Simulate an outage of the backing store.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl AssignmentProvider for InMemoryAssignmentStore {
    async fn assignments_for(
        &self,
        actor_id: ActorId,
    ) -> Result<Vec<PartitionAssignment>, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("assignment store offline".into()));
        }
        Ok(self
            .assignments
            .read()
            .get(&actor_id)
            .cloned()
            .unwrap_or_default())
    }
}
