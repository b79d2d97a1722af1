//! Versioned records.

use serde::{Deserialize, Serialize};
use shared_types::{EntityId, PartitionId, Timestamp};

/// Version assigned on insert.
pub const INITIAL_VERSION: u64 = 1;

/// A record guarded by optimistic concurrency.
///
/// `version >= 1`. Every successful update increments it by exactly one and
/// refreshes `updated_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub id: EntityId,
    /// `None` for records shared by every partition.
    pub partition_id: Option<PartitionId>,
    pub version: u64,
    pub updated_at: Timestamp,
    pub data: T,
}

impl<T> Versioned<T> {
    /// A freshly created record at [`INITIAL_VERSION`].
    pub fn new(id: EntityId, partition_id: Option<PartitionId>, data: T, now: Timestamp) -> Self {
        Self {
            id,
            partition_id,
            version: INITIAL_VERSION,
            updated_at: now,
            data,
        }
    }

    /// The successor of this record carrying `data`.
    ///
    /// The partition never changes through an update. `None` when
    /// `expected_version` has no successor.
    pub fn successor(&self, expected_version: u64, data: T, now: Timestamp) -> Option<Self> {
        Some(Self {
            id: self.id,
            partition_id: self.partition_id,
            version: expected_version.checked_add(1)?,
            updated_at: now,
            data,
        })
    }
}

/// An update computed but not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedUpdate<T> {
    /// State as read before the mutator ran.
    pub before: Versioned<T>,
    /// State that will be written; `after.version == expected_version + 1`.
    pub after: Versioned<T>,
    pub expected_version: u64,
}
