//! # Invalidation Keys
//!
//! The fixed key vocabulary shared with cache owners.

use super::debounce::CoalescedEvent;
use serde::{Deserialize, Serialize};
use shared_types::{AuditAction, EntityId, EntityType, PartitionId};
use std::collections::BTreeSet;
use std::fmt;

/// A cache entry a subscriber must drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum InvalidationKey {
    /// List view of a type within a partition (`None` for shared catalogs).
    List {
        entity_type: EntityType,
        partition_id: Option<PartitionId>,
    },
    /// Detail view of one record.
    Detail {
        entity_type: EntityType,
        entity_id: EntityId,
    },
    /// Pending-approval queue of a partition.
    ApprovalQueue { partition_id: Option<PartitionId> },
    /// Audit trail view of one record.
    AuditTrail {
        entity_type: EntityType,
        entity_id: EntityId,
    },
    /// Every cached view. Sent when the router may have missed events.
    Resync,
}

impl fmt::Display for InvalidationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List {
                entity_type,
                partition_id: Some(p),
            } => write!(f, "{entity_type}:list:{p}"),
            Self::List {
                entity_type,
                partition_id: None,
            } => write!(f, "{entity_type}:list:*"),
            Self::Detail {
                entity_type,
                entity_id,
            } => write!(f, "{entity_type}:detail:{entity_id}"),
            Self::ApprovalQueue {
                partition_id: Some(p),
            } => write!(f, "approvals:{p}"),
            Self::ApprovalQueue { partition_id: None } => f.write_str("approvals:*"),
            Self::AuditTrail {
                entity_type,
                entity_id,
            } => write!(f, "audit:{entity_type}:{entity_id}"),
            Self::Resync => f.write_str("resync"),
        }
    }
}

/// Keys for one (possibly coalesced) event.
///
/// The audit-trail key is only meaningful to subscribers allowed to read
/// audit trails, so callers pass `include_audit_trail` per subscriber.
#[must_use]
pub fn keys_for(event: &CoalescedEvent, include_audit_trail: bool) -> Vec<InvalidationKey> {
    let latest = &event.latest;
    let mut keys = BTreeSet::new();

    keys.insert(InvalidationKey::List {
        entity_type: latest.entity_type,
        partition_id: latest.partition_id,
    });

    let detail = InvalidationKey::Detail {
        entity_type: latest.entity_type,
        entity_id: latest.entity_id,
    };
    for action in &event.actions {
        match action {
            AuditAction::Create => {}
            AuditAction::Update | AuditAction::Delete => {
                keys.insert(detail);
            }
            AuditAction::Approve | AuditAction::Reject => {
                keys.insert(detail);
                keys.insert(InvalidationKey::ApprovalQueue {
                    partition_id: latest.partition_id,
                });
            }
        }
    }

    for parent in &event.parents {
        keys.insert(InvalidationKey::Detail {
            entity_type: parent.entity_type,
            entity_id: parent.entity_id,
        });
    }

    if include_audit_trail {
        keys.insert(InvalidationKey::AuditTrail {
            entity_type: latest.entity_type,
            entity_id: latest.entity_id,
        });
    }

    keys.into_iter().collect()
}
