//! # Audit Records
//!
//! [`AuditMutation`] is what callers hand in; [`AuditRecord`] is what the
//! chain stores after sequencing, timestamping and hashing it.

use serde::{Deserialize, Serialize};
use shared_types::canonical::hex_hash;
use shared_types::{
    canonical_json, sha256, ActorId, AuditAction, CanonicalError, EntityId, EntityType, Hash,
    PartitionId, RecordState, Timestamp,
};
use uuid::Uuid;

/// A mutation about to be recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditMutation {
    pub entity_type: EntityType,
    pub entity_id: EntityId,
    pub action: AuditAction,
    pub partition_id: Option<PartitionId>,
    pub actor_id: ActorId,
    /// `None` on create.
    pub before_state: Option<RecordState>,
    /// `None` on delete.
    pub after_state: Option<RecordState>,
    /// Free-text justification; expected on approve/reject.
    pub reason: Option<String>,
}

/// One link of the chain. Never mutated once committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    /// 1-based position in global creation order.
    pub sequence: u64,
    pub entity_type: EntityType,
    pub entity_id: EntityId,
    pub action: AuditAction,
    pub partition_id: Option<PartitionId>,
    pub actor_id: ActorId,
    pub before_state: Option<RecordState>,
    pub after_state: Option<RecordState>,
    pub reason: Option<String>,
    #[serde(with = "hex_hash")]
    pub previous_hash: Hash,
    #[serde(with = "hex_hash")]
    pub record_hash: Hash,
    pub created_at: Timestamp,
}

/// The hashed projection of a record: every field except the two hashes.
#[derive(Serialize)]
struct HashedFields<'a> {
    id: &'a Uuid,
    sequence: u64,
    entity_type: EntityType,
    entity_id: EntityId,
    action: AuditAction,
    partition_id: Option<PartitionId>,
    actor_id: ActorId,
    before_state: Option<&'a RecordState>,
    after_state: Option<&'a RecordState>,
    reason: Option<&'a str>,
    created_at: Timestamp,
}

impl AuditRecord {
    /// Sequence, timestamp and hash a mutation.
    ///
    /// `created_at` is used verbatim for both the hash input and the stored
    /// field.
    pub fn seal(
        mutation: AuditMutation,
        sequence: u64,
        previous_hash: Hash,
        created_at: Timestamp,
    ) -> Result<Self, CanonicalError> {
        let mut record = Self {
            id: Uuid::new_v4(),
            sequence,
            entity_type: mutation.entity_type,
            entity_id: mutation.entity_id,
            action: mutation.action,
            partition_id: mutation.partition_id,
            actor_id: mutation.actor_id,
            before_state: mutation.before_state,
            after_state: mutation.after_state,
            reason: mutation.reason,
            previous_hash,
            record_hash: [0u8; 32],
            created_at,
        };
        record.record_hash = compute_record_hash(&record)?;
        Ok(record)
    }
}

/// `SHA-256(canonical_json(fields except hashes) ‖ previous_hash)`.
pub fn compute_record_hash(record: &AuditRecord) -> Result<Hash, CanonicalError> {
    let fields = HashedFields {
        id: &record.id,
        sequence: record.sequence,
        entity_type: record.entity_type,
        entity_id: record.entity_id,
        action: record.action,
        partition_id: record.partition_id,
        actor_id: record.actor_id,
        before_state: record.before_state.as_ref(),
        after_state: record.after_state.as_ref(),
        reason: record.reason.as_deref(),
        created_at: record.created_at,
    };
    let canonical = canonical_json(&fields)?;
    Ok(sha256(&[canonical.as_bytes(), &record.previous_hash]))
}
