//! # Outbound Ports (Driven Ports)
//!
//! The append-only, ordered audit store.
//!
//! Appends are two-phase so that the audit record can be made durable
//! together with the business write it describes:
//!
//! 1. [`AuditStore::prepare`] does every fallible step (space, I/O, ordering).
//! 2. [`PendingAppend::commit`] publishes the record and cannot fail.
//! 3. Dropping a [`PendingAppend`] without committing rolls it back.

use crate::domain::record::AuditRecord;
use crate::error::AuditResult;
use async_trait::async_trait;
use shared_types::{EntityId, EntityType, Hash};

/// Position of the last committed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainTail {
    pub sequence: u64,
    pub record_hash: Hash,
}

/// A staged record awaiting publication.
pub trait PendingAppend: Send {
    fn record(&self) -> &AuditRecord;

    /// Make the record visible to readers.
    fn commit(self) -> AuditRecord;
}

/// Append-only audit store queryable by order and by entity.
///
/// Callers serialize `prepare`/`commit` pairs; a store may reject a second
/// `prepare` while one is pending.
#[async_trait]
pub trait AuditStore: Send + Sync {
    type Pending: PendingAppend;

    /// Last committed record, `None` for an empty chain.
    async fn tail(&self) -> AuditResult<Option<ChainTail>>;

    /// Stage `record`, which must be the successor of the current tail.
    fn prepare(&self, record: AuditRecord) -> AuditResult<Self::Pending>;

    /// Record at `sequence`.
    async fn get(&self, sequence: u64) -> AuditResult<Option<AuditRecord>>;

    /// Records with `from <= sequence <= to` in creation order; `to = None`
    /// reads to the tail.
    async fn range(&self, from: u64, to: Option<u64>) -> AuditResult<Vec<AuditRecord>>;

    /// Newest-first records of one entity, at most `limit`.
    async fn by_entity(
        &self,
        entity_type: EntityType,
        entity_id: EntityId,
        limit: usize,
    ) -> AuditResult<Vec<AuditRecord>>;

    /// Number of committed records.
    async fn len(&self) -> AuditResult<u64>;
}
