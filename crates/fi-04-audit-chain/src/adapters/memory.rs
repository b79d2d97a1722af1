//! In-memory audit store.

use super::index::ChainIndex;
use crate::domain::record::AuditRecord;
use crate::error::{AuditError, AuditResult};
use crate::ports::outbound::{AuditStore, ChainTail, PendingAppend};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{EntityId, EntityType, StoreError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Audit store held in process memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryAuditStore {
    index: Arc<RwLock<ChainIndex>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryAuditStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `prepare` fail, as a lost connection would.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Rewrite a committed record in place, bypassing the chain.
    ///
    /// Simulates an out-of-band write to the underlying table so that
    /// verification can be exercised. Returns `false` if no such record.
    pub fn tamper_with<F>(&self, sequence: u64, edit: F) -> bool
    where
        F: FnOnce(&mut AuditRecord),
    {
        match self.index.write().get_mut(sequence) {
            Some(record) => {
                edit(record);
                true
            }
            None => false,
        }
    }
}

/// Staged record of an [`InMemoryAuditStore`].
#[derive(Debug)]
pub struct MemoryPending {
    index: Arc<RwLock<ChainIndex>>,
    record: AuditRecord,
    committed: bool,
}

impl PendingAppend for MemoryPending {
    fn record(&self) -> &AuditRecord {
        &self.record
    }

    fn commit(mut self) -> AuditRecord {
        self.committed = true;
        self.index.write().finish(self.record.clone());
        self.record.clone()
    }
}

impl Drop for MemoryPending {
    fn drop(&mut self) {
        if !self.committed {
            self.index.write().abort();
        }
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    type Pending = MemoryPending;

    async fn tail(&self) -> AuditResult<Option<ChainTail>> {
        Ok(self.index.read().tail())
    }

    fn prepare(&self, record: AuditRecord) -> AuditResult<MemoryPending> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AuditError::Store(StoreError::Unavailable(
                "audit store offline".into(),
            )));
        }
        self.index.write().begin(&record)?;
        Ok(MemoryPending {
            index: self.index.clone(),
            record,
            committed: false,
        })
    }

    async fn get(&self, sequence: u64) -> AuditResult<Option<AuditRecord>> {
        Ok(self.index.read().get(sequence).cloned())
    }

    async fn range(&self, from: u64, to: Option<u64>) -> AuditResult<Vec<AuditRecord>> {
        Ok(self.index.read().range(from, to))
    }

    async fn by_entity(
        &self,
        entity_type: EntityType,
        entity_id: EntityId,
        limit: usize,
    ) -> AuditResult<Vec<AuditRecord>> {
        Ok(self.index.read().by_entity(entity_type, entity_id, limit))
    }

    async fn len(&self) -> AuditResult<u64> {
        Ok(self.index.read().len())
    }
}
