//! # Audit Chain Service
//!
//! Serializes appends through a single writer lane and exposes verification
//! and per-entity trails.

use crate::domain::record::{AuditMutation, AuditRecord};
use crate::domain::value_objects::AuditConfig;
use crate::domain::verify::{verify_records, ChainVerification};
use crate::error::{AuditError, AuditResult};
use crate::ports::outbound::{AuditStore, PendingAppend};
use shared_types::{EntityId, EntityType, TimeSource, GENESIS_HASH};
use std::ops::RangeInclusive;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, warn};

/// The audit chain service.
pub struct AuditChainService<S: AuditStore, C: TimeSource> {
    store: S,
    clock: C,
    config: AuditConfig,
    /// The single writer lane. Held from tail read until commit or rollback.
    lane: Mutex<()>,
}

/// Exclusive right to append the next record.
pub struct AuditLane<'a, S: AuditStore, C: TimeSource> {
    service: &'a AuditChainService<S, C>,
    guard: MutexGuard<'a, ()>,
}

/// A sealed record waiting for the business write it describes.
///
/// Keeps the writer lane until [`commit`](Self::commit); dropping it rolls
/// the record back and frees the lane.
pub struct StagedAudit<'a, S: AuditStore> {
    // Field order matters: the pending append must be released before the lane.
    pending: S::Pending,
    guard: MutexGuard<'a, ()>,
}

impl<S: AuditStore, C: TimeSource> AuditChainService<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self::with_config(store, clock, AuditConfig::default())
    }

    pub fn with_config(store: S, clock: C, config: AuditConfig) -> Self {
        Self {
            store,
            clock,
            config,
            lane: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Wait for the writer lane.
    pub async fn lock_tail(&self) -> AuditLane<'_, S, C> {
        AuditLane {
            service: self,
            guard: self.lane.lock().await,
        }
    }

    /// Append a mutation on its own: lock, stage, commit.
    pub async fn append(&self, mutation: AuditMutation) -> AuditResult<AuditRecord> {
        let staged = self.lock_tail().await.stage(mutation).await?;
        Ok(staged.commit())
    }

    /// Verify the chain, or the inclusive sequence range given.
    ///
    /// A range is anchored to the *stored* hash of the record just before it.
    pub async fn verify_chain(
        &self,
        range: Option<RangeInclusive<u64>>,
    ) -> AuditResult<ChainVerification> {
        let (from, to) = match range {
            Some(r) => ((*r.start()).max(1), Some(*r.end())),
            None => (1, None),
        };

        let records = self.store.range(from, to).await?;
        if records.is_empty() {
            return Ok(ChainVerification::empty());
        }

        let anchor = if from == 1 {
            GENESIS_HASH
        } else {
            self.store
                .get(from - 1)
                .await?
                .map_or(GENESIS_HASH, |r| r.record_hash)
        };

        let result = verify_records(&records, anchor, from);
        if let Some(broken_at) = result.broken_at {
            error!(
                broken_at,
                checked = result.checked,
                violations = result.violations.len(),
                "Audit chain integrity violation"
            );
        } else {
            debug!(checked = result.checked, from, "Audit chain verified");
        }
        Ok(result)
    }

    /// Like [`verify_chain`](Self::verify_chain) over the whole chain, but a
    /// broken chain is an error.
    pub async fn ensure_intact(&self) -> AuditResult<ChainVerification> {
        let result = self.verify_chain(None).await?;
        match result.broken_at {
            Some(broken_at) => Err(AuditError::IntegrityViolation {
                broken_at,
                checked: result.checked,
            }),
            None => Ok(result),
        }
    }

    /// Newest-first audit trail of one entity.
    ///
    /// `limit` defaults to the configured trail size and is clamped to the
    /// configured maximum.
    pub async fn trail_for(
        &self,
        entity_type: EntityType,
        entity_id: EntityId,
        limit: Option<usize>,
    ) -> AuditResult<Vec<AuditRecord>> {
        let limit = self.config.effective_limit(limit);
        self.store.by_entity(entity_type, entity_id, limit).await
    }

    /// Number of committed records.
    pub async fn len(&self) -> AuditResult<u64> {
        self.store.len().await
    }
}

impl<'a, S: AuditStore, C: TimeSource> AuditLane<'a, S, C> {
    /// Seal `mutation` as the successor of the current tail and stage it.
    ///
    /// Every failure here is an append failure: the enclosing mutation must
    /// be abandoned.
    pub async fn stage(self, mutation: AuditMutation) -> AuditResult<StagedAudit<'a, S>> {
        let service = self.service;
        let entity_type = mutation.entity_type;
        let entity_id = mutation.entity_id;

        let pending = async {
            let tail = service.store.tail().await?;
            let (sequence, previous_hash) = match tail {
                Some(t) => (t.sequence + 1, t.record_hash),
                None => (1, GENESIS_HASH),
            };
            let created_at = service.clock.now_millis();
            let record = AuditRecord::seal(mutation, sequence, previous_hash, created_at)?;
            service.store.prepare(record)
        }
        .await
        .map_err(|e| {
            warn!(entity_type = %entity_type, entity_id = %entity_id, error = %e, "Audit append failed");
            match e {
                AuditError::AppendFailed { .. } => e,
                other => AuditError::append_failed(other),
            }
        })?;

        debug!(
            sequence = pending.record().sequence,
            entity_type = %entity_type,
            entity_id = %entity_id,
            "Audit record staged"
        );
        Ok(StagedAudit {
            pending,
            guard: self.guard,
        })
    }
}

impl<'a, S: AuditStore> StagedAudit<'a, S> {
    #[must_use]
    pub fn record(&self) -> &AuditRecord {
        self.pending.record()
    }

    /// Publish the record and release the lane.
    pub fn commit(self) -> AuditRecord {
        let StagedAudit { pending, guard } = self;
        let record = pending.commit();
        drop(guard);
        record
    }
}

#[cfg(test)]
mod tests;
