//! # Concurrency Controller
//!
//! Applies mutations through a single conditional write and turns a miss
//! into a structured error.

use crate::domain::versioned::{PreparedUpdate, Versioned};
use crate::error::{ConcurrencyError, ConcurrencyResult};
use crate::ports::outbound::VersionedStore;
use shared_types::{EntityId, PartitionId, TimeSource};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// Optimistic concurrency controller over one record type.
pub struct ConcurrencyController<T, S, C>
where
    T: Clone + Send + Sync + 'static,
    S: VersionedStore<T>,
    C: TimeSource,
{
    store: Arc<S>,
    clock: C,
    _record: PhantomData<fn() -> T>,
}

impl<T, S, C> ConcurrencyController<T, S, C>
where
    T: Clone + Send + Sync + 'static,
    S: VersionedStore<T>,
    C: TimeSource,
{
    pub fn new(store: Arc<S>, clock: C) -> Self {
        Self {
            store,
            clock,
            _record: PhantomData,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Read the current state of a record.
    pub async fn get(&self, id: EntityId) -> ConcurrencyResult<Versioned<T>> {
        self.store
            .get(id)
            .await?
            .ok_or(ConcurrencyError::NotFound { entity_id: id })
    }

    /// Build a version-1 record without writing it.
    pub fn new_record(
        &self,
        id: EntityId,
        partition_id: Option<PartitionId>,
        data: T,
    ) -> Versioned<T> {
        Versioned::new(id, partition_id, data, self.clock.now_millis())
    }

    /// Write a new record.
    ///
    /// ## Errors
    ///
    /// - `AlreadyExists`: the id is taken
    pub async fn insert(&self, record: Versioned<T>) -> ConcurrencyResult<Versioned<T>> {
        if !self.store.insert(record.clone()).await? {
            return Err(ConcurrencyError::AlreadyExists {
                entity_id: record.id,
            });
        }
        debug!(entity_id = %record.id, "Record created at version 1");
        Ok(record)
    }

    /// Read the record and run the mutator, without writing.
    ///
    /// A stale `expected_version` is not rejected here; the conditional
    /// write in [`commit_prepared`](Self::commit_prepared) is the only judge.
    pub async fn prepare<F>(
        &self,
        id: EntityId,
        expected_version: u64,
        mutator: F,
    ) -> ConcurrencyResult<PreparedUpdate<T>>
    where
        F: FnOnce(&T) -> T,
    {
        if expected_version == 0 {
            return Err(ConcurrencyError::InvalidVersion {
                entity_id: id,
                version: expected_version,
            });
        }
        let before = self.get(id).await?;
        self.prepare_from(before, expected_version, mutator)
    }

    /// Run the mutator on a record the caller already read, without writing.
    pub fn prepare_from<F>(
        &self,
        before: Versioned<T>,
        expected_version: u64,
        mutator: F,
    ) -> ConcurrencyResult<PreparedUpdate<T>>
    where
        F: FnOnce(&T) -> T,
    {
        let invalid = ConcurrencyError::InvalidVersion {
            entity_id: before.id,
            version: expected_version,
        };
        if expected_version == 0 {
            return Err(invalid);
        }
        let data = mutator(&before.data);
        let after = before
            .successor(expected_version, data, self.clock.now_millis())
            .ok_or(invalid)?;

        Ok(PreparedUpdate {
            before,
            after,
            expected_version,
        })
    }

    /// Perform the conditional write of a prepared update.
    ///
    /// ## Errors
    ///
    /// - `Conflict`: the stored version is no longer `expected_version`
    /// - `NotFound`: the record was deleted in the meantime
    pub async fn commit_prepared(
        &self,
        prepared: PreparedUpdate<T>,
    ) -> ConcurrencyResult<Versioned<T>> {
        let PreparedUpdate {
            after,
            expected_version,
            ..
        } = prepared;
        let id = after.id;

        let rows = self
            .store
            .conditional_update(expected_version, after.clone())
            .await?;
        if rows == 1 {
            debug!(entity_id = %id, version = after.version, "Conditional update applied");
            return Ok(after);
        }

        Err(self.explain_miss(id, expected_version).await)
    }

    /// `UPDATE … WHERE id = ? AND version = ?` with `version = expected + 1`.
    pub async fn apply_conditional_update<F>(
        &self,
        id: EntityId,
        expected_version: u64,
        mutator: F,
    ) -> ConcurrencyResult<Versioned<T>>
    where
        F: FnOnce(&T) -> T,
    {
        let prepared = self.prepare(id, expected_version, mutator).await?;
        self.commit_prepared(prepared).await
    }

    /// Read the state a delete at `expected_version` would remove.
    pub async fn prepare_delete(
        &self,
        id: EntityId,
        expected_version: u64,
    ) -> ConcurrencyResult<Versioned<T>> {
        if expected_version == 0 {
            return Err(ConcurrencyError::InvalidVersion {
                entity_id: id,
                version: expected_version,
            });
        }
        self.get(id).await
    }

    /// `DELETE … WHERE id = ? AND version = ?`.
    pub async fn conditional_delete(&self, id: EntityId, expected_version: u64) -> ConcurrencyResult<()> {
        let rows = self.store.conditional_delete(id, expected_version).await?;
        if rows == 1 {
            debug!(entity_id = %id, version = expected_version, "Conditional delete applied");
            return Ok(());
        }
        Err(self.explain_miss(id, expected_version).await)
    }

    /// Opt-in retry: each attempt re-reads the record and re-runs the mutator
    /// on that fresh state.
    ///
    /// Returns the last conflict once `attempts` are exhausted.
    pub async fn apply_with_retry<F>(
        &self,
        id: EntityId,
        attempts: u32,
        mutator: F,
    ) -> ConcurrencyResult<Versioned<T>>
    where
        F: Fn(&T) -> T,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let current = self.get(id).await?;
            match self
                .apply_conditional_update(id, current.version, &mutator)
                .await
            {
                Err(ConcurrencyError::Conflict {
                    current_version, ..
                }) if attempt < attempts.max(1) => {
                    debug!(entity_id = %id, attempt, current_version, "Conflict, retrying on fresh state");
                }
                other => return other,
            }
        }
    }

    /// Zero rows affected: re-read to tell a conflict from a missing record.
    async fn explain_miss(&self, id: EntityId, expected_version: u64) -> ConcurrencyError {
        match self.store.get(id).await {
            Ok(Some(current)) => {
                debug!(
                    entity_id = %id,
                    expected_version,
                    current_version = current.version,
                    "Version conflict"
                );
                ConcurrencyError::Conflict {
                    entity_id: id,
                    expected_version,
                    current_version: current.version,
                }
            }
            Ok(None) => ConcurrencyError::NotFound { entity_id: id },
            Err(e) => ConcurrencyError::Store(e),
        }
    }
}
