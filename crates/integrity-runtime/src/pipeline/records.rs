//! # Record Capability
//!
//! [`AuditedRecords`] is what a business module is handed instead of a raw
//! store: the only way to write a record of type `T` is through the
//! gateway, so no write can skip the scope check or the audit chain.

use super::error::CommitResult;
use super::gateway::{Change, Committed, MutationGateway};
use async_trait::async_trait;
use fi_01_access_scope::ScopeEvaluator;
use fi_02_optimistic_concurrency::{
    ConcurrencyController, ConcurrencyError, Versioned, VersionedStore,
};
use fi_04_audit_chain::{AuditRecord, AuditStore};
use shared_types::{Actor, Auditable, EntityId, PartitionId, TimeSource};
use std::sync::Arc;

/// Computes a record's next state from its current one.
pub type Mutator<T> = Box<dyn FnOnce(&T) -> T + Send>;

/// Audited write and read access to one record type.
#[async_trait]
pub trait AuditedRecords<T: Auditable>: Send + Sync {
    async fn get(&self, actor: &Actor, id: EntityId) -> CommitResult<Option<Versioned<T>>>;

    async fn create(
        &self,
        actor: &Actor,
        partition_id: Option<PartitionId>,
        data: T,
    ) -> CommitResult<Committed<Versioned<T>>>;

    async fn update(
        &self,
        actor: &Actor,
        change: Change,
        mutator: Mutator<T>,
    ) -> CommitResult<Committed<Versioned<T>>>;

    async fn delete(
        &self,
        actor: &Actor,
        id: EntityId,
        expected_version: u64,
        reason: Option<String>,
    ) -> CommitResult<Committed<Versioned<T>>>;

    async fn trail(
        &self,
        actor: &Actor,
        id: EntityId,
        limit: Option<usize>,
    ) -> CommitResult<Vec<AuditRecord>>;
}

/// [`AuditedRecords`] over a concurrency controller and the shared gateway.
pub struct RecordPipeline<T, S, A, E, C>
where
    T: Auditable,
    S: VersionedStore<T>,
    A: AuditStore,
    E: ScopeEvaluator,
    C: TimeSource,
{
    gateway: Arc<MutationGateway<A, E, C>>,
    records: ConcurrencyController<T, S, C>,
}

impl<T, S, A, E, C> RecordPipeline<T, S, A, E, C>
where
    T: Auditable,
    S: VersionedStore<T>,
    A: AuditStore,
    E: ScopeEvaluator,
    C: TimeSource,
{
    pub fn new(gateway: Arc<MutationGateway<A, E, C>>, records: ConcurrencyController<T, S, C>) -> Self {
        Self { gateway, records }
    }

    /// The underlying controller, for reads that need no scope check.
    pub fn controller(&self) -> &ConcurrencyController<T, S, C> {
        &self.records
    }
}

#[async_trait]
impl<T, S, A, E, C> AuditedRecords<T> for RecordPipeline<T, S, A, E, C>
where
    T: Auditable,
    S: VersionedStore<T>,
    A: AuditStore,
    E: ScopeEvaluator,
    C: TimeSource,
{
    /// `None` when the record is missing or outside the actor's scope.
    async fn get(&self, actor: &Actor, id: EntityId) -> CommitResult<Option<Versioned<T>>> {
        let record = match self.records.get(id).await {
            Ok(record) => record,
            Err(ConcurrencyError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let scope = self.gateway.scopes().evaluate_scope(actor).await;
        Ok(scope.can_see(record.partition_id.as_ref()).then_some(record))
    }

    async fn create(
        &self,
        actor: &Actor,
        partition_id: Option<PartitionId>,
        data: T,
    ) -> CommitResult<Committed<Versioned<T>>> {
        self.gateway
            .create(actor, &self.records, partition_id, data)
            .await
    }

    async fn update(
        &self,
        actor: &Actor,
        change: Change,
        mutator: Mutator<T>,
    ) -> CommitResult<Committed<Versioned<T>>> {
        self.gateway
            .update(actor, &self.records, change, mutator)
            .await
    }

    async fn delete(
        &self,
        actor: &Actor,
        id: EntityId,
        expected_version: u64,
        reason: Option<String>,
    ) -> CommitResult<Committed<Versioned<T>>> {
        self.gateway
            .delete(actor, &self.records, id, expected_version, reason)
            .await
    }

    async fn trail(
        &self,
        actor: &Actor,
        id: EntityId,
        limit: Option<usize>,
    ) -> CommitResult<Vec<AuditRecord>> {
        self.gateway.trail_for(actor, T::ENTITY_TYPE, id, limit).await
    }
}
