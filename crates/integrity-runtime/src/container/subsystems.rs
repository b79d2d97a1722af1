//! Subsystem wiring.

use super::config::IntegrityConfig;
use crate::pipeline::{MutationGateway, RecordPipeline};
use fi_01_access_scope::{InMemoryAssignmentStore, ScopeService};
use fi_02_optimistic_concurrency::{ConcurrencyController, VersionedStore};
use fi_03_material_ledger::{InMemoryLedgerStore, MaterialLedgerService};
use fi_04_audit_chain::{AuditChainService, AuditStore, FileAuditStore, InMemoryAuditStore};
use fi_05_invalidation_router::{DeliverySink, RouterHandle, RouterWorker, SubscriberRegistry};
use shared_bus::{EventPublisher, InMemoryEventBus};
use shared_types::{Auditable, StoreError, TimeSource};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Scope evaluator over the in-process assignment table.
pub type Scopes = ScopeService<InMemoryAssignmentStore>;

/// Material ledger over the in-process ledger store.
pub type Ledger<C> = MaterialLedgerService<InMemoryLedgerStore, Scopes, C>;

/// Every integrity subsystem, wired.
pub struct IntegrityContainer<A, C>
where
    A: AuditStore,
    C: TimeSource + Clone,
{
    pub config: IntegrityConfig,
    pub scopes: Arc<Scopes>,
    pub audit: Arc<AuditChainService<A, C>>,
    pub ledger: Arc<Ledger<C>>,
    pub bus: Arc<InMemoryEventBus>,
    pub subscribers: Arc<SubscriberRegistry>,
    pub gateway: Arc<MutationGateway<A, Scopes, C>>,
    clock: C,
}

impl<C: TimeSource + Clone> IntegrityContainer<InMemoryAuditStore, C> {
    /// Everything in process memory.
    pub fn in_memory(config: IntegrityConfig, clock: C) -> Self {
        Self::build(config, InMemoryAuditStore::new(), clock)
    }
}

impl<C: TimeSource + Clone> IntegrityContainer<FileAuditStore, C> {
    /// Audit chain persisted to a JSON-lines log at `path`.
    pub fn with_audit_log(
        config: IntegrityConfig,
        clock: C,
        path: impl AsRef<Path>,
    ) -> Result<Self, StoreError> {
        let store = FileAuditStore::open(path)?;
        Ok(Self::build(config, store, clock))
    }
}

impl<A, C> IntegrityContainer<A, C>
where
    A: AuditStore,
    C: TimeSource + Clone,
{
    /// Wire the subsystems around an audit store.
    pub fn build(config: IntegrityConfig, audit_store: A, clock: C) -> Self {
        let scopes = Arc::new(ScopeService::with_global_roles(
            InMemoryAssignmentStore::new(),
            config.scope.global_roles(),
        ));
        let audit = Arc::new(AuditChainService::with_config(
            audit_store,
            clock.clone(),
            config.audit.audit_config(),
        ));
        let ledger = Arc::new(MaterialLedgerService::new(
            InMemoryLedgerStore::new(),
            scopes.clone(),
            clock.clone(),
        ));
        let bus = Arc::new(InMemoryEventBus::with_capacity(
            config.invalidation.bus_capacity,
        ));
        let publisher: Arc<dyn EventPublisher> = bus.clone();
        let gateway = Arc::new(MutationGateway::new(
            scopes.clone(),
            audit.clone(),
            publisher,
            config.concurrency.max_update_attempts,
        ));

        info!(
            global_roles = ?config.scope.global_roles,
            bus_capacity = config.invalidation.bus_capacity,
            "Integrity subsystems wired"
        );

        Self {
            config,
            scopes,
            audit,
            ledger,
            bus,
            subscribers: Arc::new(SubscriberRegistry::new()),
            gateway,
            clock,
        }
    }

    /// The in-process assignment table.
    pub fn assignments(&self) -> &InMemoryAssignmentStore {
        self.scopes.provider()
    }

    /// Audited access to records of type `T` kept in `store`.
    pub fn records<T, S>(&self, store: Arc<S>) -> RecordPipeline<T, S, A, Scopes, C>
    where
        T: Auditable,
        S: VersionedStore<T>,
    {
        RecordPipeline::new(
            self.gateway.clone(),
            ConcurrencyController::new(store, self.clock.clone()),
        )
    }

    /// Start the invalidation router on this container's bus.
    pub fn spawn_router<D: DeliverySink + 'static>(&self, sink: Arc<D>) -> RouterHandle {
        RouterWorker::new(
            self.subscribers.clone(),
            self.scopes.clone(),
            sink,
            self.config.invalidation.debounce_window(),
        )
        .spawn(&self.bus)
    }
}
