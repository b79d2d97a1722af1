//! Shared fixture: an in-memory container with two factory sites.

use fi_02_optimistic_concurrency::InMemoryVersionedStore;
use fi_04_audit_chain::InMemoryAuditStore;
use integrity_runtime::{IntegrityConfig, IntegrityContainer, RecordPipeline, Scopes};
use shared_types::{
    Actor, ActorId, EntityId, LotId, ManualClock, MaterialIssue, PartitionId, Role,
    WorkOrderState, WorkOrderStatus,
};
use std::sync::Arc;

pub type Container = IntegrityContainer<InMemoryAuditStore, ManualClock>;

pub type WorkOrders = RecordPipeline<
    WorkOrderState,
    InMemoryVersionedStore<WorkOrderState>,
    InMemoryAuditStore,
    Scopes,
    ManualClock,
>;

/// Start of every fixture clock.
pub const EPOCH: u64 = 1_760_000_000_000;

pub struct Plant {
    pub container: Container,
    pub clock: ManualClock,
    pub north: PartitionId,
    pub south: PartitionId,
    /// Operator assigned to `north` only.
    pub north_operator: Actor,
    /// Operator assigned to `south` only.
    pub south_operator: Actor,
    pub admin: Actor,
}

impl Plant {
    pub fn new() -> Self {
        Self::with_config(IntegrityConfig::default())
    }

    pub fn with_config(config: IntegrityConfig) -> Self {
        let clock = ManualClock::starting_at(EPOCH);
        let container = IntegrityContainer::in_memory(config, clock.clone());
        let (north, south) = (PartitionId::new(), PartitionId::new());

        let north_operator = Actor::new(ActorId::new(), Role::Operator);
        let south_operator = Actor::new(ActorId::new(), Role::Operator);
        container.assignments().assign(north_operator.id, north);
        container.assignments().assign(south_operator.id, south);

        Self {
            container,
            clock,
            north,
            south,
            north_operator,
            south_operator,
            admin: Actor::new(ActorId::new(), Role::Admin),
        }
    }

    pub fn work_orders(&self) -> WorkOrders {
        self.container
            .records(Arc::new(InMemoryVersionedStore::new()))
    }

    pub fn audit_store(&self) -> &InMemoryAuditStore {
        self.container.audit.store()
    }
}

impl Default for Plant {
    fn default() -> Self {
        Self::new()
    }
}

pub fn work_order(number: &str) -> WorkOrderState {
    WorkOrderState {
        number: number.into(),
        sku_code: "HSG-1180".into(),
        planned_quantity: 250,
        status: WorkOrderStatus::Draft,
    }
}

pub fn issue(partition_id: PartitionId, quantity: u64) -> MaterialIssue {
    MaterialIssue {
        id: EntityId::new(),
        lot_id: LotId::new(),
        partition_id,
        work_order_id: None,
        issued_quantity: quantity,
        created_at: EPOCH,
    }
}
