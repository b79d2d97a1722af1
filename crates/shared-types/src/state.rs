//! # Record States
//!
//! Before/after payloads carried by audited mutations.
//!
//! [`RecordState`] is a tagged union over the record kinds the ERP knows
//! about. Forward-compatible payloads from modules newer than this crate use
//! the [`RecordState::Opaque`] variant, whose fields live in a sorted map so
//! canonicalization stays deterministic.

use crate::entities::{
    ActorId, EntityId, EntityRef, EntityType, LotId, PartitionId, Quantity, Timestamp,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// CATALOG & ASSIGNMENTS
// =============================================================================

/// A stock keeping unit in the shared catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuState {
    pub code: String,
    pub name: String,
    pub unit: String,
    pub active: bool,
}

/// Grant of partition access to an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionAssignment {
    pub actor_id: ActorId,
    pub partition_id: PartitionId,
    pub is_active: bool,
}

// =============================================================================
// WORK ORDERS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    Draft,
    PendingApproval,
    Approved,
    Rejected,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrderState {
    pub number: String,
    pub sku_code: String,
    pub planned_quantity: Quantity,
    pub status: WorkOrderStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrderLineState {
    pub work_order_id: EntityId,
    pub lot_id: LotId,
    pub required_quantity: Quantity,
}

// =============================================================================
// DISPATCH / RECEIPT DOCUMENTS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLine {
    pub sku_code: String,
    pub lot_id: Option<LotId>,
    pub quantity: Quantity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchNoteState {
    pub number: String,
    pub destination: String,
    pub status: DocumentStatus,
    pub lines: Vec<DocumentLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptNoteState {
    pub number: String,
    pub supplier: String,
    pub status: DocumentStatus,
    pub lines: Vec<DocumentLine>,
}

// =============================================================================
// MATERIAL LEDGER
// =============================================================================

/// Material handed out of a lot to the shop floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialIssue {
    pub id: EntityId,
    pub lot_id: LotId,
    pub partition_id: PartitionId,
    /// Work order consuming the material, if any.
    pub work_order_id: Option<EntityId>,
    pub issued_quantity: Quantity,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnReason {
    Unused,
    Excess,
    Defective,
    WrongMaterial,
    Other(String),
}

/// Material handed back against an issue. Permanent once committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialReturn {
    pub id: EntityId,
    pub material_issue_id: EntityId,
    pub returned_quantity: Quantity,
    pub reason_code: ReturnReason,
    pub returned_by: ActorId,
    pub created_at: Timestamp,
}

/// Correction reversing part of the quantity already returned against an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAdjustment {
    pub id: EntityId,
    pub material_issue_id: EntityId,
    pub reversed_quantity: Quantity,
    pub reason: String,
    pub adjusted_by: ActorId,
    pub created_at: Timestamp,
}

// =============================================================================
// TAGGED UNION
// =============================================================================

/// Forward-compatible payload for record kinds not modelled here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpaqueState {
    pub kind: String,
    pub fields: BTreeMap<String, Value>,
}

/// Snapshot of a record before or after a mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum RecordState {
    Sku(SkuState),
    PartitionAssignment(PartitionAssignment),
    WorkOrder(WorkOrderState),
    WorkOrderLine(WorkOrderLineState),
    DispatchNote(DispatchNoteState),
    ReceiptNote(ReceiptNoteState),
    MaterialIssue(MaterialIssue),
    MaterialReturn(MaterialReturn),
    LedgerAdjustment(LedgerAdjustment),
    Opaque(OpaqueState),
}

impl RecordState {
    /// Top-level field names whose values differ between two snapshots.
    ///
    /// A missing side counts as "every field changed" (create / delete).
    /// Snapshots of different kinds report the union of their fields.
    #[must_use]
    pub fn changed_fields(before: Option<&RecordState>, after: Option<&RecordState>) -> Vec<String> {
        let before = before.map(Self::field_map).unwrap_or_default();
        let after = after.map(Self::field_map).unwrap_or_default();

        let keys: BTreeSet<&String> = before.keys().chain(after.keys()).collect();
        keys.into_iter()
            .filter(|k| before.get(*k) != after.get(*k))
            .cloned()
            .collect()
    }

    fn field_map(state: &RecordState) -> BTreeMap<String, Value> {
        if let RecordState::Opaque(opaque) = state {
            return opaque.fields.clone();
        }
        match serde_json::to_value(state) {
            Ok(Value::Object(mut outer)) => match outer.remove("data") {
                Some(Value::Object(data)) => data.into_iter().collect(),
                _ => BTreeMap::new(),
            },
            _ => BTreeMap::new(),
        }
    }
}

/// A business record that can be versioned and audited.
///
/// Implemented by every payload the mutation-commit pipeline accepts, so the
/// pipeline can derive entity type, partition and audit snapshot generically.
pub trait Auditable: Clone + Send + Sync + 'static {
    /// The record kind.
    const ENTITY_TYPE: EntityType;

    /// Audit snapshot of this value.
    fn to_state(&self) -> RecordState;

    /// Parent document whose views change along with this record.
    fn parent(&self) -> Option<EntityRef> {
        None
    }
}

impl Auditable for SkuState {
    const ENTITY_TYPE: EntityType = EntityType::Sku;

    fn to_state(&self) -> RecordState {
        RecordState::Sku(self.clone())
    }
}

impl Auditable for PartitionAssignment {
    const ENTITY_TYPE: EntityType = EntityType::PartitionAssignment;

    fn to_state(&self) -> RecordState {
        RecordState::PartitionAssignment(*self)
    }
}

impl Auditable for WorkOrderState {
    const ENTITY_TYPE: EntityType = EntityType::WorkOrder;

    fn to_state(&self) -> RecordState {
        RecordState::WorkOrder(self.clone())
    }
}

impl Auditable for WorkOrderLineState {
    const ENTITY_TYPE: EntityType = EntityType::WorkOrderLine;

    fn to_state(&self) -> RecordState {
        RecordState::WorkOrderLine(self.clone())
    }

    fn parent(&self) -> Option<EntityRef> {
        Some(EntityRef::new(EntityType::WorkOrder, self.work_order_id))
    }
}

impl Auditable for DispatchNoteState {
    const ENTITY_TYPE: EntityType = EntityType::DispatchNote;

    fn to_state(&self) -> RecordState {
        RecordState::DispatchNote(self.clone())
    }
}

impl Auditable for ReceiptNoteState {
    const ENTITY_TYPE: EntityType = EntityType::ReceiptNote;

    fn to_state(&self) -> RecordState {
        RecordState::ReceiptNote(self.clone())
    }
}

impl Auditable for MaterialIssue {
    const ENTITY_TYPE: EntityType = EntityType::MaterialIssue;

    fn to_state(&self) -> RecordState {
        RecordState::MaterialIssue(self.clone())
    }

    fn parent(&self) -> Option<EntityRef> {
        self.work_order_id
            .map(|id| EntityRef::new(EntityType::WorkOrder, id))
    }
}

impl Auditable for MaterialReturn {
    const ENTITY_TYPE: EntityType = EntityType::MaterialReturn;

    fn to_state(&self) -> RecordState {
        RecordState::MaterialReturn(self.clone())
    }

    fn parent(&self) -> Option<EntityRef> {
        Some(EntityRef::new(
            EntityType::MaterialIssue,
            self.material_issue_id,
        ))
    }
}

impl Auditable for LedgerAdjustment {
    const ENTITY_TYPE: EntityType = EntityType::LedgerAdjustment;

    fn to_state(&self) -> RecordState {
        RecordState::LedgerAdjustment(self.clone())
    }

    fn parent(&self) -> Option<EntityRef> {
        Some(EntityRef::new(
            EntityType::MaterialIssue,
            self.material_issue_id,
        ))
    }
}
