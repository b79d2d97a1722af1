//! Inbound ledger requests.

use serde::{Deserialize, Serialize};
use shared_types::{ActorId, EntityId, Quantity, ReturnReason};

/// Return part of a material issue to stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnRequest {
    pub material_issue_id: EntityId,
    pub quantity: Quantity,
    pub reason_code: ReturnReason,
    pub returned_by: ActorId,
}

/// Reverse part of previously returned quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentRequest {
    pub material_issue_id: EntityId,
    pub reversed_quantity: Quantity,
    pub reason: String,
    pub adjusted_by: ActorId,
}
