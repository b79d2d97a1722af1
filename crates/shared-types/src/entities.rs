//! # Core Domain Entities
//!
//! Identifiers and vocabulary shared by the integrity subsystems.
//!
//! ## Clusters
//!
//! - **Identity**: `ActorId`, `Role`, `Actor`
//! - **Partitioning**: `PartitionId`
//! - **Records**: `EntityId`, `EntityType`, `EntityRef`, `AuditAction`
//! - **Material**: `LotId`, `Quantity`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A 32-byte SHA-256 digest.
pub type Hash = [u8; 32];

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// Material quantity in the lot's base unit.
pub type Quantity = u64;

/// The `previous_hash` of the first audit record.
pub const GENESIS_HASH: Hash = [0u8; 32];

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Borrow the underlying UUID.
            #[must_use]
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a user or service principal performing a mutation.
    ActorId
);
uuid_id!(
    /// Identifier of an organizational partition (a factory / manufacturing site).
    PartitionId
);
uuid_id!(
    /// Identifier of any mutable business record.
    EntityId
);
uuid_id!(
    /// Identifier of a traceable batch of material.
    LotId
);

// =============================================================================
// RECORD VOCABULARY
// =============================================================================

/// Kinds of business records that flow through the integrity core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Sku,
    User,
    PartitionAssignment,
    WorkOrder,
    WorkOrderLine,
    Lot,
    MaterialIssue,
    MaterialReturn,
    LedgerAdjustment,
    DispatchNote,
    DispatchLine,
    ReceiptNote,
    ReceiptLine,
}

impl EntityType {
    /// Stable lowercase name used in canonical forms and cache keys.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sku => "sku",
            Self::User => "user",
            Self::PartitionAssignment => "partition_assignment",
            Self::WorkOrder => "work_order",
            Self::WorkOrderLine => "work_order_line",
            Self::Lot => "lot",
            Self::MaterialIssue => "material_issue",
            Self::MaterialReturn => "material_return",
            Self::LedgerAdjustment => "ledger_adjustment",
            Self::DispatchNote => "dispatch_note",
            Self::DispatchLine => "dispatch_line",
            Self::ReceiptNote => "receipt_note",
            Self::ReceiptLine => "receipt_line",
        }
    }

    /// The document type whose views also change when a record of this type changes.
    #[must_use]
    pub fn parent_type(&self) -> Option<EntityType> {
        match self {
            Self::WorkOrderLine => Some(Self::WorkOrder),
            Self::DispatchLine => Some(Self::DispatchNote),
            Self::ReceiptLine => Some(Self::ReceiptNote),
            Self::MaterialReturn | Self::LedgerAdjustment => Some(Self::MaterialIssue),
            Self::MaterialIssue => Some(Self::WorkOrder),
            _ => None,
        }
    }

    /// Whether records of this type always belong to a partition.
    ///
    /// The SKU catalog and user directory are shared by all factories.
    #[must_use]
    pub fn is_partitioned(&self) -> bool {
        !matches!(self, Self::Sku | Self::User)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed pointer to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_type: EntityType,
    pub entity_id: EntityId,
}

impl EntityRef {
    pub fn new(entity_type: EntityType, entity_id: EntityId) -> Self {
        Self {
            entity_type,
            entity_id,
        }
    }
}

/// Mutation kinds recorded in the audit chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Approve,
    Reject,
}

impl AuditAction {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Approve => "APPROVE",
            Self::Reject => "REJECT",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// IDENTITY
// =============================================================================

/// Organizational roles known to the ERP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Auditor,
    FactoryManager,
    Supervisor,
    Operator,
    Viewer,
}

impl Role {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Auditor => "auditor",
            Self::FactoryManager => "factory_manager",
            Self::Supervisor => "supervisor",
            Self::Operator => "operator",
            Self::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "auditor" => Ok(Self::Auditor),
            "factory_manager" => Ok(Self::FactoryManager),
            "supervisor" => Ok(Self::Supervisor),
            "operator" => Ok(Self::Operator),
            "viewer" => Ok(Self::Viewer),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// The caller of a core operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: ActorId, role: Role) -> Self {
        Self { id, role }
    }
}
