//! Domain layer for the audit chain.

pub mod record;
pub mod value_objects;
pub mod verify;

pub use record::{compute_record_hash, AuditMutation, AuditRecord};
pub use value_objects::AuditConfig;
pub use verify::{verify_records, ChainVerification, ChainViolation, ViolationKind};
