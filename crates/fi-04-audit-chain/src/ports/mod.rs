//! Ports for the audit chain.

pub mod outbound;

pub use outbound::{AuditStore, ChainTail, PendingAppend};
