//! # fi-04-audit-chain
//!
//! Audit Chain Service: one hash-linked record per committed mutation.
//!
//! ## Chain Layout
//!
//! ```text
//!   GENESIS (0x00…00)
//!        │
//!        ▼
//! ┌─────────────┐   ┌─────────────┐   ┌─────────────┐
//! │ #1          │   │ #2          │   │ #3          │
//! │ prev = 0…0  │◄──│ prev = h1   │◄──│ prev = h2   │
//! │ hash = h1   │   │ hash = h2   │   │ hash = h3   │
//! └─────────────┘   └─────────────┘   └─────────────┘
//!
//! hash = SHA-256( canonical_json(fields except hash, prev) ‖ prev )
//! ```
//!
//! ## Single Writer Lane
//!
//! Appends are totally ordered through one async mutex: read tail, compute
//! hash, insert all happen while the lane is held. The commit pipeline keeps
//! the lane across its business write so the audit record and the mutation
//! become visible together or not at all:
//!
//! ```text
//! lock_tail() ─→ stage(mutation) ─→ business write ─┬─ ok  ─→ commit()
//!                  (prepare)                         └─ err ─→ drop (rollback)
//! ```
//!
//! ## Verification
//!
//! [`AuditChainService::verify_chain`] walks records in creation order,
//! recomputes every hash, checks every link against the *recomputed* hash of
//! the predecessor and reports all divergences. A single edited record
//! therefore breaks at its own sequence and again at its successor.

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::file::FileAuditStore;
pub use adapters::memory::InMemoryAuditStore;
pub use domain::record::{compute_record_hash, AuditMutation, AuditRecord};
pub use domain::value_objects::AuditConfig;
pub use domain::verify::{verify_records, ChainVerification, ChainViolation, ViolationKind};
pub use error::{AuditError, AuditResult};
pub use ports::outbound::{AuditStore, ChainTail, PendingAppend};
pub use service::{AuditChainService, AuditLane, StagedAudit};
