//! # Integrity Runtime
//!
//! Wires the integrity subsystems and exposes the mutation-commit pipeline.
//!
//! ## Subsystems
//!
//! | Crate | Role in a mutation |
//! |-------|--------------------|
//! | `fi-01-access-scope` | Rejects writes outside the actor's partitions |
//! | `fi-02-optimistic-concurrency` | Conditional write on the expected version |
//! | `fi-03-material-ledger` | Per-issue locked return / adjustment insert |
//! | `fi-04-audit-chain` | Hash-linked record, committed with the write |
//! | `fi-05-invalidation-router` | Scoped, debounced cache invalidations |
//!
//! ## Usage
//!
//! ```rust,ignore
//! let container = IntegrityContainer::in_memory(IntegrityConfig::default(), SystemTimeSource);
//! let work_orders = container.records::<WorkOrderState, _>(Arc::new(InMemoryVersionedStore::new()));
//!
//! let created = work_orders.create(&actor, Some(site), draft).await?;
//! work_orders
//!     .update(&actor, Change::approve(created.value.id, 1), Box::new(approve))
//!     .await?;
//! ```

pub mod container;
pub mod pipeline;

pub use container::{ConfigError, IntegrityConfig, IntegrityContainer, Ledger, Scopes};
pub use pipeline::{
    AuditedRecords, Change, CommitError, CommitResult, Committed, ErrorKind, MutationGateway,
    Mutator, RecordPipeline,
};
