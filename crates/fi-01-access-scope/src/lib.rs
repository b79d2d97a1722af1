//! # fi-01-access-scope
//!
//! Authorization Scope Evaluator: decides which partitions (factories) a
//! caller may read or write.
//!
//! ## Overview
//!
//! - **Pure evaluation**: [`scope_for`] derives an [`AccessScope`] from the
//!   actor's role and active assignments, nothing else.
//! - **Global bypass**: actors holding a global role see every partition.
//! - **Fail closed**: a scope lookup that errors is treated as "no access".
//!
//! ## Read vs. Write Semantics
//!
//! | Path  | Out-of-scope outcome |
//! |-------|----------------------|
//! | Read  | Record silently filtered ([`AccessScope::filter_visible`]) |
//! | Write | [`ScopeError::Denied`] before any state is touched |
//!
//! ## Example
//!
//! ```rust,ignore
//! use fi_01_access_scope::{InMemoryAssignmentStore, ScopeService};
//!
//! let store = InMemoryAssignmentStore::new();
//! store.assign(actor.id, factory_a);
//! let scopes = ScopeService::new(store);
//!
//! scopes.ensure_access(&actor, factory_a).await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::memory::InMemoryAssignmentStore;
pub use domain::scope::{scope_for, AccessScope, GlobalRoles};
pub use error::{ScopeError, ScopeResult};
pub use ports::inbound::ScopeEvaluator;
pub use ports::outbound::AssignmentProvider;
pub use service::ScopeService;
