//! # fi-02-optimistic-concurrency
//!
//! Optimistic Concurrency Controller: prevents silent lost updates.
//!
//! ## Protocol
//!
//! ```text
//! read v3 ──→ mutator(state) ──→ UPDATE … WHERE id = ? AND version = 3
//!                                     │
//!                 rows = 1 ───────────┼──────────→ Versioned { version: 4 }
//!                                     │
//!                 rows = 0 ──→ re-read ──→ missing  → NotFound
//!                                     └──→ present  → Conflict { current_version }
//! ```
//!
//! The controller never retries on its own. [`ConcurrencyController::apply_with_retry`]
//! is an explicit opt-in that re-reads fresh state before every attempt.
//!
//! ## Two-Phase Use
//!
//! The commit pipeline needs the before/after pair *before* the write lands
//! so it can stage the audit record. [`ConcurrencyController::prepare`] and
//! [`ConcurrencyController::commit_prepared`] split
//! [`ConcurrencyController::apply_conditional_update`] at that point.

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::memory::InMemoryVersionedStore;
pub use domain::versioned::{PreparedUpdate, Versioned, INITIAL_VERSION};
pub use error::{ConcurrencyError, ConcurrencyResult};
pub use ports::outbound::VersionedStore;
pub use service::ConcurrencyController;
