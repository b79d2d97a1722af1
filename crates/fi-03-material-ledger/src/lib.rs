//! # fi-03-material-ledger
//!
//! Material Ledger Engine: returned quantity can never exceed issued
//! quantity for a material issue, including under concurrent submissions.
//!
//! ## Invariant
//!
//! ```text
//! available = issued − (Σ returns − Σ reversals)      and      0 ≤ available ≤ issued
//! ```
//!
//! `available` is never stored; it is recomputed inside the same
//! transaction that inserts the new row, while the parent issue is locked.
//!
//! ## Concurrency
//!
//! ```text
//! return A ──┐                        ┌── issue X lock ── check ── insert ── commit
//!            ├── LedgerStore::begin ──┤
//! return B ──┘                        └── (waits for A) ── check ── reject/insert
//!
//! return C on issue Y ─────────────────── runs in parallel with A and B
//! ```
//!
//! Accepted returns are permanent. Corrections are separate
//! [`LedgerAdjustment`](shared_types::LedgerAdjustment) rows, audited like
//! any other mutation.

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::memory::InMemoryLedgerStore;
pub use domain::availability::Availability;
pub use domain::requests::{AdjustmentRequest, ReturnRequest};
pub use error::{LedgerError, LedgerResult};
pub use ports::outbound::{LedgerStore, LedgerTransaction};
pub use service::{MaterialLedgerService, PreparedLedgerWrite};
