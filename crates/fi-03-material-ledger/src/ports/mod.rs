//! Ports for the material ledger.

pub mod outbound;

pub use outbound::{LedgerStore, LedgerTransaction};
