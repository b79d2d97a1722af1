//! Adapters for the material ledger.

pub mod memory;

pub use memory::InMemoryLedgerStore;
