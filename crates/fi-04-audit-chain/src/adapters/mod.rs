//! Audit store adapters.

pub mod file;
mod index;
pub mod memory;

pub use file::FileAuditStore;
pub use memory::InMemoryAuditStore;
