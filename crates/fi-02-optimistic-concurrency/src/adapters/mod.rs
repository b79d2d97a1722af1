//! Adapters for the concurrency controller.

pub mod memory;

pub use memory::InMemoryVersionedStore;
