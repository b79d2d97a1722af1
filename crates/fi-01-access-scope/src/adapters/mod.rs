//! Adapters for the scope evaluator.

pub mod memory;

pub use memory::InMemoryAssignmentStore;
