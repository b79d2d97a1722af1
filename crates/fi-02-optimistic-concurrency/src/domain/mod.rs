//! Domain layer for the concurrency controller.

pub mod versioned;

pub use versioned::{PreparedUpdate, Versioned, INITIAL_VERSION};
