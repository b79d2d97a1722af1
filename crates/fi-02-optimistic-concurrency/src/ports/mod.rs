//! Ports for the concurrency controller.

pub mod outbound;

pub use outbound::VersionedStore;
