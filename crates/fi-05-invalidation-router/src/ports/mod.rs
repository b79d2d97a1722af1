//! Ports for the invalidation router.

pub mod outbound;

pub use outbound::DeliverySink;
