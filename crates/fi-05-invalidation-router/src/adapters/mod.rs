//! Delivery sink adapters.

pub mod sinks;

pub use sinks::{ChannelSink, CollectingSink};
