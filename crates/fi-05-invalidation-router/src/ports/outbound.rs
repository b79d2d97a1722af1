//! # Outbound Ports (Driven Ports)
//!
//! Delivery of `(subscriber, keys)` pairs. Transport is the sink's concern.

use crate::domain::route::Delivery;
use crate::error::RouterResult;
use async_trait::async_trait;

#[async_trait]
pub trait DeliverySink: Send + Sync {
    /// Hand one delivery to its subscriber.
    ///
    /// ## Errors
    ///
    /// - `SinkClosed`: the subscriber went away; the router unregisters it
    async fn deliver(&self, delivery: Delivery) -> RouterResult<()>;
}
