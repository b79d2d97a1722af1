//! Delivery sinks.
//!
//! [`ChannelSink`] hands each subscriber a bounded mpsc receiver, the shape
//! a websocket or SSE connection task consumes. [`CollectingSink`] just keeps
//! deliveries for inspection.

use crate::domain::route::{Delivery, SubscriberId};
use crate::error::{RouterError, RouterResult};
use crate::ports::outbound::DeliverySink;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Per-subscriber bounded channels.
#[derive(Debug, Default)]
pub struct ChannelSink {
    channels: RwLock<HashMap<SubscriberId, mpsc::Sender<Delivery>>>,
}

impl ChannelSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the channel for a subscriber, replacing any previous one.
    pub fn connect(&self, id: SubscriberId, capacity: usize) -> mpsc::Receiver<Delivery> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        self.channels.write().insert(id, tx);
        rx
    }

    pub fn disconnect(&self, id: &SubscriberId) -> bool {
        self.channels.write().remove(id).is_some()
    }
}

#[async_trait]
impl DeliverySink for ChannelSink {
    async fn deliver(&self, delivery: Delivery) -> RouterResult<()> {
        let id = delivery.subscriber_id.clone();
        let sender = self.channels.read().get(&id).cloned();
        let Some(sender) = sender else {
            return Err(RouterError::UnknownSubscriber(id));
        };
        if sender.send(delivery).await.is_err() {
            self.channels.write().remove(&id);
            return Err(RouterError::SinkClosed(id));
        }
        Ok(())
    }
}

/// Sink that records every delivery.
#[derive(Debug, Default)]
pub struct CollectingSink {
    deliveries: Mutex<Vec<Delivery>>,
}

impl CollectingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain what has been delivered so far.
    pub fn take(&self) -> Vec<Delivery> {
        std::mem::take(&mut *self.deliveries.lock())
    }

    /// Copy of what has been delivered so far.
    #[must_use]
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().clone()
    }
}

#[async_trait]
impl DeliverySink for CollectingSink {
    async fn deliver(&self, delivery: Delivery) -> RouterResult<()> {
        self.deliveries.lock().push(delivery);
        Ok(())
    }
}
