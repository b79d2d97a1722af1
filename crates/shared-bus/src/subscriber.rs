//! # Event Subscriber
//!
//! Defines the subscription side of the event bus.

use crate::events::{EventFilter, IntegrityEvent};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The event bus was closed.
    #[error("Event bus closed")]
    Closed,
}

/// A filtered receiver on the bus.
///
/// A receiver that falls more than the bus capacity behind loses the oldest
/// events. Those losses are counted, and consumers that must not miss
/// anything collect them with [`take_lagged`](Self::take_lagged).
pub struct Subscription {
    receiver: broadcast::Receiver<IntegrityEvent>,
    filter: EventFilter,
    /// Events skipped since the subscription was created.
    lagged: u64,
    /// Skipped events not yet collected by `take_lagged`.
    unreported_lag: u64,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<IntegrityEvent>, filter: EventFilter) -> Self {
        debug!(topics = ?filter.topics, entity_types = ?filter.entity_types, "New subscription created");
        Self {
            receiver,
            filter,
            lagged: 0,
            unreported_lag: 0,
        }
    }

    fn record_lag(&mut self, count: u64) {
        self.lagged += count;
        self.unreported_lag += count;
    }

    /// Receive the next event that matches the filter.
    ///
    /// # Returns
    ///
    /// - `Some(event)` - The next matching event
    /// - `None` - The channel was closed (bus dropped)
    pub async fn recv(&mut self) -> Option<IntegrityEvent> {
        loop {
            let event = match self.receiver.recv().await {
                Ok(e) => e,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    self.record_lag(count);
                    warn!(lagged = count, "Subscriber fell behind, events skipped");
                    continue;
                }
            };

            if self.filter.matches(&event) {
                return Some(event);
            }
        }
    }

    /// Try to receive the next event without blocking.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(event))` - An event was available and matched
    /// - `Ok(None)` - No event available (would block)
    /// - `Err(SubscriptionError::Closed)` - The channel was closed
    pub fn try_recv(&mut self) -> Result<Option<IntegrityEvent>, SubscriptionError> {
        loop {
            let event = match self.receiver.try_recv() {
                Ok(e) => e,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    self.record_lag(count);
                    continue;
                }
            };

            if self.filter.matches(&event) {
                return Ok(Some(event));
            }
        }
    }

    /// Get the filter for this subscription.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Total events skipped because the receiver fell behind.
    #[must_use]
    pub fn lagged(&self) -> u64 {
        self.lagged
    }

    /// Events skipped since the previous call.
    pub fn take_lagged(&mut self) -> u64 {
        std::mem::take(&mut self.unreported_lag)
    }
}
