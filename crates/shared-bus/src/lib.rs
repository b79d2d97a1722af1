//! # Shared Bus - Event Bus for Integrity Events
//!
//! Carries committed-mutation events from the commit pipeline to the
//! invalidation router, and operational alerts from chain verification to
//! whoever monitors them.
//!
//! ```text
//! ┌──────────────────┐                    ┌──────────────────────┐
//! │ Commit pipeline  │                    │ Invalidation router  │
//! │                  │    publish()       │                      │
//! │                  │ ──────┐            │                      │
//! └──────────────────┘       │            └──────────────────────┘
//!                            ▼                    ↑
//!                      ┌──────────────┐          │
//!                      │  Event Bus   │          │
//!                      │              │ ─────────┘
//!                      └──────────────┘  subscribe()
//! ```
//!
//! Events are ephemeral: the bus never persists or replays them. Anything
//! that must survive is already in the audit chain before it is published.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, IntegrityEvent, InvalidationEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
