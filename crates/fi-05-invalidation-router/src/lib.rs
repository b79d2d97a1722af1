//! # fi-05-invalidation-router
//!
//! Change-to-Invalidation Router: turns each committed mutation into the
//! minimal set of cache keys every eligible subscriber must drop.
//!
//! ## Flow
//!
//! ```text
//! shared-bus ──MutationCommitted──→ Debouncer ──(window elapsed)──→ route()
//!                                   keyed by                          │
//!                                   (type, id)                        ▼
//!                                                   for each subscriber in scope
//!                                                                     │
//!                                                         DeliverySink::deliver
//! ```
//!
//! ## Key Mapping
//!
//! | Action | Keys |
//! |--------|------|
//! | CREATE | list(type, partition), parent detail |
//! | UPDATE / DELETE | list, detail(type, id), parent detail |
//! | APPROVE / REJECT | list, detail, approval queue(partition), parent detail |
//! | any, global subscriber | + audit trail(type, id) |
//! | events lost on the bus | resync, to every subscriber |
//!
//! Subscribers whose scope excludes the event's partition receive nothing.
//! Scopes of actor sessions are evaluated again before each routing pass.

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod registry;
pub mod service;

pub use adapters::sinks::{ChannelSink, CollectingSink};
pub use domain::debounce::{clamp_window, CoalescedEvent, Debouncer, DEFAULT_WINDOW};
pub use domain::keys::{keys_for, InvalidationKey};
pub use domain::route::{route, Delivery, Subscriber, SubscriberId};
pub use error::{RouterError, RouterResult};
pub use ports::outbound::DeliverySink;
pub use registry::SubscriberRegistry;
pub use service::{RouterHandle, RouterStats, RouterWorker};
