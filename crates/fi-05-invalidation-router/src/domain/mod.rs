//! Domain layer for the invalidation router.

pub mod debounce;
pub mod keys;
pub mod route;

pub use debounce::{CoalescedEvent, Debouncer};
pub use keys::{keys_for, InvalidationKey};
pub use route::{route, Delivery, Subscriber, SubscriberId};
