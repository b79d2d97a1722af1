//! # Routing
//!
//! Pure fan-out of one coalesced batch to the subscribers allowed to see it.

use super::debounce::CoalescedEvent;
use super::keys::{keys_for, InvalidationKey};
use fi_01_access_scope::AccessScope;
use serde::{Deserialize, Serialize};
use shared_bus::InvalidationEvent;
use shared_types::Actor;
use std::fmt;

/// Identifier of a connected client session.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriberId(pub String);

impl SubscriberId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A connected session.
///
/// Sessions opened for an actor are re-evaluated before every routing pass,
/// so `scope` is only the last resolved value. Sessions without an actor
/// (service connections) keep a fixed scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscriber {
    pub id: SubscriberId,
    pub actor: Option<Actor>,
    pub scope: AccessScope,
}

impl Subscriber {
    pub fn new(id: SubscriberId, scope: AccessScope) -> Self {
        Self {
            id,
            actor: None,
            scope,
        }
    }

    pub fn for_actor(id: SubscriberId, actor: Actor, scope: AccessScope) -> Self {
        Self {
            id,
            actor: Some(actor),
            scope,
        }
    }
}

/// Keys one subscriber must drop, with the payload that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub subscriber_id: SubscriberId,
    pub keys: Vec<InvalidationKey>,
    /// `None` for a resync.
    pub event: Option<InvalidationEvent>,
}

impl Delivery {
    /// Tell a subscriber to drop everything it caches.
    #[must_use]
    pub fn resync(subscriber_id: SubscriberId) -> Self {
        Self {
            subscriber_id,
            keys: vec![InvalidationKey::Resync],
            event: None,
        }
    }
}

/// Route a batch to every subscriber whose scope covers its partition.
///
/// Records without a partition (shared catalogs) reach everyone. Only
/// global subscribers get the audit-trail key.
#[must_use]
pub fn route(event: &CoalescedEvent, subscribers: &[Subscriber]) -> Vec<Delivery> {
    let partition = event.latest.partition_id.as_ref();
    subscribers
        .iter()
        .filter(|s| s.scope.can_see(partition))
        .map(|s| Delivery {
            subscriber_id: s.id.clone(),
            keys: keys_for(event, s.scope.is_global),
            event: Some(event.latest.clone()),
        })
        .collect()
}
