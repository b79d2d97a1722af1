//! Connected subscribers and their resolved scopes.

use crate::domain::route::{Subscriber, SubscriberId};
use crate::error::{RouterError, RouterResult};
use fi_01_access_scope::{AccessScope, ScopeEvaluator};
use parking_lot::RwLock;
use shared_types::Actor;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Registry of subscribers, shared between the connection layer and the
/// router worker.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    subscribers: RwLock<BTreeMap<SubscriberId, Subscriber>>,
}

impl SubscriberRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a subscriber with a fixed scope.
    pub fn register(&self, id: SubscriberId, scope: AccessScope) {
        self.insert(Subscriber::new(id, scope));
    }

    /// Register a session for `actor`. The scope resolved now is refreshed
    /// by the router before each routing pass.
    pub async fn register_actor<E: ScopeEvaluator + ?Sized>(
        &self,
        id: SubscriberId,
        actor: &Actor,
        scopes: &E,
    ) -> AccessScope {
        let scope = scopes.evaluate_scope(actor).await;
        self.insert(Subscriber::for_actor(id, *actor, scope.clone()));
        scope
    }

    fn insert(&self, subscriber: Subscriber) {
        debug!(
            subscriber = %subscriber.id,
            global = subscriber.scope.is_global,
            partitions = subscriber.scope.partitions.len(),
            "Subscriber registered"
        );
        self.subscribers
            .write()
            .insert(subscriber.id.clone(), subscriber);
    }

    /// Remove a subscriber. Returns `false` if it was not registered.
    pub fn unregister(&self, id: &SubscriberId) -> bool {
        let removed = self.subscribers.write().remove(id).is_some();
        if removed {
            info!(subscriber = %id, "Subscriber removed");
        }
        removed
    }

    /// Replace the scope of a subscriber after its assignments changed.
    pub fn refresh_scope(&self, id: &SubscriberId, scope: AccessScope) -> RouterResult<()> {
        match self.subscribers.write().get_mut(id) {
            Some(subscriber) => {
                subscriber.scope = scope;
                Ok(())
            }
            None => Err(RouterError::UnknownSubscriber(id.clone())),
        }
    }

    /// Copy of every subscriber, ordered by id.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Subscriber> {
        self.subscribers.read().values().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.read().is_empty()
    }
}
