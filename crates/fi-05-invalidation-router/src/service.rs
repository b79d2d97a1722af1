//! # Router Worker
//!
//! Consumes committed mutations from the bus, debounces them per record and
//! fans each batch out to the subscribers in scope.
//!
//! The worker owns the [`Debouncer`]; nothing else touches it, so the loop
//! needs no locking beyond the registry snapshot taken per routing pass.
//! Actor sessions have their scope re-evaluated on every pass, so a revoked
//! assignment stops deliveries from the next batch on. If the worker falls
//! behind the bus and events are lost, every subscriber gets a resync.

use crate::domain::debounce::{CoalescedEvent, Debouncer};
use crate::domain::route::{route, Delivery, Subscriber};
use crate::error::RouterError;
use crate::ports::outbound::DeliverySink;
use crate::registry::SubscriberRegistry;
use fi_01_access_scope::ScopeEvaluator;
use shared_bus::{EventFilter, EventTopic, InMemoryEventBus, IntegrityEvent, Subscription};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Counters reported when the worker stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStats {
    pub events_received: u64,
    pub batches_routed: u64,
    pub deliveries: u64,
    pub dropped_subscribers: u64,
    /// Bus events lost because the worker fell behind.
    pub events_lagged: u64,
    pub resyncs: u64,
}

/// The invalidation router.
pub struct RouterWorker<D: DeliverySink> {
    registry: Arc<SubscriberRegistry>,
    scopes: Arc<dyn ScopeEvaluator>,
    sink: Arc<D>,
    window: Duration,
}

/// Control handle of a spawned worker. Dropping it also stops the worker.
pub struct RouterHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<RouterStats>,
}

impl RouterHandle {
    /// Stop the worker after flushing every pending batch.
    pub async fn shutdown(self) -> Result<RouterStats, JoinError> {
        let _ = self.shutdown.send(());
        self.task.await
    }
}

impl<D: DeliverySink + 'static> RouterWorker<D> {
    /// The window is clamped to the supported band.
    pub fn new(
        registry: Arc<SubscriberRegistry>,
        scopes: Arc<dyn ScopeEvaluator>,
        sink: Arc<D>,
        window: Duration,
    ) -> Self {
        Self {
            registry,
            scopes,
            sink,
            window,
        }
    }

    /// Subscribe to `bus` and run the worker on the current runtime.
    ///
    /// The subscription is taken before spawning, so no event published
    /// after this call returns can be missed.
    pub fn spawn(self, bus: &InMemoryEventBus) -> RouterHandle {
        let subscription = bus.subscribe(EventFilter::topics(vec![EventTopic::Mutations]));
        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(subscription, shutdown_rx));
        RouterHandle { shutdown, task }
    }

    /// Worker loop. Returns when signalled, when the handle is dropped, or
    /// when the bus closes.
    pub async fn run(
        self,
        mut subscription: Subscription,
        mut shutdown: oneshot::Receiver<()>,
    ) -> RouterStats {
        let mut debouncer = Debouncer::new(self.window);
        let mut stats = RouterStats::default();
        info!(window_ms = debouncer.window().as_millis() as u64, "Invalidation router started");

        loop {
            let deadline = debouncer.next_deadline();
            tokio::select! {
                _ = &mut shutdown => {
                    // Take whatever was published before the signal.
                    while let Ok(Some(event)) = subscription.try_recv() {
                        Self::accept(&mut debouncer, &mut stats, event);
                    }
                    self.resync_if_lagged(&mut subscription, &mut stats).await;
                    break;
                }
                event = subscription.recv() => match event {
                    Some(event) => {
                        Self::accept(&mut debouncer, &mut stats, event);
                        self.resync_if_lagged(&mut subscription, &mut stats).await;
                    }
                    None => break,
                },
                _ = wait_until(deadline) => {
                    let due = debouncer.drain_due(Instant::now());
                    self.dispatch(due, &mut stats).await;
                }
            }
        }

        let rest = debouncer.flush_all();
        self.dispatch(rest, &mut stats).await;
        info!(
            events = stats.events_received,
            batches = stats.batches_routed,
            deliveries = stats.deliveries,
            lagged = stats.events_lagged,
            "Invalidation router stopped"
        );
        stats
    }

    fn accept(debouncer: &mut Debouncer, stats: &mut RouterStats, event: IntegrityEvent) {
        if let IntegrityEvent::MutationCommitted(event) = event {
            stats.events_received += 1;
            debouncer.push(event, Instant::now());
        }
    }

    /// Lost events cannot be routed, so every subscriber drops everything.
    async fn resync_if_lagged(&self, subscription: &mut Subscription, stats: &mut RouterStats) {
        let skipped = subscription.take_lagged();
        if skipped == 0 {
            return;
        }
        stats.events_lagged += skipped;
        stats.resyncs += 1;
        fi_telemetry::INVALIDATION_EVENTS_LAGGED.inc_by(skipped as f64);

        let subscribers = self.registry.snapshot();
        warn!(
            skipped,
            subscribers = subscribers.len(),
            "Router fell behind the bus, resyncing subscribers"
        );
        let deliveries = subscribers
            .into_iter()
            .map(|s| Delivery::resync(s.id))
            .collect();
        self.deliver_all(deliveries, stats).await;
    }

    async fn dispatch(&self, batches: Vec<CoalescedEvent>, stats: &mut RouterStats) {
        if batches.is_empty() {
            return;
        }
        let subscribers = self.current_subscribers().await;

        for batch in batches {
            stats.batches_routed += 1;
            let deliveries = route(&batch, &subscribers);
            debug!(
                entity = ?batch.entity(),
                coalesced = batch.count,
                recipients = deliveries.len(),
                "Routing invalidation batch"
            );
            self.deliver_all(deliveries, stats).await;
        }
    }

    /// Registered subscribers with actor scopes evaluated now.
    async fn current_subscribers(&self) -> Vec<Subscriber> {
        let mut subscribers = self.registry.snapshot();
        for subscriber in &mut subscribers {
            let Some(actor) = subscriber.actor else {
                continue;
            };
            let scope = self.scopes.evaluate_scope(&actor).await;
            if scope == subscriber.scope {
                continue;
            }
            debug!(
                subscriber = %subscriber.id,
                global = scope.is_global,
                partitions = scope.partitions.len(),
                "Subscriber scope changed"
            );
            if let Err(e) = self.registry.refresh_scope(&subscriber.id, scope.clone()) {
                debug!(error = %e, "Subscriber left during scope refresh");
            }
            subscriber.scope = scope;
        }
        subscribers
    }

    async fn deliver_all(&self, deliveries: Vec<Delivery>, stats: &mut RouterStats) {
        for delivery in deliveries {
            match self.sink.deliver(delivery).await {
                Ok(()) => {
                    stats.deliveries += 1;
                    fi_telemetry::INVALIDATIONS_DELIVERED.inc();
                }
                Err(RouterError::SinkClosed(id)) => {
                    if self.registry.unregister(&id) {
                        stats.dropped_subscribers += 1;
                    }
                }
                Err(e) => warn!(error = %e, "Invalidation delivery failed"),
            }
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
