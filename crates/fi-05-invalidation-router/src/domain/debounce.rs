//! # Debouncer
//!
//! Coalesces bursts of events about the same record. The window opens with
//! the first event for a `(type, id)` and is not extended by later ones, so a
//! record that changes continuously still flushes once per window.

use shared_bus::InvalidationEvent;
use shared_types::{AuditAction, EntityId, EntityRef, EntityType};
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use tokio::time::Instant;

/// Default coalescing window.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(400);

const MIN_WINDOW: Duration = Duration::from_millis(250);
const MAX_WINDOW: Duration = Duration::from_millis(500);

/// Clamp a configured window into the supported 250-500 ms band.
#[must_use]
pub fn clamp_window(window: Duration) -> Duration {
    window.clamp(MIN_WINDOW, MAX_WINDOW)
}

/// Everything seen for one record during a window.
///
/// `latest` is the most recent payload, or the delete once one is seen. Actions, fields and parents are
/// unioned so that an approval followed by an edit still clears the
/// approval queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoalescedEvent {
    pub latest: InvalidationEvent,
    pub actions: BTreeSet<AuditAction>,
    pub changed_fields: BTreeSet<String>,
    pub parents: BTreeSet<EntityRef>,
    /// Number of raw events folded in.
    pub count: usize,
}

impl CoalescedEvent {
    fn absorb(&mut self, event: InvalidationEvent) {
        self.actions.insert(event.action);
        self.changed_fields.extend(event.changed_fields.iter().cloned());
        self.parents.extend(event.parent);
        self.count += 1;
        // Out-of-order arrival must not roll the payload back, and nothing
        // follows a delete.
        if self.latest.action == AuditAction::Delete {
            return;
        }
        if event.version >= self.latest.version || event.action == AuditAction::Delete {
            self.latest = event;
        }
    }

    /// The record this batch is about.
    #[must_use]
    pub fn entity(&self) -> EntityRef {
        self.latest.entity()
    }
}

impl From<InvalidationEvent> for CoalescedEvent {
    fn from(event: InvalidationEvent) -> Self {
        Self {
            actions: BTreeSet::from([event.action]),
            changed_fields: event.changed_fields.iter().cloned().collect(),
            parents: event.parent.into_iter().collect(),
            count: 1,
            latest: event,
        }
    }
}

#[derive(Debug)]
struct Slot {
    deadline: Instant,
    event: CoalescedEvent,
}

/// Per-record coalescing buffer. Time is passed in so it can be driven by
/// tokio's paused clock.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    slots: HashMap<(EntityType, EntityId), Slot>,
}

impl Debouncer {
    /// Create a debouncer; the window is clamped.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window: clamp_window(window),
            slots: HashMap::new(),
        }
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Buffer an event. Returns `true` if it opened a new window.
    pub fn push(&mut self, event: InvalidationEvent, now: Instant) -> bool {
        let key = (event.entity_type, event.entity_id);
        match self.slots.get_mut(&key) {
            Some(slot) => {
                slot.event.absorb(event);
                false
            }
            None => {
                self.slots.insert(
                    key,
                    Slot {
                        deadline: now + self.window,
                        event: CoalescedEvent::from(event),
                    },
                );
                true
            }
        }
    }

    /// Remove and return every batch whose window has elapsed, oldest first.
    pub fn drain_due(&mut self, now: Instant) -> Vec<CoalescedEvent> {
        let due: Vec<_> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.deadline <= now)
            .map(|(key, slot)| (slot.deadline, *key))
            .collect();
        self.take_ordered(due)
    }

    /// Remove and return every pending batch regardless of deadline.
    pub fn flush_all(&mut self) -> Vec<CoalescedEvent> {
        let all: Vec<_> = self
            .slots
            .iter()
            .map(|(key, slot)| (slot.deadline, *key))
            .collect();
        self.take_ordered(all)
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots.values().map(|slot| slot.deadline).min()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn take_ordered(&mut self, mut keys: Vec<(Instant, (EntityType, EntityId))>) -> Vec<CoalescedEvent> {
        keys.sort();
        keys.into_iter()
            .filter_map(|(_, key)| self.slots.remove(&key))
            .map(|slot| slot.event)
            .collect()
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
