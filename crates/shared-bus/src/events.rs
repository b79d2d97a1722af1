//! # Integrity Events
//!
//! Defines all event types that flow through the shared bus.

use serde::{Deserialize, Serialize};
use shared_types::entities::{
    AuditAction, EntityId, EntityRef, EntityType, PartitionId, Timestamp,
};

/// Produced once per committed mutation; never persisted or replayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidationEvent {
    pub entity_type: EntityType,
    pub entity_id: EntityId,
    /// `None` for records shared by all partitions (SKU catalog, users).
    pub partition_id: Option<PartitionId>,
    pub action: AuditAction,
    pub changed_fields: Vec<String>,
    /// Version after the mutation; `0` once the record is deleted.
    pub version: u64,
    pub timestamp: Timestamp,
    /// Parent document whose views depend on this record.
    pub parent: Option<EntityRef>,
}

impl InvalidationEvent {
    /// The record this event is about.
    #[must_use]
    pub fn entity(&self) -> EntityRef {
        EntityRef::new(self.entity_type, self.entity_id)
    }
}

/// All events that can be published to the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IntegrityEvent {
    /// A mutation and its audit record were committed together.
    MutationCommitted(InvalidationEvent),

    /// Chain verification found a divergence. Operational alert, not a user error.
    ChainIntegrityAlert {
        /// Sequence number of the first broken record.
        broken_at: u64,
        /// Number of records walked.
        checked: u64,
    },
}

impl IntegrityEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::MutationCommitted(_) => EventTopic::Mutations,
            Self::ChainIntegrityAlert { .. } => EventTopic::Alerts,
        }
    }

    /// Entity type of a mutation event.
    #[must_use]
    pub fn entity_type(&self) -> Option<EntityType> {
        match self {
            Self::MutationCommitted(event) => Some(event.entity_type),
            Self::ChainIntegrityAlert { .. } => None,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Committed mutations.
    Mutations,
    /// Operational alerts.
    Alerts,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Entity types to include. Empty means all types; alerts always pass.
    pub entity_types: Vec<EntityType>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            entity_types: Vec::new(),
        }
    }

    /// Create a filter for mutations of specific entity types.
    #[must_use]
    pub fn entity_types(entity_types: Vec<EntityType>) -> Self {
        Self {
            topics: vec![EventTopic::Mutations],
            entity_types,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &IntegrityEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let type_match = match event.entity_type() {
            Some(entity_type) => {
                self.entity_types.is_empty() || self.entity_types.contains(&entity_type)
            }
            None => true,
        };

        topic_match && type_match
    }
}

#[cfg(test)]
pub(crate) fn sample_event(entity_type: EntityType) -> IntegrityEvent {
    IntegrityEvent::MutationCommitted(InvalidationEvent {
        entity_type,
        entity_id: EntityId::new(),
        partition_id: Some(PartitionId::new()),
        action: AuditAction::Update,
        changed_fields: vec!["status".to_string()],
        version: 2,
        timestamp: 1_000,
        parent: None,
    })
}
