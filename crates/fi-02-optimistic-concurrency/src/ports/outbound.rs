//! # Outbound Ports (Driven Ports)
//!
//! The conditional-write primitive the controller relies on.

use crate::domain::versioned::Versioned;
use async_trait::async_trait;
use shared_types::{EntityId, StoreError};

/// Storage with compare-and-set semantics on the version column.
///
/// Implementations must apply `conditional_update` and `conditional_delete`
/// atomically: `WHERE id = ? AND version = ?`.
#[async_trait]
pub trait VersionedStore<T>: Send + Sync
where
    T: Clone + Send + Sync + 'static,
{
    async fn get(&self, id: EntityId) -> Result<Option<Versioned<T>>, StoreError>;

    /// Insert a new record. Returns `false` if the id is taken.
    async fn insert(&self, record: Versioned<T>) -> Result<bool, StoreError>;

    /// Replace the record if its stored version equals `expected_version`.
    ///
    /// Returns the number of rows affected (0 or 1).
    async fn conditional_update(
        &self,
        expected_version: u64,
        next: Versioned<T>,
    ) -> Result<u64, StoreError>;

    /// Remove the record if its stored version equals `expected_version`.
    ///
    /// Returns the number of rows affected (0 or 1).
    async fn conditional_delete(&self, id: EntityId, expected_version: u64)
        -> Result<u64, StoreError>;
}
