//! In-memory versioned store.

use crate::domain::versioned::Versioned;
use crate::ports::outbound::VersionedStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{EntityId, StoreError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// `HashMap`-backed store; a single write lock makes every compare-and-set atomic.
pub struct InMemoryVersionedStore<T> {
    records: RwLock<HashMap<EntityId, Versioned<T>>>,
    unavailable: AtomicBool,
}

impl<T: Clone> InMemoryVersionedStore<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Snapshot of every stored record.
    pub fn all(&self) -> Vec<Versioned<T>> {
        self.records.read().values().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Simulate an outage of the backing store.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("versioned store offline".into()));
        }
        Ok(())
    }
}

impl<T: Clone> Default for InMemoryVersionedStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> VersionedStore<T> for InMemoryVersionedStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn get(&self, id: EntityId) -> Result<Option<Versioned<T>>, StoreError> {
        self.check_available()?;
        Ok(self.records.read().get(&id).cloned())
    }

    async fn insert(&self, record: Versioned<T>) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut records = self.records.write();
        if records.contains_key(&record.id) {
            return Ok(false);
        }
        records.insert(record.id, record);
        Ok(true)
    }

    async fn conditional_update(
        &self,
        expected_version: u64,
        next: Versioned<T>,
    ) -> Result<u64, StoreError> {
        self.check_available()?;
        let mut records = self.records.write();
        match records.get_mut(&next.id) {
            Some(current) if current.version == expected_version => {
                *current = next;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn conditional_delete(
        &self,
        id: EntityId,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        self.check_available()?;
        let mut records = self.records.write();
        match records.get(&id) {
            Some(current) if current.version == expected_version => {
                records.remove(&id);
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}
