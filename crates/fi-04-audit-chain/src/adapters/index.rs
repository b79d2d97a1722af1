//! Ordered record list with a per-entity secondary index, shared by the
//! in-memory and file-backed stores.

use crate::domain::record::AuditRecord;
use crate::error::{AuditError, AuditResult};
use crate::ports::outbound::ChainTail;
use shared_types::{EntityId, EntityType, GENESIS_HASH};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub(crate) struct ChainIndex {
    records: Vec<AuditRecord>,
    by_entity: HashMap<(EntityType, EntityId), Vec<usize>>,
    /// Sequence of a prepared but uncommitted record.
    pending: Option<u64>,
}

impl ChainIndex {
    pub(crate) fn tail(&self) -> Option<ChainTail> {
        self.records.last().map(|r| ChainTail {
            sequence: r.sequence,
            record_hash: r.record_hash,
        })
    }

    pub(crate) fn len(&self) -> u64 {
        self.records.len() as u64
    }

    /// Reserve the next position for `record`.
    pub(crate) fn begin(&mut self, record: &AuditRecord) -> AuditResult<()> {
        let expected = self.len() + 1;
        if self.pending.is_some() || record.sequence != expected {
            return Err(AuditError::OutOfOrder {
                expected,
                found: record.sequence,
            });
        }
        let tail_hash = self.tail().map_or(GENESIS_HASH, |t| t.record_hash);
        if record.previous_hash != tail_hash {
            return Err(AuditError::append_failed(format!(
                "record {} does not link to the current tail",
                record.sequence
            )));
        }
        self.pending = Some(record.sequence);
        Ok(())
    }

    pub(crate) fn abort(&mut self) {
        self.pending = None;
    }

    pub(crate) fn finish(&mut self, record: AuditRecord) {
        self.pending = None;
        self.push(record);
    }

    /// Append without ordering checks; used when reloading persisted records.
    pub(crate) fn push(&mut self, record: AuditRecord) {
        let position = self.records.len();
        self.by_entity
            .entry((record.entity_type, record.entity_id))
            .or_default()
            .push(position);
        self.records.push(record);
    }

    pub(crate) fn get(&self, sequence: u64) -> Option<&AuditRecord> {
        let position = usize::try_from(sequence.checked_sub(1)?).ok()?;
        self.records.get(position)
    }

    pub(crate) fn get_mut(&mut self, sequence: u64) -> Option<&mut AuditRecord> {
        let position = usize::try_from(sequence.checked_sub(1)?).ok()?;
        self.records.get_mut(position)
    }

    pub(crate) fn range(&self, from: u64, to: Option<u64>) -> Vec<AuditRecord> {
        let to = to.unwrap_or(u64::MAX);
        self.records
            .iter()
            .filter(|r| r.sequence >= from && r.sequence <= to)
            .cloned()
            .collect()
    }

    pub(crate) fn by_entity(
        &self,
        entity_type: EntityType,
        entity_id: EntityId,
        limit: usize,
    ) -> Vec<AuditRecord> {
        self.by_entity
            .get(&(entity_type, entity_id))
            .map(|positions| {
                positions
                    .iter()
                    .rev()
                    .take(limit)
                    .filter_map(|p| self.records.get(*p).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }
}
