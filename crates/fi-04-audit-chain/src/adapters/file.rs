//! # File-Backed Audit Store
//!
//! One JSON object per line, appended and fsynced on `prepare`, truncated
//! back on rollback. The whole log is replayed into memory on open.
//!
//! The log file is held under an exclusive `fs2` lock for the lifetime of
//! the store, so two writers can never interleave appends. Readers that only
//! verify (see `audit-verify`) use [`FileAuditStore::read_log`], which takes
//! no lock.

use super::index::ChainIndex;
use crate::domain::record::AuditRecord;
use crate::error::{AuditError, AuditResult};
use crate::ports::outbound::{AuditStore, ChainTail, PendingAppend};
use async_trait::async_trait;
use fs2::FileExt;
use parking_lot::Mutex;
use shared_types::{EntityId, EntityType, StoreError};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug)]
struct LogFile {
    file: File,
    /// Byte length of the committed part of the log.
    committed_len: u64,
    index: ChainIndex,
}

/// Append-only JSON-lines audit store.
#[derive(Debug, Clone)]
pub struct FileAuditStore {
    inner: Arc<Mutex<LogFile>>,
    path: PathBuf,
}

impl FileAuditStore {
    /// Open (or create) the log at `path` and replay it.
    ///
    /// ## Errors
    ///
    /// - `StoreError::Unavailable`: another process holds the log
    /// - `StoreError::Corrupt`: a line is not a valid record
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;

        file.try_lock_exclusive().map_err(|_| {
            StoreError::Unavailable(format!("audit log {} is locked by another process", path.display()))
        })?;

        let records = Self::read_log(&path)?;
        let committed_len = file.metadata()?.len();
        let mut index = ChainIndex::default();
        for record in records {
            index.push(record);
        }
        info!(path = %path.display(), records = index.len(), "Audit log opened");

        Ok(Self {
            inner: Arc::new(Mutex::new(LogFile {
                file,
                committed_len,
                index,
            })),
            path,
        })
    }

    /// Parse every record of a log without locking it.
    pub fn read_log(path: impl AsRef<Path>) -> Result<Vec<AuditRecord>, StoreError> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let mut records = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|e| {
                StoreError::Corrupt(format!("{}:{}: {e}", path.display(), line_no + 1))
            })?;
            records.push(record);
        }
        Ok(records)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LogFile {
    fn drop(&mut self) {
        #[allow(clippy::incompatible_msrv)]
        let _ = self.file.unlock();
    }
}

/// Staged record of a [`FileAuditStore`]: already on disk, not yet indexed.
#[derive(Debug)]
pub struct FilePending {
    inner: Arc<Mutex<LogFile>>,
    record: AuditRecord,
    /// Log length to restore on rollback.
    rollback_len: u64,
    written_len: u64,
    committed: bool,
}

impl PendingAppend for FilePending {
    fn record(&self) -> &AuditRecord {
        &self.record
    }

    fn commit(mut self) -> AuditRecord {
        self.committed = true;
        let mut log = self.inner.lock();
        log.committed_len = self.written_len;
        log.index.finish(self.record.clone());
        self.record.clone()
    }
}

impl Drop for FilePending {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let mut log = self.inner.lock();
        if let Err(e) = log.file.set_len(self.rollback_len) {
            warn!(error = %e, sequence = self.record.sequence, "Failed to truncate rolled-back audit record");
        }
        log.index.abort();
    }
}

fn append_line(file: &mut File, line: &[u8]) -> std::io::Result<()> {
    file.write_all(line)?;
    file.sync_data()
}

#[async_trait]
impl AuditStore for FileAuditStore {
    type Pending = FilePending;

    async fn tail(&self) -> AuditResult<Option<ChainTail>> {
        Ok(self.inner.lock().index.tail())
    }

    fn prepare(&self, record: AuditRecord) -> AuditResult<FilePending> {
        let mut line = serde_json::to_vec(&record).map_err(AuditError::append_failed)?;
        line.push(b'\n');

        let mut log = self.inner.lock();
        log.index.begin(&record)?;

        let rollback_len = log.committed_len;
        if let Err(e) = append_line(&mut log.file, &line) {
            // Drop any partial line before reporting.
            let _ = log.file.set_len(rollback_len);
            log.index.abort();
            return Err(AuditError::Store(StoreError::from(e)));
        }

        Ok(FilePending {
            inner: self.inner.clone(),
            record,
            rollback_len,
            written_len: rollback_len + line.len() as u64,
            committed: false,
        })
    }

    async fn get(&self, sequence: u64) -> AuditResult<Option<AuditRecord>> {
        Ok(self.inner.lock().index.get(sequence).cloned())
    }

    async fn range(&self, from: u64, to: Option<u64>) -> AuditResult<Vec<AuditRecord>> {
        Ok(self.inner.lock().index.range(from, to))
    }

    async fn by_entity(
        &self,
        entity_type: EntityType,
        entity_id: EntityId,
        limit: usize,
    ) -> AuditResult<Vec<AuditRecord>> {
        Ok(self.inner.lock().index.by_entity(entity_type, entity_id, limit))
    }

    async fn len(&self) -> AuditResult<u64> {
        Ok(self.inner.lock().index.len())
    }
}
