//! # Audit Verify
//!
//! Re-walks a JSON-lines audit log written by `FileAuditStore` and reports
//! the first divergence. Reads the file without taking the writer lock, so
//! it can run against the log of a live node.

use fi_04_audit_chain::{verify_records, AuditRecord, ChainVerification, FileAuditStore};
use serde::Serialize;
use shared_types::{StoreError, GENESIS_HASH};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Cannot read audit log: {0}")]
    Read(#[from] StoreError),

    #[error("Invalid range {from}..={to}")]
    Range { from: u64, to: u64 },
}

/// Inclusive sequence range to verify; open ends extend to the chain ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceRange {
    pub from: Option<u64>,
    pub to: Option<u64>,
}

/// Result of verifying one log file.
#[derive(Debug, Clone, Serialize)]
pub struct LogReport {
    pub path: PathBuf,
    /// Records in the whole log.
    pub total_records: usize,
    pub first_sequence: Option<u64>,
    pub last_sequence: Option<u64>,
    #[serde(flatten)]
    pub verification: ChainVerification,
}

impl LogReport {
    #[must_use]
    pub fn is_intact(&self) -> bool {
        self.verification.valid
    }

    /// Human-readable summary, one line per violation.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!(
            "{}: {} record(s) in log, {} checked",
            self.path.display(),
            self.total_records,
            self.verification.checked
        );
        match self.verification.broken_at {
            None => out.push_str(", chain intact"),
            Some(seq) => {
                out.push_str(&format!(", BROKEN at sequence {seq}"));
                for v in &self.verification.violations {
                    out.push_str(&format!("\n  #{:<8} {:?}", v.sequence, v.kind));
                }
            }
        }
        out
    }
}

/// Verify the records of `path` within `range`.
///
/// A range starting after the first record is anchored to the stored hash of
/// the record just before it, as the node's own partial verification is.
pub fn verify_log(path: impl AsRef<Path>, range: SequenceRange) -> Result<LogReport, VerifyError> {
    let path = path.as_ref();
    if let (Some(from), Some(to)) = (range.from, range.to) {
        if from > to {
            return Err(VerifyError::Range { from, to });
        }
    }

    let records = FileAuditStore::read_log(path)?;
    let from = range.from.unwrap_or(1).max(1);
    let selected: Vec<AuditRecord> = records
        .iter()
        .filter(|r| r.sequence >= from && range.to.map_or(true, |to| r.sequence <= to))
        .cloned()
        .collect();

    let anchor = records
        .iter()
        .find(|r| r.sequence + 1 == from)
        .map_or(GENESIS_HASH, |r| r.record_hash);

    let verification = if selected.is_empty() {
        ChainVerification::empty()
    } else {
        verify_records(&selected, anchor, from)
    };

    Ok(LogReport {
        path: path.to_path_buf(),
        total_records: records.len(),
        first_sequence: records.first().map(|r| r.sequence),
        last_sequence: records.last().map(|r| r.sequence),
        verification,
    })
}
