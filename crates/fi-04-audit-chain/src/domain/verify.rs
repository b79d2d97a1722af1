//! # Chain Verification
//!
//! Pure walk over a slice of records.
//!
//! | Check | Violation |
//! |-------|-----------|
//! | stored hash == recomputed hash | [`ViolationKind::HashMismatch`] |
//! | `previous_hash` == recomputed hash of predecessor | [`ViolationKind::LinkMismatch`] |
//! | sequence == predecessor + 1 | [`ViolationKind::SequenceGap`] |
//!
//! Links are checked against the *recomputed* predecessor hash, so a record
//! whose content was edited in place is flagged, and so is its successor.

use super::record::{compute_record_hash, AuditRecord};
use serde::{Deserialize, Serialize};
use shared_types::Hash;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    /// Record content no longer matches its stored hash.
    HashMismatch,
    /// `previous_hash` does not match the predecessor.
    LinkMismatch,
    /// A record is missing or duplicated.
    SequenceGap { expected: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainViolation {
    pub sequence: u64,
    #[serde(flatten)]
    pub kind: ViolationKind,
}

/// Outcome of a verification walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainVerification {
    pub valid: bool,
    pub checked: u64,
    /// Sequence of the first divergence.
    pub broken_at: Option<u64>,
    pub violations: Vec<ChainViolation>,
}

impl ChainVerification {
    /// Verification of an empty range.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            valid: true,
            checked: 0,
            broken_at: None,
            violations: Vec::new(),
        }
    }

    /// Violations reported for one record.
    pub fn violations_at(&self, sequence: u64) -> impl Iterator<Item = &ViolationKind> {
        self.violations
            .iter()
            .filter(move |v| v.sequence == sequence)
            .map(|v| &v.kind)
    }
}

/// Verify `records` (in creation order) against `anchor`, the hash the first
/// record must link to, starting at `first_sequence`.
#[must_use]
pub fn verify_records(records: &[AuditRecord], anchor: Hash, first_sequence: u64) -> ChainVerification {
    let mut violations = Vec::new();
    let mut expected_previous = anchor;
    let mut expected_sequence = first_sequence;

    for record in records {
        if record.sequence != expected_sequence {
            violations.push(ChainViolation {
                sequence: record.sequence,
                kind: ViolationKind::SequenceGap {
                    expected: expected_sequence,
                },
            });
        }

        // An unencodable record cannot match any stored hash.
        let recomputed = compute_record_hash(record).ok();
        if recomputed != Some(record.record_hash) {
            violations.push(ChainViolation {
                sequence: record.sequence,
                kind: ViolationKind::HashMismatch,
            });
        }

        if record.previous_hash != expected_previous {
            violations.push(ChainViolation {
                sequence: record.sequence,
                kind: ViolationKind::LinkMismatch,
            });
        }

        expected_previous = recomputed.unwrap_or(record.record_hash);
        expected_sequence = record.sequence + 1;
    }

    let broken_at = violations.first().map(|v| v.sequence);
    ChainVerification {
        valid: violations.is_empty(),
        checked: records.len() as u64,
        broken_at,
        violations,
    }
}
