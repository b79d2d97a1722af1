//! In-memory ledger store with per-issue locks.

use crate::ports::outbound::{LedgerStore, LedgerTransaction};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{EntityId, LedgerAdjustment, MaterialIssue, MaterialReturn, StoreError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug)]
struct IssueLedger {
    issue: MaterialIssue,
    returns: Vec<MaterialReturn>,
    adjustments: Vec<LedgerAdjustment>,
}

/// Ledger store keeping one async mutex per issue as its row lock.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    issues: RwLock<HashMap<EntityId, Arc<Mutex<IssueLedger>>>>,
    fail_commits: Arc<AtomicBool>,
}

impl InMemoryLedgerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent transaction commit fail.
    pub fn set_fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Committed returns of an issue.
    pub async fn returns_of(&self, issue_id: EntityId) -> Vec<MaterialReturn> {
        let ledger = self.issues.read().get(&issue_id).cloned();
        let Some(ledger) = ledger else {
            return Vec::new();
        };
        let guard = ledger.lock().await;
        guard.returns.clone()
    }
}

/// Open transaction on one issue.
#[derive(Debug)]
pub struct InMemoryLedgerTx {
    guard: OwnedMutexGuard<IssueLedger>,
    /// Row counts at `begin`, restored on rollback.
    committed_returns: usize,
    committed_adjustments: usize,
    fail_commit: Arc<AtomicBool>,
    committed: bool,
}

impl LedgerTransaction for InMemoryLedgerTx {
    fn issue(&self) -> &MaterialIssue {
        &self.guard.issue
    }

    fn returns(&self) -> &[MaterialReturn] {
        &self.guard.returns
    }

    fn adjustments(&self) -> &[LedgerAdjustment] {
        &self.guard.adjustments
    }

    fn insert_return(&mut self, record: MaterialReturn) {
        self.guard.returns.push(record);
    }

    fn insert_adjustment(&mut self, record: LedgerAdjustment) {
        self.guard.adjustments.push(record);
    }

    fn commit(mut self) -> Result<(), StoreError> {
        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("ledger commit failed".into()));
        }
        self.committed = true;
        Ok(())
    }
}

impl Drop for InMemoryLedgerTx {
    fn drop(&mut self) {
        if !self.committed {
            let (returns, adjustments) = (self.committed_returns, self.committed_adjustments);
            self.guard.returns.truncate(returns);
            self.guard.adjustments.truncate(adjustments);
        }
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    type Tx = InMemoryLedgerTx;

    async fn insert_issue(&self, issue: MaterialIssue) -> Result<bool, StoreError> {
        let mut issues = self.issues.write();
        if issues.contains_key(&issue.id) {
            return Ok(false);
        }
        issues.insert(
            issue.id,
            Arc::new(Mutex::new(IssueLedger {
                issue,
                returns: Vec::new(),
                adjustments: Vec::new(),
            })),
        );
        Ok(true)
    }

    async fn begin(&self, issue_id: EntityId) -> Result<Option<InMemoryLedgerTx>, StoreError> {
        // Clone the handle first so the map lock is not held while waiting.
        let ledger = self.issues.read().get(&issue_id).cloned();
        let Some(ledger) = ledger else {
            return Ok(None);
        };
        let guard = ledger.lock_owned().await;
        Ok(Some(InMemoryLedgerTx {
            committed_returns: guard.returns.len(),
            committed_adjustments: guard.adjustments.len(),
            guard,
            fail_commit: self.fail_commits.clone(),
            committed: false,
        }))
    }
}
