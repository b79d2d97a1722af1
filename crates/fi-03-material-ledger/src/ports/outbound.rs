//! # Outbound Ports (Driven Ports)
//!
//! The row-locking transaction primitive.

use async_trait::async_trait;
use shared_types::{EntityId, LedgerAdjustment, MaterialIssue, MaterialReturn, StoreError};

/// A transaction holding the lock on one material issue.
///
/// Dropping it without [`commit`](Self::commit) discards every insert.
pub trait LedgerTransaction: Send {
    fn issue(&self) -> &MaterialIssue;

    /// Committed returns plus those inserted in this transaction.
    fn returns(&self) -> &[MaterialReturn];

    /// Committed adjustments plus those inserted in this transaction.
    fn adjustments(&self) -> &[LedgerAdjustment];

    fn insert_return(&mut self, record: MaterialReturn);

    fn insert_adjustment(&mut self, record: LedgerAdjustment);

    fn commit(self) -> Result<(), StoreError>;
}

/// Storage for issues and their return/adjustment rows.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    type Tx: LedgerTransaction;

    /// Insert a new issue. Returns `false` if the id is taken.
    async fn insert_issue(&self, issue: MaterialIssue) -> Result<bool, StoreError>;

    /// Lock the issue (`SELECT … FOR UPDATE`) and open a transaction.
    ///
    /// Returns `None` if the issue does not exist. Transactions on the same
    /// issue are serialized; different issues proceed in parallel.
    async fn begin(&self, issue_id: EntityId) -> Result<Option<Self::Tx>, StoreError>;
}
