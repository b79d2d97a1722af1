//! # Material Ledger Service
//!
//! Scope-checked issue registration, returns and adjustments.
//!
//! Writes come in two flavours:
//!
//! - `prepare_*` locks the issue, validates and inserts inside an open
//!   transaction and hands back a [`PreparedLedgerWrite`]; the caller stages
//!   the audit record and then commits both.
//! - `reserve_return` / `record_adjustment` do prepare + commit in one call.

use crate::domain::availability::Availability;
use crate::domain::requests::{AdjustmentRequest, ReturnRequest};
use crate::error::{LedgerError, LedgerResult};
use crate::ports::outbound::{LedgerStore, LedgerTransaction};
use fi_01_access_scope::ScopeEvaluator;
use shared_types::{
    Actor, EntityId, LedgerAdjustment, MaterialIssue, MaterialReturn, TimeSource,
};
use std::sync::Arc;
use tracing::{debug, info};

/// A validated ledger row inside an open, still-locked transaction.
///
/// Dropping it rolls the row back and releases the issue lock.
pub struct PreparedLedgerWrite<T, Tx: LedgerTransaction> {
    tx: Tx,
    record: T,
    availability: Availability,
}

impl<T: Clone, Tx: LedgerTransaction> PreparedLedgerWrite<T, Tx> {
    pub fn record(&self) -> &T {
        &self.record
    }

    pub fn issue(&self) -> &MaterialIssue {
        self.tx.issue()
    }

    /// Availability once this row is committed.
    #[must_use]
    pub fn availability_after(&self) -> Availability {
        self.availability
    }

    pub fn commit(self) -> LedgerResult<T> {
        self.tx.commit()?;
        Ok(self.record)
    }
}

/// The material ledger service.
pub struct MaterialLedgerService<L, E, C>
where
    L: LedgerStore,
    E: ScopeEvaluator,
    C: TimeSource,
{
    store: L,
    scopes: Arc<E>,
    clock: C,
}

impl<L, E, C> MaterialLedgerService<L, E, C>
where
    L: LedgerStore,
    E: ScopeEvaluator,
    C: TimeSource,
{
    pub fn new(store: L, scopes: Arc<E>, clock: C) -> Self {
        Self {
            store,
            scopes,
            clock,
        }
    }

    pub fn store(&self) -> &L {
        &self.store
    }

    /// Validate a new issue without writing it.
    pub async fn prepare_issue(&self, actor: &Actor, issue: &MaterialIssue) -> LedgerResult<()> {
        if issue.issued_quantity == 0 {
            return Err(LedgerError::ZeroQuantity);
        }
        self.scopes.ensure_access(actor, issue.partition_id).await?;
        Ok(())
    }

    /// Write a validated issue.
    pub async fn insert_issue(&self, issue: MaterialIssue) -> LedgerResult<MaterialIssue> {
        if !self.store.insert_issue(issue.clone()).await? {
            return Err(LedgerError::IssueExists { issue_id: issue.id });
        }
        info!(issue_id = %issue.id, lot_id = %issue.lot_id, quantity = issue.issued_quantity, "Material issue registered");
        Ok(issue)
    }

    pub async fn register_issue(&self, actor: &Actor, issue: MaterialIssue) -> LedgerResult<MaterialIssue> {
        self.prepare_issue(actor, &issue).await?;
        self.insert_issue(issue).await
    }

    /// Lock the issue, check scope and availability, and insert the return.
    ///
    /// ## Errors
    ///
    /// - `IssueNotFound`: unknown issue
    /// - `Scope`: the actor cannot write to the issue's partition
    /// - `Exceeded`: `requested > available`, with the exact figures
    pub async fn prepare_return(
        &self,
        actor: &Actor,
        request: ReturnRequest,
    ) -> LedgerResult<PreparedLedgerWrite<MaterialReturn, L::Tx>> {
        let mut tx = self.begin(actor, request.material_issue_id).await?;

        let availability = Availability::compute(tx.issue(), tx.returns(), tx.adjustments())?;
        if let Err(e) = availability.check_return(tx.issue(), request.quantity) {
            debug!(
                issue_id = %request.material_issue_id,
                requested = request.quantity,
                available = availability.available,
                "Return rejected"
            );
            return Err(e);
        }

        let record = MaterialReturn {
            id: EntityId::new(),
            material_issue_id: request.material_issue_id,
            returned_quantity: request.quantity,
            reason_code: request.reason_code,
            returned_by: request.returned_by,
            created_at: self.clock.now_millis(),
        };
        tx.insert_return(record.clone());
        let availability = Availability::compute(tx.issue(), tx.returns(), tx.adjustments())?;

        Ok(PreparedLedgerWrite {
            tx,
            record,
            availability,
        })
    }

    /// Reserve a return: accepted rows are permanent.
    pub async fn reserve_return(
        &self,
        actor: &Actor,
        request: ReturnRequest,
    ) -> LedgerResult<MaterialReturn> {
        let prepared = self.prepare_return(actor, request).await?;
        let available = prepared.availability_after().available;
        let record = prepared.commit()?;
        debug!(issue_id = %record.material_issue_id, quantity = record.returned_quantity, available, "Return accepted");
        Ok(record)
    }

    /// Lock the issue and insert a reversal of previously returned quantity.
    ///
    /// ## Errors
    ///
    /// - `AdjustmentExceedsReturned`: net returned would drop below zero
    pub async fn prepare_adjustment(
        &self,
        actor: &Actor,
        request: AdjustmentRequest,
    ) -> LedgerResult<PreparedLedgerWrite<LedgerAdjustment, L::Tx>> {
        let mut tx = self.begin(actor, request.material_issue_id).await?;

        let availability = Availability::compute(tx.issue(), tx.returns(), tx.adjustments())?;
        availability.check_reversal(tx.issue(), request.reversed_quantity)?;

        let record = LedgerAdjustment {
            id: EntityId::new(),
            material_issue_id: request.material_issue_id,
            reversed_quantity: request.reversed_quantity,
            reason: request.reason,
            adjusted_by: request.adjusted_by,
            created_at: self.clock.now_millis(),
        };
        tx.insert_adjustment(record.clone());
        let availability = Availability::compute(tx.issue(), tx.returns(), tx.adjustments())?;

        Ok(PreparedLedgerWrite {
            tx,
            record,
            availability,
        })
    }

    pub async fn record_adjustment(
        &self,
        actor: &Actor,
        request: AdjustmentRequest,
    ) -> LedgerResult<LedgerAdjustment> {
        self.prepare_adjustment(actor, request).await?.commit()
    }

    /// Availability of an issue, or `None` if it is unknown or outside the
    /// actor's scope.
    pub async fn availability(
        &self,
        actor: &Actor,
        issue_id: EntityId,
    ) -> LedgerResult<Option<Availability>> {
        let Some(tx) = self.store.begin(issue_id).await? else {
            return Ok(None);
        };
        if !self.scopes.can_access(actor, tx.issue().partition_id).await {
            return Ok(None);
        }
        Availability::compute(tx.issue(), tx.returns(), tx.adjustments()).map(Some)
    }

    async fn begin(&self, actor: &Actor, issue_id: EntityId) -> LedgerResult<L::Tx> {
        let tx = self
            .store
            .begin(issue_id)
            .await?
            .ok_or(LedgerError::IssueNotFound { issue_id })?;
        self.scopes.ensure_access(actor, tx.issue().partition_id).await?;
        Ok(tx)
    }
}
