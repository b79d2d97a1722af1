//! # Mutation Gateway
//!
//! The single commit path for every business write:
//!
//! ```text
//! scope check ──→ read/prepare ──→ lock audit lane ──→ stage audit record
//!                                                            │
//!                      publish event ←── commit audit ←── conditional write
//! ```
//!
//! The audit record is staged before the business write and committed only
//! after it succeeds. If staging fails nothing is written; if the write
//! fails the staged record is rolled back. Either both become durable or
//! neither does.
//!
//! Lock order is always: issue row lock (ledger paths), then the audit lane,
//! then any store-internal lock.

use super::error::{CommitError, CommitResult};
use fi_01_access_scope::{ScopeError, ScopeEvaluator};
use fi_02_optimistic_concurrency::{ConcurrencyController, ConcurrencyError, Versioned, VersionedStore};
use fi_03_material_ledger::{
    AdjustmentRequest, LedgerError, LedgerStore, MaterialLedgerService, ReturnRequest,
};
use fi_04_audit_chain::{
    AuditChainService, AuditError, AuditMutation, AuditRecord, AuditStore, ChainVerification,
    StagedAudit,
};
use fi_telemetry::metrics::{
    time_mutation, AUDIT_APPENDS, AUDIT_APPEND_FAILURES, CHAIN_VIOLATIONS, EVENTS_PUBLISHED,
    LEDGER_REJECTIONS, SCOPE_DENIALS, VERSION_CONFLICTS,
};
use shared_bus::{EventPublisher, IntegrityEvent, InvalidationEvent};
use shared_types::{
    Actor, AuditAction, Auditable, EntityId, EntityRef, EntityType, LedgerAdjustment,
    MaterialIssue, MaterialReturn, PartitionId, RecordState, TimeSource,
};
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// A committed write together with the audit record describing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Committed<T> {
    pub value: T,
    pub audit: AuditRecord,
}

/// Identity, expected version and kind of an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub entity_id: EntityId,
    pub expected_version: u64,
    /// `Update`, `Approve` or `Reject`.
    pub action: AuditAction,
    pub reason: Option<String>,
}

impl Change {
    pub fn update(entity_id: EntityId, expected_version: u64) -> Self {
        Self {
            entity_id,
            expected_version,
            action: AuditAction::Update,
            reason: None,
        }
    }

    pub fn approve(entity_id: EntityId, expected_version: u64) -> Self {
        Self {
            action: AuditAction::Approve,
            ..Self::update(entity_id, expected_version)
        }
    }

    /// A rejection must say why.
    pub fn reject(entity_id: EntityId, expected_version: u64, reason: impl Into<String>) -> Self {
        Self {
            action: AuditAction::Reject,
            reason: Some(reason.into()),
            ..Self::update(entity_id, expected_version)
        }
    }

    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    fn validate(&self) -> CommitResult<()> {
        match self.action {
            AuditAction::Update | AuditAction::Approve => Ok(()),
            AuditAction::Reject => match self.reason.as_deref().map(str::trim) {
                Some(r) if !r.is_empty() => Ok(()),
                _ => Err(CommitError::invalid("a rejection requires a reason")),
            },
            other => Err(CommitError::invalid(format!(
                "{other} is not an update action"
            ))),
        }
    }
}

/// The mutation-commit pipeline.
pub struct MutationGateway<A, E, C>
where
    A: AuditStore,
    E: ScopeEvaluator,
    C: TimeSource,
{
    scopes: Arc<E>,
    audit: Arc<AuditChainService<A, C>>,
    publisher: Arc<dyn EventPublisher>,
    max_update_attempts: u32,
}

impl<A, E, C> MutationGateway<A, E, C>
where
    A: AuditStore,
    E: ScopeEvaluator,
    C: TimeSource,
{
    pub fn new(
        scopes: Arc<E>,
        audit: Arc<AuditChainService<A, C>>,
        publisher: Arc<dyn EventPublisher>,
        max_update_attempts: u32,
    ) -> Self {
        Self {
            scopes,
            audit,
            publisher,
            max_update_attempts: max_update_attempts.max(1),
        }
    }

    pub fn audit(&self) -> &Arc<AuditChainService<A, C>> {
        &self.audit
    }

    pub fn scopes(&self) -> &Arc<E> {
        &self.scopes
    }

    // =========================================================================
    // VERSIONED RECORDS
    // =========================================================================

    /// Create a record at version 1.
    ///
    /// ## Errors
    ///
    /// - `Invalid`: partition given for a shared type, or missing for a partitioned one
    /// - `ScopeDenied`, `ChainAppendFailure`, storage errors
    pub async fn create<T, S, CC>(
        &self,
        actor: &Actor,
        records: &ConcurrencyController<T, S, CC>,
        partition_id: Option<PartitionId>,
        data: T,
    ) -> CommitResult<Committed<Versioned<T>>>
    where
        T: Auditable,
        S: VersionedStore<T>,
        CC: TimeSource,
    {
        let _timer = time_mutation("create");
        check_partitioning(T::ENTITY_TYPE, partition_id)?;
        self.authorize(actor, partition_id).await?;

        let record = records.new_record(EntityId::new(), partition_id, data);
        let after = record.data.to_state();
        let staged = self
            .stage(AuditMutation {
                entity_type: T::ENTITY_TYPE,
                entity_id: record.id,
                action: AuditAction::Create,
                partition_id,
                actor_id: actor.id,
                before_state: None,
                after_state: Some(after.clone()),
                reason: None,
            })
            .await?;

        let record = records.insert(record).await?;
        let audit = finish(staged);
        self.publish(
            &audit,
            RecordState::changed_fields(None, Some(&after)),
            record.version,
            record.data.parent(),
        )
        .await;
        Ok(Committed {
            value: record,
            audit,
        })
    }

    /// Conditionally update a record, or approve / reject it.
    ///
    /// ## Errors
    ///
    /// - `VersionConflict`: `change.expected_version` is stale; carries the current version
    /// - `NotFound`, `ScopeDenied`, `ChainAppendFailure`, `Invalid`
    pub async fn update<T, S, CC, F>(
        &self,
        actor: &Actor,
        records: &ConcurrencyController<T, S, CC>,
        change: Change,
        mutator: F,
    ) -> CommitResult<Committed<Versioned<T>>>
    where
        T: Auditable,
        S: VersionedStore<T>,
        CC: TimeSource,
        F: FnOnce(&T) -> T,
    {
        let _timer = time_mutation("update");
        change.validate()?;

        // The mutator only ever sees records the actor may write.
        let current = records.get(change.entity_id).await?;
        self.authorize(actor, current.partition_id).await?;
        let prepared = records.prepare_from(current, change.expected_version, mutator)?;

        let before = prepared.before.data.to_state();
        let after = prepared.after.data.to_state();
        let parent = prepared.after.data.parent();
        let staged = self
            .stage(AuditMutation {
                entity_type: T::ENTITY_TYPE,
                entity_id: change.entity_id,
                action: change.action,
                partition_id: prepared.before.partition_id,
                actor_id: actor.id,
                before_state: Some(before.clone()),
                after_state: Some(after.clone()),
                reason: change.reason,
            })
            .await?;

        let updated = records
            .commit_prepared(prepared)
            .await
            .map_err(|e| note_conflict(T::ENTITY_TYPE, e))?;
        let audit = finish(staged);
        self.publish(
            &audit,
            RecordState::changed_fields(Some(&before), Some(&after)),
            updated.version,
            parent,
        )
        .await;
        Ok(Committed {
            value: updated,
            audit,
        })
    }

    /// Opt-in retry around [`update`](Self::update): every attempt re-reads
    /// the record and re-runs `mutator` on that fresh state, up to the
    /// configured number of attempts.
    pub async fn update_with_retry<T, S, CC, F>(
        &self,
        actor: &Actor,
        records: &ConcurrencyController<T, S, CC>,
        change: Change,
        mutator: F,
    ) -> CommitResult<Committed<Versioned<T>>>
    where
        T: Auditable,
        S: VersionedStore<T>,
        CC: TimeSource,
        F: Fn(&T) -> T,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let current = records.get(change.entity_id).await?;
            let fresh = Change {
                expected_version: current.version,
                ..change.clone()
            };
            match self.update(actor, records, fresh, &mutator).await {
                Err(e) if e.current_version().is_some() && attempt < self.max_update_attempts => {
                    debug!(entity_id = %change.entity_id, attempt, "Conflict, retrying on fresh state");
                }
                other => return other,
            }
        }
    }

    /// Conditionally delete a record. Returns the removed state.
    pub async fn delete<T, S, CC>(
        &self,
        actor: &Actor,
        records: &ConcurrencyController<T, S, CC>,
        entity_id: EntityId,
        expected_version: u64,
        reason: Option<String>,
    ) -> CommitResult<Committed<Versioned<T>>>
    where
        T: Auditable,
        S: VersionedStore<T>,
        CC: TimeSource,
    {
        let _timer = time_mutation("delete");
        let current = records.prepare_delete(entity_id, expected_version).await?;
        self.authorize(actor, current.partition_id).await?;

        let before = current.data.to_state();
        let staged = self
            .stage(AuditMutation {
                entity_type: T::ENTITY_TYPE,
                entity_id,
                action: AuditAction::Delete,
                partition_id: current.partition_id,
                actor_id: actor.id,
                before_state: Some(before.clone()),
                after_state: None,
                reason,
            })
            .await?;

        records
            .conditional_delete(entity_id, expected_version)
            .await
            .map_err(|e| note_conflict(T::ENTITY_TYPE, e))?;
        let audit = finish(staged);
        self.publish(
            &audit,
            RecordState::changed_fields(Some(&before), None),
            0,
            current.data.parent(),
        )
        .await;
        Ok(Committed {
            value: current,
            audit,
        })
    }

    // =========================================================================
    // MATERIAL LEDGER
    // =========================================================================

    /// Register a material issue (audited create).
    pub async fn register_issue<L, LE, LC>(
        &self,
        actor: &Actor,
        ledger: &MaterialLedgerService<L, LE, LC>,
        issue: MaterialIssue,
    ) -> CommitResult<Committed<MaterialIssue>>
    where
        L: LedgerStore,
        LE: ScopeEvaluator,
        LC: TimeSource,
    {
        let _timer = time_mutation("register_issue");
        ledger
            .prepare_issue(actor, &issue)
            .await
            .map_err(note_ledger_rejection)?;

        let after = issue.to_state();
        let staged = self
            .stage(AuditMutation {
                entity_type: EntityType::MaterialIssue,
                entity_id: issue.id,
                action: AuditAction::Create,
                partition_id: Some(issue.partition_id),
                actor_id: actor.id,
                before_state: None,
                after_state: Some(after.clone()),
                reason: None,
            })
            .await?;

        let issue = ledger.insert_issue(issue).await?;
        let audit = finish(staged);
        self.publish(
            &audit,
            RecordState::changed_fields(None, Some(&after)),
            1,
            issue.parent(),
        )
        .await;
        Ok(Committed {
            value: issue,
            audit,
        })
    }

    /// Reserve a material return against an issue.
    ///
    /// ## Errors
    ///
    /// - `LedgerExceeded`: carries the exact available quantity
    /// - `NotFound`, `ScopeDenied`, `ChainAppendFailure`
    pub async fn reserve_return<L, LE, LC>(
        &self,
        actor: &Actor,
        ledger: &MaterialLedgerService<L, LE, LC>,
        request: ReturnRequest,
    ) -> CommitResult<Committed<MaterialReturn>>
    where
        L: LedgerStore,
        LE: ScopeEvaluator,
        LC: TimeSource,
    {
        let _timer = time_mutation("reserve_return");
        let prepared = ledger
            .prepare_return(actor, request)
            .await
            .map_err(note_ledger_rejection)?;

        let after = prepared.record().to_state();
        let staged = self
            .stage(AuditMutation {
                entity_type: EntityType::MaterialReturn,
                entity_id: prepared.record().id,
                action: AuditAction::Create,
                partition_id: Some(prepared.issue().partition_id),
                actor_id: actor.id,
                before_state: None,
                after_state: Some(after.clone()),
                reason: None,
            })
            .await?;

        let available = prepared.availability_after().available;
        let record = prepared.commit()?;
        let audit = finish(staged);
        debug!(issue_id = %record.material_issue_id, quantity = record.returned_quantity, available, "Return committed");
        self.publish(
            &audit,
            RecordState::changed_fields(None, Some(&after)),
            1,
            record.parent(),
        )
        .await;
        Ok(Committed {
            value: record,
            audit,
        })
    }

    /// Record a correction reversing previously returned quantity.
    pub async fn record_adjustment<L, LE, LC>(
        &self,
        actor: &Actor,
        ledger: &MaterialLedgerService<L, LE, LC>,
        request: AdjustmentRequest,
    ) -> CommitResult<Committed<LedgerAdjustment>>
    where
        L: LedgerStore,
        LE: ScopeEvaluator,
        LC: TimeSource,
    {
        let _timer = time_mutation("record_adjustment");
        if request.reason.trim().is_empty() {
            return Err(CommitError::invalid("an adjustment requires a reason"));
        }
        let prepared = ledger
            .prepare_adjustment(actor, request)
            .await
            .map_err(note_ledger_rejection)?;

        let after = prepared.record().to_state();
        let staged = self
            .stage(AuditMutation {
                entity_type: EntityType::LedgerAdjustment,
                entity_id: prepared.record().id,
                action: AuditAction::Create,
                partition_id: Some(prepared.issue().partition_id),
                actor_id: actor.id,
                before_state: None,
                after_state: Some(after.clone()),
                reason: Some(prepared.record().reason.clone()),
            })
            .await?;

        let record = prepared.commit()?;
        let audit = finish(staged);
        self.publish(
            &audit,
            RecordState::changed_fields(None, Some(&after)),
            1,
            record.parent(),
        )
        .await;
        Ok(Committed {
            value: record,
            audit,
        })
    }

    // =========================================================================
    // AUDIT READS
    // =========================================================================

    /// Newest-first trail of one record, filtered to the actor's scope.
    ///
    /// An out-of-scope record yields an empty trail, not an error.
    pub async fn trail_for(
        &self,
        actor: &Actor,
        entity_type: EntityType,
        entity_id: EntityId,
        limit: Option<usize>,
    ) -> CommitResult<Vec<AuditRecord>> {
        let records = self.audit.trail_for(entity_type, entity_id, limit).await?;
        let scope = self.scopes.evaluate_scope(actor).await;
        Ok(scope.filter_visible(records, |r: &AuditRecord| r.partition_id))
    }

    /// Verify the chain (or a range) and return the full report.
    pub async fn verify_chain(
        &self,
        range: Option<RangeInclusive<u64>>,
    ) -> CommitResult<ChainVerification> {
        let result = self.audit.verify_chain(range).await?;
        if let Some(broken_at) = result.broken_at {
            CHAIN_VIOLATIONS.inc();
            self.publisher
                .publish(IntegrityEvent::ChainIntegrityAlert {
                    broken_at,
                    checked: result.checked,
                })
                .await;
            EVENTS_PUBLISHED.with_label_values(&["alerts"]).inc();
        }
        Ok(result)
    }

    /// Verify the whole chain; a divergence is an error.
    pub async fn integrity_check(&self) -> CommitResult<ChainVerification> {
        let result = self.verify_chain(None).await?;
        match result.broken_at {
            Some(broken_at) => {
                error!(broken_at, checked = result.checked, "Integrity check failed");
                Err(AuditError::IntegrityViolation {
                    broken_at,
                    checked: result.checked,
                }
                .into())
            }
            None => {
                info!(checked = result.checked, "Integrity check passed");
                Ok(result)
            }
        }
    }

    // =========================================================================
    // PIPELINE STEPS
    // =========================================================================

    async fn authorize(&self, actor: &Actor, partition_id: Option<PartitionId>) -> CommitResult<()> {
        let Some(partition_id) = partition_id else {
            return Ok(());
        };
        self.scopes
            .ensure_access(actor, partition_id)
            .await
            .map_err(|e| {
                if matches!(e, ScopeError::Denied { .. }) {
                    SCOPE_DENIALS.inc();
                }
                CommitError::from(e)
            })
    }

    async fn stage(&self, mutation: AuditMutation) -> CommitResult<StagedAudit<'_, A>> {
        self.audit
            .lock_tail()
            .await
            .stage(mutation)
            .await
            .map_err(|e| {
                AUDIT_APPEND_FAILURES.inc();
                CommitError::from(e)
            })
    }

    async fn publish(
        &self,
        audit: &AuditRecord,
        changed_fields: Vec<String>,
        version: u64,
        parent: Option<EntityRef>,
    ) {
        let event = InvalidationEvent {
            entity_type: audit.entity_type,
            entity_id: audit.entity_id,
            partition_id: audit.partition_id,
            action: audit.action,
            changed_fields,
            version,
            timestamp: audit.created_at,
            parent,
        };
        let receivers = self
            .publisher
            .publish(IntegrityEvent::MutationCommitted(event))
            .await;
        EVENTS_PUBLISHED.with_label_values(&["mutations"]).inc();
        debug!(
            sequence = audit.sequence,
            entity_type = %audit.entity_type,
            entity_id = %audit.entity_id,
            action = %audit.action,
            receivers,
            "Mutation committed"
        );
    }
}

fn finish<A: AuditStore>(staged: StagedAudit<'_, A>) -> AuditRecord {
    let record = staged.commit();
    AUDIT_APPENDS.inc();
    record
}

fn check_partitioning(entity_type: EntityType, partition_id: Option<PartitionId>) -> CommitResult<()> {
    match (entity_type.is_partitioned(), partition_id) {
        (true, None) => Err(CommitError::invalid(format!(
            "{entity_type} records belong to a partition"
        ))),
        (false, Some(_)) => Err(CommitError::invalid(format!(
            "{entity_type} records are shared by all partitions"
        ))),
        _ => Ok(()),
    }
}

fn note_conflict(entity_type: EntityType, err: ConcurrencyError) -> CommitError {
    if let ConcurrencyError::Conflict {
        entity_id,
        expected_version,
        current_version,
    } = &err
    {
        VERSION_CONFLICTS
            .with_label_values(&[entity_type.as_str()])
            .inc();
        warn!(
            entity_type = %entity_type,
            entity_id = %entity_id,
            expected_version,
            current_version,
            "Stale write rejected"
        );
    }
    err.into()
}

fn note_ledger_rejection(err: LedgerError) -> CommitError {
    let reason = match &err {
        LedgerError::Exceeded { .. } => Some("exceeded"),
        LedgerError::AdjustmentExceedsReturned { .. } => Some("adjustment_exceeds_returned"),
        LedgerError::ZeroQuantity => Some("zero_quantity"),
        LedgerError::Scope(ScopeError::Denied { .. }) => {
            SCOPE_DENIALS.inc();
            None
        }
        _ => None,
    };
    if let Some(reason) = reason {
        LEDGER_REJECTIONS.with_label_values(&[reason]).inc();
    }
    err.into()
}
