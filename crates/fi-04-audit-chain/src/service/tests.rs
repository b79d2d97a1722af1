use super::*;
use crate::adapters::memory::InMemoryAuditStore;
use crate::domain::verify::ViolationKind;
use proptest::prelude::*;
use shared_types::{
    ActorId, AuditAction, ManualClock, PartitionId, RecordState, WorkOrderState, WorkOrderStatus,
};
use std::sync::Arc;

type Service = AuditChainService<InMemoryAuditStore, ManualClock>;

fn service() -> (Service, ManualClock) {
    let clock = ManualClock::starting_at(1_700_000_000_000);
    (
        AuditChainService::new(InMemoryAuditStore::new(), clock.clone()),
        clock,
    )
}

fn work_order(status: WorkOrderStatus) -> RecordState {
    RecordState::WorkOrder(WorkOrderState {
        number: "WO-0042".into(),
        sku_code: "GEAR-20T".into(),
        planned_quantity: 500,
        status,
    })
}

fn mutation(entity_id: EntityId, action: AuditAction) -> AuditMutation {
    AuditMutation {
        entity_type: EntityType::WorkOrder,
        entity_id,
        action,
        partition_id: Some(PartitionId::new()),
        actor_id: ActorId::new(),
        before_state: Some(work_order(WorkOrderStatus::Draft)),
        after_state: Some(work_order(WorkOrderStatus::PendingApproval)),
        reason: None,
    }
}

async fn five_records(service: &Service) -> EntityId {
    let id = EntityId::new();
    for _ in 0..5 {
        service.append(mutation(id, AuditAction::Update)).await.unwrap();
    }
    id
}

#[tokio::test]
async fn test_first_record_links_to_genesis() {
    let (service, _) = service();
    let record = service
        .append(mutation(EntityId::new(), AuditAction::Create))
        .await
        .unwrap();

    assert_eq!(record.sequence, 1);
    assert_eq!(record.previous_hash, GENESIS_HASH);
}

#[tokio::test]
async fn test_each_record_links_to_predecessor() {
    let (service, _) = service();
    five_records(&service).await;

    let records = service.store().range(1, None).await.unwrap();
    for pair in records.windows(2) {
        assert_eq!(pair[1].previous_hash, pair[0].record_hash);
        assert_eq!(pair[1].sequence, pair[0].sequence + 1);
    }
    assert!(service.verify_chain(None).await.unwrap().valid);
}

#[tokio::test]
async fn test_timestamp_captured_once() {
    let (service, clock) = service();
    clock.set(1_234);
    let record = service
        .append(mutation(EntityId::new(), AuditAction::Create))
        .await
        .unwrap();

    assert_eq!(record.created_at, 1_234);
    assert_eq!(
        crate::domain::record::compute_record_hash(&record).unwrap(),
        record.record_hash
    );
}

#[tokio::test]
async fn test_tampered_after_state_detected_at_three() {
    let (service, _) = service();
    five_records(&service).await;

    assert!(service.store().tamper_with(3, |r| {
        r.after_state = Some(work_order(WorkOrderStatus::Approved));
    }));

    let result = service.verify_chain(None).await.unwrap();
    assert!(!result.valid);
    assert_eq!(result.broken_at, Some(3));
    assert!(result.violations_at(4).any(|k| *k == ViolationKind::LinkMismatch));

    let err = service.ensure_intact().await.unwrap_err();
    assert_eq!(
        err,
        AuditError::IntegrityViolation {
            broken_at: 3,
            checked: 5
        }
    );
}

#[tokio::test]
async fn test_range_verification_anchors_to_stored_predecessor() {
    let (service, _) = service();
    five_records(&service).await;
    service.store().tamper_with(1, |r| r.reason = Some("edited".into()));

    // Records 3..=5 are intact relative to record 2's stored hash.
    let tail = service.verify_chain(Some(3..=5)).await.unwrap();
    assert!(tail.valid);
    assert_eq!(tail.checked, 3);

    let full = service.verify_chain(None).await.unwrap();
    assert_eq!(full.broken_at, Some(1));
}

#[tokio::test]
async fn test_empty_chain_is_valid() {
    let (service, _) = service();
    assert_eq!(
        service.verify_chain(None).await.unwrap(),
        ChainVerification::empty()
    );
    assert!(service.verify_chain(Some(10..=20)).await.unwrap().valid);
}

#[tokio::test]
async fn test_staged_record_invisible_until_commit() {
    let (service, _) = service();
    let staged = service
        .lock_tail()
        .await
        .stage(mutation(EntityId::new(), AuditAction::Create))
        .await
        .unwrap();

    assert_eq!(staged.record().sequence, 1);
    assert_eq!(service.len().await.unwrap(), 0);

    staged.commit();
    assert_eq!(service.len().await.unwrap(), 1);
}

#[tokio::test]
async fn test_dropped_stage_rolls_back_and_frees_lane() {
    let (service, _) = service();
    {
        let _staged = service
            .lock_tail()
            .await
            .stage(mutation(EntityId::new(), AuditAction::Create))
            .await
            .unwrap();
    }

    let record = service
        .append(mutation(EntityId::new(), AuditAction::Create))
        .await
        .unwrap();
    assert_eq!(record.sequence, 1);
    assert_eq!(service.len().await.unwrap(), 1);
}

#[tokio::test]
async fn test_store_outage_is_append_failure() {
    let (service, _) = service();
    service.store().set_unavailable(true);

    let err = service
        .append(mutation(EntityId::new(), AuditAction::Create))
        .await
        .unwrap_err();
    assert!(matches!(err, AuditError::AppendFailed { .. }));
    assert_eq!(service.len().await.unwrap(), 0);
}

#[tokio::test]
async fn test_trail_newest_first_with_limit() {
    let (service, _) = service();
    let id = five_records(&service).await;
    service
        .append(mutation(EntityId::new(), AuditAction::Create))
        .await
        .unwrap();

    let trail = service
        .trail_for(EntityType::WorkOrder, id, Some(3))
        .await
        .unwrap();
    let sequences: Vec<_> = trail.iter().map(|r| r.sequence).collect();
    assert_eq!(sequences, vec![5, 4, 3]);

    let all = service.trail_for(EntityType::WorkOrder, id, None).await.unwrap();
    assert_eq!(all.len(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_form_one_chain() {
    let (service, _) = service();
    let service = Arc::new(service);

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .append(mutation(EntityId::new(), AuditAction::Create))
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let result = service.verify_chain(None).await.unwrap();
    assert!(result.valid);
    assert_eq!(result.checked, 32);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_any_single_edit_is_detected(len in 2u64..12, target_offset in 0u64..12, reason in "[a-z]{1,12}") {
        let target = 1 + target_offset % len;
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();

        runtime.block_on(async {
            let (service, clock) = service();
            for _ in 0..len {
                clock.advance(1);
                service.append(mutation(EntityId::new(), AuditAction::Update)).await.unwrap();
            }
            prop_assert!(service.verify_chain(None).await.unwrap().valid);

            service.store().tamper_with(target, |r| r.reason = Some(reason.clone()));
            let result = service.verify_chain(None).await.unwrap();

            prop_assert!(!result.valid);
            prop_assert_eq!(result.broken_at, Some(target));
            if target < len {
                prop_assert!(result.violations_at(target + 1).any(|k| *k == ViolationKind::LinkMismatch));
            }
            Ok(())
        })?;
    }
}
