//! # Audit Chain Flows
//!
//! Every committed mutation extends one hash-linked chain; any in-place
//! edit of a stored record is found by verification.

#[cfg(test)]
mod tests {
    use super::super::support::{issue, work_order, Plant, EPOCH};
    use audit_verify::{verify_log, SequenceRange};
    use fi_03_material_ledger::ReturnRequest;
    use fi_02_optimistic_concurrency::InMemoryVersionedStore;
    use fi_04_audit_chain::{AuditStore, ViolationKind};
    use integrity_runtime::{AuditedRecords, Change, ErrorKind, IntegrityConfig, IntegrityContainer};
    use proptest::prelude::*;
    use shared_bus::{EventFilter, EventTopic, IntegrityEvent};
    use shared_types::{
        Actor, ActorId, ManualClock, PartitionId, RecordState, ReturnReason, Role, WorkOrderState,
        WorkOrderStatus, GENESIS_HASH,
    };
    use std::sync::Arc;
    use tempfile::TempDir;

    fn approve(wo: &WorkOrderState) -> WorkOrderState {
        WorkOrderState {
            status: WorkOrderStatus::Approved,
            ..wo.clone()
        }
    }

    #[tokio::test]
    async fn test_mixed_mutations_form_one_chain() {
        let plant = Plant::new();
        let orders = plant.work_orders();
        let actor = plant.north_operator;

        let wo = orders
            .create(&actor, Some(plant.north), work_order("WO-100"))
            .await
            .unwrap();
        plant.clock.advance(5);
        orders
            .update(&plant.admin, Change::approve(wo.value.id, 1), Box::new(approve))
            .await
            .unwrap();
        let gateway = &plant.container.gateway;
        let ledger = &plant.container.ledger;
        let issued = gateway
            .register_issue(&actor, ledger, issue(plant.north, 30))
            .await
            .unwrap();
        gateway
            .reserve_return(
                &actor,
                ledger,
                ReturnRequest {
                    material_issue_id: issued.value.id,
                    quantity: 4,
                    reason_code: ReturnReason::Excess,
                    returned_by: actor.id,
                },
            )
            .await
            .unwrap();

        let records = plant.audit_store().range(1, None).await.unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].previous_hash, GENESIS_HASH);
        for pair in records.windows(2) {
            assert_eq!(pair[1].sequence, pair[0].sequence + 1);
            assert_eq!(pair[1].previous_hash, pair[0].record_hash);
        }
        assert!(records.iter().all(|r| r.created_at >= EPOCH));

        let report = gateway.integrity_check().await.unwrap();
        assert!(report.valid);
        assert_eq!(report.checked, 4);
    }

    #[tokio::test]
    async fn test_overwritten_record_breaks_chain_from_there() {
        let plant = Plant::new();
        let orders = plant.work_orders();
        for n in 1..=5 {
            orders
                .create(&plant.north_operator, Some(plant.north), work_order(&format!("WO-{n}")))
                .await
                .unwrap();
        }
        let mut alerts = plant
            .container
            .bus
            .subscribe(EventFilter::topics(vec![EventTopic::Alerts]));

        assert!(plant.audit_store().tamper_with(3, |record| {
            record.after_state = Some(RecordState::WorkOrder(work_order("WO-FORGED")));
        }));

        let report = plant.container.gateway.verify_chain(None).await.unwrap();
        assert!(!report.valid);
        assert_eq!(report.broken_at, Some(3));
        assert_eq!(report.checked, 5);
        assert!(report
            .violations_at(3)
            .any(|kind| *kind == ViolationKind::HashMismatch));
        assert!(report
            .violations_at(4)
            .any(|kind| *kind == ViolationKind::LinkMismatch));
        assert_eq!(report.violations_at(2).count(), 0);

        match alerts.try_recv() {
            Ok(Some(IntegrityEvent::ChainIntegrityAlert { broken_at, checked })) => {
                assert_eq!((broken_at, checked), (3, 5));
            }
            other => panic!("expected an integrity alert, got {other:?}"),
        }

        let err = plant.container.gateway.integrity_check().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ChainIntegrityViolation);
    }

    #[tokio::test]
    async fn test_file_backed_chain_survives_restart() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.jsonl");
        let clock = ManualClock::starting_at(EPOCH);

        let last_hash = {
            let container =
                IntegrityContainer::with_audit_log(IntegrityConfig::default(), clock.clone(), &path)
                    .unwrap();
            let orders = container.records(Arc::new(InMemoryVersionedStore::<WorkOrderState>::new()));
            let admin = Actor::new(ActorId::new(), Role::Admin);
            let mut last = None;
            for n in 1..=3 {
                let committed = orders
                    .create(&admin, Some(PartitionId::new()), work_order(&format!("WO-F{n}")))
                    .await
                    .unwrap();
                last = Some(committed.audit.record_hash);
            }
            last.unwrap()
        };

        let offline = verify_log(&path, SequenceRange::default()).unwrap();
        assert!(offline.is_intact());
        assert_eq!(offline.verification.checked, 3);

        let container =
            IntegrityContainer::with_audit_log(IntegrityConfig::default(), clock, &path).unwrap();
        assert_eq!(container.gateway.integrity_check().await.unwrap().checked, 3);

        let orders = container.records(Arc::new(InMemoryVersionedStore::<WorkOrderState>::new()));
        let admin = Actor::new(ActorId::new(), Role::Admin);
        let fourth = orders
            .create(&admin, Some(PartitionId::new()), work_order("WO-F4"))
            .await
            .unwrap();
        assert_eq!(fourth.audit.sequence, 4);
        assert_eq!(fourth.audit.previous_hash, last_hash);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_first_edited_record_is_reported(len in 1u64..12, pick in 0u64..12) {
            let target = pick % len + 1;
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let report = runtime.block_on(async {
                let plant = Plant::new();
                let orders = plant.work_orders();
                for n in 0..len {
                    orders
                        .create(&plant.admin, Some(plant.south), work_order(&format!("P-{n}")))
                        .await
                        .unwrap();
                }
                plant.audit_store().tamper_with(target, |record| {
                    record.reason = Some("rewritten".into());
                });
                plant.container.gateway.verify_chain(None).await.unwrap()
            });

            prop_assert!(!report.valid);
            prop_assert_eq!(report.broken_at, Some(target));
            prop_assert_eq!(report.checked, len);
        }
    }
}
