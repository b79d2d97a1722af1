//! # Material Ledger Flows
//!
//! Returns against an issue never exceed what was issued, however many
//! storekeepers submit at once.

#[cfg(test)]
mod tests {
    use super::super::support::{issue, Plant};
    use fi_03_material_ledger::{AdjustmentRequest, ReturnRequest};
    use fi_04_audit_chain::AuditStore;
    use integrity_runtime::ErrorKind;
    use proptest::prelude::*;
    use shared_types::{Actor, EntityId, EntityType, ReturnReason};
    use std::sync::Arc;

    fn ret(issue_id: EntityId, actor: &Actor, quantity: u64) -> ReturnRequest {
        ReturnRequest {
            material_issue_id: issue_id,
            quantity,
            reason_code: ReturnReason::Unused,
            returned_by: actor.id,
        }
    }

    #[tokio::test]
    async fn test_exact_boundary_return() {
        let plant = Plant::new();
        let (gateway, ledger) = (&plant.container.gateway, &plant.container.ledger);
        let actor = plant.north_operator;
        let issued = gateway
            .register_issue(&actor, ledger, issue(plant.north, 100))
            .await
            .unwrap()
            .value;

        gateway
            .reserve_return(&actor, ledger, ret(issued.id, &actor, 100))
            .await
            .unwrap();
        let err = gateway
            .reserve_return(&actor, ledger, ret(issued.id, &actor, 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LedgerExceeded);
        assert_eq!(err.available(), Some(0));

        let availability = ledger.availability(&actor, issued.id).await.unwrap().unwrap();
        assert_eq!(availability.returned, 100);
        assert_eq!(availability.available, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_returns_never_overdraw() {
        let plant = Plant::new();
        let gateway = plant.container.gateway.clone();
        let ledger = plant.container.ledger.clone();
        let actor = plant.north_operator;
        let issue_id = gateway
            .register_issue(&actor, &ledger, issue(plant.north, 100))
            .await
            .unwrap()
            .value
            .id;

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let (gateway, ledger) = (gateway.clone(), ledger.clone());
                tokio::spawn(async move {
                    gateway
                        .reserve_return(&actor, &ledger, ret(issue_id, &actor, 10))
                        .await
                })
            })
            .collect();

        let mut accepted = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(e) => assert_eq!(e.kind(), ErrorKind::LedgerExceeded),
            }
        }
        assert_eq!(accepted, 10);

        let availability = ledger.availability(&actor, issue_id).await.unwrap().unwrap();
        assert_eq!(availability.available, 0);

        // One audited create for the issue plus one per accepted return.
        let returns = plant
            .audit_store()
            .range(1, None)
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.entity_type == EntityType::MaterialReturn)
            .count();
        assert_eq!(returns, 10);
        assert_eq!(plant.audit_store().len().await.unwrap(), 11);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_independent_issues_in_parallel() {
        let plant = Arc::new(Plant::new());
        let actor = plant.admin;
        let mut issues = Vec::new();
        for _ in 0..4 {
            let issued = plant
                .container
                .gateway
                .register_issue(&actor, &plant.container.ledger, issue(plant.south, 12))
                .await
                .unwrap()
                .value;
            issues.push(issued.id);
        }

        let tasks: Vec<_> = issues
            .iter()
            .flat_map(|&issue_id| (0..4).map(move |_| issue_id))
            .map(|issue_id| {
                let plant = plant.clone();
                tokio::spawn(async move {
                    plant
                        .container
                        .gateway
                        .reserve_return(&actor, &plant.container.ledger, ret(issue_id, &actor, 3))
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        for issue_id in issues {
            let availability = plant
                .container
                .ledger
                .availability(&actor, issue_id)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(availability.available, 0);
        }
        assert!(plant.container.gateway.integrity_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_adjustment_restores_availability() {
        let plant = Plant::new();
        let (gateway, ledger) = (&plant.container.gateway, &plant.container.ledger);
        let actor = plant.north_operator;
        let issued = gateway
            .register_issue(&actor, ledger, issue(plant.north, 50))
            .await
            .unwrap()
            .value;
        gateway
            .reserve_return(&actor, ledger, ret(issued.id, &actor, 50))
            .await
            .unwrap();

        let adjustment = |quantity: u64, reason: &str| AdjustmentRequest {
            material_issue_id: issued.id,
            reversed_quantity: quantity,
            reason: reason.into(),
            adjusted_by: actor.id,
        };

        let err = gateway
            .record_adjustment(&actor, ledger, adjustment(5, " "))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);

        let err = gateway
            .record_adjustment(&actor, ledger, adjustment(51, "recount"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LedgerExceeded);

        gateway
            .record_adjustment(&actor, ledger, adjustment(20, "recount"))
            .await
            .unwrap();
        let availability = ledger.availability(&actor, issued.id).await.unwrap().unwrap();
        assert_eq!(availability.reversed, 20);
        assert_eq!(availability.available, 20);
    }

    #[tokio::test]
    async fn test_return_outside_scope_denied() {
        let plant = Plant::new();
        let (gateway, ledger) = (&plant.container.gateway, &plant.container.ledger);
        let issued = gateway
            .register_issue(&plant.north_operator, ledger, issue(plant.north, 10))
            .await
            .unwrap()
            .value;

        let outsider = plant.south_operator;
        let err = gateway
            .reserve_return(&outsider, ledger, ret(issued.id, &outsider, 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ScopeDenied);
        assert!(ledger.availability(&outsider, issued.id).await.unwrap().is_none());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_accepted_returns_fit_the_issue(
            issued in 1u64..200,
            requests in proptest::collection::vec(1u64..60, 1..15),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let (accepted_total, available) = runtime.block_on(async {
                let plant = Plant::new();
                let (gateway, ledger) = (&plant.container.gateway, &plant.container.ledger);
                let actor = plant.admin;
                let issue_id = gateway
                    .register_issue(&actor, ledger, issue(plant.north, issued))
                    .await
                    .unwrap()
                    .value
                    .id;

                let mut accepted_total = 0;
                for quantity in requests {
                    match gateway.reserve_return(&actor, ledger, ret(issue_id, &actor, quantity)).await {
                        Ok(committed) => accepted_total += committed.value.returned_quantity,
                        Err(e) => assert_eq!(e.available(), Some(issued - accepted_total)),
                    }
                }
                let available = ledger.availability(&actor, issue_id).await.unwrap().unwrap().available;
                (accepted_total, available)
            });

            prop_assert!(accepted_total <= issued);
            prop_assert_eq!(available, issued - accepted_total);
        }
    }
}
