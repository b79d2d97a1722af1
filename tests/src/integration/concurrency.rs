//! # Optimistic Concurrency Flows
//!
//! Two writers holding the same version: exactly one wins, the other learns
//! the current version and leaves no trace in the audit chain.

#[cfg(test)]
mod tests {
    use super::super::support::{work_order, Plant};
    use fi_02_optimistic_concurrency::InMemoryVersionedStore;
    use fi_04_audit_chain::AuditStore;
    use integrity_runtime::{AuditedRecords, Change, ErrorKind};
    use shared_types::{EntityType, WorkOrderState};
    use std::sync::Arc;

    fn planned(quantity: u64) -> Box<dyn FnOnce(&WorkOrderState) -> WorkOrderState + Send> {
        Box::new(move |wo: &WorkOrderState| WorkOrderState {
            planned_quantity: quantity,
            ..wo.clone()
        })
    }

    #[tokio::test]
    async fn test_lost_update_prevented() {
        let plant = Plant::new();
        let orders = plant.work_orders();
        let a = plant.north_operator;
        let b = plant.admin;

        let id = orders
            .create(&a, Some(plant.north), work_order("WO-200"))
            .await
            .unwrap()
            .value
            .id;
        for (expected, quantity) in [(1, 260), (2, 270)] {
            orders
                .update(&a, Change::update(id, expected), planned(quantity))
                .await
                .unwrap();
        }

        // A and B both loaded version 3; B saves first.
        let b_saved = orders
            .update(&b, Change::update(id, 3), planned(300))
            .await
            .unwrap();
        assert_eq!(b_saved.value.version, 4);

        let a_saved = orders
            .update(&a, Change::update(id, 3), planned(280))
            .await
            .unwrap_err();
        assert_eq!(a_saved.kind(), ErrorKind::VersionConflict);
        assert_eq!(a_saved.current_version(), Some(4));

        let current = orders.get(&a, id).await.unwrap().unwrap();
        assert_eq!(current.version, 4);
        assert_eq!(current.data.planned_quantity, 300);

        let trail = orders.trail(&b, id, None).await.unwrap();
        assert_eq!(trail.len(), 4);
        assert_eq!(trail[0].actor_id, b.id);
    }

    #[tokio::test]
    async fn test_simultaneous_updates_one_winner() {
        let plant = Plant::new();
        let orders = plant.work_orders();
        let id = orders
            .create(&plant.admin, Some(plant.south), work_order("WO-201"))
            .await
            .unwrap()
            .value
            .id;

        let (first, second) = tokio::join!(
            orders.update(&plant.admin, Change::update(id, 1), planned(10)),
            orders.update(&plant.south_operator, Change::update(id, 1), planned(20)),
        );

        let (won, lost) = match (first, second) {
            (Ok(won), Err(lost)) | (Err(lost), Ok(won)) => (won, lost),
            other => panic!("expected exactly one winner, got {other:?}"),
        };
        assert_eq!(won.value.version, 2);
        assert_eq!(lost.kind(), ErrorKind::VersionConflict);
        assert_eq!(lost.current_version(), Some(2));
        assert_eq!(plant.audit_store().len().await.unwrap(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_many_writers_on_one_version() {
        let plant = Plant::new();
        let orders = Arc::new(plant.work_orders());
        let admin = plant.admin;
        let id = orders
            .create(&admin, Some(plant.north), work_order("WO-202"))
            .await
            .unwrap()
            .value
            .id;

        let tasks: Vec<_> = (0..16u64)
            .map(|n| {
                let orders = orders.clone();
                tokio::spawn(async move {
                    orders
                        .update(&admin, Change::update(id, 1), planned(100 + n))
                        .await
                })
            })
            .collect();

        let mut winners = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(committed) => {
                    winners += 1;
                    assert_eq!(committed.value.version, 2);
                }
                Err(e) => assert_eq!(e.current_version(), Some(2)),
            }
        }
        assert_eq!(winners, 1);

        let records = plant
            .audit_store()
            .by_entity(EntityType::WorkOrder, id, 100)
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert!(plant.container.gateway.integrity_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_retry_helper_reapplies_on_fresh_state() {
        let plant = Plant::new();
        let store = Arc::new(InMemoryVersionedStore::<WorkOrderState>::new());
        let orders = plant.container.records(store);
        let id = orders
            .create(&plant.admin, Some(plant.north), work_order("WO-203"))
            .await
            .unwrap()
            .value
            .id;
        orders
            .update(&plant.admin, Change::update(id, 1), planned(251))
            .await
            .unwrap();

        let bumped = plant
            .container
            .gateway
            .update_with_retry(&plant.admin, orders.controller(), Change::update(id, 1), |wo: &WorkOrderState| {
                WorkOrderState {
                    planned_quantity: wo.planned_quantity + 1,
                    ..wo.clone()
                }
            })
            .await
            .unwrap();
        assert_eq!(bumped.value.version, 3);
        assert_eq!(bumped.value.data.planned_quantity, 252);
    }

    #[tokio::test]
    async fn test_stale_delete_rejected() {
        let plant = Plant::new();
        let orders = plant.work_orders();
        let id = orders
            .create(&plant.admin, Some(plant.north), work_order("WO-204"))
            .await
            .unwrap()
            .value
            .id;
        orders
            .update(&plant.admin, Change::update(id, 1), planned(1))
            .await
            .unwrap();

        let err = orders
            .delete(&plant.admin, id, 1, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::VersionConflict);

        orders
            .delete(&plant.admin, id, 2, Some("entered twice".into()))
            .await
            .unwrap();
        assert!(orders.get(&plant.admin, id).await.unwrap().is_none());
    }
}
