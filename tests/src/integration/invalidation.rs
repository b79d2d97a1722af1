//! # Invalidation Flows
//!
//! Committed mutations reach subscribers as debounced, partition-scoped
//! cache keys.

#[cfg(test)]
mod tests {
    use super::super::support::{issue, work_order, Plant};
    use fi_02_optimistic_concurrency::InMemoryVersionedStore;
    use fi_03_material_ledger::ReturnRequest;
    use fi_05_invalidation_router::{CollectingSink, Delivery, InvalidationKey, SubscriberId};
    use fi_01_access_scope::ScopeEvaluator;
    use integrity_runtime::{AuditedRecords, Change, IntegrityConfig};
    use shared_types::{AuditAction, EntityType, ReturnReason, SkuState, WorkOrderState, WorkOrderStatus};
    use std::sync::Arc;
    use std::time::Duration;

    async fn subscribe_all(plant: &Plant) {
        let registry = &plant.container.subscribers;
        let scopes = plant.container.scopes.as_ref();
        registry
            .register_actor(SubscriberId::new("hq"), &plant.admin, scopes)
            .await;
        registry
            .register_actor(SubscriberId::new("north"), &plant.north_operator, scopes)
            .await;
        registry
            .register_actor(SubscriberId::new("south"), &plant.south_operator, scopes)
            .await;
    }

    fn by_subscriber(mut deliveries: Vec<Delivery>) -> Vec<(String, Delivery)> {
        deliveries.sort_by(|a, b| a.subscriber_id.0.cmp(&b.subscriber_id.0));
        deliveries
            .into_iter()
            .map(|d| (d.subscriber_id.0.clone(), d))
            .collect()
    }

    fn planned(quantity: u64) -> Box<dyn FnOnce(&WorkOrderState) -> WorkOrderState + Send> {
        Box::new(move |wo: &WorkOrderState| WorkOrderState {
            planned_quantity: quantity,
            ..wo.clone()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_delivered_once_per_eligible_subscriber() {
        let plant = Plant::new();
        subscribe_all(&plant).await;
        let sink = Arc::new(CollectingSink::new());
        let router = plant.container.spawn_router(sink.clone());
        let orders = plant.work_orders();

        let id = orders
            .create(&plant.north_operator, Some(plant.north), work_order("WO-400"))
            .await
            .unwrap()
            .value
            .id;
        for (expected, quantity) in [(1, 300), (2, 320)] {
            tokio::time::sleep(Duration::from_millis(100)).await;
            orders
                .update(&plant.north_operator, Change::update(id, expected), planned(quantity))
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(sink.deliveries().is_empty());

        tokio::time::sleep(Duration::from_millis(300)).await;
        let deliveries = by_subscriber(sink.take());
        let names: Vec<&str> = deliveries.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["hq", "north"]);

        for (name, delivery) in &deliveries {
            let event = delivery.event.as_ref().unwrap();
            assert_eq!(event.version, 3);
            assert_eq!(event.action, AuditAction::Update);
            assert!(delivery.keys.contains(&InvalidationKey::List {
                entity_type: EntityType::WorkOrder,
                partition_id: Some(plant.north),
            }));
            assert!(delivery.keys.contains(&InvalidationKey::Detail {
                entity_type: EntityType::WorkOrder,
                entity_id: id,
            }));
            let audit_key = InvalidationKey::AuditTrail {
                entity_type: EntityType::WorkOrder,
                entity_id: id,
            };
            assert_eq!(delivery.keys.contains(&audit_key), name == "hq");
        }

        let stats = router.shutdown().await.unwrap();
        assert_eq!(stats.events_received, 3);
        assert_eq!(stats.batches_routed, 1);
        assert_eq!(stats.deliveries, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_approval_invalidates_queue() {
        let plant = Plant::new();
        subscribe_all(&plant).await;
        let sink = Arc::new(CollectingSink::new());
        let router = plant.container.spawn_router(sink.clone());
        let orders = plant.work_orders();

        let id = orders
            .create(&plant.south_operator, Some(plant.south), work_order("WO-401"))
            .await
            .unwrap()
            .value
            .id;
        tokio::time::sleep(Duration::from_millis(600)).await;
        sink.take();

        orders
            .update(
                &plant.admin,
                Change::approve(id, 1),
                Box::new(|wo: &WorkOrderState| WorkOrderState {
                    status: WorkOrderStatus::Approved,
                    ..wo.clone()
                }),
            )
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;

        let deliveries = by_subscriber(sink.take());
        let names: Vec<&str> = deliveries.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["hq", "south"]);
        assert!(deliveries.iter().all(|(_, d)| d
            .keys
            .contains(&InvalidationKey::ApprovalQueue {
                partition_id: Some(plant.south)
            })));
        router.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_catalog_change_reaches_everyone() {
        let plant = Plant::new();
        subscribe_all(&plant).await;
        let sink = Arc::new(CollectingSink::new());
        let router = plant.container.spawn_router(sink.clone());
        let catalog = plant
            .container
            .records(Arc::new(InMemoryVersionedStore::<SkuState>::new()));

        catalog
            .create(
                &plant.admin,
                None,
                SkuState {
                    code: "GSK-040".into(),
                    name: "Gasket 40mm".into(),
                    unit: "pcs".into(),
                    active: true,
                },
            )
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;

        let deliveries = by_subscriber(sink.take());
        let names: Vec<&str> = deliveries.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["hq", "north", "south"]);
        router.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_return_invalidates_parent_issue() {
        let plant = Plant::new();
        subscribe_all(&plant).await;
        let sink = Arc::new(CollectingSink::new());
        let router = plant.container.spawn_router(sink.clone());
        let (gateway, ledger) = (&plant.container.gateway, &plant.container.ledger);
        let actor = plant.north_operator;

        let issue_id = gateway
            .register_issue(&actor, ledger, issue(plant.north, 20))
            .await
            .unwrap()
            .value
            .id;
        gateway
            .reserve_return(
                &actor,
                ledger,
                ReturnRequest {
                    material_issue_id: issue_id,
                    quantity: 5,
                    reason_code: ReturnReason::Defective,
                    returned_by: actor.id,
                },
            )
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;

        let parent_detail = InvalidationKey::Detail {
            entity_type: EntityType::MaterialIssue,
            entity_id: issue_id,
        };
        let north_keys: Vec<InvalidationKey> = sink
            .take()
            .into_iter()
            .filter(|d| d.subscriber_id.0 == "north")
            .flat_map(|d| d.keys)
            .collect();
        assert!(north_keys.contains(&parent_detail));
        assert!(north_keys.contains(&InvalidationKey::List {
            entity_type: EntityType::MaterialReturn,
            partition_id: Some(plant.north),
        }));
        router.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_revoked_operator_stops_receiving() {
        let plant = Plant::new();
        subscribe_all(&plant).await;
        let sink = Arc::new(CollectingSink::new());
        let router = plant.container.spawn_router(sink.clone());

        assert!(plant
            .container
            .assignments()
            .deactivate(plant.north_operator.id, plant.north));
        let scope = plant.container.scopes.evaluate_scope(&plant.north_operator).await;
        assert!(!scope.can_access(&plant.north));

        plant
            .work_orders()
            .create(&plant.admin, Some(plant.north), work_order("WO-402"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;

        let deliveries = by_subscriber(sink.take());
        let names: Vec<&str> = deliveries.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["hq"]);
        router.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_overflowed_bus_resyncs_every_subscriber() {
        let config = IntegrityConfig::from_lookup(|var| {
            (var == "FI_BUS_CAPACITY").then(|| "1".to_string())
        })
        .unwrap();
        let plant = Plant::with_config(config);
        subscribe_all(&plant).await;
        let sink = Arc::new(CollectingSink::new());
        let router = plant.container.spawn_router(sink.clone());
        let orders = plant.work_orders();

        // Nothing yields between the commits, so the router sees only the last.
        let mut last = None;
        for number in ["WO-410", "WO-411", "WO-412"] {
            let created = orders
                .create(&plant.north_operator, Some(plant.north), work_order(number))
                .await
                .unwrap();
            last = Some(created.value.id);
        }
        tokio::time::sleep(Duration::from_millis(600)).await;

        let deliveries = by_subscriber(sink.take());
        let resynced: Vec<&str> = deliveries
            .iter()
            .filter(|(_, d)| d.keys == vec![InvalidationKey::Resync])
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(resynced, vec!["hq", "north", "south"]);
        assert!(deliveries
            .iter()
            .filter_map(|(_, d)| d.event.as_ref())
            .all(|e| Some(e.entity_id) == last));

        let stats = router.shutdown().await.unwrap();
        assert_eq!(stats.events_lagged, 2);
        assert_eq!(stats.resyncs, 1);
    }
}
