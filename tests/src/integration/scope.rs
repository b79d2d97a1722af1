//! # Partition Scope Flows
//!
//! Writes outside an actor's partitions are refused; reads outside them come
//! back empty. Assignments can change while the system runs.

#[cfg(test)]
mod tests {
    use super::super::support::{work_order, Plant};
    use fi_01_access_scope::{GlobalRoles, ScopeEvaluator};
    use fi_02_optimistic_concurrency::InMemoryVersionedStore;
    use fi_04_audit_chain::AuditStore;
    use integrity_runtime::{AuditedRecords, Change, ErrorKind, IntegrityConfig};
    use shared_types::{Actor, ActorId, EntityType, Role, SkuState, WorkOrderState};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_write_outside_assignment_denied() {
        let plant = Plant::new();
        let orders = plant.work_orders();

        let err = orders
            .create(&plant.north_operator, Some(plant.south), work_order("WO-300"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ScopeDenied);
        assert_eq!(plant.audit_store().len().await.unwrap(), 0);

        let south_order = orders
            .create(&plant.south_operator, Some(plant.south), work_order("WO-301"))
            .await
            .unwrap();
        let err = orders
            .update(
                &plant.north_operator,
                Change::reject(south_order.value.id, 1, "not ours"),
                Box::new(|wo: &WorkOrderState| wo.clone()),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ScopeDenied);
    }

    #[tokio::test]
    async fn test_reads_outside_scope_are_empty() {
        let plant = Plant::new();
        let orders = plant.work_orders();
        let south_order = orders
            .create(&plant.south_operator, Some(plant.south), work_order("WO-302"))
            .await
            .unwrap();
        let id = south_order.value.id;

        assert!(orders.get(&plant.north_operator, id).await.unwrap().is_none());
        assert!(orders.trail(&plant.north_operator, id, None).await.unwrap().is_empty());

        assert!(orders.get(&plant.admin, id).await.unwrap().is_some());
        assert_eq!(orders.trail(&plant.south_operator, id, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_deactivated_assignment_takes_effect_immediately() {
        let plant = Plant::new();
        let orders = plant.work_orders();
        let actor = plant.north_operator;
        let id = orders
            .create(&actor, Some(plant.north), work_order("WO-303"))
            .await
            .unwrap()
            .value
            .id;

        assert!(plant.container.assignments().deactivate(actor.id, plant.north));
        let scope = plant.container.scopes.evaluate_scope(&actor).await;
        assert!(!scope.is_global);
        assert!(scope.partitions.is_empty());

        let err = orders
            .update(&actor, Change::update(id, 1), Box::new(|wo: &WorkOrderState| wo.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ScopeDenied);

        plant.container.assignments().assign(actor.id, plant.north);
        orders
            .update(&actor, Change::update(id, 1), Box::new(|wo: &WorkOrderState| wo.clone()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_configured_global_roles() {
        let mut config = IntegrityConfig::default();
        config.scope.global_roles = vec![Role::SuperAdmin, Role::Auditor];
        let plant = Plant::with_config(config);

        let auditor = Actor::new(ActorId::new(), Role::Auditor);
        assert!(plant.container.scopes.evaluate_scope(&auditor).await.is_global);
        assert_eq!(
            plant.container.scopes.global_roles(),
            &GlobalRoles::new([Role::SuperAdmin, Role::Auditor])
        );

        // Admin is no longer global and has no assignments.
        let err = plant
            .work_orders()
            .create(&plant.admin, Some(plant.north), work_order("WO-304"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ScopeDenied);
    }

    #[tokio::test]
    async fn test_shared_catalog_is_unpartitioned() {
        let plant = Plant::new();
        let catalog = plant
            .container
            .records(Arc::new(InMemoryVersionedStore::<SkuState>::new()));
        let sku = || SkuState {
            code: "HSG-1180".into(),
            name: "Housing, cast".into(),
            unit: "pcs".into(),
            active: true,
        };

        let err = catalog
            .create(&plant.admin, Some(plant.north), sku())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);

        let created = catalog.create(&plant.north_operator, None, sku()).await.unwrap();
        assert_eq!(created.audit.entity_type, EntityType::Sku);
        assert_eq!(created.audit.partition_id, None);
        assert!(catalog
            .get(&plant.south_operator, created.value.id)
            .await
            .unwrap()
            .is_some());
    }
}
