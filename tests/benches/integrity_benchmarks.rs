//! # Foundry Integrity Benchmarks
//!
//! | Subsystem | Operation | Target |
//! |-----------|-----------|--------|
//! | fi-04 Audit Chain | append (in-memory) | < 50µs |
//! | fi-04 Audit Chain | verify 1k records | < 20ms |
//! | fi-03 Material Ledger | availability over 1k rows | < 100µs |
//! | fi-05 Invalidation Router | debounce 10k events | < 10ms |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fi_03_material_ledger::Availability;
use fi_04_audit_chain::{
    verify_records, AuditChainService, AuditMutation, AuditRecord, AuditStore, InMemoryAuditStore,
};
use fi_05_invalidation_router::Debouncer;
use shared_bus::InvalidationEvent;
use shared_types::{
    ActorId, AuditAction, EntityId, EntityType, LotId, ManualClock, MaterialIssue, MaterialReturn,
    PartitionId, RecordState, ReturnReason, WorkOrderState, WorkOrderStatus, GENESIS_HASH,
};
use std::time::Duration;

fn mutation(n: u64) -> AuditMutation {
    AuditMutation {
        entity_type: EntityType::WorkOrder,
        entity_id: EntityId::new(),
        action: AuditAction::Update,
        partition_id: Some(PartitionId::new()),
        actor_id: ActorId::new(),
        before_state: None,
        after_state: Some(RecordState::WorkOrder(WorkOrderState {
            number: format!("WO-{n}"),
            sku_code: "HSG-1180".into(),
            planned_quantity: n,
            status: WorkOrderStatus::InProgress,
        })),
        reason: None,
    }
}

fn bench_audit_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("fi-04-audit-chain");
    group.measurement_time(Duration::from_secs(5));
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();

    let service = AuditChainService::new(InMemoryAuditStore::new(), ManualClock::starting_at(0));
    let mut n = 0;
    group.bench_function("append", |b| {
        b.iter(|| {
            n += 1;
            runtime.block_on(service.append(black_box(mutation(n)))).unwrap()
        })
    });

    for len in [100u64, 1_000] {
        let mut previous = GENESIS_HASH;
        let records: Vec<AuditRecord> = (1..=len)
            .map(|seq| {
                let record = AuditRecord::seal(mutation(seq), seq, previous, seq).unwrap();
                previous = record.record_hash;
                record
            })
            .collect();

        group.throughput(Throughput::Elements(len));
        group.bench_with_input(BenchmarkId::new("verify", len), &records, |b, records| {
            b.iter(|| verify_records(black_box(records), GENESIS_HASH, 1))
        });
    }

    let store_len = runtime.block_on(service.store().len()).unwrap();
    black_box(store_len);
    group.finish();
}

fn bench_availability(c: &mut Criterion) {
    let mut group = c.benchmark_group("fi-03-material-ledger");
    let issue = MaterialIssue {
        id: EntityId::new(),
        lot_id: LotId::new(),
        partition_id: PartitionId::new(),
        work_order_id: None,
        issued_quantity: 1_000_000,
        created_at: 0,
    };
    let returns: Vec<MaterialReturn> = (0..1_000)
        .map(|n| MaterialReturn {
            id: EntityId::new(),
            material_issue_id: issue.id,
            returned_quantity: 7,
            reason_code: ReturnReason::Excess,
            returned_by: ActorId::new(),
            created_at: n,
        })
        .collect();

    group.bench_function("availability_1k_returns", |b| {
        b.iter(|| Availability::compute(black_box(&issue), black_box(&returns), &[]).unwrap())
    });
    group.finish();
}

fn bench_debounce(c: &mut Criterion) {
    let mut group = c.benchmark_group("fi-05-invalidation-router");
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    let partition = PartitionId::new();
    let entities: Vec<EntityId> = (0..100).map(|_| EntityId::new()).collect();
    let events: Vec<InvalidationEvent> = (0..10_000u64)
        .map(|n| InvalidationEvent {
            entity_type: EntityType::WorkOrder,
            entity_id: entities[(n % 100) as usize],
            partition_id: Some(partition),
            action: AuditAction::Update,
            changed_fields: vec!["planned_quantity".into()],
            version: n + 1,
            timestamp: n,
            parent: None,
        })
        .collect();

    group.throughput(Throughput::Elements(events.len() as u64));
    group.bench_function("push_10k_into_100_slots", |b| {
        b.iter(|| {
            let _guard = runtime.enter();
            let now = tokio::time::Instant::now();
            let mut debouncer = Debouncer::default();
            for event in &events {
                debouncer.push(event.clone(), now);
            }
            black_box(debouncer.flush_all())
        })
    });
    group.finish();
}

criterion_group!(benches, bench_audit_chain, bench_availability, bench_debounce);
criterion_main!(benches);
