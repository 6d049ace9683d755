//! Benchmarks for CRDT merges and synchronization

use agentmesh_crdt::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn agent(name: &str) -> CrdtSynchronizer {
    CrdtSynchronizer::new(SynchronizerConfig::new(name)).unwrap()
}

fn set_replica(name: &str, size: usize) -> Crdt {
    let mut sync = agent(name);
    sync.create_crdt("tags", CrdtType::OrSet, None).unwrap();
    for i in 0..size {
        sync.add("tags", Payload::Int(i as i64)).unwrap();
    }
    sync.get_crdt("tags").cloned().unwrap()
}

// Local mutation throughput
fn bench_local_increment(c: &mut Criterion) {
    let mut group = c.benchmark_group("local_increment");

    for size in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::new("g_counter", size), size, |b, &size| {
            b.iter(|| {
                let mut sync = agent("a1");
                sync.create_crdt("hits", CrdtType::GCounter, None).unwrap();
                for _ in 0..size {
                    sync.increment("hits", 1).unwrap();
                }
                black_box(sync.value("hits"))
            });
        });
    }

    group.finish();
}

fn bench_or_set_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("or_set_merge");

    for size in [100, 1000].iter() {
        let left = set_replica("a1", *size);
        let right = set_replica("a2", *size);
        group.bench_with_input(BenchmarkId::new("disjoint", size), size, |b, _| {
            b.iter(|| black_box(left.merge(&right).unwrap()));
        });
    }

    group.finish();
}

fn bench_vector_clock_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("vector_clock_compare");

    for agents in [4, 64, 512].iter() {
        let left: VectorClock = (0..*agents)
            .map(|i| (format!("agent-{}", i), i as u64 + 1))
            .collect();
        let right: VectorClock = (0..*agents)
            .map(|i| (format!("agent-{}", i), (*agents - i) as u64))
            .collect();
        group.bench_with_input(BenchmarkId::new("concurrent", agents), agents, |b, _| {
            b.iter(|| black_box(left.compare(&right)));
        });
    }

    group.finish();
}

fn bench_synchronize(c: &mut Criterion) {
    let mut group = c.benchmark_group("synchronize_with");

    for size in [100, 1000].iter() {
        let mut source = agent("a1");
        source.create_crdt("hits", CrdtType::PnCounter, None).unwrap();
        for i in 0..*size {
            if i % 3 == 0 {
                source.decrement("hits", 1).unwrap();
            } else {
                source.increment("hits", 2).unwrap();
            }
        }
        let ops = source.operations_since(&VectorClock::new());
        let vector = source.state_vector().clone();
        let source_id = source.agent_id().clone();

        group.bench_with_input(BenchmarkId::new("in_order", size), size, |b, _| {
            b.iter(|| {
                let mut target = agent("a2");
                target.create_crdt("hits", CrdtType::PnCounter, None).unwrap();
                black_box(target.synchronize_with(&source_id, ops.clone(), &vector).unwrap())
            });
        });

        let mut reversed = ops.clone();
        reversed.reverse();
        group.bench_with_input(BenchmarkId::new("reversed", size), size, |b, _| {
            b.iter(|| {
                let mut target = agent("a2");
                target.create_crdt("hits", CrdtType::PnCounter, None).unwrap();
                black_box(
                    target
                        .synchronize_with(&source_id, reversed.clone(), &vector)
                        .unwrap(),
                )
            });
        });
    }

    group.finish();
}

fn bench_wire_codec(c: &mut Criterion) {
    let mut source = agent("a1");
    source.create_crdt("tags", CrdtType::OrSet, None).unwrap();
    for i in 0..1000 {
        source.add("tags", Payload::Text(format!("tag-{}", i))).unwrap();
    }
    let ops = source.operations_since(&VectorClock::new());
    let encoded = wire::encode_batch(&ops).unwrap();

    c.bench_function("wire_encode_batch_1000", |b| {
        b.iter(|| black_box(wire::encode_batch(&ops).unwrap()))
    });
    c.bench_function("wire_decode_batch_1000", |b| {
        b.iter(|| black_box(wire::decode_batch(&encoded).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_local_increment,
    bench_or_set_merge,
    bench_vector_clock_compare,
    bench_synchronize,
    bench_wire_codec
);
criterion_main!(benches);
