//! Sync engine benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tsio_bench::{component_tree, generate_entities};
use tsio_core::{flatten, Entity, EntityCollection, Expansion};
use tsio_store::InMemoryStore;
use tsio_sync_engine::{ReadOptions, SyncConfig, SyncEngine, WriteOptions};

/// Benchmark flattening component trees.
fn bench_expansion(c: &mut Criterion) {
    let mut group = c.benchmark_group("expansion");

    for depth in [2, 4, 6].iter() {
        let root = EntityCollection::from(component_tree("ROOT", 3, *depth));
        let expansion = Expansion::default();
        group.bench_with_input(BenchmarkId::from_parameter(depth), depth, |b, _| {
            b.iter(|| black_box(flatten(&root, &expansion)));
        });
    }
    group.finish();
}

/// Benchmark batched writes, including the split above the ceiling.
fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("write");
    group.sample_size(20);

    for count in [500, 2_500].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let entities = generate_entities(count, 30);
            b.iter(|| {
                let engine = SyncEngine::new(SyncConfig::default(), InMemoryStore::new());
                let report = engine.write(&entities, &WriteOptions::default()).unwrap();
                black_box(report);
            });
        });
    }
    group.finish();
}

/// Benchmark level-by-level reads of a stored tree.
fn bench_read(c: &mut Criterion) {
    let engine = SyncEngine::new(
        SyncConfig::default().with_touch_last_use(false),
        InMemoryStore::new(),
    );
    engine
        .write(&component_tree("ROOT", 4, 3), &WriteOptions::default())
        .unwrap();

    c.bench_function("read_tree_4x3", |b| {
        b.iter(|| {
            let root = Entity::new("ROOT");
            let report = engine.read(&root, &ReadOptions::default()).unwrap();
            black_box(report);
        });
    });
}

criterion_group!(benches, bench_expansion, bench_write, bench_read);
criterion_main!(benches);
