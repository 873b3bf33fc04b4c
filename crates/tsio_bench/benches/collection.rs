//! Entity collection benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tsio_bench::generate_entities;
use tsio_core::EntityCollection;

/// Benchmark adding entities one by one.
fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("collection_add");

    for count in [100, 1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let entities = generate_entities(count, 0);
            b.iter(|| {
                let mut collection = EntityCollection::with_capacity(count);
                for entity in &entities {
                    collection.add(entity);
                }
                black_box(collection);
            });
        });
    }
    group.finish();
}

/// Benchmark removing from the front, which renumbers every later position.
fn bench_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("collection_remove");

    for count in [100, 1_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let entities = generate_entities(count, 0);
            b.iter(|| {
                let mut collection = entities.copy();
                for name in entities.names() {
                    collection.remove(black_box(&name));
                }
                black_box(collection);
            });
        });
    }
    group.finish();
}

/// Benchmark name lookups.
fn bench_lookup(c: &mut Criterion) {
    let entities = generate_entities(10_000, 0);
    let names = entities.names();

    c.bench_function("collection_lookup_10000", |b| {
        b.iter(|| {
            for name in &names {
                black_box(entities.get(name).ok());
            }
        });
    });
}

criterion_group!(benches, bench_add, bench_remove, bench_lookup);
criterion_main!(benches);
