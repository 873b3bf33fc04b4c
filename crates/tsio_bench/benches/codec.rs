//! Document codec benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tsio_bench::generate_entities;
use tsio_codec::{decode_documents, encode_documents, Document};
use tsio_core::{entity_to_document, DocumentScope};

fn documents(count: usize, points: usize) -> Vec<Document> {
    generate_entities(count, points)
        .iter()
        .map(|entity| entity_to_document(entity, DocumentScope::Full))
        .collect()
}

/// Benchmark encoding document batches.
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_documents");

    for points in [0, 100, 1_000].iter() {
        let docs = documents(100, *points);
        group.throughput(Throughput::Elements(docs.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(points), points, |b, _| {
            b.iter(|| black_box(encode_documents(black_box(&docs)).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark decoding document batches.
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_documents");

    for points in [0, 100, 1_000].iter() {
        let bytes = encode_documents(&documents(100, *points)).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(points), points, |b, _| {
            b.iter(|| black_box(decode_documents(black_box(&bytes)).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark turning documents back into entities.
fn bench_to_entities(c: &mut Criterion) {
    let docs = documents(1_000, 30);
    c.bench_function("documents_to_entities_1000", |b| {
        b.iter(|| {
            for doc in &docs {
                black_box(tsio_core::Entity::from_document(doc.clone()).unwrap());
            }
        });
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_to_entities);
criterion_main!(benches);
