//! Benchmarks for prompt scoring and decisions.
//!
//! Run with: cargo bench -p prism-core

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use prism_core::{CategorySchema, Classifier, EmbeddingStore};

const DIM: usize = 512;

/// Deterministic pseudo-random vector (xorshift), so runs are comparable.
fn vector(seed: u64) -> Vec<f32> {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
    (0..DIM)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state % 2000) as f32 / 1000.0 - 1.0
        })
        .collect()
}

fn builtin_classifier() -> Classifier {
    let schema = CategorySchema::builtin();
    let store = EmbeddingStore::from_vectors(
        schema
            .referenced_prompts()
            .into_iter()
            .enumerate()
            .map(|(i, text)| (text.to_string(), vector(i as u64 + 1))),
    )
    .expect("synthetic vectors are non-degenerate");
    Classifier::new(schema, Arc::new(store)).expect("store covers the builtin schema")
}

fn benchmark_classify(c: &mut Criterion) {
    let classifier = builtin_classifier();
    let image = vector(9_999);

    c.bench_function("classify_clothing_season", |b| {
        b.iter(|| classifier.classify(black_box(&image), "clothing-season"))
    });

    c.bench_function("classify_all_builtin", |b| {
        b.iter(|| classifier.classify_all(black_box(&image)))
    });
}

fn benchmark_store_serialize(c: &mut Criterion) {
    let classifier = builtin_classifier();
    let store = classifier.store();

    c.bench_function("store_to_json", |b| b.iter(|| black_box(store).to_json_string()));

    let json = store.to_json_string();
    c.bench_function("store_from_json", |b| {
        b.iter(|| EmbeddingStore::from_json_str(black_box(&json), Some(DIM)))
    });
}

criterion_group!(benches, benchmark_classify, benchmark_store_serialize);
criterion_main!(benches);
