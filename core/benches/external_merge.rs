//! External merge and comparison throughput

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tablediff_core::{compare_batches, compare_tables, CompareOptions, Key, Row, Table, Value};

fn shuffled_batches(rows: i64, batch_size: usize, seed: i64) -> Vec<Table> {
    let keys: Vec<i64> = (0..rows).map(|i| (i * 7919 + seed).rem_euclid(rows)).collect();
    keys.chunks(batch_size)
        .map(|chunk| {
            chunk
                .iter()
                .map(|&k| {
                    Row::new(
                        Key::scalar(k),
                        vec![Value::Int(k * 3), Value::Text(format!("name {k}"))],
                    )
                })
                .collect()
        })
        .collect()
}

fn benchmark_external_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("external_merge");
    group.sample_size(10);

    for &rows in &[10_000i64, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, &rows| {
            b.iter(|| {
                let left = shuffled_batches(rows, 4096, 1);
                let right = shuffled_batches(rows, 4096, 2);
                let summary = compare_batches(left, right, &CompareOptions::default())
                    .unwrap()
                    .summarize()
                    .unwrap();
                black_box(summary);
            })
        });
    }
    group.finish();
}

fn benchmark_in_memory_compare(c: &mut Criterion) {
    let left: Table = shuffled_batches(100_000, 100_000, 1).remove(0);
    let right: Table = shuffled_batches(100_000, 100_000, 5).remove(0);

    c.bench_function("in_memory_compare_100k", |b| {
        b.iter(|| {
            let summary = compare_tables(left.clone(), right.clone(), &CompareOptions::default())
                .unwrap()
                .summarize()
                .unwrap();
            black_box(summary);
        })
    });
}

criterion_group!(benches, benchmark_external_merge, benchmark_in_memory_compare);
criterion_main!(benches);
