//! Compiler benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rscxml_bench::{chain_chart, nested_chart, parallel_chart};
use rscxml_compiler::compile;

fn bench_compile_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile_chain");
    for n in [8usize, 32, 128] {
        let doc = chain_chart(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &doc, |b, doc| {
            b.iter(|| black_box(compile(doc).unwrap()))
        });
    }
    group.finish();
}

fn bench_compile_parallel(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile_parallel");
    for (regions, per_region) in [(2usize, 4usize), (4, 8), (8, 8)] {
        let doc = parallel_chart(regions, per_region);
        let id = format!("{}x{}", regions, per_region);
        group.bench_with_input(BenchmarkId::from_parameter(id), &doc, |b, doc| {
            b.iter(|| black_box(compile(doc).unwrap()))
        });
    }
    group.finish();
}

fn bench_compile_nested_histories(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile_nested");
    for depth in [3usize, 6, 12] {
        let doc = nested_chart(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &doc, |b, doc| {
            b.iter(|| black_box(compile(doc).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_compile_chain,
    bench_compile_parallel,
    bench_compile_nested_histories
);
criterion_main!(benches);
