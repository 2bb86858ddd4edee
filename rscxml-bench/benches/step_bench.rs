//! Kernel benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rscxml_bench::{chain_chart, parallel_chart};
use rscxml_compiler::compile;
use rscxml_sim::{Event, Simulation};

const STEPS: usize = 1024;

fn bench_chain_events(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_chain");
    for n in [8usize, 64] {
        let table = compile(&chain_chart(n)).unwrap();
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &table, |b, table| {
            b.iter(|| {
                let mut sim = Simulation::new(table.clone());
                sim.run_to_quiescence(STEPS).unwrap();
                // One full lap around the chain.
                for _ in 0..n {
                    sim.apply(Event::new("step"), STEPS).unwrap();
                }
                black_box(sim.active_names())
            })
        });
    }
    group.finish();
}

fn bench_parallel_broadcast(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_parallel");
    for (regions, per_region) in [(2usize, 4usize), (8, 8)] {
        let table = compile(&parallel_chart(regions, per_region)).unwrap();
        let id = format!("{}x{}", regions, per_region);
        group.throughput(Throughput::Elements(regions as u64));
        group.bench_with_input(BenchmarkId::from_parameter(id), &table, |b, table| {
            b.iter(|| {
                let mut sim = Simulation::new(table.clone());
                sim.run_to_quiescence(STEPS).unwrap();
                for _ in 0..8 {
                    sim.apply(Event::new("step"), STEPS).unwrap();
                }
                black_box(sim.ctx().config.count())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_chain_events, bench_parallel_broadcast);
criterion_main!(benches);
