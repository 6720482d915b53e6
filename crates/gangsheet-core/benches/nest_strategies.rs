use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use gangsheet_core::prelude::*;
use gangsheet_core::sizing::expand_units;
use gangsheet_core::pack_units;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn generate_designs(count: usize, min_in: f64, max_in: f64) -> Vec<ManagedImage> {
    let mut rng = StdRng::seed_from_u64(count as u64);
    (0..count)
        .map(|i| {
            let w = rng.gen_range(min_in..max_in);
            let h = rng.gen_range(min_in..max_in);
            ManagedImage::new(format!("design_{}", i), w, h, 1)
        })
        .collect()
}

fn bench_methods(c: &mut Criterion) {
    let mut group = c.benchmark_group("packing_methods");
    let methods = [
        PackingMethod::Skyline,
        PackingMethod::Column,
        PackingMethod::MaxRects(MaxRectsHeuristic::BestShortSideFit),
        PackingMethod::MaxRects(MaxRectsHeuristic::ContactPoint),
    ];

    for count in [50, 100, 200] {
        let designs = generate_designs(count, 1.5, 8.0);
        let mut units = expand_units(&designs);
        SortStrategy::AreaDesc.sort(&mut units);
        group.throughput(Throughput::Elements(count as u64));

        for method in methods {
            group.bench_with_input(
                BenchmarkId::new(method.to_string(), count),
                &units,
                |b, units| {
                    b.iter(|| {
                        let layout = pack_units(method, units, 13.0, 0.125, &|u| u.width != u.height);
                        black_box(layout)
                    });
                },
            );
        }
    }
    group.finish();
}

fn bench_orchestrator(c: &mut Criterion) {
    let mut group = c.benchmark_group("nest");
    group.sample_size(20);
    let cfg = NestConfig::default();

    for count in [50, 100, 200] {
        let designs = generate_designs(count, 1.5, 8.0);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("default", count), &designs, |b, designs| {
            b.iter(|| black_box(nest(designs, &cfg)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_methods, bench_orchestrator);
criterion_main!(benches);
