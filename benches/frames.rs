//! Criterion benchmarks for per-frame work.
//!
//! Run with:
//!   cargo bench
//!
//! Results are saved to target/criterion/

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use ambient::kind::{Dimensions, WidgetKind};
use ambient::registry::WidgetRegistry;
use ambient::render::{render, RenderCache};
use ambient::resolver::SimConfig;
use ambient::sims::StepParams;
use ambient::state::SimulationState;

const SIZES: [(f32, f32); 3] = [(320.0, 240.0), (800.0, 600.0), (1920.0, 1080.0)];

/// One `advance` of every kind at a few container sizes.
fn bench_advance(c: &mut Criterion) {
    let mut group = c.benchmark_group("advance");
    let params = StepParams::default();

    for kind in WidgetKind::ALL {
        for (w, h) in SIZES {
            let dims = Dimensions::new(w, h);
            let label = format!("{}x{}", w as u32, h as u32);
            group.bench_with_input(BenchmarkId::new(kind.key(), &label), &dims, |b, dims| {
                let mut state = SimulationState::init(kind, dims, 42);
                b.iter(|| black_box(state.advance(1, &params)));
            });
        }
    }

    group.finish();
}

/// Building draw primitives, including the donut projection.
fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let params = StepParams::default();
    let dims = Dimensions::new(800.0, 600.0);

    for kind in WidgetKind::ALL {
        group.bench_function(kind.key(), |b| {
            let mut state = SimulationState::init(kind, &dims, 7);
            for _ in 0..120 {
                state.advance(1, &params);
            }
            let mut cache = RenderCache::new();
            b.iter(|| black_box(render(&state, &dims, &params, &mut cache).len()));
        });
    }

    group.finish();
}

/// A full clock tick across a crowded registry.
fn bench_registry_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry_tick");

    for copies in [1usize, 4, 16] {
        group.throughput(Throughput::Elements((copies * WidgetKind::ALL.len()) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(copies), &copies, |b, &copies| {
            let mut reg = WidgetRegistry::with_seed(42);
            for kind in WidgetKind::ALL {
                for _ in 0..copies {
                    reg.duplicate(kind, &SimConfig::default());
                }
            }
            reg.start();
            b.iter(|| black_box(reg.tick(Duration::from_millis(16))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_advance, bench_render, bench_registry_tick);
criterion_main!(benches);
