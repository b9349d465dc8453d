//! # View Benchmark
//!
//! Cached snapshots versus lazy iteration.
//!
//! Run with: `cargo bench --package strata_core --bench view_benchmark`

// Benchmarks don't need docs and may have intentionally unused code
#![allow(missing_docs)]
#![allow(dead_code)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use strata_core::{Component, World};

#[derive(Clone, Copy, Debug, Default)]
struct Position(f32, f32);
impl Component for Position {}

#[derive(Clone, Copy, Debug, Default)]
struct Velocity(f32, f32);
impl Component for Velocity {}

#[derive(Clone, Copy, Debug, Default)]
struct Frozen;
impl Component for Frozen {}

const ENTITY_COUNT: usize = 100_000;

/// Three archetypes, one of which lacks velocity.
fn populated_world() -> World {
    let mut world = World::new();
    for i in 0..ENTITY_COUNT {
        match i % 3 {
            0 => world.create_entity((Position::default(), Velocity(1.0, 1.0))),
            1 => world.create_entity((Position::default(), Velocity(1.0, 1.0), Frozen)),
            _ => world.create_entity((Position::default(),)),
        };
    }
    world
}

/// Benchmark: Repeated view at an unchanged version.
fn bench_view_cache_hit(c: &mut Criterion) {
    let world = populated_world();
    world.view::<(&Position, &Velocity)>().unwrap();

    c.bench_function("view_cache_hit", |b| {
        b.iter(|| black_box(world.view::<(&Position, &Velocity)>().unwrap().len()));
    });
}

/// Benchmark: View rebuilt after every change.
fn bench_view_cache_miss(c: &mut Criterion) {
    let mut world = populated_world();
    let target = world.create_entity((Position::default(),));

    c.bench_function("view_cache_miss", |b| {
        b.iter(|| {
            world.add_component(target, Position(1.0, 1.0)).unwrap();
            black_box(world.view::<(&Position, &Velocity)>().unwrap().len())
        });
    });
}

/// Benchmark: Lazy iteration, no cloning.
fn bench_iter_view(c: &mut Criterion) {
    let world = populated_world();

    c.bench_function("iter_view", |b| {
        b.iter(|| {
            let mut sum = 0.0f32;
            for (_, (position, velocity)) in world.iter_view::<(&Position, &Velocity)>().unwrap() {
                sum += position.0 + velocity.0;
            }
            black_box(sum)
        });
    });
}

criterion_group!(benches, bench_view_cache_hit, bench_view_cache_miss, bench_iter_view);

criterion_main!(benches);
