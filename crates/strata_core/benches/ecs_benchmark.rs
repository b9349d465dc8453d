//! # ECS Performance Benchmark
//!
//! Entity churn and archetype migration.
//!
//! Run with: `cargo bench --package strata_core --bench ecs_benchmark`

// Benchmarks don't need docs and may have intentionally unused code
#![allow(missing_docs)]
#![allow(dead_code)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use strata_core::{Component, Entity, World, WorldConfig};

#[derive(Clone, Copy, Debug, Default)]
struct Position {
    x: f32,
    y: f32,
    z: f32,
}
impl Component for Position {}

#[derive(Clone, Copy, Debug, Default)]
struct Velocity {
    x: f32,
    y: f32,
    z: f32,
}
impl Component for Velocity {}

#[derive(Clone, Copy, Debug, Default)]
struct Health(u32);
impl Component for Health {}

fn sized_world(count: usize) -> World {
    World::with_config(WorldConfig {
        entity_capacity: count,
        archetype_capacity: count,
        ..WorldConfig::default()
    })
}

/// Benchmark: Create entities with two components.
fn bench_create_entities(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_entities");

    for count in [1_000, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut world = sized_world(count);
                for _ in 0..count {
                    black_box(world.create_entity((Position::default(), Velocity::default())));
                }
                world.entity_count()
            });
        });
    }

    group.finish();
}

/// Benchmark: Destroy and recreate, exercising the free list.
fn bench_create_destroy_cycle(c: &mut Criterion) {
    const COUNT: usize = 10_000;
    let mut world = sized_world(COUNT);
    let mut entities: Vec<Entity> = (0..COUNT)
        .map(|_| world.create_entity((Position::default(),)))
        .collect();

    c.bench_function("create_destroy_cycle_10k", |b| {
        b.iter(|| {
            for entity in &mut entities {
                world.destroy_entity(*entity).unwrap();
                *entity = world.create_entity((Position::default(),));
            }
            black_box(world.entity_count())
        });
    });
}

/// Benchmark: Add then remove a component, migrating every row twice.
fn bench_migration_round_trip(c: &mut Criterion) {
    const COUNT: usize = 10_000;
    let mut world = sized_world(COUNT);
    let entities: Vec<Entity> = (0..COUNT)
        .map(|_| world.create_entity((Position::default(), Velocity::default())))
        .collect();

    c.bench_function("migration_round_trip_10k", |b| {
        b.iter(|| {
            for entity in &entities {
                world.add_component(*entity, Health(100)).unwrap();
            }
            for entity in &entities {
                black_box(world.remove_component::<Health>(*entity).unwrap());
            }
        });
    });
}

/// Benchmark: Random-order component reads through handles.
fn bench_component_access(c: &mut Criterion) {
    const COUNT: usize = 100_000;
    let mut world = sized_world(COUNT);
    let entities: Vec<Entity> = (0..COUNT)
        .map(|_| world.create_entity((Position::default(), Health(1))))
        .collect();

    c.bench_function("get_component_100k", |b| {
        b.iter(|| {
            let mut total = 0u64;
            for entity in entities.iter().rev().step_by(7) {
                total += u64::from(world.get_component::<Health>(*entity).unwrap().0);
            }
            black_box(total)
        });
    });
}

/// Benchmark: Mutable iteration over one column.
fn bench_iter_view_mut(c: &mut Criterion) {
    const COUNT: usize = 100_000;
    let mut world = sized_world(COUNT);
    for _ in 0..COUNT {
        world.create_entity((Position::default(), Velocity { x: 0.1, y: 0.2, z: 0.3 }));
    }

    c.bench_function("iter_view_mut_100k", |b| {
        b.iter(|| {
            for (_, position) in world.iter_view_mut::<Position>() {
                position.x += 0.016;
                position.y += 0.016;
                position.z += 0.016;
            }
        });
    });
}

criterion_group!(
    benches,
    bench_create_entities,
    bench_create_destroy_cycle,
    bench_migration_round_trip,
    bench_component_access,
    bench_iter_view_mut,
);

criterion_main!(benches);
