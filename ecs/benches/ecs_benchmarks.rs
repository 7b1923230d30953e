use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use origin_ecs::hierarchy::set_parent;
use origin_ecs::{register_scene_components, update_global_transforms, Transform, World};

fn bench_spawn_and_despawn_recycling(c: &mut Criterion) {
    c.bench_function("spawn_despawn_1k_recycled", |b| {
        b.iter_batched(
            World::new,
            |mut world| {
                let entities: Vec<_> = (0..1_000).map(|_| world.spawn()).collect();
                for e in entities {
                    world.despawn(e);
                }
                for _ in 0..1_000 {
                    black_box(world.spawn());
                }
            },
            BatchSize::SmallInput,
        );
    });
}

/// 100 roots, each with a 10-deep chain.
fn build_forest() -> World {
    let mut world = World::new();
    register_scene_components(&mut world);
    for _ in 0..100 {
        let mut parent = world.spawn();
        world.insert(parent, Transform::from_xyz(1.0, 0.0, 0.0)).unwrap();
        for _ in 0..10 {
            let child = world.spawn();
            world.insert(child, Transform::from_xyz(0.0, 1.0, 0.0)).unwrap();
            set_parent(&mut world, child, parent).unwrap();
            parent = child;
        }
    }
    world
}

fn bench_transform_propagation(c: &mut Criterion) {
    c.bench_function("propagate_1100_entities", |b| {
        b.iter_batched(
            build_forest,
            |mut world| update_global_transforms(black_box(&mut world)),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_spawn_and_despawn_recycling,
    bench_transform_propagation
);
criterion_main!(benches);
