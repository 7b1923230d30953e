use criterion::{black_box, criterion_group, criterion_main, Criterion};

use origin_core::math::Vec3;
use origin_ecs::{register_scene_components, Transform, World};
use origin_physics::{
    register_physics_components, BackendKind, Collider, PhysicsConfig, PhysicsWorld, RigidBody,
};

const DT: f32 = 1.0 / 60.0;

/// A ground slab with a 5 x 4 x 5 pile of spheres above it.
fn build_pile() -> World {
    let mut world = World::new();
    register_scene_components(&mut world);
    register_physics_components(&mut world);

    let ground = world.spawn();
    world.insert(ground, Transform::identity()).unwrap();
    world.insert(ground, RigidBody::fixed()).unwrap();
    world
        .insert(ground, Collider::cuboid(Vec3::new(20.0, 1.0, 20.0)))
        .unwrap();

    for x in 0..5 {
        for y in 0..4 {
            for z in 0..5 {
                let ball = world.spawn();
                let position = Vec3::new(x as f32 * 1.1, 1.0 + y as f32 * 1.1, z as f32 * 1.1);
                world.insert(ball, Transform::from_translation(position)).unwrap();
                world.insert(ball, RigidBody::dynamic()).unwrap();
                world.insert(ball, Collider::sphere(0.5)).unwrap();
            }
        }
    }
    world
}

fn bench_sphere_pile(c: &mut Criterion) {
    let mut group = c.benchmark_group("sphere_pile_100");
    for kind in [BackendKind::Rapier, BackendKind::Impulse] {
        let mut world = build_pile();
        let mut physics = PhysicsWorld::new(PhysicsConfig::default());
        physics.init(kind).unwrap();
        physics.on_simulation_start(&mut world).unwrap();

        group.bench_function(kind.to_string(), |b| {
            b.iter(|| physics.simulate(black_box(&mut world), DT).unwrap())
        });

        physics.on_simulation_stop(&mut world).unwrap();
        physics.shutdown().unwrap();
    }
    group.finish();
}

criterion_group!(benches, bench_sphere_pile);
criterion_main!(benches);
