//! Shared fixtures for the physics integration tests.

#![allow(dead_code)]

use origin_core::math::Vec3;
use origin_ecs::{register_scene_components, Entity, GlobalTransform, Name, Transform, World};
use origin_physics::{
    register_physics_components, BackendKind, Collider, PhysicsConfig, PhysicsWorld, RigidBody,
};

/// One 60 Hz frame.
pub const DT: f32 = 1.0 / 60.0;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn config() -> PhysicsConfig {
    PhysicsConfig {
        worker_threads: 2,
        ..PhysicsConfig::default()
    }
}

pub fn scene() -> World {
    let mut world = World::new();
    register_scene_components(&mut world);
    register_physics_components(&mut world);
    world
}

/// An initialized (not yet simulating) physics world plus an empty scene.
pub fn setup(kind: BackendKind) -> (PhysicsWorld, World) {
    setup_with(kind, config())
}

pub fn setup_with(kind: BackendKind, config: PhysicsConfig) -> (PhysicsWorld, World) {
    init_logging();
    let mut physics = PhysicsWorld::new(config);
    physics.init(kind).expect("backend init");
    (physics, scene())
}

pub fn spawn(
    world: &mut World,
    name: &str,
    transform: Transform,
    body: Option<RigidBody>,
    collider: Option<Collider>,
) -> Entity {
    let e = world.spawn();
    world.insert(e, Name::new(name)).unwrap();
    world.insert(e, transform).unwrap();
    if let Some(body) = body {
        world.insert(e, body).unwrap();
    }
    if let Some(collider) = collider {
        world.insert(e, collider).unwrap();
    }
    e
}

/// Static 10 x 1 x 10 slab whose top face is at y = 0.5.
pub fn spawn_ground(world: &mut World) -> Entity {
    spawn(
        world,
        "ground",
        Transform::identity(),
        Some(RigidBody::fixed()),
        Some(Collider::cuboid(Vec3::new(10.0, 1.0, 10.0)).with_restitution(0.0)),
    )
}

pub fn run(physics: &mut PhysicsWorld, world: &mut World, frames: usize) {
    for _ in 0..frames {
        physics.simulate(world, DT).expect("simulate");
    }
}

pub fn global(world: &World, e: Entity) -> GlobalTransform {
    *world.get::<GlobalTransform>(e).expect("global transform")
}

pub fn assert_vec_close(a: Vec3, b: Vec3, eps: f32) {
    assert!((a - b).norm() < eps, "{a:?} vs {b:?} (eps {eps})");
}
