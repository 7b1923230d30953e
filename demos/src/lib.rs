//! # Origin Demos
//!
//! Headless physics scenes used by the `physics_demo` binary.
//!
//! Each scene spawns entities with [`RigidBody`] + [`Collider`] + [`Transform`]
//! descriptor components; [`PhysicsWorld`](origin_physics::PhysicsWorld)
//! creates the backend bodies when simulation starts.

use origin_core::math::{quat_from_rotation_y, Vec3};
use origin_ecs::hierarchy::set_parent;
use origin_ecs::{register_scene_components, Entity, Name, Transform, World};
use origin_physics::{register_physics_components, Collider, RigidBody};

/// Demos library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// A demo scene.
pub trait PhysicsScene: Send + Sync {
    /// Name used on the command line.
    fn name(&self) -> &str;

    /// Populates the world with physics entities.
    fn setup(&self, world: &mut World);
}

/// An empty world with every scene and physics component registered.
pub fn new_world() -> World {
    let mut world = World::new();
    register_scene_components(&mut world);
    register_physics_components(&mut world);
    world
}

fn spawn_entity(
    world: &mut World,
    name: String,
    body: RigidBody,
    collider: Collider,
    transform: Transform,
) -> Entity {
    let entity = world.spawn();
    let _ = world.insert(entity, Name::new(name));
    let _ = world.insert(entity, body);
    let _ = world.insert(entity, collider);
    let _ = world.insert(entity, transform);
    entity
}

fn spawn_ground(world: &mut World) -> Entity {
    spawn_entity(
        world,
        "ground".into(),
        RigidBody::fixed(),
        Collider::cuboid(Vec3::new(40.0, 0.2, 40.0)).with_restitution(0.3),
        Transform::identity(),
    )
}

// ---------------------------------------------------------------------------
// Balls: ground plane + many falling spheres
// ---------------------------------------------------------------------------

pub struct BallsScene;

impl PhysicsScene for BallsScene {
    fn name(&self) -> &str {
        "balls"
    }

    fn setup(&self, world: &mut World) {
        spawn_ground(world);

        let cols = 8;
        let rows = 8;
        for i in 0..cols {
            for j in 0..rows {
                let x = (i as f32 - cols as f32 / 2.0) * 1.2;
                let z = (j as f32 - rows as f32 / 2.0) * 1.2;
                let y = 5.0 + (i * rows + j) as f32 * 0.5;
                spawn_entity(
                    world,
                    format!("ball {i}x{j}"),
                    RigidBody::dynamic(),
                    Collider::sphere(0.5).with_restitution(0.7),
                    Transform::from_xyz(x, y, z),
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Stacking: pyramid of boxes
// ---------------------------------------------------------------------------

pub struct StackingScene;

impl PhysicsScene for StackingScene {
    fn name(&self) -> &str {
        "stacking"
    }

    fn setup(&self, world: &mut World) {
        spawn_ground(world);

        let layers = 10;
        let size = 1.0f32;
        let gap = 0.05f32;
        let step = size + gap;
        for layer in 0..layers {
            let count = layers - layer;
            let offset = count as f32 * step / 2.0 - step / 2.0;
            let y = 0.1 + size / 2.0 + layer as f32 * step;
            for i in 0..count {
                spawn_entity(
                    world,
                    format!("box {layer}.{i}"),
                    RigidBody::dynamic().with_mass(2.0),
                    Collider::cuboid(Vec3::repeat(size)).with_restitution(0.0),
                    Transform::from_xyz(i as f32 * step - offset, y, 0.0),
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Hierarchy: simulated bodies nested under a rotated, scaled anchor
// ---------------------------------------------------------------------------

pub struct HierarchyScene;

impl PhysicsScene for HierarchyScene {
    fn name(&self) -> &str {
        "hierarchy"
    }

    fn setup(&self, world: &mut World) {
        spawn_ground(world);

        let anchor = world.spawn();
        let _ = world.insert(anchor, Name::new("anchor"));
        let _ = world.insert(
            anchor,
            Transform::from_xyz(0.0, 4.0, 0.0)
                .with_rotation(quat_from_rotation_y(0.6))
                .with_scale(Vec3::repeat(1.5)),
        );

        for i in 0..4 {
            let capsule = spawn_entity(
                world,
                format!("capsule {i}"),
                RigidBody::dynamic(),
                Collider::capsule(0.5, 0.25),
                Transform::from_xyz(i as f32 - 1.5, i as f32, 0.0),
            );
            let _ = set_parent(world, capsule, anchor);

            // Visual attachment that rides along with its capsule.
            let marker = world.spawn();
            let _ = world.insert(marker, Name::new(format!("marker {i}")));
            let _ = world.insert(marker, Transform::from_xyz(0.0, 1.0, 0.0));
            let _ = set_parent(world, marker, capsule);
        }
    }
}

/// Every available scene.
pub fn scenes() -> Vec<Box<dyn PhysicsScene>> {
    vec![
        Box::new(BallsScene),
        Box::new(StackingScene),
        Box::new(HierarchyScene),
    ]
}

pub fn find_scene(name: &str) -> Option<Box<dyn PhysicsScene>> {
    scenes().into_iter().find(|s| s.name() == name)
}
