//! Simulation behavior tests, run against both backends.
//!
//! ```bash
//! cargo test -p origin-physics --test scenarios
//! ```

mod common;

use rstest::rstest;

use common::{assert_vec_close, global, run, setup, spawn, spawn_ground, DT};
use origin_core::math::{quat_from_rotation_y, quat_rotate_vec3, Vec3};
use origin_ecs::{hierarchy, Transform};
use origin_physics::{BackendKind, Collider, LockedAxes, RigidBody};

// ============================================================================
// Free motion
// ============================================================================

/// A sphere dropped from y = 10 is near y = 5.1 after one second.
#[rstest]
#[case::rapier(BackendKind::Rapier)]
#[case::impulse(BackendKind::Impulse)]
fn falling_sphere(#[case] kind: BackendKind) {
    let (mut physics, mut world) = setup(kind);
    let ball = spawn(
        &mut world,
        "ball",
        Transform::from_xyz(0.0, 10.0, 0.0),
        Some(RigidBody::dynamic()),
        Some(Collider::sphere(0.5)),
    );

    physics.on_simulation_start(&mut world).unwrap();
    run(&mut physics, &mut world, 60);

    let y = world.get::<Transform>(ball).unwrap().translation.y;
    assert!((4.9..5.3).contains(&y), "y = {y}");
    assert_eq!(global(&world, ball).translation.y, y);
    let vy = physics.linear_velocity(ball).unwrap().y;
    assert!((-10.0..-9.5).contains(&vy), "vy = {vy}");
    physics.on_simulation_stop(&mut world).unwrap();
}

/// Rigid bodies spawned mid-simulation are picked up on the next frame.
#[rstest]
#[case::rapier(BackendKind::Rapier)]
#[case::impulse(BackendKind::Impulse)]
fn late_spawn_is_instantiated_lazily(#[case] kind: BackendKind) {
    let (mut physics, mut world) = setup(kind);
    physics.on_simulation_start(&mut world).unwrap();
    run(&mut physics, &mut world, 5);

    let late = spawn(
        &mut world,
        "late",
        Transform::from_xyz(0.0, 10.0, 0.0),
        Some(RigidBody::dynamic()),
        Some(Collider::sphere(0.5)),
    );
    assert!(world.get::<RigidBody>(late).unwrap().handle().is_none());

    run(&mut physics, &mut world, 30);
    assert!(world.get::<RigidBody>(late).unwrap().handle().is_some());
    assert!(world.get::<Transform>(late).unwrap().translation.y < 10.0);
    physics.on_simulation_stop(&mut world).unwrap();
}

#[rstest]
#[case::rapier(BackendKind::Rapier)]
#[case::impulse(BackendKind::Impulse)]
fn pause_freezes_the_scene(#[case] kind: BackendKind) {
    let (mut physics, mut world) = setup(kind);
    let ball = spawn(
        &mut world,
        "ball",
        Transform::from_xyz(0.0, 10.0, 0.0),
        Some(RigidBody::dynamic()),
        Some(Collider::sphere(0.5)),
    );
    physics.on_simulation_start(&mut world).unwrap();

    physics.set_paused(true);
    run(&mut physics, &mut world, 30);
    assert_eq!(world.get::<Transform>(ball).unwrap().translation.y, 10.0);

    physics.set_paused(false);
    run(&mut physics, &mut world, 30);
    assert!(world.get::<Transform>(ball).unwrap().translation.y < 10.0);
    physics.on_simulation_stop(&mut world).unwrap();
}

/// Frames that skip the step still refresh world transforms.
#[rstest]
#[case::rapier(BackendKind::Rapier)]
#[case::impulse(BackendKind::Impulse)]
fn skipped_steps_still_propagate_hierarchy(#[case] kind: BackendKind) {
    let (mut physics, mut world) = setup(kind);
    let parent = spawn(&mut world, "parent", Transform::identity(), None, None);
    let child = spawn(
        &mut world,
        "child",
        Transform::from_xyz(1.0, 0.0, 0.0),
        None,
        None,
    );
    hierarchy::set_parent(&mut world, child, parent).unwrap();
    physics.on_simulation_start(&mut world).unwrap();

    physics.set_paused(true);
    world.get_mut::<Transform>(parent).unwrap().translation.y = 5.0;
    physics.simulate(&mut world, DT).unwrap();
    assert_vec_close(global(&world, child).translation, Vec3::new(1.0, 5.0, 0.0), 1e-6);

    physics.set_paused(false);
    world.get_mut::<Transform>(parent).unwrap().translation.y = 7.0;
    physics.simulate(&mut world, 0.0).unwrap();
    assert_vec_close(global(&world, child).translation, Vec3::new(1.0, 7.0, 0.0), 1e-6);
    physics.on_simulation_stop(&mut world).unwrap();
}

// ============================================================================
// Contacts
// ============================================================================

#[rstest]
#[case::rapier(BackendKind::Rapier)]
#[case::impulse(BackendKind::Impulse)]
fn sphere_comes_to_rest_on_ground(#[case] kind: BackendKind) {
    let (mut physics, mut world) = setup(kind);
    spawn_ground(&mut world);
    let ball = spawn(
        &mut world,
        "ball",
        Transform::from_xyz(0.0, 2.0, 0.0),
        Some(RigidBody::dynamic()),
        Some(Collider::sphere(0.5).with_restitution(0.0)),
    );

    physics.on_simulation_start(&mut world).unwrap();
    run(&mut physics, &mut world, 180);

    let y = world.get::<Transform>(ball).unwrap().translation.y;
    assert!((y - 1.0).abs() < 0.1, "y = {y}");
    physics.on_simulation_stop(&mut world).unwrap();
}

/// Layers that do not collide let bodies pass through each other.
#[rstest]
#[case::rapier(BackendKind::Rapier)]
#[case::impulse(BackendKind::Impulse)]
fn filtered_layers_pass_through_the_ground(#[case] kind: BackendKind) {
    let mut config = common::config();
    config.layers.collision_pairs = vec![[1, 1]];
    let (mut physics, mut world) = common::setup_with(kind, config);
    spawn_ground(&mut world);
    let ball = spawn(
        &mut world,
        "ghost",
        Transform::from_xyz(0.0, 2.0, 0.0),
        Some(RigidBody::dynamic()),
        Some(Collider::sphere(0.5)),
    );

    physics.on_simulation_start(&mut world).unwrap();
    run(&mut physics, &mut world, 60);

    assert!(world.get::<Transform>(ball).unwrap().translation.y < 0.0);
    physics.on_simulation_stop(&mut world).unwrap();
}

// ============================================================================
// Body commands
// ============================================================================

#[rstest]
#[case::rapier(BackendKind::Rapier)]
#[case::impulse(BackendKind::Impulse)]
fn velocity_and_impulse_commands(#[case] kind: BackendKind) {
    let (mut physics, mut world) = setup(kind);
    let puck = spawn(
        &mut world,
        "puck",
        Transform::identity(),
        Some(RigidBody::dynamic().with_gravity(false).with_mass(2.0)),
        Some(Collider::sphere(0.5)),
    );
    physics.on_simulation_start(&mut world).unwrap();

    assert!(physics.set_linear_velocity(puck, Vec3::new(1.0, 0.0, 0.0)));
    run(&mut physics, &mut world, 60);
    let x = world.get::<Transform>(puck).unwrap().translation.x;
    assert!((x - 1.0).abs() < 0.02, "x = {x}");

    assert!(physics.add_impulse(puck, Vec3::new(0.0, 0.0, 4.0)));
    let v = physics.linear_velocity(puck).unwrap();
    assert!((v.z - 2.0).abs() < 1e-3, "v = {v:?}");
    physics.on_simulation_stop(&mut world).unwrap();
}

/// Forces last for a single step.
#[rstest]
#[case::rapier(BackendKind::Rapier)]
#[case::impulse(BackendKind::Impulse)]
fn forces_apply_for_one_step(#[case] kind: BackendKind) {
    let (mut physics, mut world) = setup(kind);
    let puck = spawn(
        &mut world,
        "puck",
        Transform::identity(),
        Some(RigidBody::dynamic().with_gravity(false).with_mass(1.0)),
        Some(Collider::sphere(0.5)),
    );
    physics.on_simulation_start(&mut world).unwrap();

    assert!(physics.add_force(puck, Vec3::new(60.0, 0.0, 0.0)));
    run(&mut physics, &mut world, 1);
    let after_one = physics.linear_velocity(puck).unwrap().x;
    assert!((after_one - 1.0).abs() < 1e-3, "vx = {after_one}");

    run(&mut physics, &mut world, 10);
    let later = physics.linear_velocity(puck).unwrap().x;
    assert!((later - after_one).abs() < 1e-4);
    physics.on_simulation_stop(&mut world).unwrap();
}

#[rstest]
#[case::rapier(BackendKind::Rapier)]
#[case::impulse(BackendKind::Impulse)]
fn locked_translation_holds_position(#[case] kind: BackendKind) {
    let (mut physics, mut world) = setup(kind);
    let hover = spawn(
        &mut world,
        "hover",
        Transform::from_xyz(0.0, 4.0, 0.0),
        Some(RigidBody::dynamic().with_locked_axes(LockedAxes::TRANSLATION_Y)),
        Some(Collider::sphere(0.5)),
    );
    physics.on_simulation_start(&mut world).unwrap();
    physics.add_impulse(hover, Vec3::new(1.0, 5.0, 0.0));
    run(&mut physics, &mut world, 30);

    let t = world.get::<Transform>(hover).unwrap().translation;
    assert!((t.y - 4.0).abs() < 1e-4, "y = {}", t.y);
    assert!(t.x > 0.1);
    physics.on_simulation_stop(&mut world).unwrap();
}

// ============================================================================
// Hierarchy
// ============================================================================

/// A non-physics child follows its simulated parent in the same frame.
#[rstest]
#[case::rapier(BackendKind::Rapier)]
#[case::impulse(BackendKind::Impulse)]
fn child_follows_simulated_parent(#[case] kind: BackendKind) {
    let (mut physics, mut world) = setup(kind);
    let parent = spawn(
        &mut world,
        "parent",
        Transform::from_xyz(0.0, 10.0, 0.0).with_rotation(quat_from_rotation_y(0.5)),
        Some(RigidBody::dynamic()),
        Some(Collider::sphere(0.5)),
    );
    let child = spawn(
        &mut world,
        "child",
        Transform::from_xyz(1.0, 0.0, 0.0),
        None,
        None,
    );
    hierarchy::set_parent(&mut world, child, parent).unwrap();

    physics.on_simulation_start(&mut world).unwrap();
    run(&mut physics, &mut world, 20);

    let p = global(&world, parent);
    let c = global(&world, child);
    let expected = p.translation + quat_rotate_vec3(p.rotation, Vec3::new(1.0, 0.0, 0.0));
    assert_vec_close(c.translation, expected, 1e-4);
    assert!(p.translation.y < 10.0);
    physics.on_simulation_stop(&mut world).unwrap();
}

/// A simulated child under a static parent gets its local transform
/// back-solved so the hierarchy reproduces the simulated world pose.
#[rstest]
#[case::rapier(BackendKind::Rapier)]
#[case::impulse(BackendKind::Impulse)]
fn simulated_child_is_back_solved(#[case] kind: BackendKind) {
    let (mut physics, mut world) = setup(kind);
    let anchor = spawn(
        &mut world,
        "anchor",
        Transform::from_xyz(0.0, 5.0, 0.0).with_rotation(quat_from_rotation_y(1.0)),
        None,
        None,
    );
    let ball = spawn(
        &mut world,
        "ball",
        Transform::from_xyz(0.0, 5.0, 0.0),
        Some(RigidBody::dynamic()),
        Some(Collider::sphere(0.5)),
    );
    hierarchy::set_parent(&mut world, ball, anchor).unwrap();

    physics.on_simulation_start(&mut world).unwrap();
    run(&mut physics, &mut world, 60);

    let (position, _) = physics.pose(ball).unwrap();
    let world_pose = global(&world, ball);
    assert_vec_close(world_pose.translation, position, 1e-4);
    assert!((4.9..5.3).contains(&position.y), "y = {}", position.y);

    let local = *world.get::<Transform>(ball).unwrap();
    let recomposed = global(&world, anchor).mul_transform(&local);
    assert_vec_close(recomposed.translation, position, 1e-4);
    assert!(local.translation.y < 0.5);
    physics.on_simulation_stop(&mut world).unwrap();
}

/// Despawning a subtree releases every body in it.
#[rstest]
#[case::rapier(BackendKind::Rapier)]
#[case::impulse(BackendKind::Impulse)]
fn despawn_recursive_releases_subtree(#[case] kind: BackendKind) {
    let (mut physics, mut world) = setup(kind);
    let root = spawn(
        &mut world,
        "root",
        Transform::from_xyz(0.0, 3.0, 0.0),
        Some(RigidBody::fixed()),
        Some(Collider::sphere(0.5)),
    );
    let leaf = spawn(
        &mut world,
        "leaf",
        Transform::from_xyz(2.0, 0.0, 0.0),
        Some(RigidBody::fixed()),
        Some(Collider::sphere(0.5)),
    );
    hierarchy::set_parent(&mut world, leaf, root).unwrap();
    physics.on_simulation_start(&mut world).unwrap();
    assert_eq!(physics.body_count(), 2);

    physics.despawn_recursive(&mut world, root);
    assert!(!world.is_alive(root) && !world.is_alive(leaf));
    assert_eq!(physics.backend().unwrap().body_count(), 0);
    physics.on_simulation_stop(&mut world).unwrap();
}
