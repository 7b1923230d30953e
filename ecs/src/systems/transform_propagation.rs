//! Transform propagation through the entity hierarchy.
//!
//! Computes [`GlobalTransform`] from local [`Transform`] components top-down,
//! so every parent is resolved before its children. The same pass can take
//! externally simulated world poses (physics) and back-solve the local
//! transforms that reproduce them.

use std::collections::HashMap;

use origin_core::math::{Quat, Vec3};
use origin_core::profile_function;

use crate::components::{Children, GlobalTransform, Parent, Transform};
use crate::{Entity, World};

/// Recomputes every [`GlobalTransform`] from the local hierarchy.
///
/// Roots (no parent, or a parent that no longer exists) use their local
/// transform directly.
pub fn update_global_transforms(world: &mut World) {
    propagate_with_poses(world, &HashMap::new());
}

/// Recomputes world transforms, forcing the given world poses.
///
/// For an entity in `poses` the translation/rotation become its world pose and
/// its local [`Transform`] is rewritten as `parent.world⁻¹ ∘ pose`. Its scale is
/// left untouched. Descendants of such entities are propagated from the new
/// pose in the same pass.
///
/// Entities without a [`Transform`] are transparent: their children are
/// resolved against the nearest ancestor that has one.
///
/// Returns the number of local transforms rewritten.
pub fn propagate_with_poses(world: &mut World, poses: &HashMap<Entity, (Vec3, Quat)>) -> usize {
    profile_function!();

    let roots: Vec<Entity> = world
        .iter_entities()
        .filter(|&e| match world.get::<Parent>(e) {
            Some(parent) => !world.is_alive(parent.0),
            None => true,
        })
        .collect();

    let mut rewritten = 0;
    let mut stack: Vec<(Entity, GlobalTransform)> = roots
        .into_iter()
        .rev()
        .map(|root| (root, GlobalTransform::identity()))
        .collect();

    while let Some((entity, parent_world)) = stack.pop() {
        let resolved = match world.get::<Transform>(entity).copied() {
            Some(local) => {
                let global = match poses.get(&entity) {
                    Some(&(translation, rotation)) => {
                        let solved = parent_world.local_for(translation, rotation, local.scale);
                        if let Some(t) = world.get_mut::<Transform>(entity) {
                            *t = solved;
                        }
                        rewritten += 1;
                        GlobalTransform {
                            translation,
                            rotation,
                            scale: parent_world.scale.component_mul(&local.scale),
                        }
                    }
                    None => parent_world.mul_transform(&local),
                };
                store_global(world, entity, global);
                global
            }
            None => parent_world,
        };

        if let Some(children) = world.get::<Children>(entity) {
            stack.extend(children.0.iter().rev().map(|&child| (child, resolved)));
        }
    }

    rewritten
}

fn store_global(world: &mut World, entity: Entity, global: GlobalTransform) {
    if let Some(g) = world.get_mut::<GlobalTransform>(entity) {
        *g = global;
    } else if let Err(err) = world.insert(entity, global) {
        log::debug!("Skipping world transform cache for {entity}: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::register_scene_components;
    use crate::hierarchy::set_parent;
    use origin_core::math::quat_from_rotation_y;
    use std::f32::consts::FRAC_PI_2;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).norm() < 1e-4
    }

    fn setup() -> World {
        let mut world = World::new();
        register_scene_components(&mut world);
        world
    }

    #[test]
    fn roots_copy_local() {
        let mut world = setup();
        let e = world.spawn();
        world.insert(e, Transform::from_xyz(1.0, 2.0, 3.0)).unwrap();
        update_global_transforms(&mut world);
        assert_eq!(
            world.get::<GlobalTransform>(e).unwrap().translation,
            Vec3::new(1.0, 2.0, 3.0)
        );
    }

    #[test]
    fn children_follow_rotated_parent() {
        let mut world = setup();
        let parent = world.spawn();
        let child = world.spawn();
        world
            .insert(
                parent,
                Transform::from_xyz(5.0, 0.0, 0.0).with_rotation(quat_from_rotation_y(FRAC_PI_2)),
            )
            .unwrap();
        world.insert(child, Transform::from_xyz(0.0, 0.0, 1.0)).unwrap();
        set_parent(&mut world, child, parent).unwrap();

        update_global_transforms(&mut world);

        let g = world.get::<GlobalTransform>(child).unwrap();
        assert!(approx(g.translation, Vec3::new(6.0, 0.0, 0.0)));
    }

    #[test]
    fn transform_less_parent_is_transparent() {
        let mut world = setup();
        let root = world.spawn();
        let group = world.spawn();
        let leaf = world.spawn();
        world.insert(root, Transform::from_xyz(0.0, 1.0, 0.0)).unwrap();
        world.insert(leaf, Transform::from_xyz(0.0, 1.0, 0.0)).unwrap();
        set_parent(&mut world, group, root).unwrap();
        set_parent(&mut world, leaf, group).unwrap();

        update_global_transforms(&mut world);

        assert!(world.get::<GlobalTransform>(group).is_none());
        assert!(approx(
            world.get::<GlobalTransform>(leaf).unwrap().translation,
            Vec3::new(0.0, 2.0, 0.0)
        ));
    }

    #[test]
    fn pose_back_solves_local_under_parent() {
        let mut world = setup();
        let parent = world.spawn();
        let child = world.spawn();
        let grandchild = world.spawn();
        world
            .insert(
                parent,
                Transform::from_xyz(0.0, 10.0, 0.0).with_scale(Vec3::new(2.0, 2.0, 2.0)),
            )
            .unwrap();
        world.insert(child, Transform::from_xyz(1.0, 0.0, 0.0)).unwrap();
        world.insert(grandchild, Transform::from_xyz(0.0, 1.0, 0.0)).unwrap();
        set_parent(&mut world, child, parent).unwrap();
        set_parent(&mut world, grandchild, child).unwrap();

        let mut poses = HashMap::new();
        poses.insert(child, (Vec3::new(4.0, 10.0, 0.0), Quat::identity()));
        let rewritten = propagate_with_poses(&mut world, &poses);

        assert_eq!(rewritten, 1);
        let local = world.get::<Transform>(child).unwrap();
        assert!(approx(local.translation, Vec3::new(2.0, 0.0, 0.0)));
        let child_world = world.get::<GlobalTransform>(child).unwrap();
        assert_eq!(child_world.translation, Vec3::new(4.0, 10.0, 0.0));
        assert_eq!(child_world.scale, Vec3::new(2.0, 2.0, 2.0));
        assert!(approx(
            world.get::<GlobalTransform>(grandchild).unwrap().translation,
            Vec3::new(4.0, 12.0, 0.0)
        ));
    }

    #[test]
    fn dead_parent_makes_entity_a_root() {
        let mut world = setup();
        let parent = world.spawn();
        let child = world.spawn();
        world.insert(child, Transform::from_xyz(3.0, 0.0, 0.0)).unwrap();
        world.insert(child, Parent(parent)).unwrap();
        world.despawn(parent);

        update_global_transforms(&mut world);
        assert_eq!(
            world.get::<GlobalTransform>(child).unwrap().translation,
            Vec3::new(3.0, 0.0, 0.0)
        );
    }
}
