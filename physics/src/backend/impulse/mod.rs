//! Actor-scene backend driven by a sequential-impulse solver.
//!
//! Every shape owns a [`Material`] (static/dynamic friction, restitution and
//! combine rules). Geometry comes from parry3d-f64; stepping is
//! single-threaded and completes before [`PhysicsBackend::step`] returns.

mod material;
mod solver;

use origin_core::math::{Quat, Vec3};
use origin_core::profile_scope;
use parry3d_f64::na::Vector3;
use parry3d_f64::shape::SharedShape;

pub use material::{CombineRule, Material, MixedMaterial};
pub use solver::RESTITUTION_VELOCITY_THRESHOLD;

use self::solver::{Actor, Collidable, StepParams};
use crate::backend::{log_rejected, BackendKind, PhysicsBackend, SceneDescriptor};
use crate::components::{MotionQuality, MotionType, RigidBody};
use crate::conversions::impulse::{isometry_from_native, quat_to_native, vec3_from_native, vec3_to_native};
use crate::error::{PhysicsError, PhysicsResult};
use crate::handle::{BodyHandle, SceneHandle, ShapeHandle, Slots};
use crate::layers::{LayerConfig, ObjectLayer};
use crate::shape::{ShapeDescriptor, ShapeGeometry, ShapeMaterial};

const KIND: BackendKind = BackendKind::Impulse;

/// Tuning of the impulse solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverSettings {
    /// Velocity iterations per step.
    pub iterations: u32,
    /// Friction combine rule given to every new material.
    pub friction_combine: CombineRule,
    pub restitution_combine: CombineRule,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            iterations: 8,
            friction_combine: CombineRule::Average,
            restitution_combine: CombineRule::Average,
        }
    }
}

struct ImpulseShape {
    shape: SharedShape,
    offset: Vector3<f64>,
    material: Material,
    attached: bool,
}

struct ImpulseScene {
    gravity: Vector3<f64>,
    max_bodies: u32,
    max_contacts: u32,
    layers: LayerConfig,
    contact_overflow_logged: bool,
}

struct ActorEntry {
    actor: Actor,
    shape: ShapeHandle,
}

/// Sequential-impulse actor scene over parry3d-f64 geometry.
pub struct ImpulseBackend {
    settings: SolverSettings,
    initialized: bool,
    scenes: Slots<ImpulseScene>,
    active_scene: Option<SceneHandle>,
    actors: Slots<ActorEntry>,
    shapes: Slots<ImpulseShape>,
}

impl ImpulseBackend {
    pub fn new(settings: SolverSettings) -> Self {
        Self {
            settings,
            initialized: false,
            scenes: Slots::new(),
            active_scene: None,
            actors: Slots::new(),
            shapes: Slots::new(),
        }
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Material of a live shape.
    pub fn shape_material(&self, shape: ShapeHandle) -> Option<Material> {
        self.shape(shape).map(|s| s.material)
    }

    fn shape(&self, shape: ShapeHandle) -> Option<&ImpulseShape> {
        (shape.backend() == KIND)
            .then(|| self.shapes.get(shape.index(), shape.generation()))
            .flatten()
    }

    fn actor(&self, body: BodyHandle) -> Option<&Actor> {
        let entry = (body.backend() == KIND)
            .then(|| self.actors.get(body.index(), body.generation()))
            .flatten();
        if entry.is_none() {
            log_rejected(KIND, "body", &body);
        }
        entry.map(|e| &e.actor)
    }

    fn actor_mut(&mut self, body: BodyHandle) -> Option<&mut Actor> {
        let entry = if body.backend() == KIND {
            self.actors.get_mut(body.index(), body.generation())
        } else {
            None
        };
        match entry {
            Some(entry) => Some(&mut entry.actor),
            None => {
                log_rejected(KIND, "body", &body);
                None
            }
        }
    }
}

fn native_shape(geometry: &ShapeGeometry) -> SharedShape {
    match *geometry {
        ShapeGeometry::Box { half_extents } => {
            let h = vec3_to_native(half_extents);
            SharedShape::cuboid(h.x, h.y, h.z)
        }
        ShapeGeometry::Sphere { radius } => SharedShape::ball(radius as f64),
        ShapeGeometry::Capsule {
            half_height,
            radius,
        } => SharedShape::capsule_y(half_height as f64, radius as f64),
    }
}

impl PhysicsBackend for ImpulseBackend {
    fn kind(&self) -> BackendKind {
        KIND
    }

    fn init(&mut self) -> PhysicsResult<()> {
        if self.initialized {
            return Err(PhysicsError::AlreadyInitialized);
        }
        self.initialized = true;
        log::info!(
            "impulse backend initialized ({} solver iterations)",
            self.settings.iterations
        );
        Ok(())
    }

    fn shutdown(&mut self) -> PhysicsResult<()> {
        if !self.initialized {
            return Err(PhysicsError::NotInitialized);
        }
        if self.active_scene.is_some() {
            return Err(PhysicsError::SceneStillActive);
        }
        if !self.shapes.is_empty() {
            log::warn!(
                "impulse backend: releasing {} unattached shapes at shutdown",
                self.shapes.len()
            );
            self.shapes.clear();
        }
        self.initialized = false;
        log::info!("impulse backend shut down");
        Ok(())
    }

    fn create_scene(&mut self, desc: &SceneDescriptor) -> PhysicsResult<SceneHandle> {
        if !self.initialized {
            return Err(PhysicsError::NotInitialized);
        }
        if self.active_scene.is_some() {
            return Err(PhysicsError::SceneAlreadyActive);
        }
        desc.layers.validate()?;

        let (index, generation) = self.scenes.insert(ImpulseScene {
            gravity: vec3_to_native(desc.gravity),
            max_bodies: desc.max_bodies,
            max_contacts: desc.max_contacts,
            layers: desc.layers.clone(),
            contact_overflow_logged: false,
        });
        let handle = SceneHandle::new(KIND, index, generation);
        self.active_scene = Some(handle);
        log::debug!("impulse scene created: gravity {:?}", desc.gravity.as_slice());
        Ok(handle)
    }

    fn destroy_scene(&mut self, scene: SceneHandle) -> PhysicsResult<()> {
        if self.active_scene != Some(scene) {
            return Err(PhysicsError::UnknownScene);
        }
        if !self.actors.is_empty() {
            return Err(PhysicsError::BodiesStillAlive {
                count: self.actors.len(),
            });
        }
        self.scenes.remove(scene.index(), scene.generation());
        self.active_scene = None;
        Ok(())
    }

    fn create_shape(&mut self, desc: &ShapeDescriptor) -> Option<ShapeHandle> {
        if let Err(reason) = desc.geometry.validate() {
            log::warn!("impulse backend: invalid shape {:?}: {reason}", desc.geometry);
            return None;
        }
        let material = Material::new(
            &ShapeMaterial::default(),
            self.settings.friction_combine,
            self.settings.restitution_combine,
        );
        let (index, generation) = self.shapes.insert(ImpulseShape {
            shape: native_shape(&desc.geometry),
            offset: vec3_to_native(desc.offset),
            material,
            attached: false,
        });
        Some(ShapeHandle::new(KIND, index, generation))
    }

    fn set_shape_material(&mut self, shape: ShapeHandle, material: &ShapeMaterial) {
        if let Err(reason) = material.validate() {
            log::warn!("impulse backend: keeping previous material of {shape:?}: {reason}");
            return;
        }
        let state = if shape.backend() == KIND {
            self.shapes.get_mut(shape.index(), shape.generation())
        } else {
            None
        };
        match state {
            Some(state) => state.material.set_surface(material),
            None => log_rejected(KIND, "shape", &shape),
        }
    }

    fn release_shape(&mut self, shape: ShapeHandle) {
        match self.shape(shape).map(|s| s.attached) {
            Some(false) => {
                self.shapes.remove(shape.index(), shape.generation());
            }
            Some(true) => {
                log::warn!("impulse backend: {shape:?} is attached; destroy its body instead");
            }
            None => log_rejected(KIND, "shape", &shape),
        }
    }

    fn create_body(
        &mut self,
        desc: &RigidBody,
        shape: ShapeHandle,
        position: Vec3,
        rotation: Quat,
    ) -> Option<BodyHandle> {
        let Some(scene) = self
            .active_scene
            .and_then(|s| self.scenes.get(s.index(), s.generation()))
        else {
            log::warn!("impulse backend: create_body without an active scene");
            return None;
        };
        if self.actors.len() >= scene.max_bodies as usize {
            log::warn!(
                "impulse backend: body capacity ({}) exhausted",
                scene.max_bodies
            );
            return None;
        }

        let geometry = match self.shape(shape) {
            Some(s) if s.attached => {
                log::warn!("impulse backend: {shape:?} is already attached to a body");
                return None;
            }
            Some(s) => s,
            None => {
                log_rejected(KIND, "shape", &shape);
                return None;
            }
        };

        let position = vec3_to_native(position);
        let rotation = quat_to_native(rotation);
        let mut actor = match desc.motion_type {
            MotionType::Static => Actor::new_static(position, rotation),
            MotionType::Dynamic => {
                let mut actor = Actor::new_dynamic(
                    &*geometry.shape,
                    desc.mass as f64,
                    vec3_to_native(desc.center_of_mass),
                    position,
                    rotation,
                );
                actor.gravity_scale = desc.effective_gravity_scale() as f64;
                actor.linear_free = vec3_to_native(desc.locked_axes.translation_mask());
                actor.angular_free = vec3_to_native(desc.locked_axes.rotation_mask());
                actor
            }
        };
        actor.layer = ObjectLayer::for_motion(desc.motion_type);
        if desc.motion_quality == MotionQuality::Continuous {
            log::debug!("impulse backend: continuous collision detection unavailable, using discrete");
        }

        if let Some(state) = self.shapes.get_mut(shape.index(), shape.generation()) {
            state.attached = true;
        }
        let (index, generation) = self.actors.insert(ActorEntry { actor, shape });
        Some(BodyHandle::new(KIND, index, generation))
    }

    fn destroy_body(&mut self, body: BodyHandle) {
        let removed = (body.backend() == KIND)
            .then(|| self.actors.remove(body.index(), body.generation()))
            .flatten();
        match removed {
            Some(entry) => {
                self.shapes
                    .remove(entry.shape.index(), entry.shape.generation());
            }
            None => log_rejected(KIND, "body", &body),
        }
    }

    fn step(&mut self, scene: SceneHandle, dt: f32) {
        profile_scope!("impulse: step");

        if self.active_scene != Some(scene) {
            log_rejected(KIND, "scene", &scene);
            return;
        }
        let Some(state) = self.scenes.get_mut(scene.index(), scene.generation()) else {
            return;
        };

        let mut keys = Vec::with_capacity(self.actors.len());
        let mut actors = Vec::with_capacity(self.actors.len());
        let mut collidables = Vec::with_capacity(self.actors.len());
        for (index, generation, entry) in self.actors.iter() {
            let Some(shape) = self
                .shapes
                .get(entry.shape.index(), entry.shape.generation())
            else {
                continue;
            };
            keys.push((index, generation));
            actors.push(entry.actor);
            collidables.push(Collidable {
                shape: &*shape.shape,
                offset: shape.offset,
                material: shape.material,
            });
        }

        let report = solver::step(
            &mut actors,
            &collidables,
            &StepParams {
                gravity: state.gravity,
                dt: dt as f64,
                iterations: self.settings.iterations,
                layers: &state.layers,
                max_contacts: state.max_contacts as usize,
            },
        );

        for ((index, generation), actor) in keys.into_iter().zip(actors) {
            if let Some(entry) = self.actors.get_mut(index, generation) {
                entry.actor = actor;
            }
        }

        if report.dropped > 0 && !state.contact_overflow_logged {
            state.contact_overflow_logged = true;
            log::warn!(
                "impulse backend: dropped {} contacts over max_contacts ({})",
                report.dropped,
                state.max_contacts
            );
        }
    }

    fn pose(&self, body: BodyHandle) -> Option<(Vec3, Quat)> {
        self.actor(body).map(|a| isometry_from_native(&a.isometry()))
    }

    fn add_force(&mut self, body: BodyHandle, force: Vec3) {
        if let Some(actor) = self.actor_mut(body) {
            actor.force += vec3_to_native(force);
        }
    }

    fn add_torque(&mut self, body: BodyHandle, torque: Vec3) {
        if let Some(actor) = self.actor_mut(body) {
            actor.torque += vec3_to_native(torque);
        }
    }

    fn add_impulse(&mut self, body: BodyHandle, impulse: Vec3) {
        if let Some(actor) = self.actor_mut(body) {
            actor.apply_impulse(vec3_to_native(impulse));
        }
    }

    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.actor(body).map(|a| vec3_from_native(&a.linvel))
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        if let Some(actor) = self.actor_mut(body) {
            actor.set_linvel(vec3_to_native(velocity));
        }
    }

    fn body_count(&self) -> usize {
        self.actors.len()
    }

    fn shape_count(&self) -> usize {
        self.shapes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;

    fn started(settings: SolverSettings) -> (ImpulseBackend, SceneHandle) {
        let mut backend = ImpulseBackend::new(settings);
        backend.init().unwrap();
        let scene = backend
            .create_scene(&PhysicsConfig::default().scene_descriptor())
            .unwrap();
        (backend, scene)
    }

    fn cube() -> ShapeDescriptor {
        ShapeDescriptor {
            geometry: ShapeGeometry::Box {
                half_extents: Vec3::new(0.5, 0.5, 0.5),
            },
            offset: Vec3::zeros(),
        }
    }

    #[test]
    fn materials_take_configured_combine_rules() {
        let (mut backend, _) = started(SolverSettings {
            friction_combine: CombineRule::Max,
            ..SolverSettings::default()
        });
        let shape = backend.create_shape(&cube()).unwrap();
        backend.set_shape_material(
            shape,
            &ShapeMaterial {
                friction: 0.3,
                static_friction: 0.5,
                restitution: 0.1,
            },
        );
        let material = backend.shape_material(shape).unwrap();
        assert_eq!(material.friction_combine, CombineRule::Max);
        assert!((material.dynamic_friction - 0.3).abs() < 1e-6);
        assert!((material.static_friction - 0.5).abs() < 1e-6);
    }

    #[test]
    fn invalid_material_keeps_previous_coefficients() {
        let (mut backend, _) = started(SolverSettings::default());
        let shape = backend.create_shape(&cube()).unwrap();
        let before = backend.shape_material(shape).unwrap();

        backend.set_shape_material(
            shape,
            &ShapeMaterial {
                friction: f32::NAN,
                static_friction: 0.5,
                restitution: 0.2,
            },
        );
        backend.set_shape_material(
            shape,
            &ShapeMaterial {
                restitution: f32::NAN,
                ..ShapeMaterial::default()
            },
        );

        let after = backend.shape_material(shape).unwrap();
        assert_eq!(after, before);
        assert!(after.restitution.is_finite());
    }

    #[test]
    fn scene_lifecycle_requires_empty_scene() {
        let (mut backend, scene) = started(SolverSettings::default());
        let shape = backend.create_shape(&cube()).unwrap();
        let body = backend
            .create_body(&RigidBody::fixed(), shape, Vec3::zeros(), Quat::identity())
            .unwrap();

        assert!(matches!(
            backend.destroy_scene(scene),
            Err(PhysicsError::BodiesStillAlive { count: 1 })
        ));
        assert!(matches!(backend.shutdown(), Err(PhysicsError::SceneStillActive)));

        backend.destroy_body(body);
        backend.destroy_scene(scene).unwrap();
        backend.shutdown().unwrap();
        assert_eq!(backend.shape_count(), 0);
    }

    #[test]
    fn static_bodies_never_move() {
        let (mut backend, scene) = started(SolverSettings::default());
        let shape = backend.create_shape(&cube()).unwrap();
        let position = Vec3::new(1.0, 2.0, 3.0);
        let body = backend
            .create_body(&RigidBody::fixed(), shape, position, Quat::identity())
            .unwrap();
        backend.add_impulse(body, Vec3::new(0.0, 100.0, 0.0));
        for _ in 0..10 {
            backend.step(scene, 1.0 / 60.0);
        }
        assert_eq!(backend.pose(body).unwrap().0, position);
    }

    #[test]
    fn impulse_changes_velocity_by_inverse_mass() {
        let (mut backend, _) = started(SolverSettings::default());
        let shape = backend.create_shape(&cube()).unwrap();
        let body = backend
            .create_body(
                &RigidBody::dynamic().with_mass(2.0),
                shape,
                Vec3::zeros(),
                Quat::identity(),
            )
            .unwrap();
        backend.add_impulse(body, Vec3::new(4.0, 0.0, 0.0));
        let v = backend.linear_velocity(body).unwrap();
        assert!((v.x - 2.0).abs() < 1e-6);
    }

    #[test]
    fn stale_body_handle_is_rejected() {
        let (mut backend, _) = started(SolverSettings::default());
        let shape = backend.create_shape(&cube()).unwrap();
        let body = backend
            .create_body(&RigidBody::dynamic(), shape, Vec3::zeros(), Quat::identity())
            .unwrap();
        backend.destroy_body(body);
        assert!(backend.pose(body).is_none());
        assert_eq!(backend.body_count(), 0);
    }
}
