//! [`PhysicsWorld`]: drives a backend from the ECS scene.
//!
//! Lifecycle:
//!
//! ```text
//! new ─► Uninitialized ─init─► Initialized ─on_simulation_start─► Simulating
//!                 ▲                 ▲                                  │
//!                 └────shutdown─────┴──────on_simulation_stop──────────┘
//! ```
//!
//! While simulating, every entity with a [`RigidBody`] either owns a live
//! body/shape pair or is recorded in [`PhysicsWorld::skipped_entities`] with
//! the reason it could not be instantiated. Skipped entities are retried each
//! frame.

use std::collections::HashMap;
use std::fmt;

use origin_core::math::{Quat, Vec3};
use origin_core::{profile_function, profile_plot, profile_scope};
use origin_ecs::{hierarchy, propagate_with_poses, update_global_transforms, Entity, Name, World};

use crate::backend::{create_backend, BackendKind, PhysicsBackend};
use crate::components::{Collider, RigidBody};
use crate::config::PhysicsConfig;
use crate::error::{PhysicsError, PhysicsResult};
use crate::handle::{BodyHandle, SceneHandle};
use crate::shape::ShapeDescriptor;

/// Where a [`PhysicsWorld`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationState {
    Uninitialized,
    Initialized,
    Simulating,
}

impl SimulationState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "Uninitialized",
            Self::Initialized => "Initialized",
            Self::Simulating => "Simulating",
        }
    }
}

impl fmt::Display for SimulationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a rigid body entity has no simulated body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingCollider,
    MissingTransform,
    /// The backend rejected the collider geometry.
    InvalidShape,
    /// The backend could not create the body (e.g. capacity exhausted).
    BodyCreationFailed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::MissingCollider => "no collider component",
            Self::MissingTransform => "no transform component",
            Self::InvalidShape => "invalid collider geometry",
            Self::BodyCreationFailed => "backend failed to create the body",
        };
        f.write_str(text)
    }
}

/// Explicit physics context: owns the backend, the scene and every handle it
/// issues.
pub struct PhysicsWorld {
    config: PhysicsConfig,
    backend: Option<Box<dyn PhysicsBackend>>,
    scene: Option<SceneHandle>,
    state: SimulationState,
    paused: bool,
    bodies: HashMap<Entity, BodyHandle>,
    skipped: HashMap<Entity, SkipReason>,
}

impl PhysicsWorld {
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            backend: None,
            scene: None,
            state: SimulationState::Uninitialized,
            paused: false,
            bodies: HashMap::new(),
            skipped: HashMap::new(),
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// While paused, [`simulate`](Self::simulate) still tracks entity
    /// lifetimes but does not step the backend.
    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            log::info!("Physics {}", if paused { "paused" } else { "resumed" });
        }
        self.paused = paused;
    }

    /// The active backend, for diagnostics.
    pub fn backend(&self) -> Option<&dyn PhysicsBackend> {
        self.backend.as_deref()
    }

    /// Number of live simulated bodies.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn body_of(&self, entity: Entity) -> Option<BodyHandle> {
        self.bodies.get(&entity).copied()
    }

    /// Rigid body entities that could not be instantiated, with the reason.
    pub fn skipped_entities(&self) -> &HashMap<Entity, SkipReason> {
        &self.skipped
    }

    fn expect_state(&self, expected: SimulationState) -> PhysicsResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(PhysicsError::InvalidState {
                expected: expected.as_str(),
                actual: self.state.as_str(),
            })
        }
    }

    /// Creates and initializes the backend selected in the config.
    pub fn init_from_config(&mut self) -> PhysicsResult<()> {
        self.init(self.config.backend)
    }

    /// Creates the `kind` backend and runs its process-level setup.
    pub fn init(&mut self, kind: BackendKind) -> PhysicsResult<()> {
        self.expect_state(SimulationState::Uninitialized)?;
        self.config.validate()?;

        let mut backend = create_backend(kind, &self.config);
        backend.init()?;
        self.backend = Some(backend);
        self.state = SimulationState::Initialized;
        log::info!("Physics initialized with the {kind} backend");
        Ok(())
    }

    /// Creates the scene and instantiates every entity with a [`RigidBody`].
    pub fn on_simulation_start(&mut self, world: &mut World) -> PhysicsResult<()> {
        profile_function!();
        self.expect_state(SimulationState::Initialized)?;
        let backend = self.backend.as_mut().ok_or(PhysicsError::NotInitialized)?;

        update_global_transforms(world);
        let scene = backend.create_scene(&self.config.scene_descriptor())?;
        self.scene = Some(scene);
        self.state = SimulationState::Simulating;
        self.skipped.clear();

        let candidates = world.entities_with::<RigidBody>();
        let created = candidates
            .iter()
            .filter(|&&entity| self.instantiate_entity(world, entity))
            .count();
        log::info!(
            "Simulation started: {created} of {} rigid bodies instantiated",
            candidates.len()
        );
        Ok(())
    }

    /// Creates the simulated body for one entity.
    ///
    /// Returns `true` if the entity owns a body afterwards. Entities without a
    /// [`Collider`] or a `Transform`, or whose geometry the backend rejects,
    /// are recorded as skipped.
    pub fn instantiate_entity(&mut self, world: &mut World, entity: Entity) -> bool {
        if self.state != SimulationState::Simulating {
            log::warn!(
                "Cannot instantiate {} outside of a running simulation",
                Name::label(world, entity)
            );
            return false;
        }
        if self.bodies.contains_key(&entity) {
            return true;
        }
        let Some(desc) = world.get::<RigidBody>(entity).cloned() else {
            log::debug!("{} has no rigid body", Name::label(world, entity));
            return false;
        };
        let Some(collider) = world.get::<Collider>(entity).cloned() else {
            record_skip(&mut self.skipped, world, entity, SkipReason::MissingCollider);
            return false;
        };
        let Some(pose) = hierarchy::world_transform_of(world, entity) else {
            record_skip(&mut self.skipped, world, entity, SkipReason::MissingTransform);
            return false;
        };
        let Some(backend) = self.backend.as_mut() else {
            return false;
        };

        let descriptor = ShapeDescriptor {
            geometry: collider.shape.scaled(pose.scale),
            offset: collider.offset.component_mul(&pose.scale),
        };
        let Some(shape) = backend.create_shape(&descriptor) else {
            record_skip(&mut self.skipped, world, entity, SkipReason::InvalidShape);
            return false;
        };
        backend.set_shape_material(shape, &collider.material());

        let Some(body) = backend.create_body(&desc, shape, pose.translation, pose.rotation) else {
            backend.release_shape(shape);
            record_skip(&mut self.skipped, world, entity, SkipReason::BodyCreationFailed);
            return false;
        };

        if let Some(rb) = world.get_mut::<RigidBody>(entity) {
            rb.body = Some(body);
        }
        if let Some(c) = world.get_mut::<Collider>(entity) {
            c.shape_handle = Some(shape);
        }
        self.bodies.insert(entity, body);
        self.skipped.remove(&entity);
        log::debug!("Instantiated {} as {body:?}", Name::label(world, entity));
        true
    }

    /// Advances the simulation by `dt` seconds and writes the resulting poses
    /// back into the scene.
    pub fn simulate(&mut self, world: &mut World, dt: f32) -> PhysicsResult<()> {
        profile_function!();
        self.expect_state(SimulationState::Simulating)?;

        self.release_orphaned_bodies(world);
        for entity in world.entities_with::<RigidBody>() {
            if !self.bodies.contains_key(&entity) {
                self.instantiate_entity(world, entity);
            }
        }

        if self.paused {
            update_global_transforms(world);
            return Ok(());
        }
        if !(dt.is_finite() && dt > 0.0) {
            log::warn!("Ignoring simulation step with dt = {dt}");
            update_global_transforms(world);
            return Ok(());
        }

        let (Some(backend), Some(scene)) = (self.backend.as_mut(), self.scene) else {
            return Err(PhysicsError::NotInitialized);
        };
        backend.step(scene, dt);

        let poses: HashMap<Entity, (Vec3, Quat)> = {
            profile_scope!("physics: read poses");
            self.bodies
                .iter()
                .filter_map(|(&entity, &body)| backend.pose(body).map(|pose| (entity, pose)))
                .collect()
        };
        propagate_with_poses(world, &poses);
        profile_plot!("physics bodies", self.bodies.len());
        Ok(())
    }

    /// Releases bodies whose entity was despawned without going through
    /// [`despawn_entity`](Self::despawn_entity), or lost its [`RigidBody`] or
    /// [`Collider`].
    fn release_orphaned_bodies(&mut self, world: &mut World) {
        let (dead, stripped): (Vec<Entity>, Vec<Entity>) = self
            .bodies
            .keys()
            .copied()
            .filter(|&entity| {
                !world.is_alive(entity)
                    || !world.has::<RigidBody>(entity)
                    || !world.has::<Collider>(entity)
            })
            .partition(|&entity| !world.is_alive(entity));

        if let Some(backend) = self.backend.as_mut() {
            for entity in dead {
                if let Some(body) = self.bodies.remove(&entity) {
                    backend.destroy_body(body);
                    log::debug!("Released {body:?} of despawned {entity}");
                }
            }
        }
        for entity in stripped {
            self.destroy_entity(world, entity);
        }
        self.skipped
            .retain(|&entity, _| world.is_alive(entity) && world.has::<RigidBody>(entity));
    }

    /// Destroys every body, then the scene.
    pub fn on_simulation_stop(&mut self, world: &mut World) -> PhysicsResult<()> {
        profile_function!();
        self.expect_state(SimulationState::Simulating)?;
        let backend = self.backend.as_mut().ok_or(PhysicsError::NotInitialized)?;

        let destroyed = self.bodies.len();
        for (_, body) in self.bodies.drain() {
            backend.destroy_body(body);
        }
        for entity in world.entities_with::<RigidBody>() {
            clear_slots(world, entity);
        }
        for entity in world.entities_with::<Collider>() {
            clear_slots(world, entity);
        }
        self.skipped.clear();
        self.state = SimulationState::Initialized;

        if let Some(scene) = self.scene.take() {
            backend.destroy_scene(scene)?;
        }
        log::info!("Simulation stopped, {destroyed} bodies destroyed");
        Ok(())
    }

    /// Destroys the entity's body and shape, leaving the entity alive.
    ///
    /// Returns `true` if a body was destroyed.
    pub fn destroy_entity(&mut self, world: &mut World, entity: Entity) -> bool {
        self.skipped.remove(&entity);
        let Some(body) = self.bodies.remove(&entity) else {
            return false;
        };
        if let Some(backend) = self.backend.as_mut() {
            backend.destroy_body(body);
        }
        clear_slots(world, entity);
        log::debug!("Destroyed body of {}", Name::label(world, entity));
        true
    }

    /// Destroys the entity's body, then despawns the entity.
    pub fn despawn_entity(&mut self, world: &mut World, entity: Entity) -> bool {
        self.destroy_entity(world, entity);
        hierarchy::remove_parent(world, entity);
        world.despawn(entity)
    }

    /// Destroys the bodies of `entity` and all its descendants, then despawns
    /// the subtree.
    pub fn despawn_recursive(&mut self, world: &mut World, entity: Entity) {
        for e in hierarchy::descendants(world, entity) {
            self.destroy_entity(world, e);
        }
        self.destroy_entity(world, entity);
        hierarchy::despawn_recursive(world, entity);
    }

    /// Releases the backend. A running simulation must be stopped first.
    /// Calling this on an uninitialized world does nothing.
    pub fn shutdown(&mut self) -> PhysicsResult<()> {
        match self.state {
            SimulationState::Uninitialized => return Ok(()),
            SimulationState::Simulating => {
                return Err(PhysicsError::InvalidState {
                    expected: SimulationState::Initialized.as_str(),
                    actual: self.state.as_str(),
                })
            }
            SimulationState::Initialized => {}
        }
        if let Some(mut backend) = self.backend.take() {
            backend.shutdown()?;
        }
        self.state = SimulationState::Uninitialized;
        log::info!("Physics shut down");
        Ok(())
    }

    fn body_backend(&mut self, entity: Entity) -> Option<(&mut Box<dyn PhysicsBackend>, BodyHandle)> {
        let body = *self.bodies.get(&entity)?;
        Some((self.backend.as_mut()?, body))
    }

    /// Adds a force applied during the next step only.
    pub fn add_force(&mut self, entity: Entity, force: Vec3) -> bool {
        self.body_backend(entity)
            .map(|(backend, body)| backend.add_force(body, force))
            .is_some()
    }

    /// Adds a torque applied during the next step only.
    pub fn add_torque(&mut self, entity: Entity, torque: Vec3) -> bool {
        self.body_backend(entity)
            .map(|(backend, body)| backend.add_torque(body, torque))
            .is_some()
    }

    pub fn add_impulse(&mut self, entity: Entity, impulse: Vec3) -> bool {
        self.body_backend(entity)
            .map(|(backend, body)| backend.add_impulse(body, impulse))
            .is_some()
    }

    pub fn set_linear_velocity(&mut self, entity: Entity, velocity: Vec3) -> bool {
        self.body_backend(entity)
            .map(|(backend, body)| backend.set_linear_velocity(body, velocity))
            .is_some()
    }

    pub fn linear_velocity(&self, entity: Entity) -> Option<Vec3> {
        let body = self.bodies.get(&entity)?;
        self.backend.as_ref()?.linear_velocity(*body)
    }

    /// Simulated world pose of the entity's body origin.
    pub fn pose(&self, entity: Entity) -> Option<(Vec3, Quat)> {
        let body = self.bodies.get(&entity)?;
        self.backend.as_ref()?.pose(*body)
    }
}

impl Drop for PhysicsWorld {
    fn drop(&mut self) {
        if self.state == SimulationState::Simulating {
            log::warn!(
                "PhysicsWorld dropped while simulating; {} bodies released with the backend",
                self.bodies.len()
            );
        }
    }
}

fn record_skip(
    skipped: &mut HashMap<Entity, SkipReason>,
    world: &World,
    entity: Entity,
    reason: SkipReason,
) {
    if skipped.insert(entity, reason) != Some(reason) {
        log::warn!("Skipping {}: {reason}", Name::label(world, entity));
    }
}

fn clear_slots(world: &mut World, entity: Entity) {
    if let Some(rb) = world.get_mut::<RigidBody>(entity) {
        rb.body = None;
    }
    if let Some(c) = world.get_mut::<Collider>(entity) {
        c.shape_handle = None;
    }
}
