//! Physics backend abstraction.
//!
//! Two structurally different engines implement [`PhysicsBackend`]:
//!
//! - [`RapierBackend`] - rapier3d stepped on a private rayon worker pool,
//!   filtering pairs through two broad-phase object layers.
//! - [`ImpulseBackend`] - a sequential-impulse actor scene over parry3d-f64
//!   geometry, with a material object per shape and friction/restitution
//!   combine rules.
//!
//! Backend-level failures never panic across this boundary: lifecycle calls
//! return [`PhysicsError`](crate::PhysicsError), per-object calls return
//! `None` and log.

pub mod impulse;
pub mod rapier;

use std::fmt;

use origin_core::math::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::components::RigidBody;
use crate::config::PhysicsConfig;
use crate::error::PhysicsResult;
use crate::handle::{BodyHandle, SceneHandle, ShapeHandle};
use crate::layers::LayerConfig;
use crate::shape::{ShapeDescriptor, ShapeMaterial};

pub use impulse::ImpulseBackend;
pub use rapier::RapierBackend;

/// Which physics engine drives the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// rapier3d on a worker pool.
    #[default]
    Rapier,
    /// Sequential-impulse actor scene.
    Impulse,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rapier => f.write_str("rapier"),
            Self::Impulse => f.write_str("impulse"),
        }
    }
}

/// Parameters of a simulation scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneDescriptor {
    pub gravity: Vec3,
    pub max_bodies: u32,
    pub max_contacts: u32,
    pub layers: LayerConfig,
}

/// The contract both physics engines implement.
///
/// Call order: [`init`](Self::init) → [`create_scene`](Self::create_scene) →
/// shapes/bodies/steps → destroy every body → [`destroy_scene`](Self::destroy_scene)
/// → [`shutdown`](Self::shutdown). Methods take `&mut self`, so callers cannot
/// create, destroy or step concurrently.
pub trait PhysicsBackend: Send {
    fn kind(&self) -> BackendKind;

    /// Process-level setup (worker pool, allocators). Fails if called twice.
    fn init(&mut self) -> PhysicsResult<()>;

    /// Releases process-level resources. The scene must already be destroyed.
    fn shutdown(&mut self) -> PhysicsResult<()>;

    /// Allocates the simulation world. Only one scene may be active.
    fn create_scene(&mut self, desc: &SceneDescriptor) -> PhysicsResult<SceneHandle>;

    /// Destroys the scene. Fails while bodies are still alive.
    fn destroy_scene(&mut self, scene: SceneHandle) -> PhysicsResult<()>;

    /// Builds an unattached shape. Returns `None` and logs on invalid geometry.
    fn create_shape(&mut self, desc: &ShapeDescriptor) -> Option<ShapeHandle>;

    /// Sets friction/restitution on a shape, attached or not.
    fn set_shape_material(&mut self, shape: ShapeHandle, material: &ShapeMaterial);

    /// Releases a shape that was never attached to a body.
    fn release_shape(&mut self, shape: ShapeHandle);

    /// Creates an active body carrying `shape` at the given world pose.
    ///
    /// Returns `None` when there is no scene, the shape is invalid or already
    /// attached, or body capacity is exhausted. On `None` the shape stays
    /// unattached and must be released by the caller.
    fn create_body(
        &mut self,
        desc: &RigidBody,
        shape: ShapeHandle,
        position: Vec3,
        rotation: Quat,
    ) -> Option<BodyHandle>;

    /// Detaches and releases the body's shape, then releases the body.
    fn destroy_body(&mut self, body: BodyHandle);

    /// Advances the scene by exactly `dt` seconds. Returns once all internal
    /// work has finished.
    fn step(&mut self, scene: SceneHandle, dt: f32);

    /// World pose of the body origin.
    fn pose(&self, body: BodyHandle) -> Option<(Vec3, Quat)>;

    /// Adds a world-space force for the next step only.
    fn add_force(&mut self, body: BodyHandle, force: Vec3);

    /// Adds a world-space torque for the next step only.
    fn add_torque(&mut self, body: BodyHandle, torque: Vec3);

    /// Applies an instantaneous world-space impulse at the center of mass.
    fn add_impulse(&mut self, body: BodyHandle, impulse: Vec3);

    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec3>;

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3);

    /// Live bodies in the active scene.
    fn body_count(&self) -> usize;

    /// Live shapes, attached or not.
    fn shape_count(&self) -> usize;
}

/// Builds the backend selected by `kind`, configured from `config`.
pub fn create_backend(kind: BackendKind, config: &PhysicsConfig) -> Box<dyn PhysicsBackend> {
    match kind {
        BackendKind::Rapier => Box::new(RapierBackend::new(config.resolved_worker_threads())),
        BackendKind::Impulse => Box::new(ImpulseBackend::new(impulse::SolverSettings {
            iterations: config.solver_iterations,
            friction_combine: config.friction_combine,
            restitution_combine: config.restitution_combine,
        })),
    }
}

/// Logs a handle rejected by a backend.
pub(crate) fn log_rejected(kind: BackendKind, what: &str, handle: &dyn fmt::Debug) {
    log::error!("{kind} backend: rejected {what} handle {handle:?}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_honors_kind() {
        let config = PhysicsConfig::default();
        for kind in [BackendKind::Rapier, BackendKind::Impulse] {
            assert_eq!(create_backend(kind, &config).kind(), kind);
        }
    }

    #[test]
    fn kind_parses_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            backend: BackendKind,
        }
        let w: Wrapper = toml::from_str(r#"backend = "impulse""#).unwrap();
        assert_eq!(w.backend, BackendKind::Impulse);
    }
}
