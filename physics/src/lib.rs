//! # Origin Physics
//!
//! Rigid body simulation for the Origin scene graph.
//!
//! Entities carrying a [`RigidBody`] and a [`Collider`] are mirrored into a
//! [`PhysicsBackend`] when simulation starts; every frame
//! [`PhysicsWorld::simulate`] steps the backend and writes the simulated world
//! poses back into the transform hierarchy.
//!
//! ## Backends
//!
//! - [`RapierBackend`] - rapier3d on a rayon worker pool
//! - [`ImpulseBackend`] - sequential-impulse actor scene over parry3d-f64
//!
//! Both are built through [`create_backend`] and selected once per
//! [`PhysicsWorld::init`].
//!
//! ## Example
//!
//! ```ignore
//! let mut physics = PhysicsWorld::new(PhysicsConfig::default());
//! physics.init(BackendKind::Rapier)?;
//! physics.on_simulation_start(&mut world)?;
//! for _ in 0..60 {
//!     physics.simulate(&mut world, 1.0 / 60.0)?;
//! }
//! physics.on_simulation_stop(&mut world)?;
//! physics.shutdown()?;
//! ```

pub mod backend;
pub mod components;
pub mod config;
pub mod conversions;
mod error;
mod handle;
pub mod layers;
pub mod shape;
mod world;

pub use backend::{
    create_backend, BackendKind, ImpulseBackend, PhysicsBackend, RapierBackend, SceneDescriptor,
};
pub use components::{
    register_physics_components, Collider, ColliderShape, LockedAxes, MotionQuality, MotionType,
    RigidBody,
};
pub use config::PhysicsConfig;
pub use error::{PhysicsError, PhysicsResult};
pub use handle::{BodyHandle, SceneHandle, ShapeHandle};
pub use layers::{LayerConfig, ObjectLayer};
pub use shape::{ShapeDescriptor, ShapeGeometry, ShapeMaterial};
pub use world::{PhysicsWorld, SimulationState, SkipReason};
