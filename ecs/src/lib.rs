//! # Origin ECS
//!
//! The scene graph: entities, component storage and the transform hierarchy.
//!
//! ## Core Types
//!
//! - [`Entity`] - Generational entity identifier
//! - [`World`] - Entity allocator plus per-type sparse-set component storage
//! - [`SparseSet`] - Dense component storage keyed by entity index
//!
//! ## Transforms
//!
//! - [`Transform`] / [`GlobalTransform`] - Local and world TRS
//! - [`Parent`] / [`Children`] - Hierarchy links, maintained by [`hierarchy`]
//! - [`update_global_transforms`] - Top-down world transform resolution
//! - [`propagate_with_poses`] - Same pass with externally simulated poses

pub mod components;
mod entity;
pub mod hierarchy;
mod sparse_set;
pub mod systems;
mod world;

pub use components::{
    register_scene_components, Children, GlobalTransform, Name, Parent, Transform,
};
pub use entity::Entity;
pub use hierarchy::HierarchyError;
pub use sparse_set::SparseSet;
pub use systems::{propagate_with_poses, update_global_transforms};
pub use world::{ComponentNotRegistered, World};
