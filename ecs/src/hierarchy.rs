//! Parent-child hierarchy operations.
//!
//! All operations keep [`Parent`] and [`Children`] consistent with each other.
//!
//! ```ignore
//! set_parent(&mut world, child, parent)?;
//! remove_parent(&mut world, child);
//! despawn_recursive(&mut world, entity);
//! ```

use crate::components::{Children, GlobalTransform, Parent, Transform};
use crate::world::ComponentNotRegistered;
use crate::{Entity, World};

/// Reasons [`set_parent`] can refuse a relationship.
#[derive(Debug)]
pub enum HierarchyError {
    /// An entity cannot be its own parent.
    SelfParent(Entity),
    /// `parent` is already a descendant of `entity`.
    Cycle { entity: Entity, parent: Entity },
    /// One of the entities is not alive.
    DeadEntity(Entity),
    /// [`Parent`] or [`Children`] storage was never registered.
    NotRegistered(ComponentNotRegistered),
}

impl std::fmt::Display for HierarchyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfParent(e) => write!(f, "Cannot set entity as its own parent: {e}"),
            Self::Cycle { entity, parent } => {
                write!(f, "Parenting {entity} under {parent} would create a cycle")
            }
            Self::DeadEntity(e) => write!(f, "Entity {e} is not alive"),
            Self::NotRegistered(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for HierarchyError {}

impl From<ComponentNotRegistered> for HierarchyError {
    fn from(err: ComponentNotRegistered) -> Self {
        Self::NotRegistered(err)
    }
}

/// Sets `entity` as a child of `parent`.
///
/// If `entity` already has a different parent it is detached from it first.
pub fn set_parent(world: &mut World, entity: Entity, parent: Entity) -> Result<(), HierarchyError> {
    if entity == parent {
        return Err(HierarchyError::SelfParent(entity));
    }
    for e in [entity, parent] {
        if !world.is_alive(e) {
            return Err(HierarchyError::DeadEntity(e));
        }
    }
    if ancestors(world, parent).any(|a| a == entity) {
        return Err(HierarchyError::Cycle { entity, parent });
    }

    if let Some(old_parent) = world.get::<Parent>(entity).map(|p| p.0) {
        if old_parent == parent {
            return Ok(());
        }
        if let Some(children) = world.get_mut::<Children>(old_parent) {
            children.0.retain(|&e| e != entity);
        }
    }

    world.insert(entity, Parent(parent))?;

    if let Some(children) = world.get_mut::<Children>(parent) {
        if !children.0.contains(&entity) {
            children.0.push(entity);
        }
    } else {
        world.insert(parent, Children(vec![entity]))?;
    }
    Ok(())
}

/// Detaches `entity` from its parent. Does nothing for roots.
pub fn remove_parent(world: &mut World, entity: Entity) {
    let Some(parent) = world.remove::<Parent>(entity) else {
        return;
    };
    if let Some(children) = world.get_mut::<Children>(parent.0) {
        children.0.retain(|&e| e != entity);
    }
}

/// Walks from `entity`'s parent up to the root. Stops at the first dead parent.
pub fn ancestors(world: &World, entity: Entity) -> impl Iterator<Item = Entity> + '_ {
    let mut current = entity;
    std::iter::from_fn(move || {
        let parent = world.get::<Parent>(current)?.0;
        if !world.is_alive(parent) {
            return None;
        }
        current = parent;
        Some(parent)
    })
}

/// Returns every descendant of `entity`, parents before their children.
pub fn descendants(world: &World, entity: Entity) -> Vec<Entity> {
    let mut out = Vec::new();
    let mut stack: Vec<Entity> = children_of(world, entity).into_iter().rev().collect();
    while let Some(e) = stack.pop() {
        out.push(e);
        stack.extend(children_of(world, e).into_iter().rev());
    }
    out
}

fn children_of(world: &World, entity: Entity) -> Vec<Entity> {
    world
        .get::<Children>(entity)
        .map(|c| c.0.clone())
        .unwrap_or_default()
}

/// Computes the world transform of `entity` by composing its parent chain on
/// demand, without relying on cached [`GlobalTransform`] values.
///
/// Returns `None` if the entity has no [`Transform`]. Ancestors without a
/// `Transform` contribute identity.
pub fn world_transform_of(world: &World, entity: Entity) -> Option<GlobalTransform> {
    let local = *world.get::<Transform>(entity)?;
    let chain: Vec<Entity> = ancestors(world, entity).collect();

    let mut accumulated = GlobalTransform::identity();
    for ancestor in chain.iter().rev() {
        if let Some(t) = world.get::<Transform>(*ancestor) {
            accumulated = accumulated.mul_transform(t);
        }
    }
    Some(accumulated.mul_transform(&local))
}

/// Despawns an entity and all its descendants.
pub fn despawn_recursive(world: &mut World, entity: Entity) {
    remove_parent(world, entity);
    for e in descendants(world, entity).into_iter().rev() {
        world.despawn(e);
    }
    world.despawn(entity);
}
