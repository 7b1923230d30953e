use std::any::TypeId;
use std::collections::HashMap;

use crate::entity::{Entity, EntityAllocator};
use crate::sparse_set::{ComponentStorage, SparseSet};

/// Error returned when a component type has not been registered in the [`World`].
#[derive(Debug)]
pub struct ComponentNotRegistered {
    /// The name of the unregistered component type.
    pub type_name: &'static str,
}

impl std::fmt::Display for ComponentNotRegistered {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Component type `{}` has never been registered. Call register_component() first.",
            self.type_name
        )
    }
}

impl std::error::Error for ComponentNotRegistered {}

/// A scene: entities plus their components.
///
/// Each World is fully self-contained; several can coexist in one process.
///
/// # Example
///
/// ```
/// use origin_ecs::World;
///
/// struct Health(f32);
///
/// let mut world = World::new();
/// world.register_component::<Health>();
///
/// let entity = world.spawn();
/// world.insert(entity, Health(100.0)).unwrap();
/// assert_eq!(world.get::<Health>(entity).map(|h| h.0), Some(100.0));
/// ```
pub struct World {
    entities: EntityAllocator,
    components: HashMap<TypeId, Box<dyn ComponentStorage>>,
}

impl World {
    pub fn new() -> Self {
        Self {
            entities: EntityAllocator::new(),
            components: HashMap::new(),
        }
    }

    // ---- Entity management ----

    /// Spawns a new entity and returns its id.
    pub fn spawn(&mut self) -> Entity {
        self.entities.allocate()
    }

    /// Despawns an entity, removing all its components.
    ///
    /// Returns `false` if the entity was already dead.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.entities.deallocate(entity) {
            return false;
        }

        let index = entity.index();
        for storage in self.components.values_mut() {
            storage.remove_untyped(index);
        }
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Returns the number of alive entities.
    pub fn entity_count(&self) -> u32 {
        self.entities.count()
    }

    /// Iterates over all currently alive entity ids.
    pub fn iter_entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter_alive()
    }

    // ---- Components ----

    /// Registers a component type. Registering twice is a no-op.
    pub fn register_component<T: Send + Sync + 'static>(&mut self) {
        self.components
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(SparseSet::<T>::new()));
    }

    pub fn is_component_registered<T: 'static>(&self) -> bool {
        self.components.contains_key(&TypeId::of::<T>())
    }

    /// Inserts a component on an entity, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentNotRegistered`] if `T` has never been registered
    /// via [`register_component`](World::register_component).
    ///
    /// # Panics
    ///
    /// Panics if the entity is not alive.
    pub fn insert<T: Send + Sync + 'static>(
        &mut self,
        entity: Entity,
        component: T,
    ) -> Result<(), ComponentNotRegistered> {
        assert!(
            self.entities.is_alive(entity),
            "Cannot insert component on dead entity {entity}"
        );

        let storage = self
            .storage_mut::<T>()
            .ok_or(ComponentNotRegistered {
                type_name: std::any::type_name::<T>(),
            })?;
        storage.insert(entity.index(), component);
        Ok(())
    }

    /// Removes a component from an entity, returning it.
    pub fn remove<T: 'static>(&mut self, entity: Entity) -> Option<T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.storage_mut::<T>()?.remove(entity.index())
    }

    pub fn get<T: 'static>(&self, entity: Entity) -> Option<&T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.storage::<T>()?.get(entity.index())
    }

    pub fn get_mut<T: 'static>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.storage_mut::<T>()?.get_mut(entity.index())
    }

    pub fn has<T: 'static>(&self, entity: Entity) -> bool {
        self.get::<T>(entity).is_some()
    }

    /// Collects every alive entity that has a `T` component.
    ///
    /// Returns an owned list so callers can mutate the world while walking it.
    pub fn entities_with<T: 'static>(&self) -> Vec<Entity> {
        let Some(storage) = self.storage::<T>() else {
            return Vec::new();
        };
        storage
            .entity_indices()
            .iter()
            .filter_map(|&index| self.entities.entity_at(index))
            .collect()
    }

    /// Shared access to the whole storage of `T`.
    pub fn storage<T: 'static>(&self) -> Option<&SparseSet<T>> {
        self.components
            .get(&TypeId::of::<T>())?
            .as_any()
            .downcast_ref::<SparseSet<T>>()
    }

    fn storage_mut<T: 'static>(&mut self) -> Option<&mut SparseSet<T>> {
        self.components
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<SparseSet<T>>()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
