use std::fmt;

/// A generational entity identifier.
///
/// - **index**: slot in the entity allocator, reused after despawn
/// - **generation**: bumped on every despawn so stale ids are rejected
///
/// Entities are plain values. They stay valid across storage reallocation and
/// are the only way components refer to each other (see [`Parent`](crate::Parent)).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index into the allocator and component sparse arrays.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the generation of this entity.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

/// Allocates and recycles entity ids.
///
/// Despawned slots go on a free list. The slot's generation is incremented on
/// deallocation, invalidating any outstanding [`Entity`] values for it.
pub(crate) struct EntityAllocator {
    /// Current generation for each slot. Index = entity index.
    generations: Vec<u32>,
    /// `true` while the slot holds a live entity.
    alive: Vec<bool>,
    /// Freed slot indices, reused last-in first-out.
    free_list: Vec<u32>,
    /// Number of live entities.
    count: u32,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self {
            generations: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            count: 0,
        }
    }

    /// Hands out a fresh id, preferring the most recently freed slot.
    pub fn allocate(&mut self) -> Entity {
        self.count += 1;

        if let Some(index) = self.free_list.pop() {
            let idx = index as usize;
            self.alive[idx] = true;
            Entity::new(index, self.generations[idx])
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            self.alive.push(true);
            Entity::new(index, 0)
        }
    }

    /// Deallocates an entity. Returns false if already dead or stale.
    pub fn deallocate(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }

        let idx = entity.index() as usize;
        self.alive[idx] = false;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free_list.push(entity.index());
        self.count -= 1;
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        let idx = entity.index() as usize;
        idx < self.alive.len() && self.alive[idx] && self.generations[idx] == entity.generation()
    }

    /// Returns the live entity occupying `index`, if any.
    pub fn entity_at(&self, index: u32) -> Option<Entity> {
        let idx = index as usize;
        (idx < self.alive.len() && self.alive[idx]).then(|| Entity::new(index, self.generations[idx]))
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Iterates over all currently alive entities in index order.
    pub fn iter_alive(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(idx, _)| Entity::new(idx as u32, self.generations[idx]))
    }
}
