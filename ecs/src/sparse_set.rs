use std::any::Any;

/// Typed sparse set storing components of type T.
///
/// Uses a sparse array (entity index → dense index) and a dense array
/// (contiguous component data + entity mapping) for O(1) insert/remove/get
/// and cache-friendly iteration.
pub struct SparseSet<T: 'static> {
    /// `entity_index -> dense_index`. `None` means the entity does not have
    /// this component.
    sparse: Vec<Option<u32>>,
    dense: Vec<T>,
    /// Entity indices corresponding to each dense element.
    entities: Vec<u32>,
}

impl<T: 'static> SparseSet<T> {
    pub fn new() -> Self {
        Self {
            sparse: Vec::new(),
            dense: Vec::new(),
            entities: Vec::new(),
        }
    }

    /// Inserts a component for the given entity index.
    /// If the entity already has this component, the value is replaced.
    pub fn insert(&mut self, entity_index: u32, value: T) {
        let idx = entity_index as usize;
        if idx >= self.sparse.len() {
            self.sparse.resize(idx + 1, None);
        }

        if let Some(dense_idx) = self.sparse[idx] {
            self.dense[dense_idx as usize] = value;
        } else {
            self.sparse[idx] = Some(self.dense.len() as u32);
            self.dense.push(value);
            self.entities.push(entity_index);
        }
    }

    /// Removes the component for the given entity index (swap-remove).
    pub fn remove(&mut self, entity_index: u32) -> Option<T> {
        let dense_idx = self.sparse.get(entity_index as usize).copied().flatten()? as usize;
        self.sparse[entity_index as usize] = None;

        let last = self.dense.len() - 1;
        if dense_idx != last {
            let moved = self.entities[last];
            self.sparse[moved as usize] = Some(dense_idx as u32);
        }
        self.entities.swap_remove(dense_idx);
        Some(self.dense.swap_remove(dense_idx))
    }

    pub fn get(&self, entity_index: u32) -> Option<&T> {
        let dense_idx = self.sparse.get(entity_index as usize).copied().flatten()?;
        self.dense.get(dense_idx as usize)
    }

    pub fn get_mut(&mut self, entity_index: u32) -> Option<&mut T> {
        let dense_idx = self.sparse.get(entity_index as usize).copied().flatten()?;
        self.dense.get_mut(dense_idx as usize)
    }

    pub fn contains(&self, entity_index: u32) -> bool {
        matches!(self.sparse.get(entity_index as usize), Some(Some(_)))
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Iterates `(entity_index, &component)` in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.entities.iter().copied().zip(self.dense.iter())
    }

    /// Iterates `(entity_index, &mut component)` in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut T)> {
        self.entities.iter().copied().zip(self.dense.iter_mut())
    }

    /// Entity indices that currently hold this component.
    pub fn entity_indices(&self) -> &[u32] {
        &self.entities
    }
}

impl<T: 'static> Default for SparseSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased view of a [`SparseSet`], used by [`World`](crate::World) to
/// clean up every storage when an entity is despawned.
pub(crate) trait ComponentStorage: Send + Sync {
    fn remove_untyped(&mut self, entity_index: u32) -> bool;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Send + Sync + 'static> ComponentStorage for SparseSet<T> {
    fn remove_untyped(&mut self, entity_index: u32) -> bool {
        self.remove(entity_index).is_some()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
