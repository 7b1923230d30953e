//! Typed, generational handles for backend-owned physics objects.
//!
//! A handle records which backend issued it, the slot it refers to and the
//! slot's generation at issue time. Backends reject handles from another
//! backend or from a slot that has since been released.

use std::fmt;

use crate::backend::BackendKind;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct RawHandle {
    backend: BackendKind,
    index: u32,
    generation: u32,
}

macro_rules! typed_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(RawHandle);

        impl $name {
            pub(crate) fn new(backend: BackendKind, index: u32, generation: u32) -> Self {
                Self(RawHandle { backend, index, generation })
            }

            /// Backend that issued this handle.
            pub fn backend(&self) -> BackendKind {
                self.0.backend
            }

            pub(crate) fn index(&self) -> u32 {
                self.0.index
            }

            pub(crate) fn generation(&self) -> u32 {
                self.0.generation
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(
                    f,
                    "{}({:?}:{}v{})",
                    stringify!($name),
                    self.0.backend,
                    self.0.index,
                    self.0.generation
                )
            }
        }
    };
}

typed_handle!(
    /// Reference to a simulated rigid body.
    BodyHandle
);
typed_handle!(
    /// Reference to a collision shape; attached to at most one body.
    ShapeHandle
);
typed_handle!(
    /// Reference to a backend simulation scene.
    SceneHandle
);

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Generational slot storage backing each backend's native objects.
pub(crate) struct Slots<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    len: usize,
}

impl<T> Slots<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Stores `value`, returning `(index, generation)`.
    pub fn insert(&mut self, value: T) -> (u32, u32) {
        self.len += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            (index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                value: Some(value),
            });
            (index, 0)
        }
    }

    pub fn get(&self, index: u32, generation: u32) -> Option<&T> {
        let slot = self.slots.get(index as usize)?;
        if slot.generation != generation {
            return None;
        }
        slot.value.as_ref()
    }

    pub fn get_mut(&mut self, index: u32, generation: u32) -> Option<&mut T> {
        let slot = self.slots.get_mut(index as usize)?;
        if slot.generation != generation {
            return None;
        }
        slot.value.as_mut()
    }

    /// Releases the slot, bumping its generation.
    pub fn remove(&mut self, index: u32, generation: u32) -> Option<T> {
        let slot = self.slots.get_mut(index as usize)?;
        if slot.generation != generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(index);
        self.len -= 1;
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates live entries as `(index, generation, &value)`.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.value
                .as_ref()
                .map(|value| (i as u32, slot.generation, value))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, u32, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, slot)| {
            let generation = slot.generation;
            slot.value
                .as_mut()
                .map(|value| (i as u32, generation, value))
        })
    }

    /// Removes every entry, invalidating all outstanding handles.
    pub fn clear(&mut self) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free_list.push(i as u32);
            }
        }
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_generation_is_rejected() {
        let mut slots = Slots::new();
        let (index, generation) = slots.insert("body");
        assert_eq!(slots.remove(index, generation), Some("body"));

        let (reused, new_generation) = slots.insert("other");
        assert_eq!(reused, index);
        assert_ne!(new_generation, generation);
        assert!(slots.get(index, generation).is_none());
        assert_eq!(slots.get(index, new_generation), Some(&"other"));
    }

    #[test]
    fn double_remove_is_none() {
        let mut slots = Slots::new();
        let (i, g) = slots.insert(1);
        assert!(slots.remove(i, g).is_some());
        assert!(slots.remove(i, g).is_none());
        assert!(slots.is_empty());
    }

    #[test]
    fn clear_invalidates_everything() {
        let mut slots = Slots::new();
        let a = slots.insert('a');
        let b = slots.insert('b');
        slots.clear();
        assert_eq!(slots.len(), 0);
        assert!(slots.get(a.0, a.1).is_none());
        assert!(slots.get(b.0, b.1).is_none());
        assert_eq!(slots.iter().count(), 0);
    }

    #[test]
    fn handles_compare_backend_tag() {
        let rapier = BodyHandle::new(BackendKind::Rapier, 0, 0);
        let impulse = BodyHandle::new(BackendKind::Impulse, 0, 0);
        assert_ne!(rapier, impulse);
        assert_eq!(rapier.backend(), BackendKind::Rapier);
    }
}
