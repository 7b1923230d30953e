use crate::Entity;

/// Points at the entity this one is attached to.
///
/// The reference is an [`Entity`] id, never a borrow, so the entity store can
/// grow or recycle slots underneath it. Maintained by
/// [`set_parent`](crate::hierarchy::set_parent); a stale parent id is treated
/// as "no parent" by transform propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parent(pub Entity);

/// Ordered child list, kept in sync with [`Parent`] by the hierarchy functions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Children(pub Vec<Entity>);

impl Children {
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.0.contains(&entity)
    }
}
