use crate::{Entity, World};

/// Human-readable label for an entity, used in diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Formats an entity for log output: `"crate (Entity(3v0))"` when it has a
    /// [`Name`], otherwise just the id.
    pub fn label(world: &World, entity: Entity) -> String {
        match world.get::<Name>(entity) {
            Some(name) => format!("{} ({entity})", name.0),
            None => entity.to_string(),
        }
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
