mod hierarchy;
mod name;
mod transform;

pub use hierarchy::{Children, Parent};
pub use name::Name;
pub use transform::{GlobalTransform, Transform};

use crate::World;

/// Registers every scene component defined by this crate.
pub fn register_scene_components(world: &mut World) {
    world.register_component::<Transform>();
    world.register_component::<GlobalTransform>();
    world.register_component::<Parent>();
    world.register_component::<Children>();
    world.register_component::<Name>();
}
