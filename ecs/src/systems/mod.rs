mod transform_propagation;

pub use transform_propagation::{propagate_with_poses, update_global_transforms};
