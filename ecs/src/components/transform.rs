//! Transform components for positioning entities in 3D space.
//!
//! [`Transform`] is the local pose relative to the parent entity (or the world
//! origin for roots). [`GlobalTransform`] is the cached world pose computed by
//! [`update_global_transforms`](crate::update_global_transforms).

use origin_core::math::{
    mat4_from_scale_rotation_translation, quat_identity, quat_inverse, quat_normalize,
    quat_rotate_vec3, vec3_div_or_zero, Mat4, Quat, Vec3,
};

/// Local transform describing position, rotation, and scale relative to a parent.
///
/// ```
/// use origin_ecs::Transform;
/// use origin_core::math::{quat_from_rotation_y, Vec3};
///
/// let transform = Transform::from_xyz(1.0, 2.0, 3.0)
///     .with_rotation(quat_from_rotation_y(std::f32::consts::FRAC_PI_2))
///     .with_scale(Vec3::new(2.0, 2.0, 2.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// No translation, no rotation, unit scale.
    pub fn identity() -> Self {
        Self {
            translation: Vec3::zeros(),
            rotation: quat_identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self::from_translation(Vec3::new(x, y, z))
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            rotation,
            ..Self::identity()
        }
    }

    #[must_use]
    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Computes the local transformation matrix.
    pub fn compute_matrix(&self) -> Mat4 {
        mat4_from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// World-space transform, derived from the [`Transform`] hierarchy.
///
/// Stored as translation/rotation/scale so physics can read and overwrite the
/// pose directly. The renderer consumes [`to_matrix`](GlobalTransform::to_matrix).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for GlobalTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<Transform> for GlobalTransform {
    fn from(t: Transform) -> Self {
        Self {
            translation: t.translation,
            rotation: t.rotation,
            scale: t.scale,
        }
    }
}

impl GlobalTransform {
    pub fn identity() -> Self {
        Transform::identity().into()
    }

    /// Composes `self ∘ local`: the world transform of a child whose local
    /// transform is `local` and whose parent's world transform is `self`.
    ///
    /// Scale is applied to the child's translation before rotation and is
    /// multiplied component-wise without being rotated.
    pub fn mul_transform(&self, local: &Transform) -> GlobalTransform {
        let scaled = self.scale.component_mul(&local.translation);
        GlobalTransform {
            translation: self.translation + quat_rotate_vec3(self.rotation, scaled),
            rotation: quat_normalize(self.rotation * local.rotation),
            scale: self.scale.component_mul(&local.scale),
        }
    }

    /// Back-solves the local transform a child needs so that
    /// `self.mul_transform(&local)` reproduces `world`.
    ///
    /// `world.scale` is ignored; the returned local keeps `local_scale`.
    /// Axes where this transform has zero scale map to zero local translation.
    pub fn local_for(&self, world_translation: Vec3, world_rotation: Quat, local_scale: Vec3) -> Transform {
        let inv_rotation = quat_inverse(self.rotation);
        let delta = quat_rotate_vec3(inv_rotation, world_translation - self.translation);
        Transform {
            translation: vec3_div_or_zero(delta, self.scale),
            rotation: quat_normalize(inv_rotation * world_rotation),
            scale: local_scale,
        }
    }

    /// Computes the world matrix for rendering.
    pub fn to_matrix(&self) -> Mat4 {
        mat4_from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}
