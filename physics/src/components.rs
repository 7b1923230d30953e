//! Physics descriptor components.
//!
//! Attach a [`RigidBody`] and a [`Collider`] to an entity that has a
//! [`Transform`](origin_ecs::Transform). [`PhysicsWorld`](crate::PhysicsWorld)
//! materializes them into backend bodies when simulation starts and fills in
//! the handle slots; nothing else writes those slots.

use bitflags::bitflags;
use origin_core::math::{vec3_max_abs, Vec3};
use origin_ecs::World;

use crate::handle::{BodyHandle, ShapeHandle};
use crate::shape::{ShapeGeometry, ShapeMaterial};

/// How a body participates in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionType {
    /// Never moves. Collides with dynamic bodies only.
    Static,
    /// Driven by gravity, forces and contacts.
    #[default]
    Dynamic,
}

/// Collision detection quality for fast-moving bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionQuality {
    #[default]
    Discrete,
    /// Swept collision detection (CCD).
    Continuous,
}

bitflags! {
    /// Per-axis degree-of-freedom locks in world space.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LockedAxes: u8 {
        const TRANSLATION_X = 1 << 0;
        const TRANSLATION_Y = 1 << 1;
        const TRANSLATION_Z = 1 << 2;
        const ROTATION_X = 1 << 3;
        const ROTATION_Y = 1 << 4;
        const ROTATION_Z = 1 << 5;
        const ALL_TRANSLATION = Self::TRANSLATION_X.bits() | Self::TRANSLATION_Y.bits() | Self::TRANSLATION_Z.bits();
        const ALL_ROTATION = Self::ROTATION_X.bits() | Self::ROTATION_Y.bits() | Self::ROTATION_Z.bits();
    }
}

impl LockedAxes {
    /// 1.0 for free translation axes, 0.0 for locked ones.
    pub fn translation_mask(&self) -> Vec3 {
        Vec3::new(
            free(self.contains(Self::TRANSLATION_X)),
            free(self.contains(Self::TRANSLATION_Y)),
            free(self.contains(Self::TRANSLATION_Z)),
        )
    }

    /// 1.0 for free rotation axes, 0.0 for locked ones.
    pub fn rotation_mask(&self) -> Vec3 {
        Vec3::new(
            free(self.contains(Self::ROTATION_X)),
            free(self.contains(Self::ROTATION_Y)),
            free(self.contains(Self::ROTATION_Z)),
        )
    }
}

fn free(locked: bool) -> f32 {
    if locked {
        0.0
    } else {
        1.0
    }
}

/// Rigid body descriptor.
///
/// The body handle is `None` until the entity is instantiated into a running
/// simulation and is reset to `None` when simulation stops.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    pub motion_type: MotionType,
    pub locked_axes: LockedAxes,
    pub motion_quality: MotionQuality,
    /// Total mass in kilograms.
    pub mass: f32,
    /// Center of mass in body-local space.
    pub center_of_mass: Vec3,
    pub use_gravity: bool,
    /// Gravity multiplier, applied only when `use_gravity` is set.
    pub gravity_scale: f32,
    pub allow_sleeping: bool,
    pub(crate) body: Option<BodyHandle>,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            motion_type: MotionType::Dynamic,
            locked_axes: LockedAxes::empty(),
            motion_quality: MotionQuality::Discrete,
            mass: 1.0,
            center_of_mass: Vec3::zeros(),
            use_gravity: true,
            gravity_scale: 1.0,
            allow_sleeping: true,
            body: None,
        }
    }
}

impl RigidBody {
    pub fn dynamic() -> Self {
        Self::default()
    }

    pub fn fixed() -> Self {
        Self {
            motion_type: MotionType::Static,
            ..Self::default()
        }
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_center_of_mass(mut self, center: Vec3) -> Self {
        self.center_of_mass = center;
        self
    }

    pub fn with_locked_axes(mut self, axes: LockedAxes) -> Self {
        self.locked_axes = axes;
        self
    }

    pub fn with_motion_quality(mut self, quality: MotionQuality) -> Self {
        self.motion_quality = quality;
        self
    }

    pub fn with_gravity(mut self, use_gravity: bool) -> Self {
        self.use_gravity = use_gravity;
        self
    }

    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    pub fn with_sleeping(mut self, allow: bool) -> Self {
        self.allow_sleeping = allow;
        self
    }

    /// Gravity multiplier the backend should apply.
    pub fn effective_gravity_scale(&self) -> f32 {
        if self.use_gravity {
            self.gravity_scale
        } else {
            0.0
        }
    }

    /// Handle of the simulated body, if instantiated.
    pub fn handle(&self) -> Option<BodyHandle> {
        self.body
    }
}

/// Collider geometry in local, unscaled units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    /// Box with full edge lengths `size`.
    Box { size: Vec3 },
    Sphere { radius: f32 },
    /// Y-axis capsule.
    Capsule { half_height: f32, radius: f32 },
}

impl ColliderShape {
    /// Applies an entity's world scale to the local geometry.
    ///
    /// Spheres take the largest scale component; capsules scale their height
    /// by Y and their radius by the larger of X and Z.
    pub fn scaled(&self, scale: Vec3) -> ShapeGeometry {
        let scale = scale.abs();
        match *self {
            Self::Box { size } => ShapeGeometry::Box {
                half_extents: (size * 0.5).component_mul(&scale),
            },
            Self::Sphere { radius } => ShapeGeometry::Sphere {
                radius: radius * vec3_max_abs(scale),
            },
            Self::Capsule {
                half_height,
                radius,
            } => ShapeGeometry::Capsule {
                half_height: half_height * scale.y,
                radius: radius * scale.x.max(scale.z),
            },
        }
    }
}

/// Collider descriptor: one shape variant plus surface material.
#[derive(Debug, Clone, PartialEq)]
pub struct Collider {
    pub shape: ColliderShape,
    /// Shape position relative to the body origin.
    pub offset: Vec3,
    pub friction: f32,
    pub static_friction: f32,
    pub restitution: f32,
    pub(crate) shape_handle: Option<ShapeHandle>,
}

impl Collider {
    pub fn new(shape: ColliderShape) -> Self {
        Self {
            shape,
            offset: Vec3::zeros(),
            friction: 0.6,
            static_friction: 0.6,
            restitution: 0.6,
            shape_handle: None,
        }
    }

    /// Box with full edge lengths.
    pub fn cuboid(size: Vec3) -> Self {
        Self::new(ColliderShape::Box { size })
    }

    pub fn sphere(radius: f32) -> Self {
        Self::new(ColliderShape::Sphere { radius })
    }

    pub fn capsule(half_height: f32, radius: f32) -> Self {
        Self::new(ColliderShape::Capsule {
            half_height,
            radius,
        })
    }

    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_static_friction(mut self, friction: f32) -> Self {
        self.static_friction = friction;
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn material(&self) -> ShapeMaterial {
        ShapeMaterial {
            friction: self.friction,
            static_friction: self.static_friction,
            restitution: self.restitution,
        }
    }

    /// Handle of the backend shape, if instantiated.
    pub fn handle(&self) -> Option<ShapeHandle> {
        self.shape_handle
    }
}

/// Registers [`RigidBody`] and [`Collider`] storage.
pub fn register_physics_components(world: &mut World) {
    world.register_component::<RigidBody>();
    world.register_component::<Collider>();
}
