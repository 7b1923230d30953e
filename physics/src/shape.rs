//! Backend-facing shape descriptions.

use origin_core::math::Vec3;

/// Collision geometry in world units (entity scale already applied).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeGeometry {
    Box { half_extents: Vec3 },
    Sphere { radius: f32 },
    /// Y-axis capsule. `half_height` is the half length of the segment
    /// between the two hemisphere centers.
    Capsule { half_height: f32, radius: f32 },
}

impl ShapeGeometry {
    /// Rejects degenerate geometry: non-finite values, non-positive
    /// extents/radius, or a negative capsule half-height.
    pub fn validate(&self) -> Result<(), String> {
        let positive = |name: &str, v: f32| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(format!("{name} must be finite and > 0, got {v}"))
            }
        };
        match *self {
            Self::Box { half_extents } => {
                positive("half_extents.x", half_extents.x)?;
                positive("half_extents.y", half_extents.y)?;
                positive("half_extents.z", half_extents.z)
            }
            Self::Sphere { radius } => positive("radius", radius),
            Self::Capsule {
                half_height,
                radius,
            } => {
                if !(half_height.is_finite() && half_height >= 0.0) {
                    return Err(format!(
                        "half_height must be finite and >= 0, got {half_height}"
                    ));
                }
                positive("radius", radius)
            }
        }
    }
}

/// Everything a backend needs to build a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeDescriptor {
    pub geometry: ShapeGeometry,
    /// Local offset from the body origin.
    pub offset: Vec3,
}

/// Surface response applied to a shape after creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeMaterial {
    /// Dynamic (sliding) friction coefficient.
    pub friction: f32,
    pub static_friction: f32,
    pub restitution: f32,
}

impl ShapeMaterial {
    /// Rejects NaN or infinite coefficients, negative friction, and
    /// restitution outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), String> {
        let friction = |name: &str, v: f32| {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(format!("{name} must be finite and >= 0, got {v}"))
            }
        };
        friction("friction", self.friction)?;
        friction("static_friction", self.static_friction)?;
        if (0.0..=1.0).contains(&self.restitution) {
            Ok(())
        } else {
            Err(format!(
                "restitution must be within [0, 1], got {}",
                self.restitution
            ))
        }
    }
}

impl Default for ShapeMaterial {
    fn default() -> Self {
        Self {
            friction: 0.6,
            static_friction: 0.6,
            restitution: 0.6,
        }
    }
}
