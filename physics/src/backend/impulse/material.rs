//! Per-shape surface materials and how two of them are mixed at a contact.

use serde::{Deserialize, Serialize};

use crate::shape::ShapeMaterial;

/// How the coefficients of two touching materials are combined.
///
/// When the two materials disagree, the rule later in this list wins:
/// `Average < Min < Multiply < Max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombineRule {
    #[default]
    Average,
    Min,
    Multiply,
    Max,
}

impl CombineRule {
    fn priority(self) -> u8 {
        match self {
            Self::Average => 0,
            Self::Min => 1,
            Self::Multiply => 2,
            Self::Max => 3,
        }
    }

    /// The rule used for a pair of materials.
    pub fn resolve(a: Self, b: Self) -> Self {
        if a.priority() >= b.priority() {
            a
        } else {
            b
        }
    }

    pub fn combine(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Average => 0.5 * (a + b),
            Self::Min => a.min(b),
            Self::Multiply => a * b,
            Self::Max => a.max(b),
        }
    }
}

/// Material object owned by one impulse-backend shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub static_friction: f64,
    pub dynamic_friction: f64,
    pub restitution: f64,
    pub friction_combine: CombineRule,
    pub restitution_combine: CombineRule,
}

impl Material {
    pub fn new(
        surface: &ShapeMaterial,
        friction_combine: CombineRule,
        restitution_combine: CombineRule,
    ) -> Self {
        let mut material = Self {
            static_friction: 0.0,
            dynamic_friction: 0.0,
            restitution: 0.0,
            friction_combine,
            restitution_combine,
        };
        material.set_surface(surface);
        material
    }

    /// Replaces the coefficients, keeping the combine rules.
    pub fn set_surface(&mut self, surface: &ShapeMaterial) {
        self.static_friction = surface.static_friction.max(0.0) as f64;
        self.dynamic_friction = surface.friction.max(0.0) as f64;
        self.restitution = surface.restitution.clamp(0.0, 1.0) as f64;
    }
}

/// Coefficients of a contact between two materials.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixedMaterial {
    pub static_friction: f64,
    pub dynamic_friction: f64,
    pub restitution: f64,
}

impl MixedMaterial {
    pub fn mix(a: &Material, b: &Material) -> Self {
        let friction = CombineRule::resolve(a.friction_combine, b.friction_combine);
        let restitution = CombineRule::resolve(a.restitution_combine, b.restitution_combine);
        Self {
            static_friction: friction.combine(a.static_friction, b.static_friction),
            dynamic_friction: friction.combine(a.dynamic_friction, b.dynamic_friction),
            restitution: restitution.combine(a.restitution, b.restitution),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(friction: f32, rule: CombineRule) -> Material {
        let surface = ShapeMaterial {
            friction,
            static_friction: friction,
            restitution: 0.5,
        };
        Material::new(&surface, rule, CombineRule::Average)
    }

    #[test]
    fn higher_priority_rule_wins() {
        assert_eq!(
            CombineRule::resolve(CombineRule::Average, CombineRule::Max),
            CombineRule::Max
        );
        assert_eq!(
            CombineRule::resolve(CombineRule::Multiply, CombineRule::Min),
            CombineRule::Multiply
        );
    }

    #[test]
    fn mixing_uses_resolved_rule() {
        let ice = material(0.1, CombineRule::Min);
        let rubber = material(0.9, CombineRule::Average);
        let mixed = MixedMaterial::mix(&ice, &rubber);
        assert!((mixed.dynamic_friction - 0.1).abs() < 1e-6);

        let mixed = MixedMaterial::mix(&material(0.2, CombineRule::Average), &rubber);
        assert!((mixed.dynamic_friction - 0.55).abs() < 1e-6);
    }

    #[test]
    fn restitution_is_clamped() {
        let surface = ShapeMaterial {
            restitution: 3.0,
            ..ShapeMaterial::default()
        };
        let m = Material::new(&surface, CombineRule::Average, CombineRule::Average);
        assert_eq!(m.restitution, 1.0);
    }
}
