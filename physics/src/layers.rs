//! Broad-phase object layers and the per-world layer-pair filter.

use serde::{Deserialize, Serialize};

use crate::components::MotionType;
use crate::error::{PhysicsError, PhysicsResult};

/// Collision-filtering category of a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectLayer(pub u8);

impl ObjectLayer {
    /// Static geometry.
    pub const NON_MOVING: Self = Self(0);
    /// Everything that can move.
    pub const MOVING: Self = Self(1);

    /// Default layer for a body of the given motion type.
    pub fn for_motion(motion: MotionType) -> Self {
        match motion {
            MotionType::Static => Self::NON_MOVING,
            MotionType::Dynamic => Self::MOVING,
        }
    }
}

/// Layer-pair filter table passed to each scene at creation.
///
/// `collision_pairs` lists unordered pairs of layers that may collide; any pair
/// not listed is culled in the broad phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    pub layer_count: u8,
    pub collision_pairs: Vec<[u8; 2]>,
}

impl Default for LayerConfig {
    /// Non-moving collides only with moving; moving collides with everything.
    fn default() -> Self {
        Self {
            layer_count: 2,
            collision_pairs: vec![
                [ObjectLayer::NON_MOVING.0, ObjectLayer::MOVING.0],
                [ObjectLayer::MOVING.0, ObjectLayer::MOVING.0],
            ],
        }
    }
}

impl LayerConfig {
    pub const MAX_LAYERS: u8 = 32;

    pub fn should_collide(&self, a: ObjectLayer, b: ObjectLayer) -> bool {
        self.collision_pairs
            .iter()
            .any(|&[x, y]| (x == a.0 && y == b.0) || (x == b.0 && y == a.0))
    }

    /// Bit `i` is set when `layer` collides with layer `i`.
    pub fn collision_mask(&self, layer: ObjectLayer) -> u32 {
        (0..self.layer_count)
            .filter(|&other| self.should_collide(layer, ObjectLayer(other)))
            .fold(0u32, |mask, other| mask | (1u32 << other))
    }

    /// Single-bit membership mask for `layer`.
    pub fn membership(layer: ObjectLayer) -> u32 {
        1u32 << layer.0
    }

    pub fn validate(&self) -> PhysicsResult<()> {
        if self.layer_count == 0 || self.layer_count > Self::MAX_LAYERS {
            return Err(PhysicsError::Config(format!(
                "layer_count must be in 1..={}, got {}",
                Self::MAX_LAYERS,
                self.layer_count
            )));
        }
        if let Some(pair) = self
            .collision_pairs
            .iter()
            .find(|pair| pair.iter().any(|&l| l >= self.layer_count))
        {
            return Err(PhysicsError::Config(format!(
                "collision pair {pair:?} references a layer >= {}",
                self.layer_count
            )));
        }
        for motion in [MotionType::Static, MotionType::Dynamic] {
            let layer = ObjectLayer::for_motion(motion);
            if layer.0 >= self.layer_count {
                return Err(PhysicsError::Config(format!(
                    "{motion:?} bodies use layer {} but only {} layers are configured",
                    layer.0, self.layer_count
                )));
            }
        }
        Ok(())
    }
}
