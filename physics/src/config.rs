//! Physics configuration, loadable from `physics.toml`.
//!
//! ```toml
//! backend = "rapier"
//! gravity = [0.0, -9.81, 0.0]
//! worker_threads = 4
//!
//! [layers]
//! layer_count = 2
//! collision_pairs = [[0, 1], [1, 1]]
//! ```

use std::path::Path;

use origin_core::math::Vec3;
use serde::{Deserialize, Serialize};

use crate::backend::impulse::CombineRule;
use crate::backend::{BackendKind, SceneDescriptor};
use crate::error::{PhysicsError, PhysicsResult};
use crate::layers::LayerConfig;

/// Default body capacity of a scene.
pub const DEFAULT_MAX_BODIES: u32 = 20_480;
/// Default contact constraint capacity of a scene.
pub const DEFAULT_MAX_CONTACTS: u32 = 20_480;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub backend: BackendKind,
    pub gravity: [f32; 3],
    pub max_bodies: u32,
    pub max_contacts: u32,
    /// Worker threads for the job-pool backend. 0 = one less than the
    /// number of available cores (at least one).
    pub worker_threads: usize,
    /// Velocity iterations of the impulse backend's contact solver.
    pub solver_iterations: u32,
    /// How the impulse backend mixes the friction of two touching shapes.
    pub friction_combine: CombineRule,
    pub restitution_combine: CombineRule,
    pub layers: LayerConfig,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Rapier,
            gravity: [0.0, -9.81, 0.0],
            max_bodies: DEFAULT_MAX_BODIES,
            max_contacts: DEFAULT_MAX_CONTACTS,
            worker_threads: 0,
            solver_iterations: 8,
            friction_combine: CombineRule::Average,
            restitution_combine: CombineRule::Average,
            layers: LayerConfig::default(),
        }
    }
}

impl PhysicsConfig {
    /// Parses and validates a TOML document. Missing keys take defaults.
    pub fn from_toml_str(content: &str) -> PhysicsResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| PhysicsError::Config(format!("failed to parse: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> PhysicsResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        log::info!("Loaded physics config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> PhysicsResult<()> {
        if self.gravity.iter().any(|g| !g.is_finite()) {
            return Err(PhysicsError::Config(format!(
                "gravity must be finite, got {:?}",
                self.gravity
            )));
        }
        if self.max_bodies == 0 {
            return Err(PhysicsError::Config("max_bodies must be > 0".into()));
        }
        if self.solver_iterations == 0 {
            return Err(PhysicsError::Config("solver_iterations must be > 0".into()));
        }
        self.layers.validate()
    }

    pub fn gravity_vector(&self) -> Vec3 {
        Vec3::new(self.gravity[0], self.gravity[1], self.gravity[2])
    }

    /// Worker count with the `0 = auto` rule applied.
    pub fn resolved_worker_threads(&self) -> usize {
        if self.worker_threads > 0 {
            return self.worker_threads;
        }
        std::thread::available_parallelism()
            .map(|n| n.get().saturating_sub(1))
            .unwrap_or(1)
            .max(1)
    }

    pub fn scene_descriptor(&self) -> SceneDescriptor {
        SceneDescriptor {
            gravity: self.gravity_vector(),
            max_bodies: self.max_bodies,
            max_contacts: self.max_contacts,
            layers: self.layers.clone(),
        }
    }
}
