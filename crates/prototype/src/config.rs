//! # Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! file (or no file) yields a runnable setup.
//!
//! ```toml
//! [run]
//! frames = 600
//! log_filter = "prototype=debug"
//!
//! [capacity]
//! mesh = 2048
//!
//! [scene]
//! falling_bodies = 256
//! ```

use std::path::Path;

use prototype_core::db::MAX_OBJECT_COUNT;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrototypeConfig {
    /// Frame loop settings
    pub run: RunConfig,
    /// Fixed per-type object capacities
    pub capacity: CapacityConfig,
    /// Integrator settings
    pub physics: PhysicsConfig,
    /// Demo content settings
    pub scene: SceneConfig,
}

/// Frame loop settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Frames to simulate before shutting down.
    pub frames: u32,
    /// Fixed step in seconds.
    pub delta_time: f64,
    /// Default `tracing` filter directive; `RUST_LOG` overrides it.
    pub log_filter: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            frames: 600,
            delta_time: 1.0 / 60.0,
            log_filter: "info".to_owned(),
        }
    }
}

/// Maximum live objects per registered type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CapacityConfig {
    /// `Mesh` capacity
    pub mesh: usize,
    /// `Camera` capacity
    pub camera: usize,
    /// `RigidBody` capacity
    pub rigid_body: usize,
    /// `Affector` capacity
    pub affector: usize,
    /// `Constraint` capacity
    pub constraint: usize,
}

impl CapacityConfig {
    /// Largest capacity a config file may ask for. State columns are allocated
    /// up front, so this also bounds startup memory.
    pub const MAX: usize = 1 << 22;
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            mesh: 1024,
            camera: 16,
            rigid_body: 1024,
            affector: 1024,
            constraint: 256,
        }
    }
}

/// Integrator settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhysicsConfig {
    /// World-space gravity acceleration.
    pub gravity: [f32; 3],
    /// Height of the ground plane.
    pub ground_height: f32,
    /// The ground covers `[-extent, extent]` on x and y; bodies outside fall freely.
    pub ground_half_extent: f32,
    /// Fraction of vertical speed kept after a ground bounce.
    pub restitution: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, 0.0, -10.0],
            ground_height: 0.0,
            ground_half_extent: 20.0,
            restitution: 0.5,
        }
    }
}

/// Demo content settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    /// Number of falling bodies spawned at startup.
    pub falling_bodies: usize,
    /// Falling bodies linked pairwise by distance constraints.
    pub linked_pairs: usize,
    /// Seed for spawn positions.
    pub seed: u64,
    /// Meshes below this height are destroyed.
    pub despawn_below: f32,
    /// Mean water surface height for buoyancy.
    pub water_level: f32,
    /// Water density for buoyancy forces.
    pub water_density: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            falling_bodies: 128,
            linked_pairs: 8,
            seed: 0x2545_F491_4F6C_DD1D,
            despawn_below: -50.0,
            water_level: 2.0,
            water_density: 1.0,
        }
    }
}

impl PrototypeConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`AppError::ConfigParse`] on malformed TOML or unknown keys,
    /// [`AppError::InvalidConfig`] on unusable values.
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`AppError::ConfigIo`] if the file cannot be read, otherwise as
    /// [`Self::from_toml_str`].
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| AppError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Renders the config as TOML, e.g. to write out the defaults.
    ///
    /// # Errors
    ///
    /// Fails if a value has no TOML representation.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Checks values serde cannot.
    ///
    /// # Errors
    ///
    /// [`AppError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> AppResult<()> {
        if !(self.run.delta_time.is_finite() && self.run.delta_time > 0.0) {
            return Err(AppError::InvalidConfig(format!(
                "run.delta_time must be positive, got {}",
                self.run.delta_time
            )));
        }
        let capacities = [
            ("capacity.mesh", self.capacity.mesh),
            ("capacity.camera", self.capacity.camera),
            ("capacity.rigid_body", self.capacity.rigid_body),
            ("capacity.affector", self.capacity.affector),
            ("capacity.constraint", self.capacity.constraint),
        ];
        if let Some((field, _)) = capacities.iter().find(|(_, c)| *c == 0) {
            return Err(AppError::InvalidConfig(format!("{field} must be at least 1")));
        }
        let limit = CapacityConfig::MAX.min(MAX_OBJECT_COUNT);
        if let Some((field, c)) = capacities.iter().find(|(_, c)| *c > limit) {
            return Err(AppError::InvalidConfig(format!(
                "{field} must be at most {limit}, got {c}"
            )));
        }
        if !(0.0..=1.0).contains(&self.physics.restitution) {
            return Err(AppError::InvalidConfig(format!(
                "physics.restitution must be within [0, 1], got {}",
                self.physics.restitution
            )));
        }
        Ok(())
    }
}
