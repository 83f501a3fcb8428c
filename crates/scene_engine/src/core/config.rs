//! # Engine Configuration
//!
//! Configuration for the fixed-step simulation, the frame loop and logging.
//! Every struct derives serde so a whole [`EngineConfig`] can be stored as
//! TOML or RON through the [`Config`] trait.
//!
//! ## Defaults
//!
//! - Simulation runs at 1/30 s per step under (0, -9.81, 0) gravity
//! - Bodies bounce with restitution 0.5
//! - The blocking run loop paces frames at 60 FPS

use serde::{Serialize, Deserialize};

use crate::foundation::math::Vec3;

pub use crate::config::{Config, ConfigError};

/// Default simulation step in seconds
pub const DEFAULT_FIXED_DELTA: f32 = 1.0 / 30.0;

/// # Physics Configuration
///
/// Parameters handed to a physics backend at `init`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Seconds advanced by one simulation step
    pub fixed_delta: f32,
    /// Gravity acceleration in world units per second squared
    pub gravity: [f32; 3],
    /// Restitution applied to every collider
    pub restitution: f32,
    /// Worker budget requested from the backend
    pub max_worker_threads: usize,
    /// Upper bound on steps run to catch up after a stall
    pub max_catch_up_steps: u32,
}

impl PhysicsConfig {
    /// Gravity as a vector
    pub fn gravity_vector(&self) -> Vec3 {
        Vec3::new(self.gravity[0], self.gravity[1], self.gravity[2])
    }

    /// Set the fixed step
    pub fn with_fixed_delta(mut self, fixed_delta: f32) -> Self {
        self.fixed_delta = fixed_delta;
        self
    }

    /// Set gravity
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = [gravity.x, gravity.y, gravity.z];
        self
    }

    /// Validate simulation parameters
    pub fn validate(&self) -> Result<(), String> {
        if !self.fixed_delta.is_finite() || self.fixed_delta <= 0.0 {
            return Err(format!("fixed_delta must be a positive number, got {}", self.fixed_delta));
        }
        if self.gravity.iter().any(|g| !g.is_finite()) {
            return Err(format!("gravity must be finite, got {:?}", self.gravity));
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(format!("restitution must lie in [0, 1], got {}", self.restitution));
        }
        if self.max_catch_up_steps == 0 {
            return Err("max_catch_up_steps must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            fixed_delta: DEFAULT_FIXED_DELTA,
            gravity: [0.0, -9.81, 0.0],
            restitution: 0.5,
            max_worker_threads: 1,
            max_catch_up_steps: 5,
        }
    }
}

/// # Frame Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Frame rate the blocking run loop paces itself to
    pub target_fps: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self { target_fps: 60 }
    }
}

/// # Logging Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level filter; `RUST_LOG` takes precedence
    pub level: String,
}

impl LoggingConfig {
    /// Parse the configured level, falling back to `Info`
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

/// # Engine Configuration
///
/// Top-level configuration consumed by [`Engine::new`](crate::Engine::new).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Simulation parameters
    pub physics: PhysicsConfig,
    /// Frame loop parameters
    pub frame: FrameConfig,
    /// Logging parameters
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the physics section
    pub fn with_physics(mut self, physics: PhysicsConfig) -> Self {
        self.physics = physics;
        self
    }

    /// Set target FPS
    pub fn with_target_fps(mut self, fps: u32) -> Self {
        self.frame.target_fps = fps;
        self
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.logging.level = level.into();
        self
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.physics.validate().map_err(ConfigError::Invalid)?;
        if self.frame.target_fps == 0 {
            return Err(ConfigError::Invalid("target_fps must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl Config for EngineConfig {}
