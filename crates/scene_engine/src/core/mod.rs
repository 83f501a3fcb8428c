//! # Core Engine Module
//!
//! Shared configuration types used by the frame driver and the physics
//! backends.

pub mod config;

pub use config::{
    EngineConfig,
    PhysicsConfig,
    FrameConfig,
    LoggingConfig,
    Config,
    ConfigError,
};
