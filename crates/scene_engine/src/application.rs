//! Application trait and lifecycle management

use crate::config::ConfigError;
use crate::ecs::ComponentError;
use crate::engine::{Engine, EngineError};
use thiserror::Error;

/// Application lifecycle trait
///
/// Implement this trait to drive a scene with [`Engine::run`].
pub trait Application {
    /// Build the scene
    ///
    /// Called once after the engine is initialized and before it starts.
    /// Create nodes, attach components, add bodies and register behaviours
    /// here.
    fn setup(&mut self, engine: &mut Engine) -> Result<(), AppError>;

    /// Called after every frame with that frame's delta in seconds
    fn on_frame(&mut self, _engine: &mut Engine, _delta_time: f32) -> Result<(), AppError> {
        Ok(())
    }

    /// Called once when the main loop ends
    fn teardown(&mut self, _engine: &mut Engine) {}
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Engine error propagated to application level
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Scene construction failed
    #[error("Component error: {0}")]
    Component(#[from] ComponentError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),
}
