//! Render collaborator boundary
//!
//! The frame driver hands the final scene to a [`Renderer`] once per frame,
//! after every behaviour has run. Drawing itself lives outside this crate;
//! [`HeadlessRenderer`] stands in when there is no surface.

use thiserror::Error;

use super::scene_graph::Scene;

/// Render collaborator errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// The drawing surface is gone
    #[error("Render surface lost: {0}")]
    SurfaceLost(String),

    /// Any other backend failure
    #[error("Render backend error: {0}")]
    Backend(String),
}

/// Consumes final node transforms once per frame
pub trait Renderer {
    /// Draw the scene
    fn render(&mut self, scene: &Scene) -> Result<(), RenderError>;
}

/// Renderer that draws nothing and records what it was given
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    frames_rendered: u64,
    last_object_count: usize,
}

impl HeadlessRenderer {
    /// Create a headless renderer
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames rendered so far
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Objects (roots and descendants) seen in the last frame
    pub fn last_object_count(&self) -> usize {
        self.last_object_count
    }
}

impl Renderer for HeadlessRenderer {
    fn render(&mut self, scene: &Scene) -> Result<(), RenderError> {
        self.frames_rendered += 1;
        self.last_object_count = scene.object_count();
        log::trace!(
            "Headless frame {} with {} objects",
            self.frames_rendered,
            self.last_object_count
        );
        Ok(())
    }
}
