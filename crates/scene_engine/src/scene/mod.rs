//! Scene management
//!
//! Scene objects carry the transforms nodes own, the [`Scene`] is the set
//! registered for drawing, and a [`Renderer`] consumes it each frame.
//!
//! ```text
//! World (nodes + components)
//!      ↓  create_node / destroy_node
//! Scene (registered root objects)
//!      ↓  once per frame
//! Renderer
//! ```

mod scene_object;
mod scene_graph;
mod scene_renderer;

pub use scene_object::{attach_child, detach, LineSegment, SceneObject, SceneObjectRef, Visual};
pub use scene_graph::Scene;
pub use scene_renderer::{HeadlessRenderer, RenderError, Renderer};
