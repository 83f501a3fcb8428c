//! Debug visuals
//!
//! Based on Game Engine Architecture 3rd Edition, Chapter 10.2:
//! "Debug Drawing Facilities"

pub mod draw;
pub mod collider_visualizer;

pub use draw::box_edges;
pub use collider_visualizer::{BoxColliderVisualizer, VISUALIZER_GROUP_NAME};
