//! # Scene Engine
//!
//! A small scene runtime: nodes own components, lifecycle behaviours receive
//! per-frame and per-step callbacks, and colliders plus rigidbodies couple
//! nodes to a fixed-step physics simulation.
//!
//! ## Features
//!
//! - **Explicit world context**: no process-wide scene or layer singletons
//! - **Capability lookup**: O(1) first-match component queries by type or kind
//! - **Fixed-step physics**: rapier3d backend with layer-based contact filtering
//! - **Generation-checked handles**: stale node, behaviour and body handles are rejected
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//!
//! struct MyApp;
//!
//! impl Application for MyApp {
//!     fn setup(&mut self, engine: &mut Engine) -> Result<(), AppError> {
//!         let world = engine.world_mut();
//!         let cube = world.create_node(SceneObject::new("cube"), LAYER_MOVING);
//!         world.add_component(cube, Collider::unit_box)?;
//!         let body = world.add_component(cube, Rigidbody::dynamic)?;
//!         engine.add_body(&body);
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::with_rapier(EngineConfig::default())?;
//!     engine.init()?;
//!     engine.run(&mut MyApp, Some(120))?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod core;
pub mod config;
pub mod foundation;
pub mod events;
pub mod ecs;
pub mod scene;
pub mod physics;
pub mod debug;

mod application;
mod engine;

pub use application::{Application, AppError};
pub use engine::{Engine, EngineError};
pub use crate::core::EngineConfig;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        Application, AppError,
        Engine, EngineConfig, EngineError,
        foundation::{
            collections::{BehaviourId, BodyHandle, NodeId},
            math::{Quat, Transform, Vec3},
        },
        ecs::{
            AttachContext, Behaviour, BehaviourBase, BehaviourContext, Component, ComponentError,
            ComponentKind, ComponentRef, Hooks, LifecycleBehaviour, World,
        },
        scene::{SceneObject, SceneObjectRef, Visual},
        physics::{
            Collider, ColliderShape, LayerRegistry, MotionType, PhysicsBackend, Rigidbody,
            LAYER_MOVING, LAYER_NON_MOVING,
        },
        debug::BoxColliderVisualizer,
        core::{Config, PhysicsConfig},
    };
}
