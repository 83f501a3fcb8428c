//! Physics integration
//!
//! Collider and rigidbody components describe what a node should simulate,
//! a [`PhysicsBackend`] owns the simulated bodies, and the [`FixedStepLoop`]
//! decides how many fixed steps each frame owes.
//!
//! ```text
//! Collider + Rigidbody (components on a node)
//!      ↓  add / remove
//! PhysicsBackend (BasicPhysics | RapierPhysics)
//!      ↓  step(fixed_delta) × due steps, then sync
//! SceneObject world poses
//! ```
//!
//! Based on Game Engine Architecture 3rd Edition, Chapter 13:
//! "Collision and Rigid Body Dynamics"

pub mod layers;
pub mod collider;
pub mod rigidbody;
pub mod backend;
pub mod basic;
pub mod rapier_backend;
pub mod step_loop;

pub use layers::{
    BroadPhaseLayer, CollisionFilter, LayerRegistry, LAYER_MOVING, LAYER_NON_MOVING, MOVING, NON_MOVING,
};
pub use collider::{BodyShape, Collider, ColliderChange, ColliderError, ColliderKind, ColliderShape};
pub use rigidbody::{MotionType, Rigidbody, RigidbodyError};
pub use backend::{AddBodyError, BodyDesc, BodyTable, ContactEvent, PhysicsBackend, PhysicsError, TrackedBody};
pub use basic::{BasicBody, BasicPhysics};
pub use rapier_backend::{RapierBody, RapierPhysics};
pub use step_loop::{FixedStepLoop, LoopState, StopToken};
