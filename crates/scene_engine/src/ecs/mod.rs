//! Nodes, components and behaviours
//!
//! A node owns an ordered list of components. Lookup by concrete type or by
//! [`ComponentKind`] capability returns the first match in attachment order
//! through a per-node index. Behaviours registered with the frame driver
//! receive the lifecycle callbacks they declare.

pub mod component;
pub mod node;
pub mod world;
pub mod behaviour;
pub mod lifecycle;

pub use component::{Component, ComponentError, ComponentKind, ComponentRef};
pub use node::{AttachContext, Node};
pub use world::World;
pub use behaviour::{Behaviour, BehaviourBase, BehaviourContext, Hooks, LifecycleBehaviour};
pub use lifecycle::BehaviourRegistry;
