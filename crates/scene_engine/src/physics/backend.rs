//! Simulation backend contract
//!
//! A backend owns the simulated world. The engine drives it through
//! [`PhysicsBackend`]: `init` once, `add`/`remove` bodies, `step` at the
//! fixed rate and `sync` once per frame. `sync` is the only path by which
//! simulation results reach scene nodes.

use std::any::Any;

use thiserror::Error;

use crate::core::PhysicsConfig;
use crate::ecs::{Component, ComponentKind, ComponentRef, World};
use crate::foundation::collections::{BodyHandle, NodeId, SlotMap};
use crate::foundation::math::{Quat, Vec3};
use crate::scene::SceneObjectRef;
use super::collider::{BodyShape, Collider, ColliderKind, ColliderShape};
use super::layers::LayerRegistry;
use super::rigidbody::{MotionType, Rigidbody};

/// Fatal backend failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// `init` has not completed
    #[error("Physics backend is not initialized")]
    NotInitialized,

    /// `init` was called twice
    #[error("Physics backend is already initialized")]
    AlreadyInitialized,

    /// Configuration values the backend cannot use
    #[error("Invalid physics configuration: {0}")]
    InvalidConfig(String),
}

/// Why a rigidbody was not added to the simulation.
///
/// Non-fatal: the node keeps rendering without a simulated body.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AddBodyError {
    /// `init` has not completed
    #[error("Physics backend is not initialized")]
    NotInitialized,

    /// The rigidbody's node no longer exists
    #[error("Node {0:?} does not exist")]
    UnknownNode(NodeId),

    /// The rigidbody is already simulated
    #[error("Rigidbody is already simulated as {0:?}")]
    AlreadySimulated(BodyHandle),

    /// The node has no collider
    #[error("Node {0:?} has no collider")]
    NoCollider(NodeId),

    /// The collider kind cannot be simulated with this motion type
    #[error("{kind:?} collider is not supported for {motion_type:?} bodies")]
    UnsupportedCollider {
        /// Collider kind
        kind: ColliderKind,
        /// Requested motion type
        motion_type: MotionType,
    },

    /// Shape parameters cannot form a simulation shape
    #[error("Invalid collider shape: {0}")]
    InvalidShape(String),

    /// The node's layer is not part of the collision filter
    #[error("Layer {0} is not registered")]
    UnknownLayer(u32),
}

/// Contact transition between two simulated nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactEvent {
    /// The bodies started touching
    Started {
        /// First node
        a: NodeId,
        /// Second node
        b: NodeId,
    },
    /// The bodies stopped touching
    Stopped {
        /// First node
        a: NodeId,
        /// Second node
        b: NodeId,
    },
}

impl ContactEvent {
    /// Both nodes involved
    pub fn nodes(&self) -> (NodeId, NodeId) {
        match *self {
            Self::Started { a, b } | Self::Stopped { a, b } => (a, b),
        }
    }
}

/// Everything a backend needs to build a body, gathered from the node
#[derive(Debug, Clone)]
pub struct BodyDesc {
    /// Owning node
    pub node: NodeId,
    /// Node's scene object
    pub object: SceneObjectRef,
    /// Initial body position: the node's world position
    pub position: Vec3,
    /// Initial body rotation: the node's world rotation
    pub rotation: Quat,
    /// Collider shape relative to the body origin
    pub shape: BodyShape,
    /// Motion classification
    pub motion_type: MotionType,
    /// Mass in kilograms
    pub mass: f32,
    /// Collision layer
    pub layer: u32,
}

impl BodyDesc {
    /// Validate a rigidbody and gather its body description. The first
    /// collider on the node in attachment order drives the shape.
    pub fn from_rigidbody(world: &World, rigidbody: &ComponentRef<Rigidbody>) -> Result<Self, AddBodyError> {
        let rb = rigidbody.borrow();
        if let Some(handle) = rb.body_handle() {
            return Err(AddBodyError::AlreadySimulated(handle));
        }
        let node_id = rb.node();
        let node = world.node(node_id).ok_or(AddBodyError::UnknownNode(node_id))?;
        let collider = node
            .get_component_of_kind::<Collider>(ComponentKind::COLLIDER)
            .ok_or(AddBodyError::NoCollider(node_id))?;
        let shape = *collider.borrow().shape();

        if matches!(shape, ColliderShape::Plane { .. }) && rb.motion_type() != MotionType::Static {
            return Err(AddBodyError::UnsupportedCollider {
                kind: ColliderKind::Plane,
                motion_type: rb.motion_type(),
            });
        }

        let world_transform = node.object().borrow().world_transform();
        let shape = shape.placed(&world_transform).map_err(AddBodyError::InvalidShape)?;

        Ok(Self {
            node: node_id,
            object: node.object().clone(),
            position: world_transform.position,
            rotation: world_transform.rotation,
            shape,
            motion_type: rb.motion_type(),
            mass: rb.mass(),
            layer: node.layer,
        })
    }
}

/// Operations every simulation backend provides
pub trait PhysicsBackend {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Build the simulation context and snapshot the collision filter.
    /// Must succeed before any `add`.
    fn init(&mut self, layers: &LayerRegistry, config: &PhysicsConfig) -> Result<(), PhysicsError>;

    /// Whether `init` has completed
    fn is_initialized(&self) -> bool;

    /// Simulate a rigidbody. On success the rigidbody records the handle.
    fn add(&mut self, world: &World, rigidbody: &ComponentRef<Rigidbody>) -> Result<BodyHandle, AddBodyError>;

    /// Stop simulating a body. Returns `false` for an unknown or stale handle.
    fn remove(&mut self, handle: BodyHandle) -> bool;

    /// Advance exactly one fixed step
    fn step(&mut self, fixed_delta: f32);

    /// Write every tracked body's pose into its node
    fn sync(&mut self, world: &World);

    /// Number of tracked bodies
    fn body_count(&self) -> usize;

    /// Contact transitions produced since the last call
    fn drain_contact_events(&mut self) -> Vec<ContactEvent> {
        Vec::new()
    }

    /// Downcasting support for backend-specific access
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcasting support
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A body tracked by a backend together with its scene-side owners
#[derive(Debug)]
pub struct TrackedBody<B> {
    /// Owning node
    pub node: NodeId,
    /// Node's scene object, written by `sync`
    pub object: SceneObjectRef,
    /// Rigidbody component
    pub rigidbody: ComponentRef<Rigidbody>,
    /// Motion type at the time of `add`
    pub motion_type: MotionType,
    /// Backend-specific body data
    pub body: B,
}

impl<B> TrackedBody<B> {
    /// Track a body described by `desc`
    pub fn new(desc: &BodyDesc, rigidbody: &ComponentRef<Rigidbody>, body: B) -> Self {
        Self {
            node: desc.node,
            object: desc.object.clone(),
            rigidbody: rigidbody.clone(),
            motion_type: desc.motion_type,
            body,
        }
    }

    /// Move the node so its world pose matches the body's
    pub fn write_pose(&self, position: Vec3, rotation: Quat) {
        self.object.borrow_mut().set_world_pose(position, rotation);
    }
}

/// Generation-checked table of tracked bodies
#[derive(Debug)]
pub struct BodyTable<B> {
    bodies: SlotMap<BodyHandle, TrackedBody<B>>,
}

impl<B> Default for BodyTable<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> BodyTable<B> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            bodies: SlotMap::with_key(),
        }
    }

    /// Track a body and hand its handle to the rigidbody
    pub fn insert_with(&mut self, make: impl FnOnce(BodyHandle) -> TrackedBody<B>) -> BodyHandle {
        let handle = self.bodies.insert_with_key(make);
        self.bodies[handle].rigidbody.borrow_mut().attach_body(handle);
        handle
    }

    /// Stop tracking a body and clear the rigidbody's handle
    pub fn remove(&mut self, handle: BodyHandle) -> Option<TrackedBody<B>> {
        let tracked = self.bodies.remove(handle)?;
        if let Ok(mut rigidbody) = tracked.rigidbody.try_borrow_mut() {
            rigidbody.detach_body();
        }
        Some(tracked)
    }

    /// Tracked body by handle
    pub fn get(&self, handle: BodyHandle) -> Option<&TrackedBody<B>> {
        self.bodies.get(handle)
    }

    /// Mutable tracked body by handle
    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut TrackedBody<B>> {
        self.bodies.get_mut(handle)
    }

    /// All tracked bodies
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &TrackedBody<B>)> {
        self.bodies.iter()
    }

    /// All tracked bodies, mutably
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyHandle, &mut TrackedBody<B>)> {
        self.bodies.iter_mut()
    }

    /// Number of tracked bodies
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Whether the handle refers to a tracked body
    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains_key(handle)
    }

    /// Node owning a tracked body
    pub fn node_of(&self, handle: BodyHandle) -> Option<NodeId> {
        self.bodies.get(handle).map(|tracked| tracked.node)
    }
}

/// Log an accepted body
pub(crate) fn log_added(backend: &str, handle: BodyHandle, desc: &BodyDesc) {
    log::debug!(
        "[{}] Added {:?} body {:?} for node {:?} on layer {}",
        backend,
        desc.motion_type,
        handle,
        desc.node,
        desc.layer
    );
}
