//! Component trait and capability kinds
//!
//! Components are exclusively owned by one node and keep a non-owning
//! [`NodeId`] back-reference to it. Each component reports a
//! [`ComponentKind`] capability set so nodes can answer "first component
//! that is a collider" in O(1) without probing concrete types.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use bitflags::bitflags;
use thiserror::Error;

use crate::foundation::collections::NodeId;

bitflags! {
    /// Capability set a component satisfies in kind queries.
    ///
    /// A box collider reports `COLLIDER | BOX_COLLIDER`, so it answers both
    /// the general and the specific query.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ComponentKind: u32 {
        /// Can be enabled and disabled
        const BEHAVIOUR = 1 << 0;
        /// Receives lifecycle callbacks from the frame driver
        const LIFECYCLE = 1 << 1;
        /// Any collider shape
        const COLLIDER = 1 << 2;
        /// Box collider
        const BOX_COLLIDER = 1 << 3;
        /// Sphere collider
        const SPHERE_COLLIDER = 1 << 4;
        /// Plane collider
        const PLANE_COLLIDER = 1 << 5;
        /// Couples the node to a simulated body
        const RIGIDBODY = 1 << 6;
        /// Produces render-visible output
        const VISUAL = 1 << 7;

        /// Enableable component with lifecycle callbacks
        const LIFECYCLE_BEHAVIOUR = Self::BEHAVIOUR.bits() | Self::LIFECYCLE.bits();
    }
}

/// Number of distinct capability bits a node indexes
pub const KIND_BITS: usize = u32::BITS as usize;

/// Shared, mutable handle to a component stored on a node
pub type ComponentRef<T> = Rc<RefCell<T>>;

/// Unit of data or behaviour attached to exactly one node
pub trait Component: Any {
    /// Owning node
    fn node(&self) -> NodeId;

    /// Capabilities this component satisfies. Read once, when attached.
    fn kinds(&self) -> ComponentKind {
        ComponentKind::empty()
    }

    /// Release render-visible side effects before the node goes away
    fn on_destroy(&mut self) {}
}

/// Component construction and attachment failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    /// The node does not exist (never created or already destroyed)
    #[error("Node {0:?} does not exist")]
    UnknownNode(NodeId),

    /// A component requires a peer component the node does not have
    #[error("{component} requires a {required} on node {node:?}")]
    MissingPeer {
        /// Component being constructed
        component: &'static str,
        /// Peer it needs
        required: &'static str,
        /// Node it was attached to
        node: NodeId,
    },

    /// Rigidbody parameters were rejected
    #[error(transparent)]
    Rigidbody(#[from] crate::physics::RigidbodyError),
}
