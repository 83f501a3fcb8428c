//! Rigidbody component
//!
//! Couples a node's transform to a simulated body. The pose accessors read
//! and write the node's scene object directly; there is no private copy, so
//! moving the node and moving the rigidbody are the same operation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ecs::{AttachContext, Component, ComponentKind};
use crate::foundation::collections::{BodyHandle, NodeId};
use crate::foundation::math::{Quat, Vec3};
use crate::scene::SceneObjectRef;

/// How the simulation treats a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MotionType {
    /// Never moves
    Static,
    /// Moved by forces and contacts
    #[default]
    Dynamic,
    /// Moved by its node, pushes dynamic bodies
    Kinematic,
}

/// Rejected rigidbody changes
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RigidbodyError {
    /// Motion type is fixed while the body is simulated
    #[error("Motion type of simulated body {handle:?} cannot change; remove the body first")]
    MotionTypeLocked {
        /// Handle of the simulated body
        handle: BodyHandle,
    },

    /// Mass must be positive and finite
    #[error("Invalid mass {0}")]
    InvalidMass(f32),
}

/// Rigidbody component
#[derive(Debug)]
pub struct Rigidbody {
    node: NodeId,
    object: SceneObjectRef,
    mass: f32,
    motion_type: MotionType,
    body: Option<BodyHandle>,
}

impl Rigidbody {
    /// Rigidbody with a given mass and motion type
    pub fn new(ctx: &AttachContext<'_>, mass: f32, motion_type: MotionType) -> Result<Self, RigidbodyError> {
        validate_mass(mass)?;
        Ok(Self {
            node: ctx.node(),
            object: ctx.object().clone(),
            mass,
            motion_type,
            body: None,
        })
    }

    /// One kilogram body of the given motion type
    pub fn with_motion_type(ctx: &AttachContext<'_>, motion_type: MotionType) -> Self {
        Self {
            node: ctx.node(),
            object: ctx.object().clone(),
            mass: 1.0,
            motion_type,
            body: None,
        }
    }

    /// One kilogram dynamic body
    pub fn dynamic(ctx: &AttachContext<'_>) -> Self {
        Self::with_motion_type(ctx, MotionType::Dynamic)
    }

    /// Static body
    pub fn fixed(ctx: &AttachContext<'_>) -> Self {
        Self::with_motion_type(ctx, MotionType::Static)
    }

    /// Mass in kilograms
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Set the mass used the next time the body is added
    pub fn set_mass(&mut self, mass: f32) -> Result<(), RigidbodyError> {
        validate_mass(mass)?;
        self.mass = mass;
        Ok(())
    }

    /// Motion classification
    pub fn motion_type(&self) -> MotionType {
        self.motion_type
    }

    /// Change the motion classification. Rejected while simulated.
    pub fn set_motion_type(&mut self, motion_type: MotionType) -> Result<(), RigidbodyError> {
        if let Some(handle) = self.body {
            if motion_type != self.motion_type {
                return Err(RigidbodyError::MotionTypeLocked { handle });
            }
        }
        self.motion_type = motion_type;
        Ok(())
    }

    /// Handle of the simulated body, once a backend accepted it
    pub fn body_handle(&self) -> Option<BodyHandle> {
        self.body
    }

    /// Whether a backend is simulating this body
    pub fn is_simulated(&self) -> bool {
        self.body.is_some()
    }

    pub(crate) fn attach_body(&mut self, handle: BodyHandle) {
        self.body = Some(handle);
    }

    pub(crate) fn detach_body(&mut self) {
        self.body = None;
    }

    /// The node's scene object
    pub fn object(&self) -> &SceneObjectRef {
        &self.object
    }

    /// Node-local position
    pub fn position(&self) -> Vec3 {
        self.object.borrow().transform.position
    }

    /// Node-local rotation
    pub fn rotation(&self) -> Quat {
        self.object.borrow().transform.rotation
    }

    /// Move the node
    pub fn set_position(&self, position: Vec3) {
        self.object.borrow_mut().transform.position = position;
    }

    /// Rotate the node
    pub fn set_rotation(&self, rotation: Quat) {
        self.object.borrow_mut().transform.rotation = rotation;
    }
}

fn validate_mass(mass: f32) -> Result<(), RigidbodyError> {
    if mass.is_finite() && mass > 0.0 {
        Ok(())
    } else {
        Err(RigidbodyError::InvalidMass(mass))
    }
}

impl Component for Rigidbody {
    fn node(&self) -> NodeId {
        self.node
    }

    fn kinds(&self) -> ComponentKind {
        ComponentKind::RIGIDBODY
    }
}
