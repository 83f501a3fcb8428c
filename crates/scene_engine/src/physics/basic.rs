//! Deterministic gravity integrator
//!
//! Dynamic bodies accelerate under gravity with semi-implicit Euler, static
//! bodies stay put and kinematic bodies follow their node. No contacts are
//! computed. Poses can be set directly, which makes this backend the
//! reference for exercising the engine contract without a physics kernel.

use std::any::Any;

use crate::core::PhysicsConfig;
use crate::ecs::{ComponentRef, World};
use crate::foundation::collections::BodyHandle;
use crate::foundation::math::{Quat, Vec3};
use super::backend::{log_added, AddBodyError, BodyDesc, BodyTable, PhysicsBackend, PhysicsError, TrackedBody};
use super::collider::BodyShape;
use super::layers::{CollisionFilter, LayerRegistry};
use super::rigidbody::{MotionType, Rigidbody};

/// Simulated state of one body
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBody {
    /// World position of the body origin
    pub position: Vec3,
    /// World rotation
    pub rotation: Quat,
    /// Linear velocity
    pub velocity: Vec3,
    /// Shape built at `add`
    pub shape: BodyShape,
    /// Mass in kilograms
    pub mass: f32,
}

/// Contact-free backend
#[derive(Debug, Default)]
pub struct BasicPhysics {
    gravity: Vec3,
    filter: Option<CollisionFilter>,
    bodies: BodyTable<BasicBody>,
    steps: u64,
}

impl BasicPhysics {
    /// Create an uninitialized backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulated pose of a body
    pub fn body_pose(&self, handle: BodyHandle) -> Option<(Vec3, Quat)> {
        self.bodies
            .get(handle)
            .map(|tracked| (tracked.body.position, tracked.body.rotation))
    }

    /// Teleport a body. Returns `false` for an unknown handle.
    pub fn set_body_pose(&mut self, handle: BodyHandle, position: Vec3, rotation: Quat) -> bool {
        match self.bodies.get_mut(handle) {
            Some(tracked) => {
                tracked.body.position = position;
                tracked.body.rotation = rotation;
                true
            }
            None => false,
        }
    }

    /// Set a body's linear velocity
    pub fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec3) -> bool {
        match self.bodies.get_mut(handle) {
            Some(tracked) => {
                tracked.body.velocity = velocity;
                true
            }
            None => false,
        }
    }

    /// Shape built for a body
    pub fn body_shape(&self, handle: BodyHandle) -> Option<BodyShape> {
        self.bodies.get(handle).map(|tracked| tracked.body.shape)
    }

    /// Steps taken since init
    pub fn steps(&self) -> u64 {
        self.steps
    }
}

impl PhysicsBackend for BasicPhysics {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn init(&mut self, layers: &LayerRegistry, config: &PhysicsConfig) -> Result<(), PhysicsError> {
        if self.filter.is_some() {
            return Err(PhysicsError::AlreadyInitialized);
        }
        config.validate().map_err(PhysicsError::InvalidConfig)?;
        self.gravity = config.gravity_vector();
        let filter = CollisionFilter::from_registry(layers);
        log::info!("[basic] Physics initialized with {} layers", filter.layer_count());
        self.filter = Some(filter);
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.filter.is_some()
    }

    fn add(&mut self, world: &World, rigidbody: &ComponentRef<Rigidbody>) -> Result<BodyHandle, AddBodyError> {
        let filter = self.filter.as_ref().ok_or(AddBodyError::NotInitialized)?;
        let desc = BodyDesc::from_rigidbody(world, rigidbody)?;
        if !filter.contains_layer(desc.layer) {
            return Err(AddBodyError::UnknownLayer(desc.layer));
        }
        let body = BasicBody {
            position: desc.position,
            rotation: desc.rotation,
            velocity: Vec3::zeros(),
            shape: desc.shape,
            mass: desc.mass,
        };
        let handle = self.bodies.insert_with(|_| TrackedBody::new(&desc, rigidbody, body));
        log_added(self.name(), handle, &desc);
        Ok(handle)
    }

    fn remove(&mut self, handle: BodyHandle) -> bool {
        self.bodies.remove(handle).is_some()
    }

    fn step(&mut self, fixed_delta: f32) {
        if self.filter.is_none() {
            return;
        }
        let gravity = self.gravity;
        for (_, tracked) in self.bodies.iter_mut() {
            match tracked.motion_type {
                MotionType::Static => {}
                MotionType::Dynamic => {
                    tracked.body.velocity += gravity * fixed_delta;
                    tracked.body.position += tracked.body.velocity * fixed_delta;
                }
                MotionType::Kinematic => {
                    let pose = tracked.object.borrow().world_transform();
                    tracked.body.position = pose.position;
                    tracked.body.rotation = pose.rotation;
                }
            }
        }
        self.steps += 1;
    }

    fn sync(&mut self, world: &World) {
        for (_, tracked) in self.bodies.iter() {
            if tracked.motion_type != MotionType::Kinematic && world.contains_node(tracked.node) {
                tracked.write_pose(tracked.body.position, tracked.body.rotation);
            }
        }
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
