//! rapier3d simulation backend
//!
//! Owns a rapier [`PhysicsPipeline`] and all of its sets, steps it one fixed
//! delta at a time and writes body poses back into nodes on `sync`.
//!
//! Layer filtering: every collider stores its object layer in `user_data`
//! and asks for contact-pair filtering; [`LayerFilterHooks`] answers from the
//! [`CollisionFilter`] snapshot taken at `init`. Contact start/stop events
//! are buffered by [`ContactCollector`] and drained by the engine after each
//! step.

use std::any::Any;
use std::sync::Mutex;

use rapier3d::na::{Quaternion, Translation3, UnitQuaternion};
use rapier3d::prelude::*;

use crate::core::PhysicsConfig;
use crate::ecs::{ComponentRef, World};
use crate::foundation::collections::BodyHandle;
use crate::foundation::math::{Quat, Vec3};
use super::backend::{
    log_added, AddBodyError, BodyDesc, BodyTable, ContactEvent, PhysicsBackend, PhysicsError, TrackedBody,
};
use super::collider::BodyShape;
use super::layers::{CollisionFilter, LayerRegistry};
use super::rigidbody::{MotionType, Rigidbody};

fn to_rapier_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

fn to_rapier_rotation(q: &Quat) -> UnitQuaternion<Real> {
    UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.i, q.j, q.k))
}

fn from_rapier_rotation(q: &UnitQuaternion<Real>) -> Quat {
    Quat::from_quaternion(crate::foundation::math::Quaternion::new(q.w, q.i, q.j, q.k))
}

fn collider_layer(colliders: &ColliderSet, handle: ColliderHandle) -> Option<u32> {
    colliders
        .get(handle)
        .and_then(|collider| u32::try_from(collider.user_data).ok())
}

/// Contact filter answering from the layer tables
struct LayerFilterHooks {
    filter: CollisionFilter,
}

impl LayerFilterHooks {
    fn allows(&self, context: &PairFilterContext) -> bool {
        match (
            collider_layer(context.colliders, context.collider1),
            collider_layer(context.colliders, context.collider2),
        ) {
            (Some(a), Some(b)) => self.filter.should_collide(a, b),
            _ => false,
        }
    }
}

impl PhysicsHooks for LayerFilterHooks {
    fn filter_contact_pair(&self, context: &PairFilterContext) -> Option<SolverFlags> {
        self.allows(context).then_some(SolverFlags::COMPUTE_IMPULSES)
    }

    fn filter_intersection_pair(&self, context: &PairFilterContext) -> bool {
        self.allows(context)
    }
}

/// Buffers collision events raised during a step
#[derive(Default)]
struct ContactCollector {
    events: Mutex<Vec<CollisionEvent>>,
}

impl ContactCollector {
    fn drain(&self) -> Vec<CollisionEvent> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl EventHandler for ContactCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// Everything rapier needs to step, created by `init`
struct RapierContext {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    hooks: LayerFilterHooks,
    events: ContactCollector,
    restitution: Real,
}

impl RapierContext {
    fn build_collider(&self, desc: &BodyDesc) -> Collider {
        let builder = match desc.shape {
            BodyShape::Cuboid { half_extents, offset } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
                    .translation(to_rapier_vector(offset))
                    .mass(desc.mass)
            }
            BodyShape::Ball { radius, offset } => ColliderBuilder::ball(radius)
                .translation(to_rapier_vector(offset))
                .mass(desc.mass),
            BodyShape::HalfSpace { normal, offset } => {
                let unit_normal = UnitVector::new_normalize(to_rapier_vector(normal));
                ColliderBuilder::new(SharedShape::new(HalfSpace::new(unit_normal)))
                    .translation(to_rapier_vector(offset))
            }
        };
        builder
            .restitution(self.restitution)
            .user_data(u128::from(desc.layer))
            .active_hooks(ActiveHooks::FILTER_CONTACT_PAIRS | ActiveHooks::FILTER_INTERSECTION_PAIR)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build()
    }

    fn build_body(desc: &BodyDesc) -> RigidBody {
        let builder = match desc.motion_type {
            MotionType::Static => RigidBodyBuilder::fixed(),
            MotionType::Dynamic => RigidBodyBuilder::dynamic(),
            MotionType::Kinematic => RigidBodyBuilder::kinematic_position_based(),
        };
        let pose = Isometry::from_parts(
            Translation3::from(to_rapier_vector(desc.position)),
            to_rapier_rotation(&desc.rotation),
        );
        builder.pose(pose).build()
    }
}

/// Native handles of a tracked body
#[derive(Debug, Clone, Copy)]
pub struct RapierBody {
    /// Rigid body in the rapier set
    pub body: RigidBodyHandle,
    /// Its collider
    pub collider: ColliderHandle,
}

/// Backend running the rapier3d pipeline
#[derive(Default)]
pub struct RapierPhysics {
    context: Option<RapierContext>,
    bodies: BodyTable<RapierBody>,
}

impl RapierPhysics {
    /// Create an uninitialized backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Current world pose of a body
    pub fn body_pose(&self, handle: BodyHandle) -> Option<(Vec3, Quat)> {
        let context = self.context.as_ref()?;
        let tracked = self.bodies.get(handle)?;
        let body = context.bodies.get(tracked.body.body)?;
        let t = body.translation();
        Some((Vec3::new(t.x, t.y, t.z), from_rapier_rotation(body.rotation())))
    }

    /// Half extents of a body's box collider
    pub fn body_half_extents(&self, handle: BodyHandle) -> Option<Vec3> {
        let context = self.context.as_ref()?;
        let tracked = self.bodies.get(handle)?;
        let collider = context.colliders.get(tracked.body.collider)?;
        let cuboid = collider.shape().as_cuboid()?;
        let h = cuboid.half_extents;
        Some(Vec3::new(h.x, h.y, h.z))
    }

    /// Native handles of a body
    pub fn native_handles(&self, handle: BodyHandle) -> Option<RapierBody> {
        self.bodies.get(handle).map(|tracked| tracked.body)
    }

    fn node_of_collider(&self, context: &RapierContext, collider: ColliderHandle) -> Option<crate::foundation::collections::NodeId> {
        let parent = context.colliders.get(collider)?.parent()?;
        let body = context.bodies.get(parent)?;
        let handle = BodyHandle::from_user_data(body.user_data)?;
        self.bodies.node_of(handle)
    }
}

impl PhysicsBackend for RapierPhysics {
    fn name(&self) -> &'static str {
        "rapier"
    }

    fn init(&mut self, layers: &LayerRegistry, config: &PhysicsConfig) -> Result<(), PhysicsError> {
        if self.context.is_some() {
            return Err(PhysicsError::AlreadyInitialized);
        }
        config.validate().map_err(PhysicsError::InvalidConfig)?;

        let filter = CollisionFilter::from_registry(layers);
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = config.fixed_delta;

        log::info!(
            "[rapier] Physics initialized: {} layers, dt {:.4}s, worker budget {} (single-threaded pipeline)",
            filter.layer_count(),
            config.fixed_delta,
            config.max_worker_threads
        );

        self.context = Some(RapierContext {
            gravity: to_rapier_vector(config.gravity_vector()),
            integration_parameters,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            hooks: LayerFilterHooks { filter },
            events: ContactCollector::default(),
            restitution: config.restitution,
        });
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.context.is_some()
    }

    fn add(&mut self, world: &World, rigidbody: &ComponentRef<Rigidbody>) -> Result<BodyHandle, AddBodyError> {
        let context = self.context.as_mut().ok_or(AddBodyError::NotInitialized)?;
        let desc = BodyDesc::from_rigidbody(world, rigidbody)?;
        if !context.hooks.filter.contains_layer(desc.layer) {
            return Err(AddBodyError::UnknownLayer(desc.layer));
        }

        let collider = context.build_collider(&desc);
        let body_handle = context.bodies.insert(RapierContext::build_body(&desc));
        let collider_handle = context
            .colliders
            .insert_with_parent(collider, body_handle, &mut context.bodies);

        let handle = self.bodies.insert_with(|_handle| {
            TrackedBody::new(
                &desc,
                rigidbody,
                RapierBody {
                    body: body_handle,
                    collider: collider_handle,
                },
            )
        });
        if let Some(body) = context.bodies.get_mut(body_handle) {
            body.user_data = handle.to_user_data();
        }
        log_added(self.name(), handle, &desc);
        Ok(handle)
    }

    fn remove(&mut self, handle: BodyHandle) -> bool {
        let Some(tracked) = self.bodies.remove(handle) else {
            return false;
        };
        if let Some(context) = self.context.as_mut() {
            context.bodies.remove(
                tracked.body.body,
                &mut context.islands,
                &mut context.colliders,
                &mut context.impulse_joints,
                &mut context.multibody_joints,
                true,
            );
        }
        true
    }

    fn step(&mut self, fixed_delta: f32) {
        let Some(context) = self.context.as_mut() else {
            return;
        };

        for (_, tracked) in self.bodies.iter() {
            if tracked.motion_type != MotionType::Kinematic {
                continue;
            }
            let target = tracked.object.borrow().world_transform();
            if let Some(body) = context.bodies.get_mut(tracked.body.body) {
                body.set_next_kinematic_translation(to_rapier_vector(target.position));
                body.set_next_kinematic_rotation(to_rapier_rotation(&target.rotation));
            }
        }

        context.integration_parameters.dt = fixed_delta;
        context.pipeline.step(
            &context.gravity,
            &context.integration_parameters,
            &mut context.islands,
            &mut context.broad_phase,
            &mut context.narrow_phase,
            &mut context.bodies,
            &mut context.colliders,
            &mut context.impulse_joints,
            &mut context.multibody_joints,
            &mut context.ccd_solver,
            &context.hooks,
            &context.events,
        );
    }

    fn sync(&mut self, world: &World) {
        let Some(context) = self.context.as_ref() else {
            return;
        };
        for (_, tracked) in self.bodies.iter() {
            // Kinematic poses are owned by the node.
            if tracked.motion_type == MotionType::Kinematic || !world.contains_node(tracked.node) {
                continue;
            }
            if let Some(body) = context.bodies.get(tracked.body.body) {
                let t = body.translation();
                tracked.write_pose(Vec3::new(t.x, t.y, t.z), from_rapier_rotation(body.rotation()));
            }
        }
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn drain_contact_events(&mut self) -> Vec<ContactEvent> {
        let Some(context) = self.context.as_ref() else {
            return Vec::new();
        };
        context
            .events
            .drain()
            .into_iter()
            .filter_map(|event| {
                let a = self.node_of_collider(context, event.collider1())?;
                let b = self.node_of_collider(context, event.collider2())?;
                Some(if event.started() {
                    ContactEvent::Started { a, b }
                } else {
                    ContactEvent::Stopped { a, b }
                })
            })
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
