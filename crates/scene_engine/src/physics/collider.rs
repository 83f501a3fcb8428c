//! Collider components
//!
//! Shape descriptors in the node's local space. The shape kind is fixed at
//! construction; its parameters can change, and every change is pushed
//! synchronously to registered listeners in registration order.
//!
//! GEA 13.3.4: "Store collision shapes in model space, transform on-the-fly"

use thiserror::Error;

use crate::ecs::{AttachContext, Component, ComponentKind};
use crate::events::{ListenerId, ListenerRegistry};
use crate::foundation::collections::NodeId;
use crate::foundation::math::{Transform, Vec3};

/// Collider variant tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColliderKind {
    /// Axis-aligned box in local space
    Box,
    /// Sphere
    Sphere,
    /// Infinite plane facing local +Y
    Plane,
}

/// Local-space shape parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    /// Box with full-extent `size`
    Box {
        /// Center relative to the node
        center: Vec3,
        /// Full extent along each axis
        size: Vec3,
    },
    /// Sphere
    Sphere {
        /// Center relative to the node
        center: Vec3,
        /// Radius
        radius: f32,
    },
    /// Plane with normal local +Y, shifted `offset` along it
    Plane {
        /// Distance along the normal
        offset: f32,
    },
}

impl ColliderShape {
    /// Variant tag
    pub fn kind(&self) -> ColliderKind {
        match self {
            Self::Box { .. } => ColliderKind::Box,
            Self::Sphere { .. } => ColliderKind::Sphere,
            Self::Plane { .. } => ColliderKind::Plane,
        }
    }

    /// Scale the shape by a node's world scale and express it relative to
    /// the body origin.
    pub fn placed(&self, world: &Transform) -> Result<BodyShape, String> {
        let scale = &world.scale;
        match *self {
            Self::Box { center, size } => {
                if size.iter().any(|s| !s.is_finite() || *s <= 0.0) {
                    return Err(format!("box size must be positive, got {:?}", size.as_slice()));
                }
                let half_extents = size.component_mul(scale).abs() * 0.5;
                if half_extents.iter().any(|h| *h <= 0.0) {
                    return Err("box collapses to zero volume under the node's scale".to_string());
                }
                Ok(BodyShape::Cuboid {
                    half_extents,
                    offset: center.component_mul(scale),
                })
            }
            Self::Sphere { center, radius } => {
                if !radius.is_finite() || radius <= 0.0 {
                    return Err(format!("sphere radius must be positive, got {radius}"));
                }
                let max_scale = world.max_scale();
                if max_scale <= 0.0 {
                    return Err("sphere collapses to a point under the node's scale".to_string());
                }
                Ok(BodyShape::Ball {
                    radius: radius * max_scale,
                    offset: center.component_mul(scale),
                })
            }
            Self::Plane { offset } => {
                if !offset.is_finite() {
                    return Err(format!("plane offset must be finite, got {offset}"));
                }
                Ok(BodyShape::HalfSpace {
                    normal: Vec3::y(),
                    offset: Vec3::y() * (offset * scale.y),
                })
            }
        }
    }
}

/// Shape in simulation units, placed relative to the body origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyShape {
    /// Box
    Cuboid {
        /// Half of the full extent along each axis
        half_extents: Vec3,
        /// Offset from the body origin
        offset: Vec3,
    },
    /// Sphere
    Ball {
        /// Radius
        radius: f32,
        /// Offset from the body origin
        offset: Vec3,
    },
    /// Solid half-space below a plane
    HalfSpace {
        /// Outward normal in body space
        normal: Vec3,
        /// Offset from the body origin
        offset: Vec3,
    },
}

/// Parameter change pushed to collider listeners
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderChange {
    /// New center
    Center(Vec3),
    /// New box size
    Size(Vec3),
    /// New sphere radius
    Radius(f32),
    /// New plane offset
    Offset(f32),
}

/// Rejected collider mutation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColliderError {
    /// The parameter does not exist on this collider kind
    #[error("A {kind:?} collider has no {parameter}")]
    UnsupportedParameter {
        /// Collider kind
        kind: ColliderKind,
        /// Parameter that was set
        parameter: &'static str,
    },
}

/// Collider component
#[derive(Debug)]
pub struct Collider {
    node: NodeId,
    shape: ColliderShape,
    listeners: ListenerRegistry<ColliderChange>,
}

impl Collider {
    /// Collider with an explicit shape
    pub fn new(ctx: &AttachContext<'_>, shape: ColliderShape) -> Self {
        Self {
            node: ctx.node(),
            shape,
            listeners: ListenerRegistry::new(),
        }
    }

    /// Box collider
    pub fn cuboid(ctx: &AttachContext<'_>, center: Vec3, size: Vec3) -> Self {
        Self::new(ctx, ColliderShape::Box { center, size })
    }

    /// Unit box at the node origin
    pub fn unit_box(ctx: &AttachContext<'_>) -> Self {
        Self::cuboid(ctx, Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0))
    }

    /// Sphere collider
    pub fn sphere(ctx: &AttachContext<'_>, center: Vec3, radius: f32) -> Self {
        Self::new(ctx, ColliderShape::Sphere { center, radius })
    }

    /// Unit sphere at the node origin
    pub fn unit_sphere(ctx: &AttachContext<'_>) -> Self {
        Self::sphere(ctx, Vec3::zeros(), 1.0)
    }

    /// Plane collider facing local +Y
    pub fn plane(ctx: &AttachContext<'_>, offset: f32) -> Self {
        Self::new(ctx, ColliderShape::Plane { offset })
    }

    /// Shape parameters
    pub fn shape(&self) -> &ColliderShape {
        &self.shape
    }

    /// Variant tag
    pub fn kind(&self) -> ColliderKind {
        self.shape.kind()
    }

    /// Center of a box or sphere; planes report the origin
    pub fn center(&self) -> Vec3 {
        match self.shape {
            ColliderShape::Box { center, .. } | ColliderShape::Sphere { center, .. } => center,
            ColliderShape::Plane { .. } => Vec3::zeros(),
        }
    }

    /// Full extent of a box
    pub fn size(&self) -> Option<Vec3> {
        match self.shape {
            ColliderShape::Box { size, .. } => Some(size),
            _ => None,
        }
    }

    /// Radius of a sphere
    pub fn radius(&self) -> Option<f32> {
        match self.shape {
            ColliderShape::Sphere { radius, .. } => Some(radius),
            _ => None,
        }
    }

    fn unsupported(kind: ColliderKind, parameter: &'static str) -> ColliderError {
        ColliderError::UnsupportedParameter { kind, parameter }
    }

    /// Move a box or sphere
    pub fn set_center(&mut self, value: Vec3) -> Result<(), ColliderError> {
        let kind = self.kind();
        match &mut self.shape {
            ColliderShape::Box { center, .. } | ColliderShape::Sphere { center, .. } => *center = value,
            ColliderShape::Plane { .. } => return Err(Self::unsupported(kind, "center")),
        }
        self.listeners.notify(&ColliderChange::Center(value));
        Ok(())
    }

    /// Resize a box
    pub fn set_size(&mut self, value: Vec3) -> Result<(), ColliderError> {
        let kind = self.kind();
        match &mut self.shape {
            ColliderShape::Box { size, .. } => *size = value,
            _ => return Err(Self::unsupported(kind, "size")),
        }
        self.listeners.notify(&ColliderChange::Size(value));
        Ok(())
    }

    /// Resize a sphere
    pub fn set_radius(&mut self, value: f32) -> Result<(), ColliderError> {
        let kind = self.kind();
        match &mut self.shape {
            ColliderShape::Sphere { radius, .. } => *radius = value,
            _ => return Err(Self::unsupported(kind, "radius")),
        }
        self.listeners.notify(&ColliderChange::Radius(value));
        Ok(())
    }

    /// Shift a plane along its normal
    pub fn set_offset(&mut self, value: f32) -> Result<(), ColliderError> {
        let kind = self.kind();
        match &mut self.shape {
            ColliderShape::Plane { offset } => *offset = value,
            _ => return Err(Self::unsupported(kind, "offset")),
        }
        self.listeners.notify(&ColliderChange::Offset(value));
        Ok(())
    }

    /// Observe parameter changes
    pub fn add_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&ColliderChange) + 'static,
    {
        self.listeners.add(listener)
    }

    /// Stop observing. Returns `false` for an unknown id.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Component for Collider {
    fn node(&self) -> NodeId {
        self.node
    }

    fn kinds(&self) -> ComponentKind {
        let variant = match self.kind() {
            ColliderKind::Box => ComponentKind::BOX_COLLIDER,
            ColliderKind::Sphere => ComponentKind::SPHERE_COLLIDER,
            ColliderKind::Plane => ComponentKind::PLANE_COLLIDER,
        };
        ComponentKind::COLLIDER | variant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::World;
    use crate::scene::SceneObject;
    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn scaled(x: f32, y: f32, z: f32) -> Transform {
        Transform::identity().with_scale(Vec3::new(x, y, z))
    }

    #[test]
    fn test_listener_receives_changes_until_removed() {
        let mut world = World::new();
        let node = world.create_node(SceneObject::new("box"), 0);
        let collider = world.add_component(node, Collider::unit_box).expect("node exists");

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = collider.borrow_mut().add_listener(move |change| sink.borrow_mut().push(*change));

        collider.borrow_mut().set_center(Vec3::new(0.0, 1.0, 0.0)).expect("box has center");
        collider.borrow_mut().set_size(Vec3::new(2.0, 2.0, 2.0)).expect("box has size");
        assert!(collider.borrow_mut().remove_listener(id));
        collider.borrow_mut().set_size(Vec3::new(3.0, 3.0, 3.0)).expect("box has size");

        assert_eq!(
            *seen.borrow(),
            vec![
                ColliderChange::Center(Vec3::new(0.0, 1.0, 0.0)),
                ColliderChange::Size(Vec3::new(2.0, 2.0, 2.0)),
            ]
        );
        assert!(!collider.borrow_mut().remove_listener(id));
    }

    #[test]
    fn test_wrong_parameter_is_rejected_without_notifying() {
        let mut world = World::new();
        let node = world.create_node(SceneObject::new("ball"), 0);
        let collider = world.add_component(node, Collider::unit_sphere).expect("node exists");
        let count = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&count);
        collider.borrow_mut().add_listener(move |_| *counter.borrow_mut() += 1);

        let result = collider.borrow_mut().set_size(Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(
            result,
            Err(ColliderError::UnsupportedParameter { kind: ColliderKind::Sphere, parameter: "size" })
        );
        collider.borrow_mut().set_radius(2.0).expect("sphere has radius");
        assert_eq!(*count.borrow(), 1);
        assert_eq!(collider.borrow().radius(), Some(2.0));
    }

    #[test]
    fn test_kinds_reflect_variant() {
        let mut world = World::new();
        let node = world.create_node(SceneObject::new("floor"), 1);
        let plane = world.add_component(node, |ctx| Collider::plane(ctx, 0.0)).expect("node exists");
        let kinds = plane.borrow().kinds();
        assert!(kinds.contains(ComponentKind::COLLIDER | ComponentKind::PLANE_COLLIDER));
        assert!(!kinds.contains(ComponentKind::BOX_COLLIDER));
    }

    #[test]
    fn test_placed_box_uses_half_extents_and_scale() {
        let shape = ColliderShape::Box {
            center: Vec3::new(0.0, 1.0, 0.0),
            size: Vec3::new(2.0, 2.0, 2.0),
        };
        match shape.placed(&scaled(1.0, 3.0, 1.0)) {
            Ok(BodyShape::Cuboid { half_extents, offset }) => {
                assert_relative_eq!(half_extents.x, 1.0);
                assert_relative_eq!(half_extents.y, 3.0);
                assert_relative_eq!(offset.y, 3.0);
            }
            other => panic!("expected cuboid, got {other:?}"),
        }
    }

    #[test]
    fn test_placed_rejects_degenerate_shapes() {
        let flat = ColliderShape::Box { center: Vec3::zeros(), size: Vec3::new(1.0, 0.0, 1.0) };
        assert!(flat.placed(&Transform::identity()).is_err());
        let ball = ColliderShape::Sphere { center: Vec3::zeros(), radius: -1.0 };
        assert!(ball.placed(&Transform::identity()).is_err());
    }

    #[test]
    fn test_placed_sphere_uses_largest_scale() {
        let ball = ColliderShape::Sphere { center: Vec3::zeros(), radius: 0.5 };
        match ball.placed(&scaled(1.0, 4.0, -6.0)) {
            Ok(BodyShape::Ball { radius, .. }) => assert_relative_eq!(radius, 3.0),
            other => panic!("expected ball, got {other:?}"),
        }
    }
}
