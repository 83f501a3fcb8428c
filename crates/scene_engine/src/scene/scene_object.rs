//! Scene objects: the transform-bearing primitives nodes render through
//!
//! A [`SceneObject`] stores its transform relative to its parent. Objects are
//! shared as [`SceneObjectRef`] so a node, its rigidbody and any generated
//! child visuals observe the same transform.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::foundation::math::{Quat, Transform, Vec3};

/// Shared handle to a scene object
pub type SceneObjectRef = Rc<RefCell<SceneObject>>;

/// A straight line between two points in an object's local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    /// Start point
    pub start: Vec3,
    /// End point
    pub end: Vec3,
}

impl LineSegment {
    /// Create a segment
    pub fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }
}

/// What the render collaborator draws for an object
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Visual {
    /// Nothing, the object only groups children
    #[default]
    None,
    /// A named mesh owned by the renderer
    Mesh(String),
    /// Line segments in local space
    Lines(Vec<LineSegment>),
}

/// Positioned object in the scene hierarchy
#[derive(Debug, Default)]
pub struct SceneObject {
    /// Display name
    pub name: String,
    /// Transform relative to the parent (or the world for roots)
    pub transform: Transform,
    /// Drawable payload
    pub visual: Visual,
    parent: Option<Weak<RefCell<SceneObject>>>,
    children: Vec<SceneObjectRef>,
}

impl SceneObject {
    /// Create an object at the origin
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder-style transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Builder-style visual
    pub fn with_visual(mut self, visual: Visual) -> Self {
        self.visual = visual;
        self
    }

    /// Wrap into a shared handle
    pub fn into_shared(self) -> SceneObjectRef {
        Rc::new(RefCell::new(self))
    }

    /// Parent object, if attached and still alive
    pub fn parent(&self) -> Option<SceneObjectRef> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Direct children in attachment order
    pub fn children(&self) -> &[SceneObjectRef] {
        &self.children
    }

    /// Transform of this object in world space
    pub fn world_transform(&self) -> Transform {
        match self.parent() {
            Some(parent) => parent.borrow().world_transform().combine(&self.transform),
            None => self.transform.clone(),
        }
    }

    /// Map a point from this object's local space into world space
    pub fn local_to_world(&self, point: Vec3) -> Vec3 {
        self.world_transform().transform_point(point)
    }

    /// Place this object so its world position and rotation match the given
    /// pose. Scale is left untouched.
    pub fn set_world_pose(&mut self, position: Vec3, rotation: Quat) {
        match self.parent() {
            Some(parent) => {
                let parent_world = parent.borrow().world_transform();
                let (local_position, local_rotation) = parent_world.localize(position, rotation);
                self.transform.position = local_position;
                self.transform.rotation = local_rotation;
            }
            None => {
                self.transform.position = position;
                self.transform.rotation = rotation;
            }
        }
    }

    /// Count this object and all of its descendants
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|child| child.borrow().subtree_len())
            .sum::<usize>()
    }
}

/// Attach `child` under `parent`, detaching it from any previous parent
pub fn attach_child(parent: &SceneObjectRef, child: &SceneObjectRef) {
    detach(child);
    child.borrow_mut().parent = Some(Rc::downgrade(parent));
    parent.borrow_mut().children.push(Rc::clone(child));
}

/// Detach `child` from its parent. Returns whether it had one.
pub fn detach(child: &SceneObjectRef) -> bool {
    let parent = child.borrow().parent();
    child.borrow_mut().parent = None;
    match parent {
        Some(parent) => {
            parent
                .borrow_mut()
                .children
                .retain(|existing| !Rc::ptr_eq(existing, child));
            true
        }
        None => false,
    }
}
