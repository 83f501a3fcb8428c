//! Wireframe visual for a node's box collider
//!
//! The visualizer owns a child group object under the node's scene object.
//! The group holds the box's edge lines and is rebuilt on the next update
//! after the collider reports a change.

use std::cell::Cell;
use std::rc::Rc;

use crate::ecs::{
    AttachContext, Behaviour, BehaviourBase, BehaviourContext, Component, ComponentError, ComponentKind,
    ComponentRef, Hooks, LifecycleBehaviour,
};
use crate::events::ListenerId;
use crate::foundation::collections::NodeId;
use crate::physics::Collider;
use crate::scene::{attach_child, detach, SceneObject, SceneObjectRef, Visual};
use super::draw::box_edges;

/// Name given to the generated child group
pub const VISUALIZER_GROUP_NAME: &str = "box_collider_visualizer";

/// Draws the node's box collider as 12 line segments
pub struct BoxColliderVisualizer {
    base: BehaviourBase,
    collider: ComponentRef<Collider>,
    group: SceneObjectRef,
    listener: Option<ListenerId>,
    dirty: Rc<Cell<bool>>,
}

impl BoxColliderVisualizer {
    /// Attach to a node that already has a box collider.
    ///
    /// # Errors
    /// [`ComponentError::MissingPeer`] when the node has no box collider.
    pub fn new(ctx: &AttachContext<'_>) -> Result<Self, ComponentError> {
        let collider = ctx
            .get_component_of_kind::<Collider>(ComponentKind::BOX_COLLIDER)
            .ok_or(ComponentError::MissingPeer {
                component: "BoxColliderVisualizer",
                required: "box collider",
                node: ctx.node(),
            })?;

        let group = SceneObject::new(VISUALIZER_GROUP_NAME).into_shared();
        attach_child(ctx.object(), &group);

        let dirty = Rc::new(Cell::new(true));
        let flag = Rc::clone(&dirty);
        let listener = collider.borrow_mut().add_listener(move |_| flag.set(true));

        Ok(Self {
            base: BehaviourBase::new(ctx.node()),
            collider,
            group,
            listener: Some(listener),
            dirty,
        })
    }

    /// The generated child group
    pub fn group(&self) -> &SceneObjectRef {
        &self.group
    }

    /// Whether the lines are waiting to be rebuilt
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    fn regenerate(&mut self) {
        let collider = self.collider.borrow();
        let (Some(size), center) = (collider.size(), collider.center()) else {
            return;
        };
        self.group.borrow_mut().visual = Visual::Lines(box_edges(center, size));
        self.dirty.set(false);
    }
}

impl Component for BoxColliderVisualizer {
    fn node(&self) -> NodeId {
        self.base.node
    }

    fn kinds(&self) -> ComponentKind {
        ComponentKind::LIFECYCLE_BEHAVIOUR | ComponentKind::VISUAL
    }

    fn on_destroy(&mut self) {
        detach(&self.group);
        if let Some(id) = self.listener.take() {
            if let Ok(mut collider) = self.collider.try_borrow_mut() {
                collider.remove_listener(id);
            }
        }
    }
}

impl Behaviour for BoxColliderVisualizer {
    fn enabled(&self) -> bool {
        self.base.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.base.enabled = enabled;
    }
}

impl LifecycleBehaviour for BoxColliderVisualizer {
    fn hooks(&self) -> Hooks {
        Hooks::AWAKE | Hooks::UPDATE
    }

    fn awake(&mut self, _ctx: &mut BehaviourContext<'_>) {
        self.regenerate();
    }

    fn update(&mut self, _ctx: &mut BehaviourContext<'_>, _delta: f32) {
        if self.dirty.get() {
            self.regenerate();
        }
    }
}
