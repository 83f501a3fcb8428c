//! Behaviours and their lifecycle hooks
//!
//! A [`Behaviour`] is a component with an enable flag. A
//! [`LifecycleBehaviour`] additionally receives callbacks from the frame
//! driver, but only the ones it lists in [`LifecycleBehaviour::hooks`]; the
//! set is read once at registration and never queried again.
//!
//! ## Callback order
//!
//! ```text
//! register ─▶ awake ─▶ on_enable (if active)
//! fixed step: on_enable/on_disable edges ─▶ start (once) ─▶ fixed_update ─▶ triggers
//! frame:      sync ─▶ on_enable/on_disable edges ─▶ start (once) ─▶ update ─▶ late_update ─▶ render
//! ```

use bitflags::bitflags;

use crate::foundation::collections::NodeId;
use crate::scene::SceneObjectRef;
use super::component::{Component, ComponentRef};
use super::world::World;

bitflags! {
    /// Lifecycle callbacks a behaviour implements
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Hooks: u16 {
        /// Once, when registered
        const AWAKE = 1 << 0;
        /// Each time the behaviour becomes active
        const ON_ENABLE = 1 << 1;
        /// Once, before the first update or fixed update
        const START = 1 << 2;
        /// Every fixed simulation step
        const FIXED_UPDATE = 1 << 3;
        /// Every frame
        const UPDATE = 1 << 4;
        /// Every frame, after all updates
        const LATE_UPDATE = 1 << 5;
        /// Node's body started touching another body
        const TRIGGER_ENTER = 1 << 6;
        /// Node's body stopped touching another body
        const TRIGGER_EXIT = 1 << 7;
        /// Each time the behaviour becomes inactive
        const ON_DISABLE = 1 << 8;
    }
}

/// Enableable component
pub trait Behaviour: Component {
    /// Whether callbacks should fire
    fn enabled(&self) -> bool;

    /// Toggle callbacks. Edges are observed by the frame driver.
    fn set_enabled(&mut self, enabled: bool);
}

/// Behaviour receiving frame driver callbacks.
///
/// Callbacks run while the behaviour is mutably borrowed, so a callback must
/// not borrow its own component through the world.
#[allow(unused_variables)]
pub trait LifecycleBehaviour: Behaviour {
    /// Callbacks this behaviour implements
    fn hooks(&self) -> Hooks;

    /// Called once on registration
    fn awake(&mut self, ctx: &mut BehaviourContext<'_>) {}

    /// Called when the behaviour becomes active
    fn on_enable(&mut self, ctx: &mut BehaviourContext<'_>) {}

    /// Called once before the first update or fixed update
    fn start(&mut self, ctx: &mut BehaviourContext<'_>) {}

    /// Called every fixed simulation step with the fixed delta
    fn fixed_update(&mut self, ctx: &mut BehaviourContext<'_>, fixed_delta: f32) {}

    /// Called every frame with the frame delta
    fn update(&mut self, ctx: &mut BehaviourContext<'_>, delta: f32) {}

    /// Called every frame after every update has run
    fn late_update(&mut self, ctx: &mut BehaviourContext<'_>, delta: f32) {}

    /// Called when this node's body starts touching `other`'s
    fn on_trigger_enter(&mut self, ctx: &mut BehaviourContext<'_>, other: NodeId) {}

    /// Called when this node's body stops touching `other`'s
    fn on_trigger_exit(&mut self, ctx: &mut BehaviourContext<'_>, other: NodeId) {}

    /// Called when the behaviour becomes inactive
    fn on_disable(&mut self, ctx: &mut BehaviourContext<'_>) {}
}

/// Node back-reference plus enable flag, for embedding in behaviours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BehaviourBase {
    /// Owning node
    pub node: NodeId,
    /// Enable flag
    pub enabled: bool,
}

impl BehaviourBase {
    /// Enabled base for `node`
    pub fn new(node: NodeId) -> Self {
        Self { node, enabled: true }
    }
}

/// What a callback can reach: the world and its own node
pub struct BehaviourContext<'a> {
    world: &'a mut World,
    node: NodeId,
}

impl<'a> BehaviourContext<'a> {
    /// Context for a callback on `node`
    pub fn new(world: &'a mut World, node: NodeId) -> Self {
        Self { world, node }
    }

    /// Node the behaviour belongs to
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The node's scene object
    pub fn object(&self) -> Option<SceneObjectRef> {
        self.world.node(self.node).map(|node| node.object().clone())
    }

    /// Peer component on the same node
    pub fn get_component<T: Component>(&self) -> Option<ComponentRef<T>> {
        self.world.get_component::<T>(self.node)
    }

    /// The world
    pub fn world(&self) -> &World {
        self.world
    }

    /// The world, mutably
    pub fn world_mut(&mut self) -> &mut World {
        self.world
    }
}
