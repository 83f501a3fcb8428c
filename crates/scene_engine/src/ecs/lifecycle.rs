//! Behaviour registry and lifecycle dispatch
//!
//! The frame driver keeps one flat registry of lifecycle behaviours.
//! Registration order is dispatch order. Each entry caches the behaviour's
//! declared [`Hooks`] and the last observed active state, so enable edges
//! fire `on_enable`/`on_disable` exactly once.

use std::cell::RefCell;
use std::rc::Rc;

use crate::foundation::collections::{BehaviourId, NodeId, SlotMap};
use crate::physics::ContactEvent;
use super::behaviour::{BehaviourContext, Hooks, LifecycleBehaviour};
use super::component::ComponentRef;
use super::world::World;

struct RegisteredBehaviour {
    behaviour: Rc<RefCell<dyn LifecycleBehaviour>>,
    node: NodeId,
    hooks: Hooks,
    active: bool,
    started: bool,
}

impl RegisteredBehaviour {
    fn is_enabled(&self, world: &World) -> bool {
        let node_enabled = world.node(self.node).is_some_and(|node| node.enabled);
        node_enabled && self.behaviour.borrow().enabled()
    }

    fn call(&self, world: &mut World, f: impl FnOnce(&mut dyn LifecycleBehaviour, &mut BehaviourContext<'_>)) {
        let mut ctx = BehaviourContext::new(world, self.node);
        f(&mut *self.behaviour.borrow_mut(), &mut ctx);
    }

    /// Fire `start` if this is the behaviour's first active tick
    fn ensure_started(&mut self, world: &mut World) {
        if self.started {
            return;
        }
        self.started = true;
        if self.hooks.contains(Hooks::START) {
            self.call(world, |b, ctx| b.start(ctx));
        }
    }
}

/// Ordered set of lifecycle behaviours driven by the engine
#[derive(Default)]
pub struct BehaviourRegistry {
    slots: SlotMap<BehaviourId, RegisteredBehaviour>,
    order: Vec<BehaviourId>,
}

impl BehaviourRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a behaviour for dispatch. Fires `awake`, then `on_enable`
    /// if the behaviour and its node are enabled.
    pub fn register<T: LifecycleBehaviour>(&mut self, world: &mut World, behaviour: &ComponentRef<T>) -> BehaviourId {
        let shared: Rc<RefCell<dyn LifecycleBehaviour>> = behaviour.clone();
        self.register_dyn(world, shared)
    }

    /// Register an already type-erased behaviour
    pub fn register_dyn(&mut self, world: &mut World, behaviour: Rc<RefCell<dyn LifecycleBehaviour>>) -> BehaviourId {
        let (node, hooks) = {
            let b = behaviour.borrow();
            (b.node(), b.hooks())
        };
        let mut entry = RegisteredBehaviour {
            behaviour,
            node,
            hooks,
            active: false,
            started: false,
        };

        if hooks.contains(Hooks::AWAKE) {
            entry.call(world, |b, ctx| b.awake(ctx));
        }
        if entry.is_enabled(world) {
            entry.active = true;
            if hooks.contains(Hooks::ON_ENABLE) {
                entry.call(world, |b, ctx| b.on_enable(ctx));
            }
        }

        let id = self.slots.insert(entry);
        self.order.push(id);
        log::trace!("Registered behaviour {:?} on node {:?} with hooks {:?}", id, node, hooks);
        id
    }

    /// Unregister a behaviour, firing `on_disable` if it was active.
    /// Returns `false` for an unknown or stale id.
    pub fn unregister(&mut self, world: &mut World, id: BehaviourId) -> bool {
        let Some(entry) = self.slots.remove(id) else {
            return false;
        };
        self.order.retain(|existing| *existing != id);
        if entry.active && entry.hooks.contains(Hooks::ON_DISABLE) && world.contains_node(entry.node) {
            entry.call(world, |b, ctx| b.on_disable(ctx));
        }
        true
    }

    /// Unregister every behaviour of `node`, returning how many there were
    pub fn unregister_node(&mut self, world: &mut World, node: NodeId) -> usize {
        let ids: Vec<BehaviourId> = self
            .order
            .iter()
            .copied()
            .filter(|id| self.slots[*id].node == node)
            .collect();
        for id in &ids {
            self.unregister(world, *id);
        }
        ids.len()
    }

    /// Fire `on_enable`/`on_disable` for every behaviour whose active state
    /// changed since the last reconcile, and drop behaviours whose node is
    /// gone.
    pub fn reconcile(&mut self, world: &mut World) {
        let slots = &mut self.slots;
        self.order.retain(|id| {
            if world.contains_node(slots[*id].node) {
                true
            } else {
                slots.remove(*id);
                false
            }
        });

        for id in &self.order {
            let entry = &mut self.slots[*id];
            let now_active = entry.is_enabled(world);
            if now_active == entry.active {
                continue;
            }
            entry.active = now_active;
            if now_active && entry.hooks.contains(Hooks::ON_ENABLE) {
                entry.call(world, |b, ctx| b.on_enable(ctx));
            } else if !now_active && entry.hooks.contains(Hooks::ON_DISABLE) {
                entry.call(world, |b, ctx| b.on_disable(ctx));
            }
        }
    }

    fn dispatch(&mut self, world: &mut World, hook: Hooks, f: impl Fn(&mut dyn LifecycleBehaviour, &mut BehaviourContext<'_>)) {
        for id in &self.order {
            let entry = &mut self.slots[*id];
            // Active as of the last reconcile and still enabled now: a
            // behaviour disabled earlier in this pass is skipped.
            if !entry.active || !entry.is_enabled(world) {
                continue;
            }
            if hook == Hooks::UPDATE || hook == Hooks::FIXED_UPDATE {
                entry.ensure_started(world);
            }
            if entry.hooks.contains(hook) {
                entry.call(world, &f);
            }
        }
    }

    /// Run `update` on every active behaviour declaring it
    pub fn update(&mut self, world: &mut World, delta: f32) {
        self.dispatch(world, Hooks::UPDATE, |b, ctx| b.update(ctx, delta));
    }

    /// Run `late_update` on every active behaviour declaring it
    pub fn late_update(&mut self, world: &mut World, delta: f32) {
        self.dispatch(world, Hooks::LATE_UPDATE, |b, ctx| b.late_update(ctx, delta));
    }

    /// Run `fixed_update` on every active behaviour declaring it
    pub fn fixed_update(&mut self, world: &mut World, fixed_delta: f32) {
        self.dispatch(world, Hooks::FIXED_UPDATE, |b, ctx| b.fixed_update(ctx, fixed_delta));
    }

    /// Deliver a contact event to the behaviours of both nodes involved
    pub fn dispatch_contact(&mut self, world: &mut World, event: &ContactEvent) {
        let (a, b) = event.nodes();
        for (own, other) in [(a, b), (b, a)] {
            for id in &self.order {
                let entry = &mut self.slots[*id];
                if entry.node != own || !entry.active || !entry.is_enabled(world) {
                    continue;
                }
                match event {
                    ContactEvent::Started { .. } if entry.hooks.contains(Hooks::TRIGGER_ENTER) => {
                        entry.call(world, |b, ctx| b.on_trigger_enter(ctx, other));
                    }
                    ContactEvent::Stopped { .. } if entry.hooks.contains(Hooks::TRIGGER_EXIT) => {
                        entry.call(world, |b, ctx| b.on_trigger_exit(ctx, other));
                    }
                    _ => {}
                }
            }
        }
    }

    /// Number of registered behaviours
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether the id refers to a registered behaviour
    pub fn contains(&self, id: BehaviourId) -> bool {
        self.slots.contains_key(id)
    }
}
