//! World context
//!
//! The [`World`] owns every node, the render-visible [`Scene`] and the
//! [`LayerRegistry`]. Nothing here is process-wide; independent worlds can
//! coexist, which keeps tests isolated.

use crate::foundation::collections::{NodeId, SlotMap};
use crate::physics::LayerRegistry;
use crate::scene::{Scene, SceneObject, SceneObjectRef};
use super::component::{Component, ComponentError, ComponentRef};
use super::node::{AttachContext, Node};

/// Nodes, scene registration and collision layers for one simulation
#[derive(Debug, Default)]
pub struct World {
    nodes: SlotMap<NodeId, Node>,
    scene: Scene,
    layers: LayerRegistry,
}

impl World {
    /// Create an empty world with an empty layer registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty world using the given layers
    pub fn with_layers(layers: LayerRegistry) -> Self {
        Self {
            layers,
            ..Default::default()
        }
    }

    /// Create a node around a new scene object and register it with the scene
    pub fn create_node(&mut self, object: SceneObject, layer: u32) -> NodeId {
        self.create_node_shared(object.into_shared(), layer)
    }

    /// Create a node around an existing scene object
    pub fn create_node_shared(&mut self, object: SceneObjectRef, layer: u32) -> NodeId {
        let scene_object = object.clone();
        let id = self.nodes.insert_with_key(|id| Node::new(id, object, layer));
        self.scene.add_to_scene(id, scene_object);
        log::debug!("Created node {:?} on layer {}", id, layer);
        id
    }

    /// Construct a component with access to the node and attach it
    pub fn add_component<T, F>(&mut self, node: NodeId, build: F) -> Result<ComponentRef<T>, ComponentError>
    where
        T: Component,
        F: FnOnce(&AttachContext<'_>) -> T,
    {
        self.try_add_component(node, |ctx| Ok(build(ctx)))
    }

    /// Like [`World::add_component`] for constructors that check preconditions
    pub fn try_add_component<T, F>(&mut self, node: NodeId, build: F) -> Result<ComponentRef<T>, ComponentError>
    where
        T: Component,
        F: FnOnce(&AttachContext<'_>) -> Result<T, ComponentError>,
    {
        let target = self.nodes.get_mut(node).ok_or(ComponentError::UnknownNode(node))?;
        let component = build(&AttachContext::new(target))?;
        Ok(target.attach(component))
    }

    /// First component of type `T` on `node`
    pub fn get_component<T: Component>(&self, node: NodeId) -> Option<ComponentRef<T>> {
        self.nodes.get(node)?.get_component::<T>()
    }

    /// Destroy a node: every component releases its side effects and the node
    /// leaves the scene. Returns `false` for an unknown or stale id.
    ///
    /// Behaviours and simulated bodies are not touched here; use
    /// [`Engine::destroy_node`](crate::Engine::destroy_node) for nodes the
    /// engine knows about.
    pub fn destroy_node(&mut self, node: NodeId) -> bool {
        let Some(mut removed) = self.nodes.remove(node) else {
            return false;
        };
        for component in removed.take_components() {
            component.borrow_mut().on_destroy();
        }
        self.scene.remove_from_scene(node);
        log::debug!("Destroyed node {:?}", node);
        true
    }

    /// Node by id
    pub fn node(&self, node: NodeId) -> Option<&Node> {
        self.nodes.get(node)
    }

    /// Mutable node by id
    pub fn node_mut(&mut self, node: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(node)
    }

    /// Whether the id refers to a live node
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Live node ids
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys()
    }

    /// Render-visible objects
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Collision layers
    pub fn layers(&self) -> &LayerRegistry {
        &self.layers
    }

    /// Collision layers, for setup before the physics backend starts
    pub fn layers_mut(&mut self) -> &mut LayerRegistry {
        &mut self.layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::ComponentKind;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Marker {
        node: NodeId,
        destroyed: Rc<Cell<bool>>,
    }

    impl Component for Marker {
        fn node(&self) -> NodeId {
            self.node
        }

        fn kinds(&self) -> ComponentKind {
            ComponentKind::VISUAL
        }

        fn on_destroy(&mut self) {
            self.destroyed.set(true);
        }
    }

    #[test]
    fn test_create_node_registers_with_scene() {
        let mut world = World::new();
        let node = world.create_node(SceneObject::new("cube"), 0);
        assert!(world.scene().contains(node));
        assert_eq!(world.node_count(), 1);
    }

    #[test]
    fn test_add_component_sets_back_reference() {
        let mut world = World::new();
        let node = world.create_node(SceneObject::new("cube"), 0);
        let destroyed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&destroyed);
        let marker = world
            .add_component(node, |ctx| Marker { node: ctx.node(), destroyed: flag })
            .expect("node exists");
        assert_eq!(marker.borrow().node(), node);
    }

    #[test]
    fn test_destroy_runs_on_destroy_and_unregisters() {
        let mut world = World::new();
        let node = world.create_node(SceneObject::new("cube"), 0);
        let destroyed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&destroyed);
        world
            .add_component(node, |ctx| Marker { node: ctx.node(), destroyed: flag })
            .expect("node exists");

        assert!(world.destroy_node(node));
        assert!(destroyed.get());
        assert!(!world.scene().contains(node));
        assert!(!world.destroy_node(node));
    }

    #[test]
    fn test_add_component_to_stale_node_fails() {
        let mut world = World::new();
        let node = world.create_node(SceneObject::new("gone"), 0);
        world.destroy_node(node);
        let result = world.add_component(node, |ctx| Marker {
            node: ctx.node(),
            destroyed: Rc::new(Cell::new(false)),
        });
        assert!(matches!(result, Err(ComponentError::UnknownNode(id)) if id == node));
    }
}
