//! The render-visible set of scene objects

use crate::foundation::collections::NodeId;
use super::scene_object::SceneObjectRef;

/// Root objects registered per node, in registration order.
///
/// Linear storage; scenes built around this engine hold tens of nodes.
#[derive(Debug, Default)]
pub struct Scene {
    roots: Vec<(NodeId, SceneObjectRef)>,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node's object. Re-registering a node replaces its object.
    pub fn add_to_scene(&mut self, node: NodeId, object: SceneObjectRef) {
        match self.roots.iter_mut().find(|(existing, _)| *existing == node) {
            Some(entry) => entry.1 = object,
            None => self.roots.push((node, object)),
        }
    }

    /// Unregister a node's object, returning whether it was registered
    pub fn remove_from_scene(&mut self, node: NodeId) -> bool {
        let before = self.roots.len();
        self.roots.retain(|(existing, _)| *existing != node);
        self.roots.len() != before
    }

    /// Whether a node is registered
    pub fn contains(&self, node: NodeId) -> bool {
        self.roots.iter().any(|(existing, _)| *existing == node)
    }

    /// Registered root objects in registration order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneObjectRef)> {
        self.roots.iter().map(|(node, object)| (*node, object))
    }

    /// Number of registered nodes
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Registered objects plus all of their descendants
    pub fn object_count(&self) -> usize {
        self.roots
            .iter()
            .map(|(_, object)| object.borrow().subtree_len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::collections::SlotMap;
    use crate::scene::scene_object::SceneObject;

    #[test]
    fn test_add_and_remove() {
        let mut ids: SlotMap<NodeId, ()> = SlotMap::with_key();
        let a = ids.insert(());
        let b = ids.insert(());
        let mut scene = Scene::new();

        scene.add_to_scene(a, SceneObject::new("a").into_shared());
        scene.add_to_scene(b, SceneObject::new("b").into_shared());
        assert_eq!(scene.len(), 2);

        assert!(scene.remove_from_scene(a));
        assert!(!scene.remove_from_scene(a));
        assert!(!scene.contains(a));
        assert!(scene.contains(b));
    }
}
