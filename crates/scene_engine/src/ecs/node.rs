//! Nodes and their component directory

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::foundation::collections::NodeId;
use crate::scene::SceneObjectRef;
use super::component::{Component, ComponentKind, ComponentRef, KIND_BITS};

struct ComponentEntry {
    type_id: TypeId,
    kinds: ComponentKind,
    typed: Rc<dyn Any>,
    component: Rc<RefCell<dyn Component>>,
}

/// A positioned object in the world owning an ordered list of components.
///
/// Lookups return the first match in attachment order. Both lookup paths are
/// backed by an index built on insertion, so neither scans the list.
pub struct Node {
    id: NodeId,
    object: SceneObjectRef,
    /// Whether the node's behaviours are active
    pub enabled: bool,
    /// Collision layer index
    pub layer: u32,
    components: Vec<ComponentEntry>,
    by_type: HashMap<TypeId, usize>,
    by_kind: [Option<usize>; KIND_BITS],
}

impl Node {
    pub(crate) fn new(id: NodeId, object: SceneObjectRef, layer: u32) -> Self {
        Self {
            id,
            object,
            enabled: true,
            layer,
            components: Vec::new(),
            by_type: HashMap::new(),
            by_kind: [None; KIND_BITS],
        }
    }

    /// Node handle
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Scene object holding this node's transform
    pub fn object(&self) -> &SceneObjectRef {
        &self.object
    }

    /// Number of attached components
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub(crate) fn attach<T: Component>(&mut self, component: T) -> ComponentRef<T> {
        let kinds = component.kinds();
        let shared = Rc::new(RefCell::new(component));
        let index = self.components.len();

        self.by_type.entry(TypeId::of::<T>()).or_insert(index);
        for bit in (0..KIND_BITS).filter(|bit| kinds.bits() & (1 << bit) != 0) {
            self.by_kind[bit].get_or_insert(index);
        }

        let typed: Rc<dyn Any> = shared.clone();
        let component: Rc<RefCell<dyn Component>> = shared.clone();
        self.components.push(ComponentEntry {
            type_id: TypeId::of::<T>(),
            kinds,
            typed,
            component,
        });
        shared
    }

    /// First attached component of concrete type `T`
    pub fn get_component<T: Component>(&self) -> Option<ComponentRef<T>> {
        let index = *self.by_type.get(&TypeId::of::<T>())?;
        Rc::clone(&self.components[index].typed).downcast::<RefCell<T>>().ok()
    }

    fn kind_index(&self, kind: ComponentKind) -> Option<usize> {
        if kind.bits().count_ones() == 1 {
            self.by_kind[kind.bits().trailing_zeros() as usize]
        } else if kind.is_empty() {
            None
        } else {
            self.components.iter().position(|entry| entry.kinds.contains(kind))
        }
    }

    /// First attached component satisfying every capability in `kind`
    pub fn get_component_by_kind(&self, kind: ComponentKind) -> Option<Rc<RefCell<dyn Component>>> {
        let index = self.kind_index(kind)?;
        Some(Rc::clone(&self.components[index].component))
    }

    /// First component satisfying `kind`, if it is a `T`
    pub fn get_component_of_kind<T: Component>(&self, kind: ComponentKind) -> Option<ComponentRef<T>> {
        let index = self.kind_index(kind)?;
        let entry = &self.components[index];
        if entry.type_id != TypeId::of::<T>() {
            return None;
        }
        Rc::clone(&entry.typed).downcast::<RefCell<T>>().ok()
    }

    /// Whether any component satisfies `kind`
    pub fn has_kind(&self, kind: ComponentKind) -> bool {
        self.kind_index(kind).is_some()
    }

    /// All components in attachment order
    pub fn components(&self) -> impl Iterator<Item = Rc<RefCell<dyn Component>>> + '_ {
        self.components.iter().map(|entry| Rc::clone(&entry.component))
    }

    pub(crate) fn take_components(&mut self) -> Vec<Rc<RefCell<dyn Component>>> {
        self.by_type.clear();
        self.by_kind = [None; KIND_BITS];
        self.components.drain(..).map(|entry| entry.component).collect()
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("enabled", &self.enabled)
            .field("layer", &self.layer)
            .field("components", &self.components.len())
            .finish()
    }
}

/// Read-only view of the node a component is being attached to
pub struct AttachContext<'a> {
    node: &'a Node,
}

impl<'a> AttachContext<'a> {
    pub(crate) fn new(node: &'a Node) -> Self {
        Self { node }
    }

    /// Node the component will belong to
    pub fn node(&self) -> NodeId {
        self.node.id
    }

    /// The node's scene object
    pub fn object(&self) -> &SceneObjectRef {
        &self.node.object
    }

    /// The node's collision layer
    pub fn layer(&self) -> u32 {
        self.node.layer
    }

    /// Peer lookup by type
    pub fn get_component<T: Component>(&self) -> Option<ComponentRef<T>> {
        self.node.get_component::<T>()
    }

    /// Peer lookup by capability
    pub fn get_component_of_kind<T: Component>(&self, kind: ComponentKind) -> Option<ComponentRef<T>> {
        self.node.get_component_of_kind::<T>(kind)
    }
}
