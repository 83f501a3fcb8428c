//! Collision layers
//!
//! Based on Game Engine Architecture 3rd Edition, Section 13.3.8:
//! "Most games need to filter collisions... This is typically done via
//! collision layers or groups."
//!
//! Layers are named and mapped to dense indices by a [`LayerRegistry`],
//! which also holds a symmetric enable matrix. A physics backend snapshots
//! the registry into a [`CollisionFilter`] at init; the topology is fixed
//! for the backend's lifetime after that.

use std::collections::{BTreeSet, HashMap};

/// Index of the default "moving" layer
pub const LAYER_MOVING: u32 = 0;

/// Index of the default "non_moving" layer
pub const LAYER_NON_MOVING: u32 = 1;

/// Name of the default moving layer
pub const MOVING: &str = "moving";

/// Name of the default non-moving layer
pub const NON_MOVING: &str = "non_moving";

/// Named collision layers and which pairs of them collide
#[derive(Debug, Clone, Default)]
pub struct LayerRegistry {
    names: Vec<String>,
    indices: HashMap<String, u32>,
    enabled_pairs: BTreeSet<(u32, u32)>,
}

fn ordered(a: u32, b: u32) -> (u32, u32) {
    if a <= b { (a, b) } else { (b, a) }
}

impl LayerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// "moving" and "non_moving", where moving bodies collide with both
    pub fn with_default_layers() -> Self {
        let mut registry = Self::new();
        let moving = registry.add_layer(MOVING);
        let non_moving = registry.add_layer(NON_MOVING);
        registry.enable_collision(moving, moving);
        registry.enable_collision(moving, non_moving);
        registry
    }

    /// Add a layer, returning its index. Adding a known name returns the
    /// existing index.
    pub fn add_layer(&mut self, name: &str) -> u32 {
        if let Some(index) = self.indices.get(name) {
            return *index;
        }
        let index = self.names.len() as u32;
        self.names.push(name.to_string());
        self.indices.insert(name.to_string(), index);
        index
    }

    /// Add several layers in order
    pub fn add_layers<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<u32> {
        names.iter().map(|name| self.add_layer(name.as_ref())).collect()
    }

    /// Index of a layer, `None` when the name is unknown
    pub fn get_layer(&self, name: &str) -> Option<u32> {
        self.indices.get(name).copied()
    }

    /// Name of a layer index
    pub fn name(&self, index: u32) -> Option<&str> {
        self.names.get(index as usize).map(String::as_str)
    }

    /// Number of layers
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no layer has been added
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Allow two layers to collide. Returns `false` if either is unknown.
    pub fn enable_collision(&mut self, a: u32, b: u32) -> bool {
        if !self.contains(a) || !self.contains(b) {
            return false;
        }
        self.enabled_pairs.insert(ordered(a, b));
        true
    }

    /// Stop two layers from colliding. Returns whether the pair was enabled.
    pub fn disable_collision(&mut self, a: u32, b: u32) -> bool {
        self.enabled_pairs.remove(&ordered(a, b))
    }

    /// Whether two layers collide
    pub fn should_collide(&self, a: u32, b: u32) -> bool {
        self.enabled_pairs.contains(&ordered(a, b))
    }

    fn contains(&self, index: u32) -> bool {
        (index as usize) < self.names.len()
    }
}

/// Coarse partition a layer is placed in for broad-phase culling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BroadPhaseLayer(pub u8);

impl BroadPhaseLayer {
    /// Layers that never collide with themselves
    pub const NON_MOVING: Self = Self(0);
    /// Layers that collide with themselves
    pub const MOVING: Self = Self(1);
    /// Number of partitions
    pub const COUNT: usize = 2;
}

/// Immutable snapshot of layer filtering tables
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionFilter {
    layer_count: usize,
    pairs: Vec<bool>,
    broad_phase: Vec<BroadPhaseLayer>,
    object_vs_broad_phase: Vec<[bool; BroadPhaseLayer::COUNT]>,
}

impl CollisionFilter {
    /// Build the dense pair table, broad-phase mapping and object versus
    /// broad-phase table from a registry
    pub fn from_registry(registry: &LayerRegistry) -> Self {
        let layer_count = registry.len();
        let mut pairs = vec![false; layer_count * layer_count];
        for a in 0..layer_count {
            for b in 0..layer_count {
                pairs[a * layer_count + b] = registry.should_collide(a as u32, b as u32);
            }
        }

        let broad_phase: Vec<BroadPhaseLayer> = (0..layer_count)
            .map(|layer| {
                if pairs[layer * layer_count + layer] {
                    BroadPhaseLayer::MOVING
                } else {
                    BroadPhaseLayer::NON_MOVING
                }
            })
            .collect();

        let object_vs_broad_phase = (0..layer_count)
            .map(|layer| {
                let mut row = [false; BroadPhaseLayer::COUNT];
                for other in 0..layer_count {
                    if pairs[layer * layer_count + other] {
                        row[broad_phase[other].0 as usize] = true;
                    }
                }
                row
            })
            .collect();

        Self {
            layer_count,
            pairs,
            broad_phase,
            object_vs_broad_phase,
        }
    }

    /// Number of object layers
    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    /// Whether `layer` is known to this filter
    pub fn contains_layer(&self, layer: u32) -> bool {
        (layer as usize) < self.layer_count
    }

    /// Partition a layer belongs to
    pub fn broad_phase_layer(&self, layer: u32) -> Option<BroadPhaseLayer> {
        self.broad_phase.get(layer as usize).copied()
    }

    /// Whether objects in `layer` can touch anything in `partition`
    pub fn object_vs_broad_phase(&self, layer: u32, partition: BroadPhaseLayer) -> bool {
        self.object_vs_broad_phase
            .get(layer as usize)
            .and_then(|row| row.get(partition.0 as usize))
            .copied()
            .unwrap_or(false)
    }

    /// Whether two object layers collide. Unknown layers never collide.
    pub fn should_collide(&self, a: u32, b: u32) -> bool {
        if !self.contains_layer(a) || !self.contains_layer(b) {
            return false;
        }
        let Some(partition) = self.broad_phase_layer(b) else {
            return false;
        };
        self.object_vs_broad_phase(a, partition)
            && self.pairs[a as usize * self.layer_count + b as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_layers_assigns_dense_indices() {
        let mut registry = LayerRegistry::new();
        registry.add_layers(&["moving", "static"]);

        assert_eq!(registry.get_layer("moving"), Some(0));
        assert_eq!(registry.get_layer("static"), Some(1));
        assert_eq!(registry.get_layer("unknown"), None);
        assert_eq!(registry.name(1), Some("static"));
    }

    #[test]
    fn test_add_layer_is_idempotent() {
        let mut registry = LayerRegistry::new();
        assert_eq!(registry.add_layer("a"), 0);
        assert_eq!(registry.add_layer("b"), 1);
        assert_eq!(registry.add_layer("a"), 0);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_pair_matrix_is_symmetric() {
        let mut registry = LayerRegistry::new();
        let a = registry.add_layer("a");
        let b = registry.add_layer("b");
        assert!(!registry.should_collide(a, b));
        assert!(registry.enable_collision(b, a));
        assert!(registry.should_collide(a, b));
        assert!(registry.disable_collision(a, b));
        assert!(!registry.should_collide(b, a));
        assert!(!registry.enable_collision(a, 7));
    }

    #[test]
    fn test_default_topology_filter() {
        let filter = CollisionFilter::from_registry(&LayerRegistry::with_default_layers());

        assert!(filter.should_collide(LAYER_MOVING, LAYER_MOVING));
        assert!(filter.should_collide(LAYER_MOVING, LAYER_NON_MOVING));
        assert!(filter.should_collide(LAYER_NON_MOVING, LAYER_MOVING));
        assert!(!filter.should_collide(LAYER_NON_MOVING, LAYER_NON_MOVING));

        assert_eq!(filter.broad_phase_layer(LAYER_MOVING), Some(BroadPhaseLayer::MOVING));
        assert_eq!(filter.broad_phase_layer(LAYER_NON_MOVING), Some(BroadPhaseLayer::NON_MOVING));
        assert!(filter.object_vs_broad_phase(LAYER_NON_MOVING, BroadPhaseLayer::MOVING));
        assert!(!filter.object_vs_broad_phase(LAYER_NON_MOVING, BroadPhaseLayer::NON_MOVING));
    }

    #[test]
    fn test_unknown_layers_never_collide() {
        let filter = CollisionFilter::from_registry(&LayerRegistry::with_default_layers());
        assert!(!filter.should_collide(LAYER_MOVING, 9));
        assert!(!filter.contains_layer(2));
    }

    #[test]
    fn test_filter_is_a_snapshot() {
        let mut registry = LayerRegistry::with_default_layers();
        let filter = CollisionFilter::from_registry(&registry);
        registry.disable_collision(LAYER_MOVING, LAYER_MOVING);
        assert!(filter.should_collide(LAYER_MOVING, LAYER_MOVING));
    }
}
