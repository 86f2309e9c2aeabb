//! Dynamic loose octree
//!
//! Indexes the stage's movable objects (actors, lights, particle systems) by
//! their bounding boxes for culling and spatial queries.
//!
//! - **Loose**: a node accepts any object whose box fits in a cube twice the
//!   size of its grid cell, so objects rarely straddle boundaries.
//! - **Dynamic**: the tree grows a coarser root around the old one when
//!   something lands outside it, and materialises finer nodes on demand. It is
//!   never rebuilt wholesale.
//! - **Constant-time lookup**: every object's node is kept in a reverse index,
//!   and nodes on each level are keyed by integer [`GridCoord`]s.
//!
//! Removal never prunes. Call [`Octree::prune_empty_nodes`] once per frame
//! (the [`Stage`](crate::scene::Stage) does this for you).

use std::collections::{BTreeMap, HashMap, VecDeque};

use log::{debug, trace};
use slotmap::SlotMap;
use thiserror::Error;

use crate::config::OctreeConfig;
use crate::foundation::ids::{ActorId, LightId, ObjectKinds, ParticleSystemId, SceneObject};
use crate::foundation::math::Vec3;
use crate::scene::{BoundingSphere, Frustum, AABB};
use crate::spatial::grid::{Grid, GridCoord};
use crate::spatial::node::{NodeId, OctreeNode};

/// Octree errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OctreeError {
    /// The object was never inserted, or has been removed
    #[error("{0} is not in the octree")]
    NotFound(SceneObject),

    /// The bounds provider has nothing for this object
    #[error("no bounds available for {0}")]
    MissingBounds(SceneObject),

    /// A read-only query fell outside the current root
    #[error("point ({}, {}, {}) lies outside the root node", .point.x, .point.y, .point.z)]
    OutsideBounds {
        /// The queried point
        point: Vec3,
    },

    /// A read-only query was made before anything was inserted
    #[error("the octree has no root node")]
    EmptyTree,
}

/// Source of bounding boxes for insertable objects
pub trait BoundsProvider {
    /// World-space bounds of `object`, if it is known
    fn bounds(&self, object: SceneObject) -> Option<AABB>;
}

impl<S: std::hash::BuildHasher> BoundsProvider for HashMap<SceneObject, AABB, S> {
    fn bounds(&self, object: SceneObject) -> Option<AABB> {
        self.get(&object).copied()
    }
}

/// Where an object currently lives
#[derive(Debug, Clone, Copy)]
struct Placement {
    node: NodeId,
    bounds: AABB,
}

/// Loose octree over the stage's objects
#[derive(Debug, Clone)]
pub struct Octree {
    config: OctreeConfig,
    grid: Grid,

    /// Arena owning every node
    nodes: SlotMap<NodeId, OctreeNode>,

    /// Node keys per level; `levels[0]` holds only the root
    levels: VecDeque<BTreeMap<GridCoord, NodeId>>,

    /// Grid scale of the root node
    root_scale: u32,

    /// Reverse index from object to its node
    placements: HashMap<SceneObject, Placement>,
}

impl Octree {
    /// Create an empty octree
    pub fn new(config: OctreeConfig) -> Self {
        debug_assert!(config.validate().is_ok(), "invalid octree config {config:?}");
        Self {
            grid: Grid::new(config.min_node_width),
            config,
            nodes: SlotMap::with_key(),
            levels: VecDeque::new(),
            root_scale: 0,
            placements: HashMap::new(),
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    /// Insert (or move) an actor using bounds from `provider`
    pub fn insert_actor(
        &mut self,
        actor_id: ActorId,
        provider: &impl BoundsProvider,
    ) -> Result<NodeId, OctreeError> {
        self.insert_object(actor_id.into(), provider)
    }

    /// Insert (or move) a light using bounds from `provider`
    pub fn insert_light(
        &mut self,
        light_id: LightId,
        provider: &impl BoundsProvider,
    ) -> Result<NodeId, OctreeError> {
        self.insert_object(light_id.into(), provider)
    }

    /// Insert (or move) a particle system using bounds from `provider`
    pub fn insert_particle_system(
        &mut self,
        particle_system_id: ParticleSystemId,
        provider: &impl BoundsProvider,
    ) -> Result<NodeId, OctreeError> {
        self.insert_object(particle_system_id.into(), provider)
    }

    /// Insert (or move) any object using bounds from `provider`
    pub fn insert_object(
        &mut self,
        object: SceneObject,
        provider: &impl BoundsProvider,
    ) -> Result<NodeId, OctreeError> {
        let bounds = provider
            .bounds(object)
            .ok_or(OctreeError::MissingBounds(object))?;
        Ok(self.insert(object, bounds))
    }

    /// Move an already inserted object to wherever its current bounds belong
    pub fn relocate(
        &mut self,
        object: SceneObject,
        provider: &impl BoundsProvider,
    ) -> Result<NodeId, OctreeError> {
        if !self.placements.contains_key(&object) {
            return Err(OctreeError::NotFound(object));
        }
        self.insert_object(object, provider)
    }

    /// Place `object` in the tightest node whose loose cube holds `bounds`.
    ///
    /// An object that is already present is moved. The tree grows upward as
    /// many times as needed, so this never fails for finite bounds anywhere in
    /// the `f32` range. Objects far from the origin go no lower than the scale
    /// at which their cell index stays within [`Grid::INDEX_LIMIT`].
    /// Non-finite bounds trip a debug assertion; in release builds where they
    /// end up is unspecified.
    pub fn insert(&mut self, object: SceneObject, bounds: AABB) -> NodeId {
        debug_assert!(bounds.is_finite(), "degenerate bounds {bounds:?} for {object}");

        self.detach(object);

        let scale = self.scale_for(&bounds);
        let coord = self.grid.cell_containing(bounds.center(), scale);
        self.cover(scale, coord);
        let node = self.get_or_create(scale, coord);

        self.nodes[node].data.insert(object);
        self.placements.insert(object, Placement { node, bounds });
        trace!("Placed {object} at scale {scale} in node {node:?}");
        node
    }

    /// Node currently holding an actor
    pub fn locate_actor(&self, actor_id: ActorId) -> Result<NodeId, OctreeError> {
        self.locate(actor_id.into())
    }

    /// Node currently holding a light
    pub fn locate_light(&self, light_id: LightId) -> Result<NodeId, OctreeError> {
        self.locate(light_id.into())
    }

    /// Node currently holding a particle system
    pub fn locate_particle_system(
        &self,
        particle_system_id: ParticleSystemId,
    ) -> Result<NodeId, OctreeError> {
        self.locate(particle_system_id.into())
    }

    /// Node currently holding any object
    pub fn locate(&self, object: SceneObject) -> Result<NodeId, OctreeError> {
        self.placements
            .get(&object)
            .map(|placement| placement.node)
            .ok_or(OctreeError::NotFound(object))
    }

    /// Bounds recorded when the object was last inserted
    pub fn bounds_of(&self, object: SceneObject) -> Option<AABB> {
        self.placements.get(&object).map(|placement| placement.bounds)
    }

    /// Check whether an object is indexed
    pub fn contains(&self, object: SceneObject) -> bool {
        self.placements.contains_key(&object)
    }

    /// Remove an actor; returns false if it was not present
    pub fn remove_actor(&mut self, actor_id: ActorId) -> bool {
        self.remove(actor_id.into())
    }

    /// Remove a light; returns false if it was not present
    pub fn remove_light(&mut self, light_id: LightId) -> bool {
        self.remove(light_id.into())
    }

    /// Remove a particle system; returns false if it was not present
    pub fn remove_particle_system(&mut self, particle_system_id: ParticleSystemId) -> bool {
        self.remove(particle_system_id.into())
    }

    /// Remove any object. Empty nodes are left for the next prune.
    pub fn remove(&mut self, object: SceneObject) -> bool {
        self.detach(object).is_some()
    }

    /// Remove every non-root node that holds nothing and has no children.
    ///
    /// Works from the finest level up so whole empty branches disappear in one
    /// call. With `collapse_root` set, an empty root with a single child is then
    /// replaced by that child, repeatedly. Returns the number of nodes removed;
    /// a second call straight after the first always returns 0.
    pub fn prune_empty_nodes(&mut self) -> usize {
        let mut removed = 0;

        for level in (1..self.levels.len()).rev() {
            let empty: Vec<(GridCoord, NodeId)> = self.levels[level]
                .iter()
                .filter(|(_, id)| self.nodes[**id].is_empty())
                .map(|(coord, id)| (*coord, *id))
                .collect();

            for (coord, id) in empty {
                self.levels[level].remove(&coord);
                if let Some(node) = self.nodes.remove(id) {
                    let octant = self.grid.octant(coord, node.scale);
                    if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(p)) {
                        parent.children[octant] = None;
                    }
                }
                removed += 1;
            }
        }

        while self.levels.len() > 1 && self.levels.back().is_some_and(BTreeMap::is_empty) {
            self.levels.pop_back();
        }

        if self.config.collapse_root {
            removed += self.collapse_root();
        }

        if removed > 0 {
            debug!(
                "Pruned {removed} octree nodes, {} remain over {} levels",
                self.nodes.len(),
                self.levels.len()
            );
        }
        removed
    }

    /// Drop everything, including the root
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.levels.clear();
        self.placements.clear();
        self.root_scale = 0;
    }

    /// True when no objects are indexed and no nodes other than the root exist
    pub fn is_empty(&self) -> bool {
        self.root_node().map_or(true, OctreeNode::is_empty)
    }

    /// True once something has been inserted
    pub fn has_root(&self) -> bool {
        !self.levels.is_empty()
    }

    /// Root node handle
    pub fn root(&self) -> Option<NodeId> {
        self.levels.front().and_then(|level| level.values().next().copied())
    }

    /// Root node
    pub fn root_node(&self) -> Option<&OctreeNode> {
        self.root().and_then(|id| self.nodes.get(id))
    }

    /// Tight edge length of the root, 0 for an empty tree
    pub fn root_width(&self) -> f32 {
        self.root_node().map_or(0.0, OctreeNode::width)
    }

    /// Centre of the root, the origin for an empty tree
    pub fn centre(&self) -> Vec3 {
        self.root_node().map_or_else(Vec3::zeros, OctreeNode::centre)
    }

    /// Look up a node
    pub fn node(&self, id: NodeId) -> Option<&OctreeNode> {
        self.nodes.get(id)
    }

    /// Number of materialised nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of indexed objects
    pub fn object_count(&self) -> usize {
        self.placements.len()
    }

    /// Number of levels, root included
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Depth of a node below the root (root is 0)
    pub fn node_level(&self, id: NodeId) -> Option<u32> {
        self.nodes.get(id).map(|node| self.root_scale - node.scale)
    }

    /// All materialised nodes on one level, in key order
    pub fn nodes_at_level(&self, level: u32) -> Vec<NodeId> {
        self.levels
            .get(level as usize)
            .map(|nodes| nodes.values().copied().collect())
            .unwrap_or_default()
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(OctreeNode::parent)
    }

    /// Direct children of a node
    pub fn immediate_children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(id)
            .map(|node| node.immediate_children().collect())
            .unwrap_or_default()
    }

    /// Every descendant of a node, breadth first
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut queue: VecDeque<NodeId> = self.immediate_children(id).into();
        while let Some(next) = queue.pop_front() {
            result.push(next);
            if let Some(node) = self.nodes.get(next) {
                queue.extend(node.immediate_children());
            }
        }
        result
    }

    /// The other children of this node's parent
    pub fn siblings(&self, id: NodeId) -> Vec<NodeId> {
        self.parent(id)
            .map(|parent| {
                self.immediate_children(parent)
                    .into_iter()
                    .filter(|sibling| *sibling != id)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Deepest materialised node whose cell contains `point`.
    ///
    /// Never grows the tree: fails with `OutsideBounds` if the point is outside
    /// the root cell.
    pub fn locate_point(&self, point: Vec3) -> Result<NodeId, OctreeError> {
        let root = self.root().ok_or(OctreeError::EmptyTree)?;
        if !self.nodes[root].cell_contains(point) {
            return Err(OctreeError::OutsideBounds { point });
        }

        let mut current = root;
        loop {
            let node = &self.nodes[current];
            match node.child(node.octant_towards(point)) {
                Some(child) => current = child,
                None => return Ok(current),
            }
        }
    }

    /// Objects of the given kinds whose bounds intersect `aabb`
    pub fn query_aabb(&self, aabb: &AABB, kinds: ObjectKinds) -> Vec<SceneObject> {
        self.collect(kinds, |node| node.intersects(aabb), |bounds| bounds.intersects(aabb))
    }

    /// Objects of the given kinds whose bounds touch `sphere`
    pub fn query_sphere(&self, sphere: &BoundingSphere, kinds: ObjectKinds) -> Vec<SceneObject> {
        self.collect(
            kinds,
            |node| node.intersects_sphere(sphere),
            |bounds| bounds.intersects_sphere(sphere),
        )
    }

    /// Objects of the given kinds whose bounds are at least partly inside `frustum`
    pub fn query_frustum(&self, frustum: &Frustum, kinds: ObjectKinds) -> Vec<SceneObject> {
        self.collect(
            kinds,
            |node| frustum.intersects_aabb(node),
            |bounds| frustum.intersects_aabb(bounds),
        )
    }

    /// Walk the tree skipping nodes whose loose cube fails `node_test`, keeping
    /// objects whose recorded bounds pass `object_test`. Results are sorted.
    fn collect(
        &self,
        kinds: ObjectKinds,
        node_test: impl Fn(&AABB) -> bool,
        object_test: impl Fn(&AABB) -> bool,
    ) -> Vec<SceneObject> {
        let mut results = Vec::new();
        let mut stack: Vec<NodeId> = self.root().into_iter().collect();

        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if !node_test(&node.loose_bounds()) {
                continue;
            }
            results.extend(node.data.objects(kinds).filter(|object| {
                self.placements
                    .get(object)
                    .is_some_and(|placement| object_test(&placement.bounds))
            }));
            stack.extend(node.immediate_children());
        }

        results.sort_unstable();
        results
    }

    /// Smallest scale whose tight cell is at least as wide as the object and
    /// at which the object's centre has a bounded cell index
    fn scale_for(&self, bounds: &AABB) -> u32 {
        let size = (bounds.max.cast::<f64>() - bounds.min.cast::<f64>()).max();
        let mut scale = self.grid.min_scale_for(bounds.center());
        while self.grid.width(scale) < size {
            scale += 1;
        }
        scale
    }

    /// Make sure the root is cell `coord` at `scale` or one of its ancestors,
    /// growing as needed.
    ///
    /// Any two cells share an ancestor a bounded number of scales up, so this
    /// always terminates.
    fn cover(&mut self, scale: u32, coord: GridCoord) {
        let Some(mut root) = self.root() else {
            let root = self.new_node(scale, coord);
            self.levels.push_back(BTreeMap::from([(coord, root)]));
            self.root_scale = scale;
            debug!("Created octree root at scale {scale} (width {})", self.grid.width(scale));
            return;
        };

        while self.root_scale < scale
            || self.grid.ancestor(coord, scale, self.root_scale) != self.nodes[root].coord
        {
            root = self.grow(root);
        }
    }

    /// Wrap the current root in a new root one scale up and return it
    fn grow(&mut self, old_root: NodeId) -> NodeId {
        let old_coord = self.nodes[old_root].coord;
        let scale = self.root_scale + 1;
        let coord = self.grid.parent(old_coord, self.root_scale);

        let new_root = self.new_node(scale, coord);
        self.nodes[new_root].children[self.grid.octant(old_coord, self.root_scale)] = Some(old_root);
        self.nodes[old_root].parent = Some(new_root);

        self.levels.push_front(BTreeMap::from([(coord, new_root)]));
        self.root_scale = scale;
        debug!("Octree grew to scale {scale} (root width {})", self.grid.width(scale));
        new_root
    }

    /// Promote the only child of an empty root until that no longer applies
    fn collapse_root(&mut self) -> usize {
        let mut removed = 0;
        while let Some(root) = self.root() {
            let only_child = {
                let node = &self.nodes[root];
                let mut children = node.immediate_children();
                match (node.data.is_empty(), children.next(), children.next()) {
                    (true, Some(child), None) => child,
                    _ => break,
                }
            };

            self.nodes.remove(root);
            self.levels.pop_front();
            self.root_scale -= 1;
            self.nodes[only_child].parent = None;
            removed += 1;
        }

        if removed > 0 {
            debug!(
                "Collapsed octree root {removed} times, root width now {}",
                self.root_width()
            );
        }
        removed
    }

    /// Find or create the node at `coord`, creating any missing ancestors.
    /// The root must already cover the cell.
    fn get_or_create(&mut self, scale: u32, coord: GridCoord) -> NodeId {
        let level = (self.root_scale - scale) as usize;
        if let Some(id) = self.levels.get(level).and_then(|nodes| nodes.get(&coord)) {
            return *id;
        }
        debug_assert!(scale < self.root_scale, "cell {coord:?} is not under the root");

        let parent = self.get_or_create(scale + 1, self.grid.parent(coord, scale));
        let id = self.new_node(scale, coord);
        self.nodes[id].parent = Some(parent);
        self.nodes[parent].children[self.grid.octant(coord, scale)] = Some(id);

        while self.levels.len() <= level {
            self.levels.push_back(BTreeMap::new());
        }
        self.levels[level].insert(coord, id);
        id
    }

    fn new_node(&mut self, scale: u32, coord: GridCoord) -> NodeId {
        let centre = self.grid.cell_centre(coord, scale);
        self.nodes
            .insert(OctreeNode::new(scale, coord, centre, self.grid.width(scale)))
    }

    fn detach(&mut self, object: SceneObject) -> Option<Placement> {
        let placement = self.placements.remove(&object)?;
        if let Some(node) = self.nodes.get_mut(placement.node) {
            node.data.remove(object);
        }
        Some(placement)
    }
}

impl Default for Octree {
    fn default() -> Self {
        Self::new(OctreeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(x: f32, y: f32, z: f32, half: f32) -> AABB {
        AABB::cube(Vec3::new(x, y, z), half)
    }

    fn actor(id: u32) -> SceneObject {
        SceneObject::Actor(ActorId::new(id))
    }

    fn assert_tree_consistent(octree: &Octree) {
        let root = octree.root().unwrap();
        assert_eq!(octree.nodes_at_level(0), vec![root]);
        assert!(octree.node(root).unwrap().is_root());

        for level in 1..octree.level_count() as u32 {
            for id in octree.nodes_at_level(level) {
                let node = octree.node(id).unwrap();
                let parent = octree.node(node.parent().unwrap()).unwrap();
                assert_eq!(octree.node_level(id), Some(level));
                assert_eq!(parent.scale(), node.scale() + 1);
                assert!(parent.immediate_children().any(|child| child == id));
                assert!(parent.loose_bounds().contains_aabb(&node.loose_bounds()));
            }
        }
    }

    #[test]
    fn test_insert_and_locate_round_trip() {
        let mut octree = Octree::default();
        let mut bounds = HashMap::new();
        let mut seed = 17_u32;
        for id in 1..=60 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let x = (seed % 2000) as f32 / 10.0 - 100.0;
            let y = ((seed >> 8) % 2000) as f32 / 10.0 - 100.0;
            let z = ((seed >> 16) % 2000) as f32 / 10.0 - 100.0;
            let half = ((seed >> 4) % 80) as f32 / 10.0 + 0.05;
            bounds.insert(actor(id), cube(x, y, z, half));
        }

        for id in 1..=60 {
            octree.insert_actor(ActorId::new(id), &bounds).unwrap();
        }

        for (object, aabb) in &bounds {
            let node = octree.node(octree.locate(*object).unwrap()).unwrap();
            assert!(node.loose_bounds().contains_aabb(aabb), "{object} escapes its node");
            assert!(node.data().contains(*object));
        }
        assert_eq!(octree.object_count(), 60);
        assert_tree_consistent(&octree);
    }

    #[test]
    fn test_locate_unknown_object_fails() {
        let octree = Octree::default();
        assert_eq!(
            octree.locate_actor(ActorId::new(9)),
            Err(OctreeError::NotFound(actor(9)))
        );
        assert!(octree.locate_light(LightId::new(1)).is_err());
    }

    #[test]
    fn test_missing_bounds_is_reported() {
        let mut octree = Octree::default();
        let bounds: HashMap<SceneObject, AABB> = HashMap::new();
        assert_eq!(
            octree.insert_light(LightId::new(3), &bounds),
            Err(OctreeError::MissingBounds(SceneObject::Light(LightId::new(3))))
        );
        assert!(!octree.has_root());
    }

    #[test]
    fn test_first_insert_creates_root() {
        let mut octree = Octree::default();
        assert!(octree.is_empty());
        assert_eq!(octree.root_width(), 0.0);

        let node = octree.insert(actor(1), cube(0.5, 0.5, 0.5, 0.25));
        assert_eq!(octree.root(), Some(node));
        assert_eq!(octree.root_width(), 1.0);
        assert_eq!(octree.centre(), Vec3::new(0.5, 0.5, 0.5));
        assert!(!octree.is_empty());
    }

    #[test]
    fn test_growth_wraps_old_root() {
        let mut octree = Octree::default();
        octree.insert(actor(1), cube(0.5, 0.5, 0.5, 0.25));
        let old_root = octree.root().unwrap();
        let old_width = octree.root_width();
        let old_bounds = octree.node(old_root).unwrap().loose_bounds();

        octree.insert(actor(2), cube(1000.5, 0.5, 0.5, 0.25));

        let new_root = octree.root().unwrap();
        assert_ne!(new_root, old_root);
        assert!(octree.root_width() >= old_width * 2.0);
        assert!(octree.node(new_root).unwrap().loose_bounds().contains_aabb(&old_bounds));
        assert!(octree.children(new_root).contains(&old_root));
        assert_eq!(octree.locate(actor(1)).unwrap(), old_root);
        assert_tree_consistent(&octree);
    }

    #[test]
    fn test_growth_towards_negative_coordinates() {
        let mut octree = Octree::default();
        octree.insert(actor(1), cube(0.5, 0.5, 0.5, 0.25));
        octree.insert(actor(2), cube(-1000.5, -3.0, 70.0, 0.25));

        for id in [1, 2] {
            let node = octree.node(octree.locate(actor(id)).unwrap()).unwrap();
            assert!(node.loose_bounds().contains_aabb(&octree.bounds_of(actor(id)).unwrap()));
        }
        assert!(octree.root_width() < 10_000.0);
        assert_tree_consistent(&octree);
    }

    fn assert_contained(octree: &Octree, object: SceneObject) {
        let node = octree.node(octree.locate(object).unwrap()).unwrap();
        let bounds = octree.bounds_of(object).unwrap();
        assert!(
            node.loose_bounds().contains_aabb(&bounds),
            "{object} at {bounds:?} escapes {:?}",
            node.loose_bounds()
        );
    }

    #[test]
    fn test_far_first_insert_then_origin() {
        let mut octree = Octree::default();
        octree.insert(actor(1), cube(1.0e20, 0.0, 0.0, 1.0));
        octree.insert(actor(2), cube(0.0, 0.0, 0.0, 0.25));

        assert_contained(&octree, actor(1));
        assert_contained(&octree, actor(2));
        assert_eq!(octree.node(octree.locate(actor(2)).unwrap()).unwrap().width(), 1.0);
        assert_tree_consistent(&octree);
    }

    #[test]
    fn test_growth_reaches_distant_finite_coordinates() {
        let mut octree = Octree::default();
        octree.insert(actor(1), cube(0.0, 0.0, 0.0, 0.25));
        for (id, x) in (2..).zip([1.0e16, -3.0e25, 1.0e30]) {
            octree.insert(actor(id), cube(x, 0.0, 0.0, 0.25));
        }

        for id in 1..=4 {
            assert_contained(&octree, actor(id));
        }
        assert!(octree.root_width() > 1.0e30);
        assert_eq!(
            octree.query_aabb(&cube(1.0e16, 0.0, 0.0, 1.0), ObjectKinds::ACTORS),
            vec![actor(2)]
        );
        assert_tree_consistent(&octree);
    }

    #[test]
    fn test_objects_at_the_edge_of_the_f32_range() {
        let mut octree = Octree::default();
        octree.insert(actor(1), cube(0.5, 0.5, 0.5, 0.25));
        octree.insert(actor(2), cube(f32::MAX, 0.0, -f32::MAX, 0.0));
        octree.insert(actor(3), cube(-f32::MAX, f32::MAX, 0.0, 1.0));

        for id in 1..=3 {
            assert_contained(&octree, actor(id));
        }
        assert_eq!(octree.root_width(), f32::MAX);
        assert!(octree.root_node().unwrap().loose_bounds().is_finite());
        assert_tree_consistent(&octree);

        octree.remove(actor(2));
        octree.remove(actor(3));
        octree.prune_empty_nodes();
        assert_eq!(octree.root(), octree.locate(actor(1)).ok());
        assert_eq!(octree.root_width(), 1.0);
    }

    #[test]
    fn test_large_objects_sit_higher_up() {
        let mut octree = Octree::default();
        octree.insert(actor(1), cube(0.0, 0.0, 0.0, 0.25));
        let big = octree.insert(actor(2), cube(0.0, 0.0, 0.0, 5.0));
        let small = octree.locate(actor(1)).unwrap();

        assert_eq!(octree.node(big).unwrap().width(), 16.0);
        assert_eq!(octree.node(small).unwrap().width(), 1.0);
        assert!(octree.node_level(big) < octree.node_level(small));
    }

    #[test]
    fn test_reinsert_moves_object() {
        let mut octree = Octree::default();
        let first = octree.insert(actor(1), cube(0.5, 0.5, 0.5, 0.25));
        let second = octree.insert(actor(1), cube(40.5, 0.5, 0.5, 0.25));

        assert_ne!(first, second);
        assert!(!octree.node(first).unwrap().data().contains(actor(1)));
        assert_eq!(octree.locate(actor(1)), Ok(second));
        assert_eq!(octree.object_count(), 1);
    }

    #[test]
    fn test_relocate_requires_existing_object() {
        let mut octree = Octree::default();
        let mut bounds = HashMap::new();
        bounds.insert(actor(1), cube(0.0, 0.0, 0.0, 1.0));
        assert_eq!(octree.relocate(actor(1), &bounds), Err(OctreeError::NotFound(actor(1))));

        octree.insert_object(actor(1), &bounds).unwrap();
        bounds.insert(actor(1), cube(-20.0, 0.0, 0.0, 1.0));
        let node = octree.relocate(actor(1), &bounds).unwrap();
        assert!(octree.node(node).unwrap().loose_bounds().contains_aabb(&bounds[&actor(1)]));
    }

    #[test]
    fn test_remove_is_idempotent_and_does_not_prune() {
        let mut octree = Octree::default();
        octree.insert(actor(1), cube(0.5, 0.5, 0.5, 0.25));
        octree.insert(actor(2), cube(30.5, 0.5, 0.5, 0.25));
        let nodes_before = octree.node_count();

        assert!(octree.remove_actor(ActorId::new(2)));
        assert!(!octree.remove_actor(ActorId::new(2)));
        assert_eq!(octree.node_count(), nodes_before);
        assert!(octree.locate(actor(2)).is_err());
    }

    #[test]
    fn test_prune_is_idempotent() {
        let mut octree = Octree::default();
        for (id, x) in [(1, 0.5), (2, 10.5), (3, -50.5), (4, 200.5)] {
            octree.insert(actor(id), cube(x, x, 0.5, 0.25));
        }
        octree.remove(actor(2));
        octree.remove(actor(4));

        octree.prune_empty_nodes();
        let snapshot: Vec<Vec<NodeId>> = (0..octree.level_count() as u32)
            .map(|level| octree.nodes_at_level(level))
            .collect();
        let root_width = octree.root_width();

        assert_eq!(octree.prune_empty_nodes(), 0);
        let again: Vec<Vec<NodeId>> = (0..octree.level_count() as u32)
            .map(|level| octree.nodes_at_level(level))
            .collect();
        assert_eq!(snapshot, again);
        assert_eq!(octree.root_width(), root_width);
        assert!(octree.locate(actor(1)).is_ok());
        assert!(octree.locate(actor(3)).is_ok());
        assert_tree_consistent(&octree);
    }

    #[test]
    fn test_prune_on_full_tree_is_noop() {
        let mut octree = Octree::default();
        octree.insert(actor(1), cube(0.5, 0.5, 0.5, 0.25));
        octree.insert(actor(2), cube(0.5, 0.5, 0.5, 3.0));
        let nodes = octree.node_count();
        assert_eq!(octree.prune_empty_nodes(), 0);
        assert_eq!(octree.node_count(), nodes);
    }

    #[test]
    fn test_remove_all_then_prune_empties_tree() {
        let mut octree = Octree::default();
        let spots = [
            (0.0, 0.0, 0.0),
            (500.0, 0.0, 0.0),
            (0.0, -500.0, 0.0),
            (0.0, 0.0, 900.0),
            (-700.0, 300.0, -100.0),
        ];
        for (id, (x, y, z)) in (1..).zip(spots) {
            octree.insert(actor(id), cube(x, y, z, 0.5));
        }
        assert!(octree.node_count() > spots.len());

        for id in 1..=spots.len() as u32 {
            assert!(octree.remove_actor(ActorId::new(id)));
        }
        octree.prune_empty_nodes();

        assert!(octree.is_empty());
        assert_eq!(octree.node_count(), 1);
        assert_eq!(octree.level_count(), 1);
    }

    #[test]
    fn test_collapse_root_shrinks_tree() {
        let mut octree = Octree::default();
        octree.insert(actor(1), cube(0.5, 0.5, 0.5, 0.25));
        octree.insert(actor(2), cube(1000.5, 0.5, 0.5, 0.25));
        assert!(octree.root_width() > 1000.0);

        octree.remove(actor(2));
        octree.prune_empty_nodes();

        assert_eq!(octree.root_width(), 1.0);
        assert_eq!(octree.root(), octree.locate(actor(1)).ok());
        assert_eq!(octree.node_count(), 1);
    }

    #[test]
    fn test_collapse_can_be_disabled() {
        let mut octree = Octree::new(OctreeConfig::default().with_collapse_root(false));
        octree.insert(actor(1), cube(0.5, 0.5, 0.5, 0.25));
        octree.insert(actor(2), cube(1000.5, 0.5, 0.5, 0.25));
        let width = octree.root_width();

        octree.remove(actor(2));
        octree.prune_empty_nodes();

        assert_eq!(octree.root_width(), width);
        assert_tree_consistent(&octree);
    }

    #[test]
    fn test_children_and_siblings() {
        let mut octree = Octree::default();
        let a = octree.insert(actor(1), cube(0.5, 0.5, 0.5, 0.25));
        let b = octree.insert(actor(2), cube(-0.5, 0.5, 0.5, 0.25));
        let c = octree.insert(actor(3), cube(0.5, -0.5, 0.5, 0.25));
        let root = octree.root().unwrap();

        assert_eq!(octree.parent(a), Some(root));
        assert_eq!(octree.parent(b), Some(root));
        let mut siblings = octree.siblings(a);
        siblings.sort();
        let mut expected = vec![b, c];
        expected.sort();
        assert_eq!(siblings, expected);

        let descendants = octree.children(root);
        for id in [a, b, c] {
            assert!(descendants.contains(&id));
        }
        assert!(octree.siblings(root).is_empty());
        assert_eq!(octree.parent(root), None);
    }

    #[test]
    fn test_locate_point_is_strict() {
        let mut octree = Octree::default();
        assert_eq!(octree.locate_point(Vec3::zeros()), Err(OctreeError::EmptyTree));

        let leaf = octree.insert(actor(1), cube(0.5, 0.5, 0.5, 0.25));
        octree.insert(actor(2), cube(12.5, 0.5, 0.5, 0.25));
        let root_width = octree.root_width();

        assert_eq!(octree.locate_point(Vec3::new(0.6, 0.4, 0.5)), Ok(leaf));
        assert!(matches!(
            octree.locate_point(Vec3::new(5000.0, 0.0, 0.0)),
            Err(OctreeError::OutsideBounds { .. })
        ));
        assert_eq!(octree.root_width(), root_width);
    }

    #[test]
    fn test_spatial_queries_filter_by_kind_and_bounds() {
        let mut octree = Octree::default();
        octree.insert(actor(1), cube(0.0, 0.0, 0.0, 1.0));
        octree.insert(actor(2), cube(50.0, 0.0, 0.0, 1.0));
        octree.insert(SceneObject::Light(LightId::new(1)), cube(2.0, 0.0, 0.0, 4.0));
        octree.insert(
            SceneObject::ParticleSystem(ParticleSystemId::new(1)),
            cube(-3.0, 0.0, 0.0, 0.5),
        );

        let near = octree.query_aabb(&cube(0.0, 0.0, 0.0, 4.0), ObjectKinds::all());
        assert_eq!(
            near,
            vec![
                actor(1),
                SceneObject::Light(LightId::new(1)),
                SceneObject::ParticleSystem(ParticleSystemId::new(1)),
            ]
        );

        let actors = octree.query_aabb(&cube(0.0, 0.0, 0.0, 100.0), ObjectKinds::ACTORS);
        assert_eq!(actors, vec![actor(1), actor(2)]);

        let sphere = BoundingSphere::new(Vec3::new(50.0, 3.0, 0.0), 2.5);
        assert_eq!(octree.query_sphere(&sphere, ObjectKinds::all()), vec![actor(2)]);

        let frustum = Frustum::from_matrix(&crate::foundation::math::Mat4::new_orthographic(
            -10.0, 10.0, -10.0, 10.0, -10.0, 10.0,
        ));
        assert_eq!(
            octree.query_frustum(&frustum, ObjectKinds::ACTORS | ObjectKinds::LIGHTS),
            vec![actor(1), SceneObject::Light(LightId::new(1))]
        );
    }

    #[test]
    fn test_particle_systems_are_indexed() {
        let mut octree = Octree::default();
        let mut bounds = HashMap::new();
        let ps = ParticleSystemId::new(7);
        bounds.insert(SceneObject::from(ps), cube(3.0, 3.0, 3.0, 0.5));

        let node = octree.insert_particle_system(ps, &bounds).unwrap();
        assert_eq!(octree.locate_particle_system(ps), Ok(node));
        assert!(octree.node(node).unwrap().data().particle_system_ids.contains(&ps));
        assert!(octree.remove_particle_system(ps));
        octree.prune_empty_nodes();
        assert!(octree.is_empty());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "degenerate bounds")]
    fn test_nan_bounds_assert_in_debug() {
        let mut octree = Octree::default();
        octree.insert(actor(1), cube(f32::NAN, 0.0, 0.0, 1.0));
    }
}
