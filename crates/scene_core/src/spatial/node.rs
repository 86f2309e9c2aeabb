//! Octree nodes
//!
//! Nodes live in the octree's arena and refer to each other by [`NodeId`].
//! A removed node's ID is never resurrected, so holding a stale ID after a
//! prune is harmless: lookups just return `None`.

use std::collections::BTreeSet;

use crate::foundation::ids::{ActorId, LightId, ObjectKinds, ParticleSystemId, SceneObject};
use crate::foundation::math::{saturating_f32, DVec3, Vec3};
use crate::scene::AABB;
use crate::spatial::grid::GridCoord;

slotmap::new_key_type! {
    /// Generation-checked handle to a node in an [`Octree`](super::Octree)
    pub struct NodeId;
}

/// Objects registered in a single node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeData {
    /// Actors in this node
    pub actor_ids: BTreeSet<ActorId>,
    /// Lights in this node
    pub light_ids: BTreeSet<LightId>,
    /// Particle systems in this node
    pub particle_system_ids: BTreeSet<ParticleSystemId>,
}

impl NodeData {
    /// No objects of any kind
    pub fn is_empty(&self) -> bool {
        self.actor_ids.is_empty() && self.light_ids.is_empty() && self.particle_system_ids.is_empty()
    }

    /// Total number of objects
    pub fn len(&self) -> usize {
        self.actor_ids.len() + self.light_ids.len() + self.particle_system_ids.len()
    }

    /// Add an object; returns false if it was already present
    pub fn insert(&mut self, object: SceneObject) -> bool {
        match object {
            SceneObject::Actor(id) => self.actor_ids.insert(id),
            SceneObject::Light(id) => self.light_ids.insert(id),
            SceneObject::ParticleSystem(id) => self.particle_system_ids.insert(id),
        }
    }

    /// Remove an object; returns false if it was not present
    pub fn remove(&mut self, object: SceneObject) -> bool {
        match object {
            SceneObject::Actor(id) => self.actor_ids.remove(&id),
            SceneObject::Light(id) => self.light_ids.remove(&id),
            SceneObject::ParticleSystem(id) => self.particle_system_ids.remove(&id),
        }
    }

    /// Check membership
    pub fn contains(&self, object: SceneObject) -> bool {
        match object {
            SceneObject::Actor(id) => self.actor_ids.contains(&id),
            SceneObject::Light(id) => self.light_ids.contains(&id),
            SceneObject::ParticleSystem(id) => self.particle_system_ids.contains(&id),
        }
    }

    /// Iterate over the objects whose kind is in `kinds`
    pub fn objects(&self, kinds: ObjectKinds) -> impl Iterator<Item = SceneObject> + '_ {
        let actors = self
            .actor_ids
            .iter()
            .filter(move |_| kinds.contains(ObjectKinds::ACTORS))
            .map(|id| SceneObject::Actor(*id));
        let lights = self
            .light_ids
            .iter()
            .filter(move |_| kinds.contains(ObjectKinds::LIGHTS))
            .map(|id| SceneObject::Light(*id));
        let particles = self
            .particle_system_ids
            .iter()
            .filter(move |_| kinds.contains(ObjectKinds::PARTICLE_SYSTEMS))
            .map(|id| SceneObject::ParticleSystem(*id));
        actors.chain(lights).chain(particles)
    }
}

/// Single cell of the loose octree
///
/// The tight cell is `width()` on each edge; objects are accepted anywhere in
/// the loose cube, which shares the centre and is twice as wide.
///
/// Position and width are kept in `f64`. Near the top of a tree spanning the
/// whole `f32` range they no longer fit in `f32`, so the public accessors
/// clamp to the largest finite `f32` instead.
#[derive(Debug, Clone)]
pub struct OctreeNode {
    pub(crate) scale: u32,
    pub(crate) coord: GridCoord,
    pub(crate) centre: DVec3,
    pub(crate) width: f64,
    pub(crate) data: NodeData,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: [Option<NodeId>; 8],
}

impl OctreeNode {
    pub(crate) fn new(scale: u32, coord: GridCoord, centre: DVec3, width: f64) -> Self {
        Self {
            scale,
            coord,
            centre,
            width,
            data: NodeData::default(),
            parent: None,
            children: [None; 8],
        }
    }

    /// Grid scale; the finest cells are scale 0
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Integer cell key within this node's level
    pub fn coord(&self) -> GridCoord {
        self.coord
    }

    /// Centre of both the tight and the loose cube
    pub fn centre(&self) -> Vec3 {
        self.centre.map(saturating_f32)
    }

    /// Tight edge length
    pub fn width(&self) -> f32 {
        saturating_f32(self.width)
    }

    /// Loose edge length, twice the tight width
    pub fn diameter(&self) -> f32 {
        saturating_f32(self.width * 2.0)
    }

    /// The tight cell
    pub fn tight_bounds(&self) -> AABB {
        self.cube(self.width * 0.5)
    }

    /// The loose cube objects are placed in
    pub fn loose_bounds(&self) -> AABB {
        self.cube(self.width)
    }

    fn cube(&self, half: f64) -> AABB {
        AABB::new(
            self.centre.add_scalar(-half).map(saturating_f32),
            self.centre.add_scalar(half).map(saturating_f32),
        )
    }

    /// Whether `point` is inside the tight cell, lower faces included
    pub fn cell_contains(&self, point: Vec3) -> bool {
        let half = self.width * 0.5;
        point
            .iter()
            .zip(self.centre.iter())
            .all(|(p, c)| (c - half..c + half).contains(&f64::from(*p)))
    }

    /// Octant of the child cell on `point`'s side of the centre
    pub fn octant_towards(&self, point: Vec3) -> usize {
        let bit = |p: f32, c: f64| usize::from(f64::from(p) >= c);
        (bit(point.z, self.centre.z) << 2)
            | (bit(point.y, self.centre.y) << 1)
            | bit(point.x, self.centre.x)
    }

    /// Objects registered here
    pub fn data(&self) -> &NodeData {
        &self.data
    }

    /// Parent node, `None` for the root
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// True for the root
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Any child slot occupied
    pub fn has_children(&self) -> bool {
        self.children.iter().any(Option::is_some)
    }

    /// Child in a particular octant
    pub fn child(&self, octant: usize) -> Option<NodeId> {
        self.children.get(octant).copied().flatten()
    }

    /// Occupied child slots, in octant order
    pub fn immediate_children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.iter().filter_map(|child| *child)
    }

    /// No objects and no children
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && !self.has_children()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_data_membership() {
        let mut data = NodeData::default();
        assert!(data.is_empty());

        assert!(data.insert(SceneObject::Actor(ActorId::new(1))));
        assert!(!data.insert(SceneObject::Actor(ActorId::new(1))));
        assert!(data.insert(SceneObject::Light(LightId::new(1))));
        assert_eq!(data.len(), 2);

        let lights: Vec<_> = data.objects(ObjectKinds::LIGHTS).collect();
        assert_eq!(lights, vec![SceneObject::Light(LightId::new(1))]);
        assert_eq!(data.objects(ObjectKinds::all()).count(), 2);

        assert!(data.remove(SceneObject::Actor(ActorId::new(1))));
        assert!(!data.remove(SceneObject::Actor(ActorId::new(1))));
        assert!(data.remove(SceneObject::Light(LightId::new(1))));
        assert!(data.is_empty());
    }

    #[test]
    fn test_loose_bounds_are_twice_tight() {
        let node = OctreeNode::new(2, GridCoord::new(0, 0, 0), DVec3::repeat(2.0), 4.0);
        assert_eq!(node.centre(), Vec3::new(2.0, 2.0, 2.0));
        assert_eq!(node.tight_bounds().size(), Vec3::repeat(4.0));
        assert_eq!(node.loose_bounds().size(), Vec3::repeat(8.0));
        assert_eq!(node.diameter(), 8.0);
    }

    #[test]
    fn test_cell_membership_and_octants() {
        let node = OctreeNode::new(2, GridCoord::new(0, 0, 0), DVec3::repeat(2.0), 4.0);
        assert!(node.cell_contains(Vec3::new(0.0, 3.9, 2.0)));
        assert!(!node.cell_contains(Vec3::new(4.0, 2.0, 2.0)));
        assert_eq!(node.octant_towards(Vec3::new(1.0, 1.0, 1.0)), 0);
        assert_eq!(node.octant_towards(Vec3::new(2.0, 1.0, 3.0)), 0b101);
    }

    #[test]
    fn test_oversized_cell_saturates_to_finite_bounds() {
        let node = OctreeNode::new(140, GridCoord::new(0, 0, 0), DVec3::zeros(), 1.0e42);
        let loose = node.loose_bounds();
        assert!(loose.is_finite());
        assert_eq!(loose.max, Vec3::repeat(f32::MAX));
        assert_eq!(node.width(), f32::MAX);
        assert!(loose.contains_aabb(&AABB::cube(Vec3::new(f32::MAX, -f32::MAX, 0.0), 0.0)));
    }

    #[test]
    fn test_fresh_node_is_empty_root() {
        let node = OctreeNode::new(0, GridCoord::new(3, 3, 3), DVec3::repeat(3.5), 1.0);
        assert!(node.is_root());
        assert!(node.is_empty());
        assert!(!node.has_children());
        assert_eq!(node.immediate_children().count(), 0);
    }
}
