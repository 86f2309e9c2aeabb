//! # Stage
//!
//! The stage owns everything the spatial and batching core needs for one scene:
//! the ID allocator, the current bounds of every object, the octree, the render
//! queue and the queue of pending object events.
//!
//! Creating, moving and destroying objects only records events. The octree
//! catches up once per frame in [`Stage::update`].
//!
//! ```rust
//! use scene_core::prelude::*;
//!
//! let mut stage = Stage::default();
//! let ship = stage.new_actor(AABB::cube(Vec3::new(3.0, 0.0, 0.0), 1.0));
//! stage.update(0);
//! assert!(stage.octree().locate_actor(ship).is_ok());
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::{debug, trace, warn};

use crate::config::{ConfigError, SceneConfig, StageConfig};
use crate::foundation::ids::{
    ActorId, IdAllocator, LightId, ObjectKinds, ParticleSystemId, RenderableId, SceneObject,
};
use crate::render::{RenderQueue, Renderable};
use crate::scene::bounds::{BoundingSphere, Frustum, AABB};
use crate::scene::events::{EventQueue, StageEvent};
use crate::spatial::{Octree, OctreeError};

/// Stage behind the single coarse lock used when several threads need it
pub type SharedStage = Arc<Mutex<Stage>>;

/// Owning context for one scene's objects, octree and render queue
#[derive(Debug)]
pub struct Stage {
    config: StageConfig,
    ids: IdAllocator,
    bounds: HashMap<SceneObject, AABB>,
    octree: Octree,
    render_queue: RenderQueue,
    events: EventQueue,
}

impl Stage {
    /// Create an empty stage from a validated configuration
    pub fn new(config: &SceneConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: config.stage.clone(),
            ids: IdAllocator::new(),
            bounds: HashMap::new(),
            octree: Octree::new(config.octree.clone()),
            render_queue: RenderQueue::default(),
            events: EventQueue::new(),
        })
    }

    /// Replace the render queue, e.g. to use a different group factory
    pub fn with_render_queue(mut self, render_queue: RenderQueue) -> Self {
        self.render_queue = render_queue;
        self
    }

    /// Wrap the stage for sharing between threads
    pub fn into_shared(self) -> SharedStage {
        Arc::new(Mutex::new(self))
    }

    /// Create an actor; it reaches the octree on the next update
    pub fn new_actor(&mut self, bounds: AABB) -> ActorId {
        let id = self.ids.next_actor();
        self.spawn(id.into(), bounds);
        id
    }

    /// Create a light; it reaches the octree on the next update
    pub fn new_light(&mut self, bounds: AABB) -> LightId {
        let id = self.ids.next_light();
        self.spawn(id.into(), bounds);
        id
    }

    /// Create a particle system; it reaches the octree on the next update
    pub fn new_particle_system(&mut self, bounds: AABB) -> ParticleSystemId {
        let id = self.ids.next_particle_system();
        self.spawn(id.into(), bounds);
        id
    }

    /// Allocate an ID for something that will be submitted to the render queue
    pub fn new_renderable_id(&mut self) -> RenderableId {
        self.ids.next_renderable()
    }

    /// Record new bounds for an existing object
    pub fn set_bounds(&mut self, object: SceneObject, bounds: AABB) -> Result<(), OctreeError> {
        let Some(current) = self.bounds.get_mut(&object) else {
            warn!("Ignoring bounds update for unknown {object}");
            return Err(OctreeError::NotFound(object));
        };
        *current = bounds;
        self.events.send(StageEvent::BoundsChanged(object));
        Ok(())
    }

    /// Destroy an object. Returns false if it did not exist.
    pub fn destroy(&mut self, object: SceneObject) -> bool {
        if self.bounds.remove(&object).is_none() {
            return false;
        }
        self.events.send(StageEvent::Destroyed(object));
        true
    }

    /// Current bounds of an object
    pub fn bounds(&self, object: SceneObject) -> Option<AABB> {
        self.bounds.get(&object).copied()
    }

    /// Apply every pending event to the octree, then prune if configured.
    /// Returns the number of events applied.
    pub fn update(&mut self, frame_id: u64) -> usize {
        let events: Vec<StageEvent> = self.events.drain().collect();
        for event in &events {
            self.apply(*event);
        }

        let pruned = if self.config.prune_on_update {
            self.octree.prune_empty_nodes()
        } else {
            0
        };

        if !events.is_empty() || pruned > 0 {
            debug!(
                "Frame {frame_id}: applied {} events, pruned {pruned} nodes, {} objects in {} nodes",
                events.len(),
                self.octree.object_count(),
                self.octree.node_count()
            );
        }
        events.len()
    }

    fn apply(&mut self, event: StageEvent) {
        match event {
            StageEvent::Spawned(object) | StageEvent::BoundsChanged(object) => {
                // Bounds are gone if the object was destroyed before this update
                match self.octree.insert_object(object, &self.bounds) {
                    Ok(node) => trace!("{object} now in node {node:?}"),
                    Err(err) => trace!("Skipping {event:?}: {err}"),
                }
            }
            StageEvent::Destroyed(object) => {
                self.octree.remove(object);
            }
        }
    }

    /// Objects of the given kinds touching the view frustum
    pub fn visible_objects(&self, frustum: &Frustum, kinds: ObjectKinds) -> Vec<SceneObject> {
        self.octree.query_frustum(frustum, kinds)
    }

    /// Objects of the given kinds touching a box
    pub fn objects_in_aabb(&self, aabb: &AABB, kinds: ObjectKinds) -> Vec<SceneObject> {
        self.octree.query_aabb(aabb, kinds)
    }

    /// Objects of the given kinds touching a sphere
    pub fn objects_in_sphere(&self, sphere: &BoundingSphere, kinds: ObjectKinds) -> Vec<SceneObject> {
        self.octree.query_sphere(sphere, kinds)
    }

    /// Submit (or regroup) a renderable
    pub fn register_renderable(&mut self, renderable: &dyn Renderable) {
        self.render_queue.insert_renderable(renderable);
    }

    /// Withdraw a renderable; safe to repeat
    pub fn unregister_renderable(&mut self, renderable: RenderableId) -> bool {
        self.render_queue.remove_renderable(renderable)
    }

    /// Number of live objects, including ones not yet applied to the octree
    pub fn object_count(&self) -> usize {
        self.bounds.len()
    }

    /// Number of events waiting for the next update
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// The spatial index
    pub fn octree(&self) -> &Octree {
        &self.octree
    }

    /// The render queue
    pub fn render_queue(&self) -> &RenderQueue {
        &self.render_queue
    }

    /// The render queue, mutably
    pub fn render_queue_mut(&mut self) -> &mut RenderQueue {
        &mut self.render_queue
    }

    /// Drop every object and restart ID sequences
    pub fn reset(&mut self) {
        self.bounds.clear();
        self.events.clear();
        self.octree.clear();
        self.render_queue.clear();
        self.ids.reset();
    }

    fn spawn(&mut self, object: SceneObject, bounds: AABB) {
        self.bounds.insert(object, bounds);
        self.events.send(StageEvent::Spawned(object));
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self {
            config: StageConfig::default(),
            ids: IdAllocator::new(),
            bounds: HashMap::new(),
            octree: Octree::default(),
            render_queue: RenderQueue::default(),
            events: EventQueue::new(),
        }
    }
}
