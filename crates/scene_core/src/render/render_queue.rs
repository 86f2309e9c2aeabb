//! # Render Queue
//!
//! Groups visible renderables into batches that share GPU state and walks them
//! in a fixed order, so the renderer switches shaders and textures as rarely as
//! possible.
//!
//! ## Layout
//!
//! - **Pass buckets**: material pass `i` of every renderable lands in bucket
//!   `i`. Buckets are walked in ascending index order.
//! - **Groups**: within a bucket, batches are keyed by [`RenderGroup`] in an
//!   ordered map, so iteration follows priority first and the renderer's key
//!   second.
//! - **Batches**: renderables within a group keep their insertion order.
//!
//! Regrouping a renderable is always remove-then-insert; group keys are never
//! mutated in place. Batches are dropped as soon as they become empty.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use log::trace;
use thiserror::Error;

use crate::foundation::ids::RenderableId;
use crate::render::batch::Batch;
use crate::render::material::MaterialPass;
use crate::render::render_group::{GpuStateGroupFactory, RenderGroup, RenderGroupFactory, RenderPriority};

/// Render queue errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderQueueError {
    /// Asked about a pass bucket that does not exist
    #[error("pass {pass} is out of range (queue has {pass_count} passes)")]
    OutOfRange {
        /// Requested pass
        pass: usize,
        /// Number of pass buckets
        pass_count: usize,
    },
}

/// Anything that can be drawn through the queue
pub trait Renderable {
    /// Stable identity within the queue
    fn renderable_id(&self) -> RenderableId;

    /// Material passes, in draw order
    fn material_passes(&self) -> &[MaterialPass];

    /// Draw order bucket
    fn render_priority(&self) -> RenderPriority {
        RenderPriority::MAIN
    }

    /// Lights affecting this renderable, used by per-light passes
    fn affecting_light_count(&self) -> u32 {
        0
    }
}

/// One draw yielded by [`RenderQueue::traverse`]
#[derive(Debug, Clone, Copy)]
pub struct TraversalStep<'a> {
    /// Pass bucket index
    pub pass: usize,
    /// Group being drawn
    pub group: &'a RenderGroup,
    /// Group of the previous step, `None` for the first
    pub previous_group: Option<&'a RenderGroup>,
    /// What to draw
    pub renderable: RenderableId,
    /// Material pass to draw it with
    pub material_pass: &'a MaterialPass,
    /// Iteration index within the pass, starting at 0
    pub iteration: u32,
}

impl TraversalStep<'_> {
    /// True when the renderer has to bind new state before drawing
    pub fn group_changed(&self) -> bool {
        self.previous_group != Some(self.group)
    }
}

/// What the queue remembers about a registered renderable
#[derive(Debug, Clone)]
struct Registration {
    material_passes: Vec<MaterialPass>,
    light_count: u32,
    /// Group per pass, indexed like `material_passes`
    groups: Vec<RenderGroup>,
}

/// Per-pass ordered batches of renderables
pub struct RenderQueue {
    factory: Box<dyn RenderGroupFactory>,
    passes: Vec<BTreeMap<RenderGroup, Batch>>,
    registrations: HashMap<RenderableId, Registration>,
}

impl RenderQueue {
    /// Create an empty queue using `factory` to group renderables
    pub fn new(factory: impl RenderGroupFactory + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            passes: Vec::new(),
            registrations: HashMap::new(),
        }
    }

    /// Create an empty queue grouping by a closure
    pub fn with_group_fn<F>(group_fn: F) -> Self
    where
        F: Fn(&dyn Renderable, &MaterialPass) -> RenderGroup + Send + Sync + 'static,
    {
        Self::new(group_fn)
    }

    /// Register a renderable, or regroup it if it is already registered.
    ///
    /// Each material pass gets its own group from the factory and goes into the
    /// bucket with the same index. The light count for per-light passes is read
    /// now; insert again when it changes.
    pub fn insert_renderable(&mut self, renderable: &dyn Renderable) {
        let id = renderable.renderable_id();
        self.remove_renderable(id);

        let material_passes = renderable.material_passes().to_vec();
        let mut groups = Vec::with_capacity(material_passes.len());
        for (pass, material_pass) in material_passes.iter().enumerate() {
            let group = self.factory.new_render_group(renderable, material_pass);
            if self.passes.len() <= pass {
                self.passes.resize_with(pass + 1, BTreeMap::new);
            }
            self.passes[pass].entry(group.clone()).or_default().add(id);
            groups.push(group);
        }

        trace!("Registered {id} in {} passes", groups.len());
        self.registrations.insert(
            id,
            Registration {
                material_passes,
                light_count: renderable.affecting_light_count(),
                groups,
            },
        );
    }

    /// Drop a renderable from every batch it is in.
    ///
    /// Returns false if it was not registered; calling this twice is fine.
    pub fn remove_renderable(&mut self, renderable: RenderableId) -> bool {
        let Some(registration) = self.registrations.remove(&renderable) else {
            return false;
        };

        for (pass, group) in registration.groups.iter().enumerate() {
            let Some(bucket) = self.passes.get_mut(pass) else {
                continue;
            };
            if let Some(batch) = bucket.get_mut(group) {
                batch.remove(renderable);
                if batch.is_empty() {
                    bucket.remove(group);
                }
            }
        }
        true
    }

    /// Check whether a renderable is registered
    pub fn is_registered(&self, renderable: RenderableId) -> bool {
        self.registrations.contains_key(&renderable)
    }

    /// Groups a renderable currently sits in, indexed by pass
    pub fn groups_of(&self, renderable: RenderableId) -> Option<&[RenderGroup]> {
        self.registrations
            .get(&renderable)
            .map(|registration| registration.groups.as_slice())
    }

    /// Number of registered renderables
    pub fn renderable_count(&self) -> usize {
        self.registrations.len()
    }

    /// Number of pass buckets ever used
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Number of non-empty groups in a pass
    pub fn group_count(&self, pass: usize) -> Result<usize, RenderQueueError> {
        self.bucket(pass).map(BTreeMap::len)
    }

    /// Call `f(index, group, batch)` for each group of a pass, in draw order
    pub fn each_group(
        &self,
        pass: usize,
        mut f: impl FnMut(usize, &RenderGroup, &Batch),
    ) -> Result<(), RenderQueueError> {
        for (index, (group, batch)) in self.bucket(pass)?.iter().enumerate() {
            f(index, group, batch);
        }
        Ok(())
    }

    /// Walk every draw in order: passes ascending, groups ascending, batch
    /// order within a group, then iterations.
    pub fn traverse(&self, frame_id: u64, mut callback: impl FnMut(&TraversalStep<'_>)) {
        let mut previous_group = None;
        let mut draws = 0_usize;

        for (pass, bucket) in self.passes.iter().enumerate() {
            for (group, batch) in bucket {
                for renderable in batch.iter() {
                    let Some(registration) = self.registrations.get(&renderable) else {
                        continue;
                    };
                    let Some(material_pass) = registration.material_passes.get(pass) else {
                        continue;
                    };

                    for iteration in 0..material_pass.iteration_count(registration.light_count) {
                        callback(&TraversalStep {
                            pass,
                            group,
                            previous_group,
                            renderable,
                            material_pass,
                            iteration,
                        });
                        previous_group = Some(group);
                        draws += 1;
                    }
                }
            }
        }

        trace!("Frame {frame_id}: traversed {draws} draws over {} passes", self.passes.len());
    }

    /// Unregister everything; pass buckets are kept
    pub fn clear(&mut self) {
        self.registrations.clear();
        for bucket in &mut self.passes {
            bucket.clear();
        }
    }

    fn bucket(&self, pass: usize) -> Result<&BTreeMap<RenderGroup, Batch>, RenderQueueError> {
        self.passes.get(pass).ok_or(RenderQueueError::OutOfRange {
            pass,
            pass_count: self.passes.len(),
        })
    }
}

impl Default for RenderQueue {
    fn default() -> Self {
        Self::new(GpuStateGroupFactory)
    }
}

impl fmt::Debug for RenderQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderQueue")
            .field("passes", &self.passes)
            .field("renderables", &self.registrations.len())
            .finish_non_exhaustive()
    }
}
