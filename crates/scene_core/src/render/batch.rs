//! Batches of renderables sharing a render group

use crate::foundation::ids::RenderableId;

/// Renderables sharing one group within one pass, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    renderables: Vec<RenderableId>,
}

impl Batch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a renderable; returns false if it was already here
    pub fn add(&mut self, renderable: RenderableId) -> bool {
        if self.contains(renderable) {
            return false;
        }
        self.renderables.push(renderable);
        true
    }

    /// Remove a renderable, keeping the others in order
    pub fn remove(&mut self, renderable: RenderableId) -> bool {
        match self.renderables.iter().position(|r| *r == renderable) {
            Some(index) => {
                self.renderables.remove(index);
                true
            }
            None => false,
        }
    }

    /// Check membership
    pub fn contains(&self, renderable: RenderableId) -> bool {
        self.renderables.contains(&renderable)
    }

    /// Number of renderables
    pub fn renderable_count(&self) -> usize {
        self.renderables.len()
    }

    /// True when nothing is batched
    pub fn is_empty(&self) -> bool {
        self.renderables.is_empty()
    }

    /// Renderables in batch order
    pub fn renderables(&self) -> &[RenderableId] {
        &self.renderables
    }

    /// Iterate in batch order
    pub fn iter(&self) -> impl Iterator<Item = RenderableId> + '_ {
        self.renderables.iter().copied()
    }

    /// Call `f(index, renderable)` for each renderable in batch order
    pub fn each(&self, mut f: impl FnMut(usize, RenderableId)) {
        for (index, renderable) in self.renderables.iter().enumerate() {
            f(index, *renderable);
        }
    }
}
