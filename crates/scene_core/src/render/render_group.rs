//! Render groups
//!
//! A [`RenderGroup`] is the key batches are sorted by. Priority decides first;
//! ties fall through to a [`GroupKey`] describing the GPU state the group binds,
//! so neighbouring groups in iteration order share as much state as possible.

use std::fmt;

use crate::render::material::{MaterialPass, ShaderId, TextureId};
use crate::render::render_queue::Renderable;

/// Draw order bucket; lower values are drawn first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RenderPriority(pub i32);

impl RenderPriority {
    /// Skyboxes and backdrops
    pub const BACKGROUND: Self = Self(-100);
    /// Far scenery
    pub const DISTANT: Self = Self(-50);
    /// Ordinary scene geometry
    pub const MAIN: Self = Self(0);
    /// Geometry drawn over the scene
    pub const NEAR: Self = Self(50);
    /// Overlays and HUD
    pub const FOREGROUND: Self = Self(100);
}

/// Renderer-specific part of a group's ordering
///
/// Variants compare in declaration order, then by their fields in order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    /// Groups renderables that bind the same textures and shader.
    /// Textures come first since switching them costs the most.
    GpuState {
        /// Bound textures, in unit order
        textures: Vec<TextureId>,
        /// Bound shader
        shader: ShaderId,
    },
    /// Free-form key for renderers with their own notion of state
    Label(String),
}

/// Sort key for one batch
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderGroup {
    /// Primary sort axis
    pub priority: RenderPriority,
    /// Tie-breaker within a priority
    pub key: GroupKey,
}

impl RenderGroup {
    /// Create a group
    pub fn new(priority: RenderPriority, key: GroupKey) -> Self {
        Self { priority, key }
    }

    /// Group keyed by a label
    pub fn labelled(priority: RenderPriority, label: impl Into<String>) -> Self {
        Self::new(priority, GroupKey::Label(label.into()))
    }
}

impl fmt::Display for RenderGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            GroupKey::GpuState { textures, shader } => {
                write!(f, "[{}] {shader} with {} textures", self.priority.0, textures.len())
            }
            GroupKey::Label(label) => write!(f, "[{}] {label}", self.priority.0),
        }
    }
}

/// Decides which group a renderable's pass belongs to
///
/// Called once per renderable and pass each time the renderable is inserted.
/// Any `Fn(&dyn Renderable, &MaterialPass) -> RenderGroup` closure works too.
pub trait RenderGroupFactory: Send + Sync {
    /// Group for `pass` of `renderable`
    fn new_render_group(&self, renderable: &dyn Renderable, pass: &MaterialPass) -> RenderGroup;
}

impl<F> RenderGroupFactory for F
where
    F: Fn(&dyn Renderable, &MaterialPass) -> RenderGroup + Send + Sync,
{
    fn new_render_group(&self, renderable: &dyn Renderable, pass: &MaterialPass) -> RenderGroup {
        self(renderable, pass)
    }
}

/// Groups by the renderable's priority, then the pass's textures and shader
#[derive(Debug, Clone, Copy, Default)]
pub struct GpuStateGroupFactory;

impl RenderGroupFactory for GpuStateGroupFactory {
    fn new_render_group(&self, renderable: &dyn Renderable, pass: &MaterialPass) -> RenderGroup {
        RenderGroup::new(
            renderable.render_priority(),
            GroupKey::GpuState {
                textures: pass.textures.clone(),
                shader: pass.shader,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gpu(priority: i32, textures: &[u32], shader: u32) -> RenderGroup {
        RenderGroup::new(
            RenderPriority(priority),
            GroupKey::GpuState {
                textures: textures.iter().copied().map(TextureId).collect(),
                shader: ShaderId(shader),
            },
        )
    }

    #[test]
    fn test_priority_dominates_key() {
        assert!(gpu(0, &[9], 9) < gpu(1, &[0], 0));
        let sky = RenderGroup::labelled(RenderPriority::BACKGROUND, "z");
        assert!(sky < RenderGroup::labelled(RenderPriority::MAIN, "a"));
    }

    #[test]
    fn test_textures_compare_before_shader() {
        assert!(gpu(0, &[1], 5) < gpu(0, &[2], 1));
        assert!(gpu(0, &[1], 1) < gpu(0, &[1], 2));
    }

    #[test]
    fn test_labels_order_lexically() {
        let a = RenderGroup::labelled(RenderPriority::MAIN, "A");
        let b = RenderGroup::labelled(RenderPriority::MAIN, "B");
        assert!(a < b);
        assert_eq!(a.to_string(), "[0] A");
    }
}
