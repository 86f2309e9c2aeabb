//! Material passes as seen by the render queue
//!
//! The queue only cares about the GPU state a pass binds (shader and textures)
//! and how many times the pass must be drawn. Everything else about a
//! material lives with the renderer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Handle to a compiled shader program owned by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShaderId(pub u32);

/// Handle to a texture owned by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TextureId(pub u32);

impl fmt::Display for ShaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shader #{}", self.0)
    }
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "texture #{}", self.0)
    }
}

/// How many times a pass is drawn per traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum IterationType {
    /// Drawn exactly once
    #[default]
    Once,
    /// Drawn `max_iterations` times
    N,
    /// Drawn once per light affecting the renderable, up to `max_iterations`
    OncePerLight,
}

/// One pass of a material
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialPass {
    /// Shader bound for this pass
    pub shader: ShaderId,
    /// Textures bound for this pass, in unit order
    pub textures: Vec<TextureId>,
    /// Iteration policy
    pub iteration: IterationType,
    /// Upper bound for `N` and `OncePerLight`
    pub max_iterations: u32,
}

impl MaterialPass {
    /// Single-iteration pass with no textures
    pub fn new(shader: ShaderId) -> Self {
        Self {
            shader,
            textures: Vec::new(),
            iteration: IterationType::Once,
            max_iterations: 1,
        }
    }

    /// Add a texture unit
    pub fn with_texture(mut self, texture: TextureId) -> Self {
        self.textures.push(texture);
        self
    }

    /// Set the iteration policy
    pub fn with_iteration(mut self, iteration: IterationType, max_iterations: u32) -> Self {
        self.iteration = iteration;
        self.max_iterations = max_iterations;
        self
    }

    /// Number of draws this pass needs for a renderable lit by `light_count` lights
    pub fn iteration_count(&self, light_count: u32) -> u32 {
        match self.iteration {
            IterationType::Once => 1,
            IterationType::N => self.max_iterations,
            IterationType::OncePerLight => light_count.min(self.max_iterations),
        }
    }
}
