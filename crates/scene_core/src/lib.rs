//! # Scene Core
//!
//! Spatial partitioning and render batching for a 3D engine.
//!
//! ## Features
//!
//! - **Loose Octree**: dynamic, grows and shrinks around the objects it holds
//! - **Render Queue**: priority-ordered batches that minimise GPU state changes
//! - **Stage**: owning context with per-stage ID allocation and deferred updates
//! - **Config**: TOML/RON scene settings
//!
//! ## Quick Start
//!
//! ```rust
//! use scene_core::prelude::*;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let mut stage = Stage::new(&SceneConfig::default())?;
//!     let rock = stage.new_actor(AABB::cube(Vec3::new(40.0, 0.0, 0.0), 2.0));
//!     let lamp = stage.new_light(AABB::cube(Vec3::zeros(), 10.0));
//!     stage.update(0);
//!
//!     let nearby = stage.objects_in_aabb(&AABB::cube(Vec3::zeros(), 50.0), ObjectKinds::all());
//!     assert_eq!(nearby, vec![SceneObject::from(rock), SceneObject::from(lamp)]);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod render;
pub mod scene;
pub mod spatial;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, OctreeConfig, SceneConfig, StageConfig},
        foundation::{
            ids::{ActorId, IdAllocator, LightId, ObjectKinds, ParticleSystemId, RenderableId, SceneObject},
            math::{Mat4, Vec3},
        },
        render::{
            IterationType, MaterialPass, RenderGroup, RenderPriority, RenderQueue, Renderable,
            ShaderId, TextureId, TraversalStep,
        },
        scene::{BoundingSphere, Frustum, SharedStage, Stage, AABB},
        spatial::{NodeId, Octree, OctreeError},
    };
}
