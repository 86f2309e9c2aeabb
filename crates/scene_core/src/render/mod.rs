//! # Render Batching
//!
//! Sorts what the stage decided is visible into batches that minimise GPU state
//! changes, and walks those batches in a deterministic order for the renderer.
//!
//! ## Architecture
//!
//! - **MaterialPass**: the GPU state one pass binds and how often it is drawn
//! - **RenderGroup**: totally ordered key, priority first
//! - **Batch**: renderables sharing one group in one pass
//! - **RenderQueue**: owns the batches and drives traversal
//!
//! The queue never talks to a graphics API. Renderers consume
//! [`TraversalStep`]s and bind state whenever
//! [`group_changed`](TraversalStep::group_changed) says so.

pub mod batch;
pub mod material;
pub mod render_group;
pub mod render_queue;

pub use batch::Batch;
pub use material::{IterationType, MaterialPass, ShaderId, TextureId};
pub use render_group::{GpuStateGroupFactory, GroupKey, RenderGroup, RenderGroupFactory, RenderPriority};
pub use render_queue::{RenderQueue, RenderQueueError, Renderable, TraversalStep};
