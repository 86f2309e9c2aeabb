//! Scene management
//!
//! Bounding volumes shared by the spatial index and the culling code, and the
//! [`Stage`] that ties objects, octree and render queue together.
//!
//! ## Architecture
//!
//! ```text
//! Stage (objects, bounds, events)
//!      ↓ update()
//! Octree (spatial index)  →  visible objects
//!                                  ↓
//!                            RenderQueue (batches)
//! ```

pub mod bounds;
pub mod events;
mod stage;

pub use bounds::{BoundingSphere, Frustum, Plane, AABB};
pub use events::{EventQueue, StageEvent};
pub use stage::{SharedStage, Stage};
