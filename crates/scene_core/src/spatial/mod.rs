//! Spatial partitioning data structures
//!
//! A dynamic loose octree indexing the stage's actors, lights and particle
//! systems for culling and proximity queries.

mod grid;
mod node;
mod octree;

pub use grid::{Grid, GridCoord};
pub use node::{NodeData, NodeId, OctreeNode};
pub use octree::{BoundsProvider, Octree, OctreeError};
