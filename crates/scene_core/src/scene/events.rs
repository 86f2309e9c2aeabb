//! Stage events
//!
//! Objects do not poke the octree directly. The stage queues what happened to
//! them and applies it all at once in [`Stage::update`](super::Stage::update),
//! in the order it was queued.

use std::collections::VecDeque;

use crate::foundation::ids::SceneObject;

/// Something that happened to an object since the last update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageEvent {
    /// Object was created with initial bounds
    Spawned(SceneObject),
    /// Object's bounds changed
    BoundsChanged(SceneObject),
    /// Object was destroyed
    Destroyed(SceneObject),
}

impl StageEvent {
    /// Object the event is about
    pub fn object(&self) -> SceneObject {
        match *self {
            Self::Spawned(object) | Self::BoundsChanged(object) | Self::Destroyed(object) => object,
        }
    }
}

/// FIFO of pending stage events
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    pending: VecDeque<StageEvent>,
}

impl EventQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event
    pub fn send(&mut self, event: StageEvent) {
        self.pending.push_back(event);
    }

    /// Take every pending event, oldest first
    pub fn drain(&mut self) -> impl Iterator<Item = StageEvent> {
        std::mem::take(&mut self.pending).into_iter()
    }

    /// Number of pending events
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True when nothing is pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop all pending events
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
