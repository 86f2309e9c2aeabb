//! Object identifiers
//!
//! Every object the stage tracks gets a small typed ID. IDs are handed out by an
//! [`IdAllocator`] owned by whoever owns the objects (normally the
//! [`Stage`](crate::scene::Stage)), so two stages never share a counter and
//! tests can reset the sequence.

use std::fmt;

use log::warn;

macro_rules! object_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u32);

        impl $name {
            /// Wrap a raw ID value
            pub const fn new(id: u32) -> Self {
                Self(id)
            }

            /// Get the raw ID value
            pub const fn id(&self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, " #{}"), self.0)
            }
        }
    };
}

object_id!(
    /// Identifier of a mesh-carrying actor
    ActorId,
    "actor"
);
object_id!(
    /// Identifier of a light source
    LightId,
    "light"
);
object_id!(
    /// Identifier of a particle system
    ParticleSystemId,
    "particle system"
);
object_id!(
    /// Identifier of anything submitted to the render queue
    RenderableId,
    "renderable"
);

bitflags::bitflags! {
    /// Set of object kinds, used to filter spatial queries
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ObjectKinds: u8 {
        /// Actors
        const ACTORS = 1 << 0;
        /// Lights
        const LIGHTS = 1 << 1;
        /// Particle systems
        const PARTICLE_SYSTEMS = 1 << 2;
    }
}

/// Any object that can live in the octree
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SceneObject {
    /// An actor
    Actor(ActorId),
    /// A light
    Light(LightId),
    /// A particle system
    ParticleSystem(ParticleSystemId),
}

impl SceneObject {
    /// The kind flag matching this object
    pub const fn kind(&self) -> ObjectKinds {
        match self {
            Self::Actor(_) => ObjectKinds::ACTORS,
            Self::Light(_) => ObjectKinds::LIGHTS,
            Self::ParticleSystem(_) => ObjectKinds::PARTICLE_SYSTEMS,
        }
    }
}

impl fmt::Display for SceneObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actor(id) => write!(f, "{id}"),
            Self::Light(id) => write!(f, "{id}"),
            Self::ParticleSystem(id) => write!(f, "{id}"),
        }
    }
}

impl From<ActorId> for SceneObject {
    fn from(id: ActorId) -> Self {
        Self::Actor(id)
    }
}

impl From<LightId> for SceneObject {
    fn from(id: LightId) -> Self {
        Self::Light(id)
    }
}

impl From<ParticleSystemId> for SceneObject {
    fn from(id: ParticleSystemId) -> Self {
        Self::ParticleSystem(id)
    }
}

/// Per-kind ID counters
///
/// IDs start at 1 for every kind. Counters never hand out a value twice until
/// [`reset`](Self::reset) is called, up to `u32::MAX` IDs per kind. An
/// exhausted sequence keeps returning `u32::MAX` and logs a warning each time.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next_actor: u32,
    next_light: u32,
    next_particle_system: u32,
    next_renderable: u32,
}

impl IdAllocator {
    /// Create an allocator with all sequences at their first value
    pub const fn new() -> Self {
        Self {
            next_actor: 1,
            next_light: 1,
            next_particle_system: 1,
            next_renderable: 1,
        }
    }

    /// Allocate a new actor ID
    pub fn next_actor(&mut self) -> ActorId {
        ActorId(Self::bump(&mut self.next_actor, "actor"))
    }

    /// Allocate a new light ID
    pub fn next_light(&mut self) -> LightId {
        LightId(Self::bump(&mut self.next_light, "light"))
    }

    /// Allocate a new particle system ID
    pub fn next_particle_system(&mut self) -> ParticleSystemId {
        ParticleSystemId(Self::bump(&mut self.next_particle_system, "particle system"))
    }

    /// Allocate a new renderable ID
    pub fn next_renderable(&mut self) -> RenderableId {
        RenderableId(Self::bump(&mut self.next_renderable, "renderable"))
    }

    /// Restart every sequence from 1
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn bump(counter: &mut u32, kind: &str) -> u32 {
        let id = *counter;
        match id.checked_add(1) {
            Some(next) => *counter = next,
            None => warn!("{kind} IDs exhausted, handing out {id} again"),
        }
        id
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
