//! # STRATA Core
//!
//! Archetype-based Entity Component System (ECS) for application state:
//! - Generational entity handles that never alias after reuse
//! - Columnar archetype storage with O(1) swap-removal
//! - Versioned query views, cached until the next change
//! - Priority scheduler for sync and async systems
//!
//! ## Architecture Rules
//!
//! 1. **Liveness first** - Every accessor validates the handle before
//!    touching storage, so a failed call never leaves the world half-changed
//! 2. **Dense columns** - One `Vec<T>` per component type per archetype
//! 3. **Version on change** - Structural changes and mutable access bump the
//!    version; views built at an older version are rebuilt
//! 4. **Deferred destroys** - Destroys requested during a tick apply after
//!    the last system ran
//!
//! ## Example
//!
//! ```rust,ignore
//! use strata_core::prelude::*;
//!
//! #[derive(Clone)]
//! struct Position(f32, f32);
//! impl Component for Position {}
//!
//! let mut world = World::new();
//! let e = world.create_entity((Position(0.0, 0.0),));
//! world.add_system(Movement);
//! world.update(1.0 / 60.0)?;
//!
//! let positions = world.view::<&Position>()?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod schedule;
pub mod sync;

pub use config::WorldConfig;
pub use ecs::{
    Archetype, ArchetypeId, Bundle, Component, ComponentRef, ComponentStorage, Entity,
    EntityLocation, Query, QueryIter, Signature, View, World,
};
pub use error::{BoxError, EcsError, EcsResult, SystemResult};
pub use schedule::{AsyncSystem, Scheduler, System, TickContext};
pub use sync::SharedWorld;

/// Boxed future returned by [`AsyncSystem`] hooks.
pub use futures::future::BoxFuture;

/// Everything needed to define components and systems.
pub mod prelude {
    pub use crate::{
        AsyncSystem, BoxFuture, Component, EcsError, EcsResult, Entity, SharedWorld, System,
        SystemResult, TickContext, World, WorldConfig,
    };
}
