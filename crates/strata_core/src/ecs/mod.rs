//! # Entity Component System
//!
//! An archetype-based ECS for arbitrary component types.
//!
//! ## Design Philosophy
//!
//! - Entities with the same component set share one archetype
//! - Components are stored in dense columns, one `Vec<T>` per type
//! - Entity IDs are indices with generation counters
//! - Queries walk only the archetypes that can match

pub mod archetype;
pub mod component;
pub mod entity;
pub mod query;
pub mod storage;
mod world;

pub use archetype::{Archetype, ArchetypeId, ArchetypeStore, ComponentRef, Signature};
pub use component::{Bundle, Component};
pub use entity::{Entity, EntityLocation, EntityRegistry};
pub use query::{Query, QueryIter, View};
pub use storage::{ComponentStorage, ErasedStorage};
pub use world::World;
