//! # Sharing a World with Async Systems
//!
//! The ECS is single-threaded and cooperative. Async systems still need to
//! mutate the world between their own suspension points, so async ticks run
//! on a [`SharedWorld`]: the world behind a short-lived lock.
//!
//! ```text
//! async system:   lock ─ mutate ─ unlock ─ .await ─ lock ─ mutate ─ unlock
//! scheduler:      never holds the lock while polling a system
//! ```

mod shared;

pub use shared::SharedWorld;
