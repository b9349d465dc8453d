//! # System Scheduling
//!
//! Systems are registered on the world and run once per tick, highest
//! priority first:
//! - `World::update` / `World::timed_update` run the sync track
//! - `SharedWorld::aupdate` runs both tracks, async systems one at a time
//! - `SharedWorld::aupdate_concurrent` polls async systems of equal
//!   priority together

pub(crate) mod scheduler;
mod system;

pub use scheduler::Scheduler;
pub use system::{AsyncSystem, System, TickContext};
