//! # Scheduler
//!
//! Two ordered tracks of systems (sync and async), plus per-system timings.
//!
//! While a tick runs, the track it executes is taken out of the scheduler so
//! systems can receive the world mutably. Systems added during the tick land
//! in the (now empty) live track and are merged back when the tick ends;
//! removals are remembered and applied to the restored track. Ticks may nest
//! (a system calling `update`); removals are forgotten only when the
//! outermost one finishes.

use std::any::TypeId;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::system::{AnyAsyncSystem, AnySystem, AsyncSystem, System, TickContext};
use crate::ecs::World;
use crate::error::{EcsError, EcsResult};

/// A registered synchronous system.
pub(crate) struct SyncEntry {
    pub(crate) type_id: TypeId,
    pub(crate) name: String,
    pub(crate) priority: i32,
    pub(crate) system: Box<dyn AnySystem>,
}

impl SyncEntry {
    pub(crate) fn new<S: System>(system: S, priority: i32) -> Self {
        Self {
            type_id: TypeId::of::<S>(),
            name: system.name().to_string(),
            priority,
            system: Box::new(system),
        }
    }
}

/// A registered asynchronous system.
pub(crate) struct AsyncEntry {
    pub(crate) type_id: TypeId,
    pub(crate) name: String,
    pub(crate) priority: i32,
    /// `setup` has not run yet.
    pub(crate) needs_setup: bool,
    pub(crate) system: Box<dyn AnyAsyncSystem>,
}

impl AsyncEntry {
    pub(crate) fn new<S: AsyncSystem>(system: S, priority: i32) -> Self {
        Self {
            type_id: TypeId::of::<S>(),
            name: system.name().to_string(),
            priority,
            needs_setup: true,
            system: Box::new(system),
        }
    }
}

/// System registry and timing table of one world.
#[derive(Default)]
pub struct Scheduler {
    sync_systems: Vec<SyncEntry>,
    async_systems: Vec<AsyncEntry>,
    /// Wall time of the last timed run, per system name or group key.
    process_times: HashMap<String, Duration>,
    /// Open ticks; a track is taken out while this is non-zero.
    running: u32,
    /// Types removed while a track was taken out.
    pending_removals: Vec<TypeId>,
}

impl Scheduler {
    /// Number of registered sync systems.
    #[must_use]
    pub fn sync_len(&self) -> usize {
        self.sync_systems.len()
    }

    /// Number of registered async systems.
    #[must_use]
    pub fn async_len(&self) -> usize {
        self.async_systems.len()
    }

    /// Names of the sync systems in execution order.
    #[must_use]
    pub fn sync_names(&self) -> Vec<&str> {
        self.sync_systems.iter().map(|entry| entry.name.as_str()).collect()
    }

    /// Names of the async systems in execution order.
    #[must_use]
    pub fn async_names(&self) -> Vec<&str> {
        self.async_systems.iter().map(|entry| entry.name.as_str()).collect()
    }

    /// Wall time of the last timed run per system name. Concurrent groups
    /// are recorded as `AsyncGroup(p=<priority>)`.
    #[must_use]
    pub fn process_times(&self) -> &HashMap<String, Duration> {
        &self.process_times
    }

    pub(crate) fn insert_sync(&mut self, entry: SyncEntry) {
        self.sync_systems.push(entry);
        sort_by_priority(&mut self.sync_systems, |entry| entry.priority);
    }

    pub(crate) fn insert_async(&mut self, entry: AsyncEntry) {
        self.async_systems.push(entry);
        sort_by_priority(&mut self.async_systems, |entry| entry.priority);
    }

    /// Removes every system of type `type_id` from both tracks.
    pub(crate) fn remove(&mut self, type_id: TypeId) {
        self.sync_systems.retain(|entry| entry.type_id != type_id);
        self.async_systems.retain(|entry| entry.type_id != type_id);
        if self.running > 0 {
            self.pending_removals.push(type_id);
        }
    }

    pub(crate) fn get<S: 'static>(&self) -> Option<&S> {
        let type_id = TypeId::of::<S>();
        if let Some(entry) = self.sync_systems.iter().find(|entry| entry.type_id == type_id) {
            return entry.system.as_any().downcast_ref();
        }
        self.async_systems
            .iter()
            .find(|entry| entry.type_id == type_id)
            .and_then(|entry| entry.system.as_any().downcast_ref())
    }

    pub(crate) fn get_mut<S: 'static>(&mut self) -> Option<&mut S> {
        let type_id = TypeId::of::<S>();
        if let Some(entry) = self.sync_systems.iter_mut().find(|entry| entry.type_id == type_id) {
            return entry.system.as_any_mut().downcast_mut();
        }
        self.async_systems
            .iter_mut()
            .find(|entry| entry.type_id == type_id)
            .and_then(|entry| entry.system.as_any_mut().downcast_mut())
    }

    /// Opens a tick. Pair with [`Scheduler::finish_tick`].
    pub(crate) fn start_tick(&mut self) {
        self.running += 1;
    }

    pub(crate) fn take_sync(&mut self) -> Vec<SyncEntry> {
        std::mem::take(&mut self.sync_systems)
    }

    pub(crate) fn take_async(&mut self) -> Vec<AsyncEntry> {
        std::mem::take(&mut self.async_systems)
    }

    pub(crate) fn restore_sync(&mut self, mut systems: Vec<SyncEntry>) {
        systems.retain(|entry| !self.pending_removals.contains(&entry.type_id));
        systems.append(&mut self.sync_systems);
        sort_by_priority(&mut systems, |entry| entry.priority);
        self.sync_systems = systems;
    }

    pub(crate) fn restore_async(&mut self, mut systems: Vec<AsyncEntry>) {
        systems.retain(|entry| !self.pending_removals.contains(&entry.type_id));
        systems.append(&mut self.async_systems);
        sort_by_priority(&mut systems, |entry| entry.priority);
        self.async_systems = systems;
    }

    /// Closes a tick once its taken tracks are restored.
    pub(crate) fn finish_tick(&mut self) {
        self.running = self.running.saturating_sub(1);
        if self.running == 0 {
            self.pending_removals.clear();
        }
    }

    pub(crate) fn record(&mut self, name: &str, elapsed: Duration, slow_threshold: Duration) {
        if elapsed > slow_threshold {
            tracing::warn!(
                "System {} took {:?} (threshold {:?})",
                name,
                elapsed,
                slow_threshold
            );
        }
        self.process_times.insert(name.to_string(), elapsed);
    }

    /// Drops every system and timing.
    pub(crate) fn clear(&mut self) {
        self.sync_systems.clear();
        self.async_systems.clear();
        self.process_times.clear();
        self.pending_removals.clear();
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("sync_systems", &self.sync_names())
            .field("async_systems", &self.async_names())
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

/// Stable descending sort: ties keep registration order.
fn sort_by_priority<T>(systems: &mut [T], priority: impl Fn(&T) -> i32) {
    systems.sort_by_key(|entry| Reverse(priority(entry)));
}

/// Group key for a concurrent priority tier.
pub(crate) fn group_key(priority: i32) -> String {
    format!("AsyncGroup(p={priority})")
}

/// Runs the sync track once, stopping at the first failure.
///
/// With `timed`, each system's wall time is recorded in the world's
/// scheduler.
pub(crate) fn run_sync_systems(
    world: &mut World,
    systems: &mut [SyncEntry],
    tick: TickContext,
    timed: bool,
) -> EcsResult<()> {
    let threshold = world.config().slow_system_threshold();
    for entry in systems.iter_mut() {
        let start = timed.then(Instant::now);
        let outcome = entry.system.update(world, tick);
        if let Some(start) = start {
            world.scheduler_mut().record(&entry.name, start.elapsed(), threshold);
        }
        outcome.map_err(|source| EcsError::System {
            system: entry.name.clone(),
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SystemResult;

    struct Named(&'static str, i32);

    impl System for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn priority(&self) -> i32 {
            self.1
        }

        fn update(&mut self, _world: &mut World, _tick: TickContext) -> SystemResult {
            Ok(())
        }
    }

    struct Other;

    impl System for Other {
        fn update(&mut self, _world: &mut World, _tick: TickContext) -> SystemResult {
            Ok(())
        }
    }

    fn entry(name: &'static str, priority: i32) -> SyncEntry {
        SyncEntry::new(Named(name, priority), priority)
    }

    #[test]
    fn test_priority_order_is_stable() {
        let mut scheduler = Scheduler::default();
        scheduler.insert_sync(entry("low", -1));
        scheduler.insert_sync(entry("first", 5));
        scheduler.insert_sync(entry("second", 5));
        scheduler.insert_sync(entry("top", 9));

        assert_eq!(scheduler.sync_names(), vec!["top", "first", "second", "low"]);
    }

    #[test]
    fn test_restore_merges_additions_and_removals() {
        let mut scheduler = Scheduler::default();
        scheduler.insert_sync(entry("a", 1));
        scheduler.insert_sync(SyncEntry::new(Other, 0));

        scheduler.start_tick();
        let taken = scheduler.take_sync();
        assert_eq!(scheduler.sync_len(), 0);

        scheduler.insert_sync(entry("late", 3));
        scheduler.remove(TypeId::of::<Other>());
        scheduler.restore_sync(taken);
        scheduler.finish_tick();

        assert_eq!(scheduler.sync_names(), vec!["late", "a"]);
        assert!(scheduler.get::<Other>().is_none());
        assert_eq!(scheduler.get::<Named>().map(|named| named.0), Some("late"));
    }

    #[test]
    fn test_nested_tick_keeps_outer_removals() {
        let mut scheduler = Scheduler::default();
        scheduler.insert_sync(SyncEntry::new(Other, 0));

        scheduler.start_tick();
        let outer = scheduler.take_sync();

        scheduler.start_tick();
        let inner = scheduler.take_sync();
        scheduler.restore_sync(inner);
        scheduler.finish_tick();

        scheduler.remove(TypeId::of::<Other>());
        scheduler.restore_sync(outer);
        scheduler.finish_tick();

        assert_eq!(scheduler.sync_len(), 0);
        assert!(scheduler.pending_removals.is_empty());
    }

    #[test]
    fn test_record_and_group_key() {
        let mut scheduler = Scheduler::default();
        scheduler.record("Physics", Duration::from_millis(2), Duration::from_millis(16));
        assert_eq!(scheduler.process_times()["Physics"], Duration::from_millis(2));
        assert_eq!(group_key(-3), "AsyncGroup(p=-3)");
    }
}
