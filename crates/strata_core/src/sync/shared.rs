//! # Shared World
//!
//! A [`World`] behind a `parking_lot` mutex, so async systems can mutate it
//! between their own `.await` points.
//!
//! ```text
//! aupdate_concurrent, async priorities [5, 5, 1]:
//!
//!   sync track ──► p=5: A ┐ joined ──► p=1: C ──► flush destroys
//!                       B ┘
//! ```
//!
//! The scheduler never holds the lock while polling a system. Systems lock
//! around each mutation; the guard is `!Send`, so it cannot live across an
//! `.await` inside a `BoxFuture`.
//!
//! Dropping a tick future early (for example under `tokio::time::timeout`)
//! still puts every system back and flushes deferred destroys.

use std::time::Instant;

use futures::future::join_all;
use parking_lot::{Mutex, MutexGuard};

use crate::ecs::World;
use crate::error::{EcsError, EcsResult};
use crate::schedule::scheduler::{group_key, run_sync_systems, AsyncEntry, SyncEntry};
use crate::schedule::TickContext;

/// How the async track is driven.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AsyncMode {
    /// One system at a time, highest priority first.
    Sequential,
    /// Systems of equal priority polled together.
    Grouped,
}

/// A world shared with async systems.
///
/// # Example
///
/// ```rust,ignore
/// let shared = SharedWorld::new(world);
/// shared.aupdate_concurrent(0.016).await?;
/// let count = shared.lock().entity_count();
/// ```
#[derive(Debug, Default)]
pub struct SharedWorld {
    world: Mutex<World>,
}

impl SharedWorld {
    /// Wraps a world.
    #[must_use]
    pub fn new(world: World) -> Self {
        Self {
            world: Mutex::new(world),
        }
    }

    /// Locks the world. Do not hold the guard across an `.await`.
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, World> {
        self.world.lock()
    }

    /// Unwraps the world.
    #[must_use]
    pub fn into_inner(self) -> World {
        self.world.into_inner()
    }

    /// Runs the sync track only. Same as [`World::update`].
    ///
    /// # Errors
    ///
    /// [`EcsError::System`] wrapping the first system failure.
    pub fn update(&self, delta_time: f32) -> EcsResult<()> {
        self.lock().update(delta_time)
    }

    /// Runs pending async `setup` hooks, once per system.
    ///
    /// Called by both async tick methods; calling it earlier is harmless.
    pub async fn setup_async(&self) {
        let mut scope = TrackScope::setup(self);
        for entry in scope.async_systems.iter_mut().filter(|entry| entry.needs_setup) {
            entry.system.setup(self).await;
            entry.needs_setup = false;
        }
    }

    /// Runs the sync track, then every async system one at a time, highest
    /// priority first. Records each async system's wall time.
    ///
    /// # Errors
    ///
    /// [`EcsError::System`] wrapping the first failure. Deferred destroys are
    /// flushed before it is returned.
    pub async fn aupdate(&self, delta_time: f32) -> EcsResult<()> {
        self.run_tick(delta_time, AsyncMode::Sequential).await
    }

    /// Runs the sync track, then the async track grouped by priority: every
    /// system of one priority is polled concurrently and the whole group
    /// finishes before the next lower priority starts. Records each group's
    /// wall time as `AsyncGroup(p=<priority>)`.
    ///
    /// # Errors
    ///
    /// [`EcsError::System`] wrapping the first failure in priority, then
    /// registration, order. Siblings in the failing group still run to
    /// completion; their errors are logged.
    pub async fn aupdate_concurrent(&self, delta_time: f32) -> EcsResult<()> {
        self.run_tick(delta_time, AsyncMode::Grouped).await
    }

    async fn run_tick(&self, delta_time: f32, mode: AsyncMode) -> EcsResult<()> {
        self.setup_async().await;

        let (mut scope, tick) = TrackScope::tick(self, delta_time);
        {
            let mut world = self.lock();
            run_sync_systems(&mut world, &mut scope.sync_systems, tick, false)?;
        }

        let result = match mode {
            AsyncMode::Sequential => self.run_sequential(&mut scope.async_systems, tick).await,
            AsyncMode::Grouped => self.run_grouped(&mut scope.async_systems, tick).await,
        };
        drop(scope);
        result
    }

    async fn run_sequential(&self, systems: &mut [AsyncEntry], tick: TickContext) -> EcsResult<()> {
        let threshold = self.lock().config().slow_system_threshold();
        for entry in systems.iter_mut() {
            let start = Instant::now();
            let outcome = entry.system.update(self, tick).await;
            self.lock()
                .scheduler_mut()
                .record(&entry.name, start.elapsed(), threshold);

            outcome.map_err(|source| EcsError::System {
                system: entry.name.clone(),
                source,
            })?;
        }
        Ok(())
    }

    async fn run_grouped(&self, systems: &mut [AsyncEntry], tick: TickContext) -> EcsResult<()> {
        let threshold = self.lock().config().slow_system_threshold();
        let mut start = 0;
        while start < systems.len() {
            let priority = systems[start].priority;
            let end = start
                + systems[start..]
                    .iter()
                    .take_while(|entry| entry.priority == priority)
                    .count();
            let group = &mut systems[start..end];

            let started = Instant::now();
            let outcomes = join_all(group.iter_mut().map(|entry| entry.system.update(self, tick))).await;
            self.lock()
                .scheduler_mut()
                .record(&group_key(priority), started.elapsed(), threshold);

            let mut first_error = None;
            for (entry, outcome) in group.iter().zip(outcomes) {
                let Err(source) = outcome else { continue };
                if first_error.is_none() {
                    first_error = Some(EcsError::System {
                        system: entry.name.clone(),
                        source,
                    });
                } else {
                    tracing::warn!(
                        "System {} also failed in group p={}: {}",
                        entry.name,
                        priority,
                        source
                    );
                }
            }
            if let Some(err) = first_error {
                return Err(err);
            }

            start = end;
        }
        Ok(())
    }
}

/// Tracks taken out of the scheduler for one async run.
///
/// Dropping it restores them and, for a tick, closes the tick. This runs
/// whether the run finished, failed, panicked or had its future dropped.
struct TrackScope<'w> {
    shared: &'w SharedWorld,
    sync_systems: Vec<SyncEntry>,
    async_systems: Vec<AsyncEntry>,
    closes_tick: bool,
}

impl<'w> TrackScope<'w> {
    /// Takes the async track for a setup pass. No tick is opened.
    fn setup(shared: &'w SharedWorld) -> Self {
        let mut world = shared.lock();
        let scheduler = world.scheduler_mut();
        scheduler.start_tick();
        let async_systems = scheduler.take_async();
        Self {
            shared,
            sync_systems: Vec::new(),
            async_systems,
            closes_tick: false,
        }
    }

    /// Opens a tick and takes both tracks.
    fn tick(shared: &'w SharedWorld, delta_time: f32) -> (Self, TickContext) {
        let mut world = shared.lock();
        let tick = world.begin_tick(delta_time);
        let scheduler = world.scheduler_mut();
        let sync_systems = scheduler.take_sync();
        let async_systems = scheduler.take_async();
        let scope = Self {
            shared,
            sync_systems,
            async_systems,
            closes_tick: true,
        };
        (scope, tick)
    }
}

impl Drop for TrackScope<'_> {
    fn drop(&mut self) {
        let mut world = self.shared.lock();
        let scheduler = world.scheduler_mut();
        scheduler.restore_sync(std::mem::take(&mut self.sync_systems));
        scheduler.restore_async(std::mem::take(&mut self.async_systems));
        if self.closes_tick {
            world.end_tick();
        } else {
            world.scheduler_mut().finish_tick();
        }
    }
}

impl From<World> for SharedWorld {
    fn from(world: World) -> Self {
        Self::new(world)
    }
}
