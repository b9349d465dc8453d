//! # ECS World
//!
//! The central container for entities, components and systems.
//!
//! Every structural change (create, destroy, add/remove component) and every
//! mutable component access bumps the world [`version`](World::version).
//! Cached views are only handed out while the version they were built at is
//! still current.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::archetype::{ArchetypeId, ArchetypeStore, ComponentRef, Signature};
use super::component::{Bundle, Component};
use super::entity::{Entity, EntityLocation, EntityRegistry};
use super::query::{query_types, Query, QueryIter, View, ViewCache};
use crate::config::WorldConfig;
use crate::error::{EcsError, EcsResult};
use crate::schedule::scheduler::{run_sync_systems, AsyncEntry, SyncEntry};
use crate::schedule::{AsyncSystem, Scheduler, System, TickContext};

/// The ECS World - container for all state.
///
/// `World` has no internal locking: every mutator takes `&mut self`. To run
/// async systems, wrap it in a [`SharedWorld`](crate::sync::SharedWorld).
///
/// # Example
///
/// ```rust,ignore
/// let mut world = World::new();
///
/// let entity = world.create_entity((Position::new(1.0, 2.0), Velocity::default()));
/// world.add_system(Movement);
/// world.update(1.0 / 60.0)?;
///
/// for (entity, (pos, vel)) in world.view::<(&Position, &Velocity)>()?.iter() { ... }
/// ```
pub struct World {
    config: WorldConfig,
    entities: EntityRegistry,
    archetypes: ArchetypeStore,
    /// Snapshot cache; behind a lock so `view` can take `&self`.
    views: Mutex<ViewCache>,
    scheduler: Scheduler,
    /// Structural change counter.
    version: u64,
    /// Number of ticks started.
    tick: u64,
    /// Open deferral scopes (ticks and `defer_deletions`).
    defer_depth: u32,
    /// Destroys requested while `defer_depth > 0`.
    pending_kill: Vec<Entity>,
}

impl World {
    /// Creates an empty world with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Creates an empty world pre-sized from `config`.
    #[must_use]
    pub fn with_config(config: WorldConfig) -> Self {
        Self {
            entities: EntityRegistry::with_capacity(config.entity_capacity),
            archetypes: ArchetypeStore::new(config.archetype_capacity),
            views: Mutex::new(ViewCache::default()),
            scheduler: Scheduler::default(),
            version: 0,
            tick: 0,
            defer_depth: 0,
            pending_kill: Vec::new(),
            config,
        }
    }

    /// The configuration this world was built with.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Current structural version.
    #[inline]
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Number of ticks started so far.
    #[inline]
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    #[inline]
    fn bump_version(&mut self) {
        self.version += 1;
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Creates an entity from a bundle of components.
    ///
    /// ```rust,ignore
    /// let e = world.create_entity((Position::default(),));
    /// let bare = world.create_entity(());
    /// ```
    pub fn create_entity<B: Bundle>(&mut self, bundle: B) -> Entity {
        let archetype = self.archetype_for_bundle::<B>();
        let storage = self.archetypes.get_mut(archetype);
        let row = storage.len();
        let entity = self.entities.allocate(EntityLocation { archetype, row });

        bundle.write(storage);
        storage.commit_row(entity.index());
        self.bump_version();

        tracing::trace!("Created entity {} in archetype {:?}", entity, archetype);
        entity
    }

    fn archetype_for_bundle<B: Bundle>(&mut self) -> ArchetypeId {
        let mut types = Vec::new();
        B::component_types(&mut types);
        let signature = Signature::new(types);
        if let Some(id) = self.archetypes.lookup(&signature) {
            return id;
        }

        let mut columns = Vec::new();
        B::empty_columns(self.config.archetype_capacity, &mut columns);
        self.archetypes.insert(signature, columns)
    }

    /// Destroys an entity, or queues it while a tick or
    /// [`defer_deletions`](World::defer_deletions) scope is open.
    ///
    /// A queued handle stays live until the outermost scope ends.
    ///
    /// # Errors
    ///
    /// [`EcsError::StaleHandle`] if applied immediately to a dead handle.
    /// Queued handles are validated at flush time and silently skipped if
    /// already dead.
    pub fn destroy_entity(&mut self, entity: Entity) -> EcsResult<()> {
        if self.defer_depth > 0 {
            self.pending_kill.push(entity);
            return Ok(());
        }
        self.destroy_entity_immediate(entity)
    }

    /// Destroys an entity now, even inside a tick.
    ///
    /// # Errors
    ///
    /// [`EcsError::StaleHandle`] if the handle is not live.
    pub fn destroy_entity_immediate(&mut self, entity: Entity) -> EcsResult<()> {
        let location = self.live_location(entity)?;
        self.despawn_at(entity, location);
        Ok(())
    }

    fn despawn_at(&mut self, entity: Entity, location: EntityLocation) {
        if let Some(moved) = self.archetypes.get_mut(location.archetype).swap_remove(location.row) {
            self.entities.relocate_row(moved, location.row);
        }
        self.entities.release(entity.index());
        self.bump_version();
        tracing::trace!("Destroyed entity {}", entity);
    }

    /// Checks if a handle names a live entity. Never fails.
    #[inline]
    #[must_use]
    pub fn entity_exists(&self, entity: Entity) -> bool {
        self.entities.is_live(entity)
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.alive_count()
    }

    /// Handles of all live entities, in archetype order.
    #[must_use]
    pub fn entities(&self) -> Vec<Entity> {
        self.iter_entities().collect()
    }

    /// Lazily iterates all live entities, in archetype order.
    pub fn iter_entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.archetypes.iter().flat_map(move |archetype| {
            archetype
                .entities()
                .iter()
                .map(move |index| self.entities.handle(*index))
        })
    }

    /// Where a live entity is stored.
    ///
    /// # Errors
    ///
    /// [`EcsError::StaleHandle`] if the handle is not live.
    pub fn location(&self, entity: Entity) -> EcsResult<EntityLocation> {
        self.live_location(entity)
    }

    #[inline]
    fn live_location(&self, entity: Entity) -> EcsResult<EntityLocation> {
        self.entities
            .location(entity)
            .ok_or(EcsError::StaleHandle { entity })
    }

    /// Number of archetypes created so far, including the empty one.
    #[must_use]
    pub fn archetype_count(&self) -> usize {
        self.archetypes.len()
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Attaches `component`, replacing an existing value of the same type in
    /// place. Otherwise the entity migrates to the archetype with `C` added.
    ///
    /// # Errors
    ///
    /// [`EcsError::StaleHandle`] if the handle is not live.
    pub fn add_component<C: Component>(&mut self, entity: Entity, component: C) -> EcsResult<()> {
        let location = self.live_location(entity)?;

        if let Some(slot) = self.archetypes.get_mut(location.archetype).get_mut::<C>(location.row) {
            *slot = component;
            self.bump_version();
            return Ok(());
        }

        let target = self.archetypes.target_with::<C>(location.archetype);
        let (src, dst) = self.archetypes.pair_mut(location.archetype, target);
        let moved = src.move_row(location.row, dst, None);
        dst.stage(component);
        let row = dst.commit_row(entity.index());

        self.finish_migration(entity, location, moved, EntityLocation { archetype: target, row });
        Ok(())
    }

    /// Detaches and returns component `C`; the entity migrates to the
    /// archetype without it.
    ///
    /// # Errors
    ///
    /// [`EcsError::StaleHandle`] if the handle is not live,
    /// [`EcsError::ComponentNotFound`] if the entity lacks `C`.
    pub fn remove_component<C: Component>(&mut self, entity: Entity) -> EcsResult<C> {
        let location = self.live_location(entity)?;
        let type_id = TypeId::of::<C>();
        if !self.archetypes.get(location.archetype).signature().contains(type_id) {
            return Err(Self::missing::<C>(entity));
        }

        let target = self.archetypes.target_without(location.archetype, type_id);
        let (src, dst) = self.archetypes.pair_mut(location.archetype, target);
        let value = src
            .take::<C>(location.row)
            .ok_or_else(|| Self::missing::<C>(entity))?;
        let moved = src.move_row(location.row, dst, Some(type_id));
        let row = dst.commit_row(entity.index());

        self.finish_migration(entity, location, moved, EntityLocation { archetype: target, row });
        Ok(value)
    }

    fn finish_migration(&mut self, entity: Entity, from: EntityLocation, moved: Option<u32>, to: EntityLocation) {
        if let Some(moved) = moved {
            self.entities.relocate_row(moved, from.row);
        }
        self.entities.set_location(entity.index(), to);
        self.bump_version();
        tracing::trace!(
            "Migrated entity {} from archetype {:?} to {:?}",
            entity,
            from.archetype,
            to.archetype
        );
    }

    fn missing<C: Component>(entity: Entity) -> EcsError {
        EcsError::ComponentNotFound {
            entity,
            component: type_name::<C>(),
        }
    }

    /// Checks if the entity carries `C`.
    ///
    /// # Errors
    ///
    /// [`EcsError::StaleHandle`] if the handle is not live.
    pub fn has_component<C: Component>(&self, entity: Entity) -> EcsResult<bool> {
        let location = self.live_location(entity)?;
        Ok(self
            .archetypes
            .get(location.archetype)
            .signature()
            .contains(TypeId::of::<C>()))
    }

    /// Checks if the entity carries every type named by `Q`.
    ///
    /// # Errors
    ///
    /// [`EcsError::StaleHandle`] if the handle is not live.
    pub fn has_components<Q: Query>(&self, entity: Entity) -> EcsResult<bool> {
        let location = self.live_location(entity)?;
        Ok(self
            .archetypes
            .get(location.archetype)
            .signature()
            .contains_all(&query_types::<Q>()))
    }

    /// Borrows component `C` of an entity.
    ///
    /// # Errors
    ///
    /// [`EcsError::StaleHandle`] if the handle is not live,
    /// [`EcsError::ComponentNotFound`] if the entity lacks `C`.
    pub fn get_component<C: Component>(&self, entity: Entity) -> EcsResult<&C> {
        self.try_component::<C>(entity)?
            .ok_or_else(|| Self::missing::<C>(entity))
    }

    /// Borrows component `C` if present.
    ///
    /// # Errors
    ///
    /// [`EcsError::StaleHandle`] if the handle is not live.
    pub fn try_component<C: Component>(&self, entity: Entity) -> EcsResult<Option<&C>> {
        let location = self.live_location(entity)?;
        Ok(self.archetypes.get(location.archetype).get::<C>(location.row))
    }

    /// Mutably borrows component `C`. Bumps the version, since cached views
    /// hold clones. A failed lookup leaves the version alone.
    ///
    /// # Errors
    ///
    /// [`EcsError::StaleHandle`] if the handle is not live,
    /// [`EcsError::ComponentNotFound`] if the entity lacks `C`.
    pub fn get_component_mut<C: Component>(&mut self, entity: Entity) -> EcsResult<&mut C> {
        let location = self.live_location(entity)?;
        if !self
            .archetypes
            .get(location.archetype)
            .signature()
            .contains(TypeId::of::<C>())
        {
            return Err(Self::missing::<C>(entity));
        }
        self.bump_version();
        self.archetypes
            .get_mut(location.archetype)
            .get_mut::<C>(location.row)
            .ok_or_else(|| Self::missing::<C>(entity))
    }

    /// Every component of an entity, in signature order.
    ///
    /// # Errors
    ///
    /// [`EcsError::StaleHandle`] if the handle is not live.
    pub fn components_for(&self, entity: Entity) -> EcsResult<Vec<ComponentRef<'_>>> {
        let location = self.live_location(entity)?;
        Ok(self
            .archetypes
            .get(location.archetype)
            .row_components(location.row))
    }

    /// Number of live entities carrying `C`.
    #[must_use]
    pub fn component_count<C: Component>(&self) -> usize {
        self.archetypes
            .containing(TypeId::of::<C>())
            .iter()
            .map(|id| self.archetypes.get(*id).len())
            .sum()
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Snapshot of every entity matching `Q`, as owned clones.
    ///
    /// Repeated calls at the same version return the same `Arc`.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidQuery`] if `Q` names no component type.
    pub fn view<Q: Query>(&self) -> EcsResult<View<Q::Owned>> {
        let types = Self::checked_types::<Q>()?;
        if let Some(rows) = self.views.lock().get::<Q::Owned>(self.version) {
            return Ok(rows);
        }

        let rows: View<Q::Owned> = Arc::new(
            self.iter_candidates::<Q>(&types)
                .map(|(entity, item)| (entity, Q::to_owned(item)))
                .collect(),
        );
        self.views.lock().insert(self.version, Arc::clone(&rows));
        Ok(rows)
    }

    /// Lazily iterates every entity matching `Q`, borrowing the world.
    ///
    /// Yields the same entities in the same order as [`World::view`].
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidQuery`] if `Q` names no component type.
    pub fn iter_view<Q: Query>(&self) -> EcsResult<QueryIter<'_, Q>> {
        let types = Self::checked_types::<Q>()?;
        Ok(self.iter_candidates::<Q>(&types))
    }

    /// Lazily iterates every entity carrying `C`, with mutable access.
    /// Bumps the version once.
    pub fn iter_view_mut<C: Component>(&mut self) -> impl Iterator<Item = (Entity, &mut C)> + '_ {
        self.bump_version();
        let registry = &self.entities;
        self.archetypes
            .iter_mut()
            .filter_map(|archetype| archetype.column_mut::<C>())
            .flat_map(move |(rows, column)| {
                rows.iter()
                    .zip(column.iter_mut())
                    .map(move |(index, value)| (registry.handle(*index), value))
            })
    }

    fn checked_types<Q: Query>() -> EcsResult<Vec<TypeId>> {
        let types = query_types::<Q>();
        if types.is_empty() {
            return Err(EcsError::InvalidQuery);
        }
        Ok(types)
    }

    fn iter_candidates<Q: Query>(&self, types: &[TypeId]) -> QueryIter<'_, Q> {
        QueryIter::new(&self.entities, &self.archetypes, self.archetypes.candidates(types))
    }

    // =========================================================================
    // Systems
    // =========================================================================

    /// Registers a sync system at its own priority and runs its `setup`.
    pub fn add_system<S: System>(&mut self, system: S) {
        let priority = system.priority();
        self.add_system_with_priority(system, priority);
    }

    /// Registers a sync system at an explicit priority and runs its `setup`.
    pub fn add_system_with_priority<S: System>(&mut self, mut system: S, priority: i32) {
        system.setup(self);
        self.scheduler.insert_sync(SyncEntry::new(system, priority));
    }

    /// Registers an async system at its own priority. Its `setup` runs before
    /// the first async tick that includes it.
    pub fn add_async_system<S: AsyncSystem>(&mut self, system: S) {
        let priority = system.priority();
        self.add_async_system_with_priority(system, priority);
    }

    /// Registers an async system at an explicit priority.
    pub fn add_async_system_with_priority<S: AsyncSystem>(&mut self, system: S, priority: i32) {
        self.scheduler.insert_async(AsyncEntry::new(system, priority));
    }

    /// Removes every sync or async system of type `S`.
    ///
    /// During a tick the removal takes effect when the tick ends.
    pub fn remove_system<S: 'static>(&mut self) {
        self.scheduler.remove(TypeId::of::<S>());
    }

    /// First registered system of type `S`.
    ///
    /// Returns `None` for systems of the track that is currently running.
    #[must_use]
    pub fn get_system<S: 'static>(&self) -> Option<&S> {
        self.scheduler.get::<S>()
    }

    /// First registered system of type `S`, mutably.
    pub fn get_system_mut<S: 'static>(&mut self) -> Option<&mut S> {
        self.scheduler.get_mut::<S>()
    }

    /// The system registry.
    #[inline]
    #[must_use]
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    #[inline]
    pub(crate) fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    /// Wall time of the last timed run per system name.
    #[must_use]
    pub fn process_times(&self) -> &HashMap<String, Duration> {
        self.scheduler.process_times()
    }

    // =========================================================================
    // Ticks
    // =========================================================================

    /// Runs every sync system once, highest priority first.
    ///
    /// Destroys requested during the tick are applied after the last system,
    /// whether or not the tick failed.
    ///
    /// # Errors
    ///
    /// [`EcsError::System`] wrapping the first system failure; later systems
    /// do not run.
    pub fn update(&mut self, delta_time: f32) -> EcsResult<()> {
        self.run_sync_tick(delta_time, false)
    }

    /// Like [`World::update`], recording each system's wall time in
    /// [`World::process_times`].
    ///
    /// # Errors
    ///
    /// [`EcsError::System`] wrapping the first system failure.
    pub fn timed_update(&mut self, delta_time: f32) -> EcsResult<()> {
        self.run_sync_tick(delta_time, true)
    }

    fn run_sync_tick(&mut self, delta_time: f32, timed: bool) -> EcsResult<()> {
        let tick = self.begin_tick(delta_time);
        let systems = self.scheduler.take_sync();
        let mut scope = SyncTickScope { world: self, systems };
        let result = run_sync_systems(&mut *scope.world, &mut scope.systems, tick, timed);
        drop(scope);
        result
    }

    /// Opens a tick: advances the counter, marks the scheduler as running and
    /// opens a deferral scope.
    pub(crate) fn begin_tick(&mut self, delta_time: f32) -> TickContext {
        self.tick += 1;
        self.defer_depth += 1;
        self.scheduler.start_tick();
        TickContext {
            tick: self.tick,
            delta_time,
        }
    }

    /// Closes the tick opened by [`World::begin_tick`]. Taken tracks must be
    /// restored first.
    pub(crate) fn end_tick(&mut self) {
        self.scheduler.finish_tick();
        self.close_defer_scope();
    }

    /// True while a tick or deferral scope is open.
    #[inline]
    #[must_use]
    pub const fn is_deferring(&self) -> bool {
        self.defer_depth > 0
    }

    /// Runs `f` with destroys deferred until the outermost scope ends.
    ///
    /// Scopes nest; ticks count as scopes too.
    ///
    /// ```rust,ignore
    /// world.defer_deletions(|world| {
    ///     world.destroy_entity(a)?;
    ///     assert!(world.entity_exists(a));
    ///     Ok::<_, EcsError>(())
    /// })?;
    /// assert!(!world.entity_exists(a));
    /// ```
    pub fn defer_deletions<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.defer_depth += 1;
        let mut scope = DeferScope(self);
        f(&mut *scope.0)
    }

    fn close_defer_scope(&mut self) {
        self.defer_depth = self.defer_depth.saturating_sub(1);
        if self.defer_depth == 0 {
            self.flush_pending_kills();
        }
    }

    fn flush_pending_kills(&mut self) {
        if self.pending_kill.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending_kill);
        let requested = pending.len();
        let mut destroyed = 0usize;
        for entity in pending {
            if let Some(location) = self.entities.location(entity) {
                self.despawn_at(entity, location);
                destroyed += 1;
            }
        }
        tracing::debug!(
            "Flushed deferred destroys: {} requested, {} applied",
            requested,
            destroyed
        );
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Destroys every entity and archetype. Systems stay registered.
    pub fn clear(&mut self) {
        let count = self.entities.alive_count();
        self.entities.clear();
        self.archetypes.clear();
        self.views.lock().clear();
        self.pending_kill.clear();
        self.bump_version();
        tracing::debug!("Cleared world ({} entities)", count);
    }

    /// Returns the world to its freshly constructed state: no entities, no
    /// systems, no timings, version 0.
    pub fn reset(&mut self) {
        self.clear();
        self.scheduler.clear();
        self.version = 0;
        self.tick = 0;
        self.defer_depth = 0;
        tracing::debug!("Reset world");
    }
}

/// Restores the sync track and closes the tick when dropped, so a panicking
/// system still leaves the world usable.
struct SyncTickScope<'w> {
    world: &'w mut World,
    systems: Vec<SyncEntry>,
}

impl Drop for SyncTickScope<'_> {
    fn drop(&mut self) {
        let systems = std::mem::take(&mut self.systems);
        self.world.scheduler.restore_sync(systems);
        self.world.end_tick();
    }
}

/// Closes one `defer_deletions` scope when dropped.
struct DeferScope<'w>(&'w mut World);

impl Drop for DeferScope<'_> {
    fn drop(&mut self) {
        self.0.close_defer_scope();
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.entities.alive_count())
            .field("archetypes", &self.archetypes.len())
            .field("sync_systems", &self.scheduler.sync_len())
            .field("async_systems", &self.scheduler.async_len())
            .field("cached_views", &self.views.lock().len())
            .field("version", &self.version)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SystemResult;

    #[derive(Clone, Debug, PartialEq)]
    struct Pos(i32);
    impl Component for Pos {}

    #[derive(Clone, Debug, PartialEq)]
    struct Vel(i32);
    impl Component for Vel {}

    #[test]
    fn test_create_and_read() {
        let mut world = World::new();
        let e = world.create_entity((Pos(1), Vel(2)));

        assert!(world.entity_exists(e));
        assert_eq!(world.get_component::<Pos>(e).unwrap(), &Pos(1));
        assert_eq!(world.get_component::<Vel>(e).unwrap(), &Vel(2));
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn test_versions_bump_on_changes() {
        let mut world = World::new();
        let v0 = world.version();
        let e = world.create_entity((Pos(0),));
        let v1 = world.version();
        assert!(v1 > v0);

        world.add_component(e, Pos(5)).unwrap();
        let v2 = world.version();
        assert!(v2 > v1);

        world.get_component_mut::<Pos>(e).unwrap().0 += 1;
        assert!(world.version() > v2);
        assert_eq!(world.get_component::<Pos>(e).unwrap(), &Pos(6));
    }

    #[test]
    fn test_replace_does_not_migrate() {
        let mut world = World::new();
        let e = world.create_entity((Pos(0),));
        let before = world.location(e).unwrap();
        world.add_component(e, Pos(9)).unwrap();
        assert_eq!(world.location(e).unwrap(), before);
        assert_eq!(world.archetype_count(), 2);
    }

    #[test]
    fn test_remove_component_returns_value() {
        let mut world = World::new();
        let e = world.create_entity((Pos(3), Vel(4)));
        assert_eq!(world.remove_component::<Vel>(e).unwrap(), Vel(4));
        assert!(!world.has_component::<Vel>(e).unwrap());
        assert!(world
            .remove_component::<Vel>(e)
            .unwrap_err()
            .is_component_not_found());
    }

    #[test]
    fn test_query_without_types_is_rejected() {
        let world = World::new();
        assert!(matches!(world.view::<()>(), Err(EcsError::InvalidQuery)));
        assert!(world.iter_view::<()>().is_err());
    }

    #[test]
    fn test_view_cache_reuses_snapshot() {
        let mut world = World::new();
        world.create_entity((Pos(1),));

        let first = world.view::<&Pos>().unwrap();
        let second = world.view::<&Pos>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        world.create_entity((Pos(2),));
        let third = world.view::<&Pos>().unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.len(), 2);
    }

    #[test]
    fn test_iter_view_mut_writes_through() {
        let mut world = World::new();
        world.create_entity((Pos(1),));
        world.create_entity((Pos(2), Vel(0)));

        for (_, pos) in world.iter_view_mut::<Pos>() {
            pos.0 *= 10;
        }
        let values: Vec<i32> = world.view::<&Pos>().unwrap().iter().map(|(_, p)| p.0).collect();
        assert_eq!(values, vec![10, 20]);
    }

    struct Spawner;

    impl System for Spawner {
        fn update(&mut self, world: &mut World, tick: TickContext) -> SystemResult {
            world.create_entity((Pos(i32::try_from(tick.tick)?),));
            Ok(())
        }
    }

    #[test]
    fn test_update_counts_ticks() {
        let mut world = World::new();
        world.add_system(Spawner);
        world.update(0.1).unwrap();
        world.update(0.1).unwrap();

        assert_eq!(world.tick(), 2);
        let ticks: Vec<i32> = world.view::<&Pos>().unwrap().iter().map(|(_, p)| p.0).collect();
        assert_eq!(ticks, vec![1, 2]);
        assert!(world.get_system::<Spawner>().is_some());
    }

    #[test]
    fn test_debug_output() {
        let mut world = World::new();
        world.create_entity(());
        let text = format!("{world:?}");
        assert!(text.contains("entities: 1"));
    }
}
