//! # Entity Management
//!
//! Entities are lightweight identifiers consisting of:
//! - An index into the registry's slot array
//! - A generation counter for safe reuse
//!
//! The registry maps each live index to the archetype and row that
//! currently hold its components.

use std::fmt;

use super::archetype::ArchetypeId;

/// Unique identifier for an entity.
///
/// The ID is split into two parts:
/// - Lower 32 bits: Index into the registry
/// - Upper 32 bits: Generation counter for detecting stale references
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Entity(u64);

impl Entity {
    /// Null/invalid entity handle. Never live.
    pub const NULL: Self = Self(u64::MAX);

    /// Creates a new handle from index and generation.
    ///
    /// # Arguments
    ///
    /// * `index` - The registry slot (0 to 2^32-1)
    /// * `generation` - The generation counter (0 to 2^32-1)
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the index portion of the handle.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the handle.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Returns the packed 64-bit representation.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Rebuilds a handle from its packed representation.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Checks if this handle is the null handle.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

/// Where a live entity's components are stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityLocation {
    /// Archetype holding the entity's row.
    pub archetype: ArchetypeId,
    /// Row inside that archetype.
    pub row: usize,
}

/// Per-index bookkeeping.
#[derive(Clone, Copy, Debug)]
struct Slot {
    generation: u32,
    /// `None` while the slot is free.
    location: Option<EntityLocation>,
}

/// Generation-checked map from entity index to storage location.
///
/// Freed indices are recycled LIFO. Destroying an entity bumps the slot
/// generation so every handle issued for the previous occupant goes stale.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    /// One slot per index ever issued.
    slots: Vec<Slot>,
    /// Free list of indices for reuse.
    free_indices: Vec<u32>,
    /// Number of currently live entities.
    alive_count: usize,
}

impl EntityRegistry {
    /// Creates a registry with room for `capacity` slots before growing.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_indices: Vec::new(),
            alive_count: 0,
        }
    }

    /// Returns the number of currently live entities.
    #[inline]
    #[must_use]
    pub const fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Claims an index and places it at `location`, returning the new handle.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` slots would be needed.
    pub fn allocate(&mut self, location: EntityLocation) -> Entity {
        let index = if let Some(index) = self.free_indices.pop() {
            index
        } else {
            let index = u32::try_from(self.slots.len()).expect("entity index space exhausted");
            self.slots.push(Slot {
                generation: 0,
                location: None,
            });
            index
        };

        let slot = &mut self.slots[index as usize];
        slot.location = Some(location);
        self.alive_count += 1;

        Entity::new(index, slot.generation)
    }

    /// Returns the handle currently issued for a live index.
    #[inline]
    #[must_use]
    pub fn handle(&self, index: u32) -> Entity {
        Entity::new(index, self.slots[index as usize].generation)
    }

    /// Checks if a handle names a live entity.
    #[inline]
    #[must_use]
    pub fn is_live(&self, entity: Entity) -> bool {
        self.location(entity).is_some()
    }

    /// Returns the location of a live entity, or `None` for any
    /// stale/invalid/unknown handle.
    #[inline]
    #[must_use]
    pub fn location(&self, entity: Entity) -> Option<EntityLocation> {
        let slot = self.slots.get(entity.index() as usize)?;
        if slot.generation != entity.generation() {
            return None;
        }
        slot.location
    }

    /// Points a live index at a new location (migration).
    #[inline]
    pub fn set_location(&mut self, index: u32, location: EntityLocation) {
        self.slots[index as usize].location = Some(location);
    }

    /// Updates the row of an entity displaced by a swap-removal.
    #[inline]
    pub fn relocate_row(&mut self, index: u32, row: usize) {
        if let Some(location) = self.slots[index as usize].location.as_mut() {
            location.row = row;
        }
    }

    /// Frees a live index: clears its location, bumps the generation and
    /// returns the index to the free list.
    pub fn release(&mut self, index: u32) {
        let slot = &mut self.slots[index as usize];
        debug_assert!(slot.location.is_some(), "releasing a free slot");
        slot.location = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_indices.push(index);
        self.alive_count -= 1;
    }

    /// Drops every slot. Previously issued handles become invalid because
    /// their indices are no longer in range until reissued.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_indices.clear();
        self.alive_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(row: usize) -> EntityLocation {
        EntityLocation {
            archetype: ArchetypeId::EMPTY,
            row,
        }
    }

    #[test]
    fn test_entity_roundtrip() {
        for (index, generation) in [(0, 0), (12345, 67890), (u32::MAX - 1, 1), (7, u32::MAX)] {
            let id = Entity::new(index, generation);
            assert_eq!(id.index(), index);
            assert_eq!(id.generation(), generation);
            assert_eq!(Entity::from_bits(id.to_bits()), id);
        }
    }

    #[test]
    fn test_entity_packing_layout() {
        let id = Entity::new(5, 2);
        assert_eq!(id.to_bits(), (2u64 << 32) | 5);
        assert_eq!(id.to_string(), "5v2");
        assert!(Entity::default().is_null());
    }

    #[test]
    fn test_registry_reuse_bumps_generation() {
        let mut registry = EntityRegistry::with_capacity(4);

        let first = registry.allocate(loc(0));
        assert!(registry.is_live(first));
        assert_eq!(registry.alive_count(), 1);

        registry.release(first.index());
        assert!(!registry.is_live(first));
        assert_eq!(registry.alive_count(), 0);

        let second = registry.allocate(loc(0));
        assert_eq!(second.index(), first.index());
        assert!(second.generation() > first.generation());
        assert!(!registry.is_live(first));
        assert!(registry.is_live(second));
    }

    #[test]
    fn test_registry_unknown_handles() {
        let registry = EntityRegistry::default();
        assert!(!registry.is_live(Entity::new(0, 0)));
        assert!(!registry.is_live(Entity::NULL));
    }

    #[test]
    fn test_registry_relocate_and_release() {
        let mut registry = EntityRegistry::default();
        let a = registry.allocate(loc(0));
        let b = registry.allocate(loc(1));
        registry.relocate_row(b.index(), 0);
        assert_eq!(registry.location(b).map(|l| l.row), Some(0));

        registry.release(a.index());
        assert!(!registry.is_live(a));
        assert!(registry.is_live(b));
        assert_eq!(registry.alive_count(), 1);
    }
}
