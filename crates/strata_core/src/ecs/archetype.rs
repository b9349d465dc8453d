//! # Archetype-based Entity Storage
//!
//! Entities with the same component set are stored together.
//!
//! ```text
//! Archetype (Position + Velocity):
//! entities:  [e4, e1, e9]
//! Position:  [P4, P1, P9]
//! Velocity:  [V4, V1, V9]
//! ```
//!
//! Row `i` of every column belongs to `entities[i]`. Removing a row moves the
//! last row into the hole, so the caller must relocate the displaced entity.
//!
//! Adding or removing a component type migrates the row to the archetype
//! whose signature is one type larger or smaller. Archetypes are created on
//! first use, memoized by signature and never destroyed before a clear.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use super::component::Component;
use super::storage::{ComponentStorage, ErasedStorage};

/// Dense identifier of an archetype inside one world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchetypeId(u32);

impl ArchetypeId {
    /// The archetype of entities with no components. Always exists.
    pub const EMPTY: Self = Self(0);

    /// Returns the position of this archetype in the store.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Sorted, de-duplicated set of component types.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Signature {
    types: Vec<TypeId>,
}

impl Signature {
    /// Builds a signature from types in any order, dropping duplicates.
    #[must_use]
    pub fn new(mut types: Vec<TypeId>) -> Self {
        types.sort_unstable();
        types.dedup();
        Self { types }
    }

    /// Number of component types.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// True for the empty signature.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// The sorted component types.
    #[inline]
    #[must_use]
    pub fn types(&self) -> &[TypeId] {
        &self.types
    }

    /// Column index of `type_id`, if present.
    #[inline]
    #[must_use]
    pub fn position(&self, type_id: TypeId) -> Option<usize> {
        self.types.binary_search(&type_id).ok()
    }

    /// Checks membership.
    #[inline]
    #[must_use]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.position(type_id).is_some()
    }

    /// Checks that every type in `types` is present.
    #[must_use]
    pub fn contains_all(&self, types: &[TypeId]) -> bool {
        types.iter().all(|type_id| self.contains(*type_id))
    }

    /// This signature plus `type_id`.
    #[must_use]
    pub fn with(&self, type_id: TypeId) -> Self {
        let mut types = self.types.clone();
        if let Err(at) = types.binary_search(&type_id) {
            types.insert(at, type_id);
        }
        Self { types }
    }

    /// This signature minus `type_id`.
    #[must_use]
    pub fn without(&self, type_id: TypeId) -> Self {
        let mut types = self.types.clone();
        if let Ok(at) = types.binary_search(&type_id) {
            types.remove(at);
        }
        Self { types }
    }
}

/// A borrowed component value, as returned by `World::components_for`.
#[derive(Clone, Copy)]
pub struct ComponentRef<'a> {
    /// `TypeId` of the component.
    pub type_id: TypeId,
    /// Type name of the component.
    pub type_name: &'static str,
    /// The value; downcast with `downcast_ref`.
    pub value: &'a dyn Any,
}

impl<'a> ComponentRef<'a> {
    /// Downcasts the value to a concrete component type.
    #[must_use]
    pub fn downcast<C: Component>(&self) -> Option<&'a C> {
        self.value.downcast_ref::<C>()
    }
}

impl std::fmt::Debug for ComponentRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRef")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Columnar storage for every entity sharing one signature.
pub struct Archetype {
    id: ArchetypeId,
    signature: Signature,
    /// Entity index per row.
    entities: Vec<u32>,
    /// One column per signature entry, in signature order.
    columns: Vec<Box<dyn ErasedStorage>>,
}

impl Archetype {
    fn new(id: ArchetypeId, signature: Signature, columns: Vec<Box<dyn ErasedStorage>>, capacity: usize) -> Self {
        debug_assert_eq!(signature.len(), columns.len());
        debug_assert!(columns
            .iter()
            .zip(signature.types())
            .all(|(column, type_id)| column.component_type() == *type_id));

        Self {
            id,
            signature,
            entities: Vec::with_capacity(capacity),
            columns,
        }
    }

    /// This archetype's id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ArchetypeId {
        self.id
    }

    /// The component types stored here.
    #[inline]
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Number of rows.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Checks if empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entity index per row.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[u32] {
        &self.entities
    }

    fn storage<C: Component>(&self) -> Option<&ComponentStorage<C>> {
        let column = self.signature.position(TypeId::of::<C>())?;
        self.columns[column].as_any().downcast_ref()
    }

    fn storage_mut<C: Component>(&mut self) -> Option<&mut ComponentStorage<C>> {
        let column = self.signature.position(TypeId::of::<C>())?;
        self.columns[column].as_any_mut().downcast_mut()
    }

    /// The whole column of `C`, if this archetype stores it.
    #[inline]
    #[must_use]
    pub fn column<C: Component>(&self) -> Option<&[C]> {
        self.storage::<C>().map(ComponentStorage::as_slice)
    }

    /// Row ids paired with the mutable column of `C`.
    pub fn column_mut<C: Component>(&mut self) -> Option<(&[u32], &mut [C])> {
        let column = self.signature.position(TypeId::of::<C>())?;
        let storage = self.columns[column]
            .as_any_mut()
            .downcast_mut::<ComponentStorage<C>>()?;
        Some((&self.entities, storage.as_mut_slice()))
    }

    /// Component `C` of the entity at `row`.
    #[inline]
    #[must_use]
    pub fn get<C: Component>(&self, row: usize) -> Option<&C> {
        self.storage::<C>()?.get(row)
    }

    /// Mutable component `C` of the entity at `row`.
    #[inline]
    pub fn get_mut<C: Component>(&mut self, row: usize) -> Option<&mut C> {
        self.storage_mut::<C>()?.get_mut(row)
    }

    /// Every component of the entity at `row`, in signature order.
    #[must_use]
    pub fn row_components(&self, row: usize) -> Vec<ComponentRef<'_>> {
        self.columns
            .iter()
            .filter_map(|column| {
                column.get_any(row).map(|value| ComponentRef {
                    type_id: column.component_type(),
                    type_name: column.component_name(),
                    value,
                })
            })
            .collect()
    }

    /// Writes one component of the row under construction.
    ///
    /// Writing the same type twice before the row is committed keeps the
    /// last value.
    pub(crate) fn stage<C: Component>(&mut self, component: C) {
        let pending = self.entities.len();
        if let Some(storage) = self.storage_mut::<C>() {
            if storage.len() > pending {
                storage.replace_last(component);
            } else {
                storage.push(component);
            }
        }
    }

    /// Finishes the row under construction and returns its index.
    pub(crate) fn commit_row(&mut self, entity_index: u32) -> usize {
        let row = self.entities.len();
        debug_assert!(
            self.columns.iter().all(|column| column.len() == row + 1),
            "row committed with missing components"
        );
        self.entities.push(entity_index);
        row
    }

    /// Swap-removes `row` from every column and drops the values.
    ///
    /// Returns the index of the entity moved into `row`, if any.
    pub(crate) fn swap_remove(&mut self, row: usize) -> Option<u32> {
        for column in &mut self.columns {
            column.swap_remove_drop(row);
        }
        self.finish_swap_remove(row)
    }

    /// Swap-removes only the `C` column at `row`, returning the value.
    ///
    /// Must be followed by [`Archetype::move_row`] with `skip` set to `C`.
    pub(crate) fn take<C: Component>(&mut self, row: usize) -> Option<C> {
        let storage = self.storage_mut::<C>()?;
        (row < storage.len()).then(|| storage.swap_remove(row))
    }

    /// Moves `row` into `dst`, leaving `dst` with a pending row.
    ///
    /// Columns present in `dst` move their value; the others drop it. The
    /// `skip` column has already been removed by [`Archetype::take`].
    /// Returns the index of the entity moved into `row`, if any.
    pub(crate) fn move_row(&mut self, row: usize, dst: &mut Self, skip: Option<TypeId>) -> Option<u32> {
        for column in &mut self.columns {
            let type_id = column.component_type();
            if skip == Some(type_id) {
                continue;
            }
            match dst.signature.position(type_id) {
                Some(at) => column.swap_remove_into(row, dst.columns[at].as_mut()),
                None => column.swap_remove_drop(row),
            }
        }
        self.finish_swap_remove(row)
    }

    fn finish_swap_remove(&mut self, row: usize) -> Option<u32> {
        self.entities.swap_remove(row);
        self.entities.get(row).copied()
    }

    /// Fresh empty columns for every type here, except `skip`.
    fn empty_columns(&self, capacity: usize, skip: Option<TypeId>) -> Vec<Box<dyn ErasedStorage>> {
        self.columns
            .iter()
            .filter(|column| Some(column.component_type()) != skip)
            .map(|column| column.new_empty(capacity))
            .collect()
    }
}

impl std::fmt::Debug for Archetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.columns.iter().map(|column| column.component_name()).collect();
        f.debug_struct("Archetype")
            .field("id", &self.id)
            .field("components", &names)
            .field("len", &self.entities.len())
            .finish()
    }
}

/// All archetypes of one world, with lookup by signature and by type.
#[derive(Debug)]
pub struct ArchetypeStore {
    archetypes: Vec<Archetype>,
    by_signature: HashMap<Signature, ArchetypeId>,
    /// Archetypes containing each type, ascending by id.
    by_type: HashMap<TypeId, Vec<ArchetypeId>>,
    /// Initial row capacity for new archetypes.
    row_capacity: usize,
}

impl ArchetypeStore {
    /// Creates a store holding only the empty archetype.
    #[must_use]
    pub fn new(row_capacity: usize) -> Self {
        let mut store = Self {
            archetypes: Vec::new(),
            by_signature: HashMap::new(),
            by_type: HashMap::new(),
            row_capacity,
        };
        store.insert(Signature::default(), Vec::new());
        store
    }

    /// Number of archetypes, including the empty one.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    /// Always false: the empty archetype exists.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    /// Gets an archetype.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this store.
    #[inline]
    #[must_use]
    pub fn get(&self, id: ArchetypeId) -> &Archetype {
        &self.archetypes[id.index()]
    }

    /// Gets an archetype mutably.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this store.
    #[inline]
    pub fn get_mut(&mut self, id: ArchetypeId) -> &mut Archetype {
        &mut self.archetypes[id.index()]
    }

    /// Iterates archetypes in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Archetype> {
        self.archetypes.iter()
    }

    /// Iterates archetypes mutably in id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Archetype> {
        self.archetypes.iter_mut()
    }

    /// Looks up the archetype for a signature.
    #[inline]
    #[must_use]
    pub fn lookup(&self, signature: &Signature) -> Option<ArchetypeId> {
        self.by_signature.get(signature).copied()
    }

    /// Archetypes containing `type_id`, ascending by id.
    #[must_use]
    pub fn containing(&self, type_id: TypeId) -> &[ArchetypeId] {
        self.by_type.get(&type_id).map_or(&[][..], Vec::as_slice)
    }

    /// Archetypes containing every type in `types`, ascending by id.
    #[must_use]
    pub fn candidates(&self, types: &[TypeId]) -> Vec<ArchetypeId> {
        let mut lists: Vec<&[ArchetypeId]> = types.iter().map(|type_id| self.containing(*type_id)).collect();
        lists.sort_by_key(|list| list.len());

        let Some((smallest, rest)) = lists.split_first() else {
            return Vec::new();
        };
        smallest
            .iter()
            .copied()
            .filter(|id| rest.iter().all(|list| list.binary_search(id).is_ok()))
            .collect()
    }

    /// Registers a new archetype. Columns may come in any order and may
    /// contain duplicates; they are aligned with the signature here.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` archetypes would exist.
    pub fn insert(&mut self, signature: Signature, mut columns: Vec<Box<dyn ErasedStorage>>) -> ArchetypeId {
        debug_assert!(self.lookup(&signature).is_none(), "archetype already registered");
        columns.sort_by_key(|column| column.component_type());
        columns.dedup_by_key(|column| column.component_type());

        let id = ArchetypeId(u32::try_from(self.archetypes.len()).expect("archetype id space exhausted"));
        for type_id in signature.types() {
            self.by_type.entry(*type_id).or_default().push(id);
        }
        tracing::debug!("Created archetype {} with {} component types", id.0, signature.len());

        self.by_signature.insert(signature.clone(), id);
        self.archetypes
            .push(Archetype::new(id, signature, columns, self.row_capacity));
        id
    }

    /// The archetype reached from `source` by adding `C`.
    pub fn target_with<C: Component>(&mut self, source: ArchetypeId) -> ArchetypeId {
        let signature = self.get(source).signature().with(TypeId::of::<C>());
        if let Some(id) = self.lookup(&signature) {
            return id;
        }
        let mut columns = self.get(source).empty_columns(self.row_capacity, None);
        columns.push(Box::new(ComponentStorage::<C>::with_capacity(self.row_capacity)));
        self.insert(signature, columns)
    }

    /// The archetype reached from `source` by removing `type_id`.
    pub fn target_without(&mut self, source: ArchetypeId, type_id: TypeId) -> ArchetypeId {
        let signature = self.get(source).signature().without(type_id);
        if let Some(id) = self.lookup(&signature) {
            return id;
        }
        let columns = self.get(source).empty_columns(self.row_capacity, Some(type_id));
        self.insert(signature, columns)
    }

    /// Borrows two distinct archetypes mutably.
    ///
    /// # Panics
    ///
    /// Panics if `a == b`.
    pub fn pair_mut(&mut self, a: ArchetypeId, b: ArchetypeId) -> (&mut Archetype, &mut Archetype) {
        assert_ne!(a, b, "cannot borrow the same archetype twice");
        if a.index() < b.index() {
            let (low, high) = self.archetypes.split_at_mut(b.index());
            (&mut low[a.index()], &mut high[0])
        } else {
            let (low, high) = self.archetypes.split_at_mut(a.index());
            (&mut high[0], &mut low[b.index()])
        }
    }

    /// Drops every archetype except a fresh empty one.
    pub fn clear(&mut self) {
        self.archetypes.clear();
        self.by_signature.clear();
        self.by_type.clear();
        self.insert(Signature::default(), Vec::new());
    }
}
