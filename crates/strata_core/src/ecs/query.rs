//! # Queries and Views
//!
//! A query names the component types an entity must carry:
//!
//! ```rust,ignore
//! world.view::<&Position>()?;               // single type
//! world.view::<(&Position, &Velocity)>()?;  // conjunction, up to 8
//! ```
//!
//! Two ways to read the matches:
//! - `World::view` materializes owned clones once per world version and
//!   hands out the same `Arc` until the next change
//! - `World::iter_view` borrows the world and walks the columns lazily
//!
//! Both visit candidate archetypes in ascending id and rows in ascending
//! order, so they always agree.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use super::archetype::{Archetype, ArchetypeId, ArchetypeStore};
use super::component::Component;
use super::entity::{Entity, EntityRegistry};

/// Materialized query result: `(entity, owned components)` per match.
pub type View<T> = Arc<Vec<(Entity, T)>>;

/// A set of component reads.
///
/// Implemented for `&T` and for tuples of queries up to eight elements.
/// `()` is accepted by the type system but rejected at run time with
/// `EcsError::InvalidQuery`.
pub trait Query {
    /// Borrowed item yielded by [`QueryIter`].
    type Item<'w>;

    /// Owned snapshot stored in a [`View`].
    type Owned: Clone + Send + Sync + 'static;

    /// Column slices of one archetype.
    type Columns<'w>: Copy;

    /// Appends the component types this query reads.
    fn component_types(out: &mut Vec<TypeId>);

    /// Borrows the columns this query needs, or `None` if the archetype
    /// lacks one of them.
    fn columns(archetype: &Archetype) -> Option<Self::Columns<'_>>;

    /// Reads one row.
    fn fetch<'w>(columns: Self::Columns<'w>, row: usize) -> Self::Item<'w>;

    /// Clones a borrowed item into its owned form.
    fn to_owned(item: Self::Item<'_>) -> Self::Owned;
}

impl<T: Component> Query for &T {
    type Item<'w> = &'w T;
    type Owned = T;
    type Columns<'w> = &'w [T];

    fn component_types(out: &mut Vec<TypeId>) {
        out.push(TypeId::of::<T>());
    }

    fn columns(archetype: &Archetype) -> Option<Self::Columns<'_>> {
        archetype.column::<T>()
    }

    #[inline]
    fn fetch<'w>(columns: Self::Columns<'w>, row: usize) -> Self::Item<'w> {
        &columns[row]
    }

    fn to_owned(item: Self::Item<'_>) -> Self::Owned {
        item.clone()
    }
}

impl Query for () {
    type Item<'w> = ();
    type Owned = ();
    type Columns<'w> = ();

    fn component_types(_out: &mut Vec<TypeId>) {}

    fn columns(_archetype: &Archetype) -> Option<Self::Columns<'_>> {
        Some(())
    }

    fn fetch<'w>(_columns: Self::Columns<'w>, _row: usize) -> Self::Item<'w> {}

    fn to_owned(_item: Self::Item<'_>) -> Self::Owned {}
}

macro_rules! impl_query {
    ($(($q:ident, $v:ident)),+) => {
        impl<$($q: Query),+> Query for ($($q,)+) {
            type Item<'w> = ($($q::Item<'w>,)+);
            type Owned = ($($q::Owned,)+);
            type Columns<'w> = ($($q::Columns<'w>,)+);

            fn component_types(out: &mut Vec<TypeId>) {
                $($q::component_types(out);)+
            }

            fn columns(archetype: &Archetype) -> Option<Self::Columns<'_>> {
                Some(($($q::columns(archetype)?,)+))
            }

            #[inline]
            fn fetch<'w>(columns: Self::Columns<'w>, row: usize) -> Self::Item<'w> {
                let ($($v,)+) = columns;
                ($($q::fetch($v, row),)+)
            }

            fn to_owned(item: Self::Item<'_>) -> Self::Owned {
                let ($($v,)+) = item;
                ($($q::to_owned($v),)+)
            }
        }
    };
}

impl_query!((A, a));
impl_query!((A, a), (B, b));
impl_query!((A, a), (B, b), (C, c));
impl_query!((A, a), (B, b), (C, c), (D, d));
impl_query!((A, a), (B, b), (C, c), (D, d), (E, e));
impl_query!((A, a), (B, b), (C, c), (D, d), (E, e), (F, f));
impl_query!((A, a), (B, b), (C, c), (D, d), (E, e), (F, f), (G, g));
impl_query!((A, a), (B, b), (C, c), (D, d), (E, e), (F, f), (G, g), (H, h));

/// Component types of `Q`, in declaration order.
pub(crate) fn query_types<Q: Query>() -> Vec<TypeId> {
    let mut types = Vec::new();
    Q::component_types(&mut types);
    types
}

/// Lazy iterator over the matches of `Q`.
///
/// Borrows the world immutably; structural changes are impossible while it
/// is alive.
pub struct QueryIter<'w, Q: Query> {
    registry: &'w EntityRegistry,
    archetypes: &'w ArchetypeStore,
    candidates: std::vec::IntoIter<ArchetypeId>,
    current: Option<(&'w Archetype, Q::Columns<'w>)>,
    row: usize,
}

impl<'w, Q: Query> QueryIter<'w, Q> {
    pub(crate) fn new(registry: &'w EntityRegistry, archetypes: &'w ArchetypeStore, candidates: Vec<ArchetypeId>) -> Self {
        Self {
            registry,
            archetypes,
            candidates: candidates.into_iter(),
            current: None,
            row: 0,
        }
    }
}

impl<'w, Q: Query> Iterator for QueryIter<'w, Q> {
    type Item = (Entity, Q::Item<'w>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((archetype, columns)) = self.current {
                if self.row < archetype.len() {
                    let row = self.row;
                    self.row += 1;
                    let entity = self.registry.handle(archetype.entities()[row]);
                    return Some((entity, Q::fetch(columns, row)));
                }
            }

            let archetype = self.archetypes.get(self.candidates.next()?);
            self.current = Q::columns(archetype).map(|columns| (archetype, columns));
            self.row = 0;
        }
    }
}

/// One cached materialization.
struct CachedView {
    version: u64,
    rows: Arc<dyn Any + Send + Sync>,
}

/// Per-query snapshot cache, keyed by the query's owned type.
#[derive(Default)]
pub(crate) struct ViewCache {
    entries: HashMap<TypeId, CachedView>,
}

impl ViewCache {
    /// Returns the cached rows if they were built at `version`.
    pub(crate) fn get<T: Clone + Send + Sync + 'static>(&self, version: u64) -> Option<View<T>> {
        let entry = self.entries.get(&TypeId::of::<T>())?;
        if entry.version != version {
            return None;
        }
        Arc::clone(&entry.rows).downcast::<Vec<(Entity, T)>>().ok()
    }

    /// Stores rows built at `version`, replacing any older entry.
    pub(crate) fn insert<T: Clone + Send + Sync + 'static>(&mut self, version: u64, rows: View<T>) {
        self.entries.insert(TypeId::of::<T>(), CachedView { version, rows });
    }

    /// Number of cached query types.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

impl std::fmt::Debug for ViewCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Pos(i32);
    impl Component for Pos {}

    #[derive(Clone, Debug, PartialEq)]
    struct Tag;
    impl Component for Tag {}

    #[test]
    fn test_query_types_in_declaration_order() {
        assert_eq!(query_types::<&Pos>(), vec![TypeId::of::<Pos>()]);
        assert_eq!(
            query_types::<(&Tag, &Pos)>(),
            vec![TypeId::of::<Tag>(), TypeId::of::<Pos>()]
        );
        assert!(query_types::<()>().is_empty());
    }

    #[test]
    fn test_cache_hit_requires_same_version() {
        let mut cache = ViewCache::default();
        let rows: View<Pos> = Arc::new(vec![(Entity::new(0, 0), Pos(1))]);
        cache.insert(3, Arc::clone(&rows));

        let hit = cache.get::<Pos>(3).unwrap();
        assert!(Arc::ptr_eq(&hit, &rows));
        assert!(cache.get::<Pos>(4).is_none());
        assert!(cache.get::<(Pos, Tag)>(3).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_keys_by_owned_type() {
        let mut cache = ViewCache::default();
        cache.insert::<Pos>(1, Arc::new(Vec::new()));
        cache.insert::<(Pos, Tag)>(1, Arc::new(vec![(Entity::new(1, 0), (Pos(2), Tag))]));
        assert_eq!(cache.len(), 2);
        assert!(cache.get::<Pos>(1).unwrap().is_empty());
        assert_eq!(cache.get::<(Pos, Tag)>(1).unwrap()[0].1, (Pos(2), Tag));

        cache.clear();
        assert!(cache.get::<(Pos, Tag)>(1).is_none());
    }
}
