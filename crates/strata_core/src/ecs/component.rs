//! # Component System
//!
//! Components are plain data attached to entities. Any owned, cloneable,
//! thread-safe type can be a component once it opts in through the
//! [`Component`] marker.
//!
//! Entities are spawned from a [`Bundle`]: a tuple of up to eight components
//! whose types form the entity's initial signature.

use std::any::TypeId;

use super::archetype::Archetype;
use super::storage::{ComponentStorage, ErasedStorage};

/// Marker trait for ECS components.
///
/// Components must be:
/// - `Clone`: views hand out owned snapshots
/// - `Send + Sync`: the world may be shared with async systems
/// - `'static`: identified by `TypeId`
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone, Debug)]
/// struct Position {
///     x: f32,
///     y: f32,
/// }
///
/// impl Component for Position {}
/// ```
pub trait Component: Clone + Send + Sync + 'static {}

/// A set of components inserted together by `World::create_entity`.
///
/// Implemented for `()` and for tuples of up to eight components. If a type
/// appears twice in one bundle the last value wins.
pub trait Bundle: Send + 'static {
    /// Appends the `TypeId` of every component in the bundle.
    fn component_types(out: &mut Vec<TypeId>);

    /// Appends one empty column per component in the bundle.
    fn empty_columns(capacity: usize, out: &mut Vec<Box<dyn ErasedStorage>>);

    /// Stages every component into the archetype's columns.
    ///
    /// The caller finishes the row with `Archetype::commit_row`.
    fn write(self, archetype: &mut Archetype);
}

impl Bundle for () {
    fn component_types(_out: &mut Vec<TypeId>) {}

    fn empty_columns(_capacity: usize, _out: &mut Vec<Box<dyn ErasedStorage>>) {}

    fn write(self, _archetype: &mut Archetype) {}
}

macro_rules! impl_bundle {
    ($(($ty:ident, $value:ident)),+) => {
        impl<$($ty: Component),+> Bundle for ($($ty,)+) {
            fn component_types(out: &mut Vec<TypeId>) {
                $(out.push(TypeId::of::<$ty>());)+
            }

            fn empty_columns(capacity: usize, out: &mut Vec<Box<dyn ErasedStorage>>) {
                $(out.push(Box::new(ComponentStorage::<$ty>::with_capacity(capacity)));)+
            }

            fn write(self, archetype: &mut Archetype) {
                let ($($value,)+) = self;
                $(archetype.stage($value);)+
            }
        }
    };
}

impl_bundle!((A, a));
impl_bundle!((A, a), (B, b));
impl_bundle!((A, a), (B, b), (C, c));
impl_bundle!((A, a), (B, b), (C, c), (D, d));
impl_bundle!((A, a), (B, b), (C, c), (D, d), (E, e));
impl_bundle!((A, a), (B, b), (C, c), (D, d), (E, e), (F, f));
impl_bundle!((A, a), (B, b), (C, c), (D, d), (E, e), (F, f), (G, g));
impl_bundle!((A, a), (B, b), (C, c), (D, d), (E, e), (F, f), (G, g), (H, h));

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::archetype::{ArchetypeStore, Signature};

    #[derive(Clone, Debug, PartialEq)]
    struct Name(&'static str);
    impl Component for Name {}

    #[derive(Clone, Debug, PartialEq)]
    struct Score(i64);
    impl Component for Score {}

    fn archetype_for<B: Bundle>(store: &mut ArchetypeStore) -> crate::ecs::ArchetypeId {
        let mut types = Vec::new();
        B::component_types(&mut types);
        let mut columns = Vec::new();
        B::empty_columns(8, &mut columns);
        store.insert(Signature::new(types), columns)
    }

    #[test]
    fn test_bundle_writes_one_row() {
        let mut store = ArchetypeStore::new(8);
        let id = archetype_for::<(Score, Name)>(&mut store);

        let archetype = store.get_mut(id);
        (Score(12), Name("ada")).write(archetype);
        assert_eq!(archetype.commit_row(0), 0);

        assert_eq!(archetype.get::<Name>(0), Some(&Name("ada")));
        assert_eq!(archetype.get::<Score>(0), Some(&Score(12)));
    }

    #[test]
    fn test_duplicate_type_keeps_last_value() {
        let mut store = ArchetypeStore::new(8);
        let id = archetype_for::<(Score, Score)>(&mut store);
        assert_eq!(store.get(id).signature().len(), 1);

        let archetype = store.get_mut(id);
        (Score(1), Score(2)).write(archetype);
        archetype.commit_row(0);
        assert_eq!(archetype.column::<Score>(), Some(&[Score(2)][..]));
    }

    #[test]
    fn test_empty_bundle() {
        let mut types = Vec::new();
        <()>::component_types(&mut types);
        assert!(types.is_empty());
    }
}
