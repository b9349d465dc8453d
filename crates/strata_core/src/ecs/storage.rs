//! # Component Storage
//!
//! Dense, growable column storage for one component type.
//!
//! Each archetype owns one column per component type in its signature:
//! - Row `i` of every column belongs to the same entity
//! - Access is O(1) via row index
//! - Removal is swap-with-last, so columns never contain holes
//!
//! Archetypes hold columns behind [`ErasedStorage`] so a single archetype can
//! mix arbitrary component types; typed access downcasts back to
//! [`ComponentStorage<C>`].

use std::any::{type_name, Any, TypeId};

use super::component::Component;

/// Dense storage for a single component type.
///
/// # Type Parameters
///
/// * `C` - The component type to store
///
/// # Example
///
/// ```rust,ignore
/// let mut storage: ComponentStorage<Position> = ComponentStorage::with_capacity(64);
/// storage.push(Position::new(1.0, 2.0, 3.0));
/// ```
#[derive(Debug)]
pub struct ComponentStorage<C: Component> {
    /// The dense array of components.
    data: Vec<C>,
}

impl<C: Component> ComponentStorage<C> {
    /// Creates an empty column with room for `capacity` rows.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of rows.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Checks if empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Gets a component by row.
    #[inline]
    #[must_use]
    pub fn get(&self, row: usize) -> Option<&C> {
        self.data.get(row)
    }

    /// Gets a mutable component by row.
    #[inline]
    pub fn get_mut(&mut self, row: usize) -> Option<&mut C> {
        self.data.get_mut(row)
    }

    /// Appends a component at the end of the column.
    #[inline]
    pub fn push(&mut self, component: C) {
        self.data.push(component);
    }

    /// Overwrites the last row. No-op on an empty column.
    #[inline]
    pub fn replace_last(&mut self, component: C) {
        if let Some(slot) = self.data.last_mut() {
            *slot = component;
        }
    }

    /// Removes a row by moving the last row into its place.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    #[inline]
    pub fn swap_remove(&mut self, row: usize) -> C {
        self.data.swap_remove(row)
    }

    /// Returns a slice of all components.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[C] {
        &self.data
    }

    /// Returns a mutable slice of all components.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [C] {
        &mut self.data
    }
}

/// Type-erased view of a [`ComponentStorage`].
///
/// Every operation that moves a row between archetypes goes through this
/// trait, since the archetype does not know its column types statically.
pub trait ErasedStorage: Send + Sync {
    /// `TypeId` of the stored component.
    fn component_type(&self) -> TypeId;

    /// Type name of the stored component.
    fn component_name(&self) -> &'static str;

    /// Number of rows.
    fn len(&self) -> usize;

    /// Checks if empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creates an empty column of the same component type.
    fn new_empty(&self, capacity: usize) -> Box<dyn ErasedStorage>;

    /// Swap-removes `row` and drops the value.
    fn swap_remove_drop(&mut self, row: usize);

    /// Swap-removes `row` and pushes the value onto `dst`.
    ///
    /// # Panics
    ///
    /// Panics if `dst` stores a different component type.
    fn swap_remove_into(&mut self, row: usize, dst: &mut dyn ErasedStorage);

    /// Returns the value at `row` as `&dyn Any`.
    fn get_any(&self, row: usize) -> Option<&dyn Any>;

    /// Upcast for typed access.
    fn as_any(&self) -> &dyn Any;

    /// Upcast for typed mutable access.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<C: Component> ErasedStorage for ComponentStorage<C> {
    fn component_type(&self) -> TypeId {
        TypeId::of::<C>()
    }

    fn component_name(&self) -> &'static str {
        type_name::<C>()
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn new_empty(&self, capacity: usize) -> Box<dyn ErasedStorage> {
        Box::new(Self::with_capacity(capacity))
    }

    fn swap_remove_drop(&mut self, row: usize) {
        self.data.swap_remove(row);
    }

    fn swap_remove_into(&mut self, row: usize, dst: &mut dyn ErasedStorage) {
        let dst = dst
            .as_any_mut()
            .downcast_mut::<Self>()
            .expect("column type mismatch during row migration");
        dst.data.push(self.data.swap_remove(row));
    }

    fn get_any(&self, row: usize) -> Option<&dyn Any> {
        self.data.get(row).map(|value| value as &dyn Any)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Health(u32);
    impl Component for Health {}

    #[test]
    fn test_storage_swap_remove() {
        let mut storage = ComponentStorage::with_capacity(4);
        storage.push(Health(1));
        storage.push(Health(2));
        storage.push(Health(3));

        assert_eq!(storage.swap_remove(0), Health(1));
        assert_eq!(storage.as_slice(), &[Health(3), Health(2)]);
    }

    #[test]
    fn test_erased_migration() {
        let mut src: Box<dyn ErasedStorage> = Box::new(ComponentStorage::<Health>::with_capacity(2));
        let mut dst = src.new_empty(2);
        src.as_any_mut()
            .downcast_mut::<ComponentStorage<Health>>()
            .unwrap()
            .push(Health(9));

        src.swap_remove_into(0, dst.as_mut());
        assert!(src.is_empty());
        assert_eq!(dst.len(), 1);
        assert_eq!(dst.get_any(0).unwrap().downcast_ref::<Health>(), Some(&Health(9)));
        assert_eq!(dst.component_type(), TypeId::of::<Health>());
    }

    #[test]
    fn test_replace_last() {
        let mut storage = ComponentStorage::with_capacity(1);
        storage.replace_last(Health(1));
        assert!(storage.is_empty());
        storage.push(Health(1));
        storage.replace_last(Health(5));
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.get(0), Some(&Health(5)));
    }
}
