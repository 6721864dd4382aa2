//! # State Registry Entries
//!
//! A state is a named, fixed-stride column attached to one type.
//! Typed access goes through [`StateKey`], which remembers the element type.

use std::fmt;
use std::marker::PhantomData;

use super::column::Column;
use super::handle::{StateId, TypeId};

/// Registry entry for one state column.
pub(crate) struct StateEntry {
    /// Qualified name, `Type::State`.
    pub(crate) name: String,
    pub(crate) type_id: TypeId,
    pub(crate) column: Column,
}

impl StateEntry {
    pub(crate) fn new(name: String, type_id: TypeId, elem_size: usize, rows: usize) -> Self {
        Self {
            name,
            type_id,
            column: Column::new(elem_size, rows),
        }
    }

    #[inline]
    pub(crate) const fn elem_size(&self) -> usize {
        self.column.elem_size()
    }
}

/// Typed key for a registered state.
///
/// Obtained from [`StateDb::register_state`](crate::StateDb::register_state) or
/// [`StateDb::state_key`](crate::StateDb::state_key), both of which check that
/// `size_of::<T>()` matches the registered element size.
pub struct StateKey<T> {
    id: StateId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> StateKey<T> {
    pub(crate) const fn new(id: StateId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// The untyped state id.
    #[inline]
    #[must_use]
    pub const fn id(self) -> StateId {
        self.id
    }
}

impl<T> Clone for StateKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StateKey<T> {}

impl<T> PartialEq for StateKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for StateKey<T> {}

impl<T> fmt::Debug for StateKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateKey<{}>({})", std::any::type_name::<T>(), self.id.0)
    }
}
