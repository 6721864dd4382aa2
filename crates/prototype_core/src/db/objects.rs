//! # Object Lifetime
//!
//! Creation, destruction and per-handle state lookup.
//!
//! Destruction swap-compacts every state column of the type:
//!
//! ```text
//! before:  [_, A, B, C]   count = 3   destroy B
//! after:   [_, A, C, 0]   count = 2
//! ```
//!
//! Iteration order is not stable across destruction; handles are.

use bytemuck::Pod;

use super::handle::{ObjectHandle, StateId, TypeId};
use super::state::{StateEntry, StateKey};
use super::store::StateDb;
use crate::error::{ObjectError, ObjectResult};

impl StateDb {
    /// Creates an object of `type_id`.
    ///
    /// All state rows of the new object start zeroed.
    ///
    /// # Errors
    ///
    /// [`ObjectError::CapacityExhausted`] if the type is full,
    /// [`ObjectError::InvalidTypeId`] if the type is unknown.
    pub fn create_object(&mut self, type_id: TypeId) -> ObjectResult<ObjectHandle> {
        let entry = self
            .type_entry_mut(type_id)
            .ok_or(ObjectError::InvalidTypeId(type_id.0))?;
        entry.acquire().ok_or_else(|| {
            tracing::debug!(type_name = %entry.name, "out of memory for type");
            ObjectError::CapacityExhausted {
                type_name: entry.name.clone(),
                capacity: entry.max_object_count,
            }
        })
    }

    /// Creates an object of the type owning `key` and returns its row in that state.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create_object`].
    pub fn create<T: Pod>(&mut self, key: StateKey<T>) -> ObjectResult<(ObjectHandle, &mut T)> {
        let type_id = self.state_type(key.id()).unwrap_or(TypeId::NONE);
        let handle = self.create_object(type_id)?;
        let row = self
            .state_mut(key, handle)
            .ok_or(ObjectError::StaleHandle(handle))?;
        Ok((handle, row))
    }

    /// Destroys the object `handle` refers to and invalidates the handle.
    ///
    /// The last live object of the type is moved into the vacated slot in every
    /// state column, and the freed row is zeroed.
    ///
    /// # Errors
    ///
    /// [`ObjectError::StaleHandle`] if the handle does not refer to a live object.
    pub fn destroy_object(&mut self, handle: ObjectHandle) -> ObjectResult<()> {
        let Self { types, states, .. } = self;
        let entry = usize::from(handle.type_id().0)
            .checked_sub(1)
            .and_then(|slot| types.get_mut(slot))
            .filter(|t| t.is_live(handle))
            .ok_or(ObjectError::StaleHandle(handle))?;

        let vacated = entry.release(handle.object_id());
        for state_id in &entry.state_ids {
            let column = &mut states[state_id.0 as usize - 1].column;
            if vacated.hole != vacated.last {
                column.copy_row(vacated.last, vacated.hole);
            }
            column.zero_row(vacated.last);
        }
        Ok(())
    }

    /// Checks that `handle` refers to a live object.
    #[inline]
    #[must_use]
    pub fn is_object_handle_valid(&self, handle: ObjectHandle) -> bool {
        self.type_entry(handle.type_id())
            .is_some_and(|t| t.is_live(handle))
    }

    /// Resolves a handle to its state entry and dense row.
    fn resolve(&self, state_id: StateId, handle: ObjectHandle) -> Option<(&StateEntry, usize)> {
        let state = self.state_entry(state_id)?;
        if state.type_id != handle.type_id() {
            return None;
        }
        let entry = self.type_entry(state.type_id)?;
        if !entry.is_live(handle) {
            return None;
        }
        Some((state, entry.dense_index(handle.object_id())))
    }

    /// Row bytes of `state_id` for the object `handle` refers to.
    ///
    /// `None` if the handle is stale or belongs to another type.
    #[must_use]
    pub fn state_bytes(&self, state_id: StateId, handle: ObjectHandle) -> Option<&[u8]> {
        self.resolve(state_id, handle)
            .map(|(state, idx)| state.column.row(idx))
    }

    /// Mutable row bytes of `state_id` for the object `handle` refers to.
    pub fn state_bytes_mut(&mut self, state_id: StateId, handle: ObjectHandle) -> Option<&mut [u8]> {
        let (_, idx) = self.resolve(state_id, handle)?;
        let slot = state_id.0 as usize - 1;
        Some(self.states[slot].column.row_mut(idx))
    }

    /// Typed row of `key` for the object `handle` refers to.
    #[inline]
    #[must_use]
    pub fn state<T: Pod>(&self, key: StateKey<T>, handle: ObjectHandle) -> Option<&T> {
        self.state_bytes(key.id(), handle).map(bytemuck::from_bytes)
    }

    /// Mutable typed row of `key` for the object `handle` refers to.
    #[inline]
    pub fn state_mut<T: Pod>(&mut self, key: StateKey<T>, handle: ObjectHandle) -> Option<&mut T> {
        self.state_bytes_mut(key.id(), handle)
            .map(bytemuck::from_bytes_mut)
    }
}
