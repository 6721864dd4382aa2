//! # Type Registry Entries
//!
//! Every registered type keeps a pair of mutually inverse permutations over
//! `[0..=max_object_count]`:
//!
//! ```text
//! object_id_to_idx:  object id  -> dense slot
//! idx_to_object_id:  dense slot -> object id
//! ```
//!
//! Slots `[1..=object_count]` are live, the rest are free. Slot 0 is the sentinel.

use super::handle::{ObjectHandle, StateId, TypeId};

/// Registry entry for one object type.
pub(crate) struct TypeEntry {
    pub(crate) name: String,
    pub(crate) id: TypeId,
    pub(crate) max_object_count: usize,
    pub(crate) object_count: usize,
    pub(crate) state_ids: Vec<StateId>,
    object_id_to_idx: Box<[u32]>,
    idx_to_object_id: Box<[u32]>,
    lifecycle_by_object_id: Box<[u16]>,
}

/// Outcome of vacating a dense slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Vacated {
    /// Slot the destroyed object occupied; now holds the moved object.
    pub(crate) hole: usize,
    /// Previously last live slot; now free and to be zeroed.
    pub(crate) last: usize,
}

impl TypeEntry {
    /// Creates an empty type with identity permutations and zeroed lifecycles.
    pub(crate) fn new(name: String, id: TypeId, max_object_count: usize) -> Self {
        let identity: Box<[u32]> = (0..=max_object_count).map(|i| i as u32).collect();
        Self {
            name,
            id,
            max_object_count,
            object_count: 0,
            state_ids: Vec::new(),
            object_id_to_idx: identity.clone(),
            idx_to_object_id: identity,
            lifecycle_by_object_id: vec![0; max_object_count + 1].into_boxed_slice(),
        }
    }

    /// Checks that `handle` names a live object of this type.
    #[inline]
    #[must_use]
    pub(crate) fn is_live(&self, handle: ObjectHandle) -> bool {
        let id = handle.object_id() as usize;
        if handle.type_id() != self.id || id == 0 || id > self.max_object_count {
            return false;
        }
        if self.lifecycle_by_object_id[id] != handle.lifecycle() {
            return false;
        }
        let idx = self.object_id_to_idx[id] as usize;
        idx >= 1 && idx <= self.object_count
    }

    /// Dense slot currently holding `object_id`.
    #[inline]
    #[must_use]
    pub(crate) fn dense_index(&self, object_id: u32) -> usize {
        self.object_id_to_idx[object_id as usize] as usize
    }

    /// Handle of the object in a live dense slot.
    #[inline]
    #[must_use]
    pub(crate) fn handle_at(&self, idx: usize) -> Option<ObjectHandle> {
        if idx == 0 || idx > self.object_count {
            return None;
        }
        let object_id = self.idx_to_object_id[idx];
        let lifecycle = self.lifecycle_by_object_id[object_id as usize];
        Some(ObjectHandle::compose(self.id, lifecycle, object_id))
    }

    /// Occupies the next free slot and returns the new object's handle.
    ///
    /// Returns `None` if the type is at capacity.
    pub(crate) fn acquire(&mut self) -> Option<ObjectHandle> {
        if self.object_count >= self.max_object_count {
            return None;
        }
        self.object_count += 1;
        let object_id = self.idx_to_object_id[self.object_count];
        let lifecycle = self.bump_lifecycle(object_id);
        Some(ObjectHandle::compose(self.id, lifecycle, object_id))
    }

    /// Vacates the slot of a live object by swapping the last live object into it.
    ///
    /// The caller must have checked liveness and must mirror the move in every state column.
    pub(crate) fn release(&mut self, object_id: u32) -> Vacated {
        debug_assert!(self.object_count > 0, "release on empty type");
        let hole = self.dense_index(object_id);
        let last = self.object_count;
        let moved_id = self.idx_to_object_id[last];

        self.object_id_to_idx.swap(moved_id as usize, object_id as usize);
        self.idx_to_object_id.swap(last, hole);

        let old = self.lifecycle_by_object_id[object_id as usize];
        let new = self.bump_lifecycle(object_id);
        debug_assert_ne!(old, new);

        self.object_count -= 1;
        Vacated { hole, last }
    }

    fn bump_lifecycle(&mut self, object_id: u32) -> u16 {
        let lifecycle = &mut self.lifecycle_by_object_id[object_id as usize];
        *lifecycle = lifecycle.wrapping_add(1);
        if *lifecycle == 0 {
            tracing::warn!(
                type_name = %self.name,
                object_id,
                "lifecycle counter wrapped; handles from 32768 reuses ago validate again"
            );
        }
        *lifecycle
    }
}

/// Read-only snapshot of a registered type, for introspection and debug UIs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypeInfo<'a> {
    /// Type id.
    pub id: TypeId,
    /// Registered name.
    pub name: &'a str,
    /// Fixed capacity.
    pub max_object_count: usize,
    /// Live object count.
    pub object_count: usize,
    /// States attached to this type, in registration order.
    pub state_ids: &'a [StateId],
}

impl<'a> From<&'a TypeEntry> for TypeInfo<'a> {
    fn from(entry: &'a TypeEntry) -> Self {
        Self {
            id: entry.id,
            name: &entry.name,
            max_object_count: entry.max_object_count,
            object_count: entry.object_count,
            state_ids: &entry.state_ids,
        }
    }
}
