//! # Bulk Access
//!
//! Live rows of a state are contiguous in `[1..=object_count]`, so per-frame
//! systems iterate plain slices. Dense positions map back to handles through
//! the type's permutation.

use std::ops::Range;

use bytemuck::Pod;

use super::handle::{ObjectHandle, StateId, TypeId};
use super::state::StateKey;
use super::store::StateDb;

impl StateDb {
    fn live_rows(&self, state_id: StateId) -> Option<(usize, Range<usize>)> {
        let state = self.state_entry(state_id)?;
        let entry = self.type_entry(state.type_id)?;
        Some((state_id.0 as usize - 1, 1..entry.object_count + 1))
    }

    /// Bytes of all live rows of `state_id`; empty for unknown states.
    #[must_use]
    pub fn full_state_bytes(&self, state_id: StateId) -> &[u8] {
        match self.live_rows(state_id) {
            Some((slot, rows)) => self.states[slot].column.rows(rows),
            None => &[],
        }
    }

    /// Mutable bytes of all live rows of `state_id`; empty for unknown states.
    pub fn full_state_bytes_mut(&mut self, state_id: StateId) -> &mut [u8] {
        match self.live_rows(state_id) {
            Some((slot, rows)) => self.states[slot].column.rows_mut(rows),
            None => &mut [],
        }
    }

    /// All live rows of a state, packed. Row `i` of every state of the same
    /// type belongs to the same object.
    #[inline]
    #[must_use]
    pub fn full_state<T: Pod>(&self, key: StateKey<T>) -> &[T] {
        match self.live_rows(key.id()) {
            Some((slot, rows)) => bytemuck::cast_slice(self.states[slot].column.rows(rows)),
            None => &[],
        }
    }

    /// All live rows of a state, packed and mutable.
    #[inline]
    pub fn full_state_mut<T: Pod>(&mut self, key: StateKey<T>) -> &mut [T] {
        match self.live_rows(key.id()) {
            Some((slot, rows)) => bytemuck::cast_slice_mut(self.states[slot].column.rows_mut(rows)),
            None => &mut [],
        }
    }

    /// Live rows of two distinct states of the same type, the first mutable.
    ///
    /// `None` if the states belong to different types or are the same state.
    pub fn full_state_pair_mut<A: Pod, B: Pod>(
        &mut self,
        a: StateKey<A>,
        b: StateKey<B>,
    ) -> Option<(&mut [A], &[B])> {
        let (slot_a, rows) = self.live_rows(a.id())?;
        let (slot_b, _) = self.live_rows(b.id())?;
        if slot_a == slot_b || self.states[slot_a].type_id != self.states[slot_b].type_id {
            return None;
        }

        let (col_a, col_b) = if slot_a < slot_b {
            let (lo, hi) = self.states.split_at_mut(slot_b);
            (&mut lo[slot_a].column, &hi[0].column)
        } else {
            let (lo, hi) = self.states.split_at_mut(slot_a);
            (&mut hi[0].column, &lo[slot_b].column)
        };
        Some((
            bytemuck::cast_slice_mut(col_a.rows_mut(rows.clone())),
            bytemuck::cast_slice(col_b.rows(rows)),
        ))
    }

    /// Handle of the object in dense slot `idx` (1-based) of a type.
    #[must_use]
    pub fn handle_at(&self, type_id: TypeId, idx: usize) -> Option<ObjectHandle> {
        self.type_entry(type_id)?.handle_at(idx)
    }

    /// Recovers the handle of a row obtained from [`Self::full_state`].
    ///
    /// `None` if `elem` does not point at a live row of the state.
    #[must_use]
    pub fn handle_from_elem<T: Pod>(&self, key: StateKey<T>, elem: &T) -> Option<ObjectHandle> {
        let state = self.state_entry(key.id())?;
        let idx = state.column.row_of_addr(elem as *const T as usize)?;
        self.handle_at(state.type_id, idx)
    }

    /// Live rows of a state paired with the handles of their objects.
    pub fn iter_with_handles<T: Pod>(
        &self,
        key: StateKey<T>,
    ) -> impl Iterator<Item = (ObjectHandle, &T)> + '_ {
        let entry = self
            .state_entry(key.id())
            .and_then(|s| self.type_entry(s.type_id));
        self.full_state(key)
            .iter()
            .enumerate()
            .filter_map(move |(i, row)| Some((entry?.handle_at(i + 1)?, row)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_state_tracks_live_count() {
        let mut db = StateDb::new();
        let body = db.register_type("Body", 4);
        let pos = db.register_state::<u32>(body, "Pos");
        assert!(db.full_state(pos).is_empty());

        let a = db.create_object(body).unwrap();
        let b = db.create_object(body).unwrap();
        *db.state_mut(pos, a).unwrap() = 10;
        *db.state_mut(pos, b).unwrap() = 20;
        assert_eq!(db.full_state(pos), &[10, 20]);

        for row in db.full_state_mut(pos) {
            *row += 1;
        }
        assert_eq!(db.state(pos, b), Some(&21));
    }

    #[test]
    fn test_unknown_state_is_empty() {
        let mut registered = StateDb::new();
        let body = registered.register_type("Body", 4);
        let pos = registered.register_state::<u32>(body, "Pos");
        let wide = registered.register_state::<u64>(body, "Wide");

        let mut empty = StateDb::new();
        assert!(empty.full_state(pos).is_empty());
        assert!(empty.full_state(wide).is_empty());
        assert!(empty.full_state_mut(wide).is_empty());
        assert!(empty.full_state_bytes(pos.id()).is_empty());
        assert_eq!(empty.iter_with_handles(wide).count(), 0);
    }

    #[test]
    fn test_handle_from_elem_roundtrip() {
        let mut db = StateDb::new();
        let body = db.register_type("Body", 4);
        let pos = db.register_state::<u32>(body, "Pos");
        let handles: Vec<_> = (0..3).map(|_| db.create_object(body).unwrap()).collect();
        db.destroy_object(handles[0]).unwrap();

        for row in db.full_state(pos) {
            let h = db.handle_from_elem(pos, row).unwrap();
            assert!(db.is_object_handle_valid(h));
            assert!(std::ptr::eq(db.state(pos, h).unwrap(), row));
        }
        let outside = 7u32;
        assert!(db.handle_from_elem(pos, &outside).is_none());
    }

    #[test]
    fn test_iter_with_handles() {
        let mut db = StateDb::new();
        let body = db.register_type("Body", 4);
        let pos = db.register_state::<u32>(body, "Pos");
        let a = db.create_object(body).unwrap();
        let b = db.create_object(body).unwrap();
        *db.state_mut(pos, a).unwrap() = 1;
        *db.state_mut(pos, b).unwrap() = 2;

        let pairs: Vec<_> = db.iter_with_handles(pos).map(|(h, v)| (h, *v)).collect();
        assert_eq!(pairs, [(a, 1), (b, 2)]);
    }

    #[test]
    fn test_pair_mut_is_row_aligned() {
        let mut db = StateDb::new();
        let body = db.register_type("Body", 4);
        let pos = db.register_state::<f32>(body, "Pos");
        let vel = db.register_state::<f32>(body, "Vel");
        let other = db.register_type("Other", 1);
        let foreign = db.register_state::<f32>(other, "Pos");

        for v in [1.0, 2.0, 3.0] {
            let h = db.create_object(body).unwrap();
            *db.state_mut(vel, h).unwrap() = v;
        }

        let (positions, velocities) = db.full_state_pair_mut(pos, vel).unwrap();
        for (p, v) in positions.iter_mut().zip(velocities) {
            *p += *v * 2.0;
        }
        assert_eq!(db.full_state(pos), &[2.0, 4.0, 6.0]);

        assert!(db.full_state_pair_mut(vel, pos).is_some());
        assert!(db.full_state_pair_mut(pos, pos).is_none());
        assert!(db.full_state_pair_mut(pos, foreign).is_none());
    }
}
