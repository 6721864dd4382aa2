//! # State Database
//!
//! The registry half of the store: types, states, name lookup and introspection.
//! Object lifetime lives in `objects.rs`, bulk access in `iter.rs`.

use std::collections::HashMap;

use bytemuck::Pod;

use super::column::Column;
use super::handle::{ObjectHandle, StateId, TypeId};
use super::state::{StateEntry, StateKey};
use super::types::{TypeEntry, TypeInfo};
use crate::error::{RegistryError, RegistryResult};

/// Largest capacity a type may declare; object ids must fit 32 bits.
pub const MAX_OBJECT_COUNT: usize = u32::MAX as usize;

/// Shared object store.
///
/// Types and states are registered once at startup and live as long as the store.
/// Objects are created and destroyed at runtime and referenced by [`ObjectHandle`].
///
/// # Example
///
/// ```rust
/// use prototype_core::StateDb;
///
/// let mut db = StateDb::new();
/// let mesh = db.register_type("Mesh", 1024);
/// assert_eq!(db.register_type("Mesh", 1024), mesh);
/// assert_eq!(db.type_id_by_name("Mesh"), Some(mesh));
/// ```
#[derive(Default)]
pub struct StateDb {
    pub(super) types: Vec<TypeEntry>,
    pub(super) type_ids_by_name: HashMap<String, TypeId>,
    pub(super) states: Vec<StateEntry>,
    pub(super) state_ids_by_name: HashMap<String, StateId>,
}

impl StateDb {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Type registry
    // =========================================================================

    /// Registers a type, or returns the id of an identical earlier registration.
    ///
    /// # Panics
    ///
    /// Panics on any wiring error reported by [`Self::try_register_type`].
    pub fn register_type(&mut self, name: &str, max_object_count: usize) -> TypeId {
        self.try_register_type(name, max_object_count)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Registers a type, or returns the id of an identical earlier registration.
    ///
    /// # Errors
    ///
    /// Fails on an empty name, a zero or oversized capacity, an exhausted id space,
    /// or a re-registration with a different capacity.
    pub fn try_register_type(&mut self, name: &str, max_object_count: usize) -> RegistryResult<TypeId> {
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if let Some(&id) = self.type_ids_by_name.get(name) {
            let registered = self.types[Self::slot(id.0)].max_object_count;
            if registered != max_object_count {
                return Err(RegistryError::CapacityMismatch {
                    name: name.to_owned(),
                    registered,
                    requested: max_object_count,
                });
            }
            return Ok(id);
        }
        if max_object_count == 0 {
            return Err(RegistryError::ZeroCapacity(name.to_owned()));
        }
        if max_object_count > MAX_OBJECT_COUNT {
            return Err(RegistryError::CapacityTooLarge {
                name: name.to_owned(),
                requested: max_object_count,
            });
        }
        let Ok(raw) = u16::try_from(self.types.len() + 1) else {
            return Err(RegistryError::TypeLimitReached(name.to_owned()));
        };

        let id = TypeId(raw);
        self.types.push(TypeEntry::new(name.to_owned(), id, max_object_count));
        self.type_ids_by_name.insert(name.to_owned(), id);
        tracing::debug!(type_name = name, type_id = raw, max_object_count, "registered type");
        Ok(id)
    }

    /// Checks that `type_id` names a registered type. Id 0 is never valid.
    #[inline]
    #[must_use]
    pub fn is_type_id_valid(&self, type_id: TypeId) -> bool {
        type_id.0 > 0 && usize::from(type_id.0) <= self.types.len()
    }

    #[inline]
    const fn slot(raw: u16) -> usize {
        raw as usize - 1
    }

    #[inline]
    pub(super) fn type_entry(&self, type_id: TypeId) -> Option<&TypeEntry> {
        self.types.get(usize::from(type_id.0).checked_sub(1)?)
    }

    #[inline]
    pub(super) fn type_entry_mut(&mut self, type_id: TypeId) -> Option<&mut TypeEntry> {
        self.types.get_mut(usize::from(type_id.0).checked_sub(1)?)
    }

    // =========================================================================
    // State registry
    // =========================================================================

    /// Registers a typed state on `type_id`; the element size is `size_of::<T>()`.
    ///
    /// # Panics
    ///
    /// Panics on any wiring error reported by [`Self::try_register_state`].
    pub fn register_state<T: Pod>(&mut self, type_id: TypeId, name: &str) -> StateKey<T> {
        self.try_register_state::<T>(type_id, name)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Registers a typed state on `type_id`.
    ///
    /// # Errors
    ///
    /// Fails if `T` needs more than 8-byte alignment, or on any error of
    /// [`Self::try_register_state_raw`].
    pub fn try_register_state<T: Pod>(&mut self, type_id: TypeId, name: &str) -> RegistryResult<StateKey<T>> {
        let align = std::mem::align_of::<T>();
        if align > Column::ALIGN {
            return Err(RegistryError::ElementAlignment {
                name: name.to_owned(),
                align,
            });
        }
        self.try_register_state_raw(type_id, name, std::mem::size_of::<T>())
            .map(StateKey::new)
    }

    /// Registers an untyped state of `elem_size` bytes per row.
    ///
    /// # Panics
    ///
    /// Panics on any wiring error reported by [`Self::try_register_state_raw`].
    pub fn register_state_raw(&mut self, type_id: TypeId, name: &str, elem_size: usize) -> StateId {
        self.try_register_state_raw(type_id, name, elem_size)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Registers an untyped state, or returns the id of an identical earlier registration.
    ///
    /// States are keyed by their qualified name `Type::State`.
    ///
    /// # Errors
    ///
    /// Fails on an empty name, an unknown type, an element size that is zero or not a
    /// multiple of 4, a type that already has live objects, or a re-registration that
    /// differs in element size.
    pub fn try_register_state_raw(&mut self, type_id: TypeId, name: &str, elem_size: usize) -> RegistryResult<StateId> {
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let type_entry = self
            .type_entry(type_id)
            .ok_or(RegistryError::InvalidTypeId(type_id.0))?;
        let qualified = format!("{}::{}", type_entry.name, name);

        if elem_size == 0 || elem_size % 4 != 0 {
            return Err(RegistryError::InvalidElementSize {
                name: qualified,
                size: elem_size,
            });
        }
        if type_entry.object_count > 0 {
            return Err(RegistryError::StateAfterObjects {
                type_name: type_entry.name.clone(),
                live: type_entry.object_count,
            });
        }

        if let Some(&existing) = self.state_ids_by_name.get(&qualified) {
            let state = &self.states[existing.0 as usize - 1];
            if state.elem_size() != elem_size {
                return Err(RegistryError::ElementSizeMismatch {
                    name: qualified,
                    registered: state.elem_size(),
                    requested: elem_size,
                });
            }
            return Ok(existing);
        }

        let rows = type_entry.max_object_count + 1;
        let id = StateId(self.states.len() as u32 + 1);
        tracing::debug!(state_name = %qualified, state_id = id.0, elem_size, "registered state");

        self.states
            .push(StateEntry::new(qualified.clone(), type_id, elem_size, rows));
        self.state_ids_by_name.insert(qualified, id);
        if let Some(entry) = self.type_entry_mut(type_id) {
            entry.state_ids.push(id);
        }
        Ok(id)
    }

    /// Binds a typed key to an existing state.
    ///
    /// # Panics
    ///
    /// Panics on any wiring error reported by [`Self::try_state_key`].
    #[must_use]
    pub fn state_key<T: Pod>(&self, state_id: StateId) -> StateKey<T> {
        self.try_state_key(state_id).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Binds a typed key to an existing state.
    ///
    /// # Errors
    ///
    /// Fails if the state is unknown or `size_of::<T>()` differs from its element size.
    pub fn try_state_key<T: Pod>(&self, state_id: StateId) -> RegistryResult<StateKey<T>> {
        let state = self
            .state_entry(state_id)
            .ok_or(RegistryError::InvalidStateId(state_id.0))?;
        let requested = std::mem::size_of::<T>();
        if state.elem_size() != requested {
            return Err(RegistryError::ElementSizeMismatch {
                name: state.name.clone(),
                registered: state.elem_size(),
                requested,
            });
        }
        if std::mem::align_of::<T>() > Column::ALIGN {
            return Err(RegistryError::ElementAlignment {
                name: state.name.clone(),
                align: std::mem::align_of::<T>(),
            });
        }
        Ok(StateKey::new(state_id))
    }

    /// Checks that `state_id` names a registered state. Id 0 is never valid.
    #[inline]
    #[must_use]
    pub fn is_state_id_valid(&self, state_id: StateId) -> bool {
        state_id.0 > 0 && state_id.0 as usize <= self.states.len()
    }

    #[inline]
    pub(super) fn state_entry(&self, state_id: StateId) -> Option<&StateEntry> {
        self.states.get((state_id.0 as usize).checked_sub(1)?)
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Looks up a type by name.
    #[must_use]
    pub fn type_id_by_name(&self, name: &str) -> Option<TypeId> {
        self.type_ids_by_name.get(name).copied()
    }

    /// Looks up a state by qualified name, `Type::State`.
    #[must_use]
    pub fn state_id_by_name(&self, qualified_name: &str) -> Option<StateId> {
        self.state_ids_by_name.get(qualified_name).copied()
    }

    /// Name of a registered type.
    #[must_use]
    pub fn type_name(&self, type_id: TypeId) -> Option<&str> {
        self.type_entry(type_id).map(|t| t.name.as_str())
    }

    /// Qualified name of a registered state.
    #[must_use]
    pub fn state_name(&self, state_id: StateId) -> Option<&str> {
        self.state_entry(state_id).map(|s| s.name.as_str())
    }

    /// Owning type of a registered state.
    #[must_use]
    pub fn state_type(&self, state_id: StateId) -> Option<TypeId> {
        self.state_entry(state_id).map(|s| s.type_id)
    }

    /// Element size of a registered state, in bytes.
    #[must_use]
    pub fn element_size(&self, state_id: StateId) -> Option<usize> {
        self.state_entry(state_id).map(StateEntry::elem_size)
    }

    /// Type name of the object a valid handle refers to.
    #[must_use]
    pub fn handle_type_name(&self, handle: ObjectHandle) -> Option<&str> {
        self.type_entry(handle.type_id())
            .filter(|t| t.is_live(handle))
            .map(|t| t.name.as_str())
    }

    /// Live object count of a type; zero for unknown types.
    #[must_use]
    pub fn object_count(&self, type_id: TypeId) -> usize {
        self.type_entry(type_id).map_or(0, |t| t.object_count)
    }

    /// Fixed capacity of a type.
    #[must_use]
    pub fn max_object_count(&self, type_id: TypeId) -> Option<usize> {
        self.type_entry(type_id).map(|t| t.max_object_count)
    }

    /// Snapshot of a single type.
    #[must_use]
    pub fn type_info(&self, type_id: TypeId) -> Option<TypeInfo<'_>> {
        self.type_entry(type_id).map(TypeInfo::from)
    }

    /// Snapshots of all registered types, in id order.
    pub fn types(&self) -> impl Iterator<Item = TypeInfo<'_>> {
        self.types.iter().map(TypeInfo::from)
    }
}

impl Drop for StateDb {
    fn drop(&mut self) {
        for entry in self.types.iter().filter(|t| t.object_count > 0) {
            tracing::warn!(
                type_name = %entry.name,
                live = entry.object_count,
                "dropping state db with active objects"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_type_is_idempotent() {
        let mut db = StateDb::new();
        let a = db.register_type("Mesh", 16);
        let b = db.register_type("Camera", 4);
        assert_eq!(a, TypeId(1));
        assert_eq!(b, TypeId(2));
        assert_eq!(db.register_type("Mesh", 16), a);
        assert!(db.is_type_id_valid(a));
        assert!(!db.is_type_id_valid(TypeId::NONE));
        assert!(!db.is_type_id_valid(TypeId(3)));
    }

    #[test]
    fn test_register_type_capacity_mismatch() {
        let mut db = StateDb::new();
        db.register_type("Mesh", 16);
        assert_eq!(
            db.try_register_type("Mesh", 32),
            Err(RegistryError::CapacityMismatch {
                name: "Mesh".into(),
                registered: 16,
                requested: 32,
            })
        );
    }

    #[test]
    #[should_panic(expected = "already registered with capacity 16")]
    fn test_register_type_mismatch_fails_fast() {
        let mut db = StateDb::new();
        db.register_type("Mesh", 16);
        db.register_type("Mesh", 8);
    }

    #[test]
    fn test_register_type_rejects_bad_input() {
        let mut db = StateDb::new();
        assert_eq!(db.try_register_type("", 1), Err(RegistryError::EmptyName));
        assert_eq!(
            db.try_register_type("Empty", 0),
            Err(RegistryError::ZeroCapacity("Empty".into()))
        );
    }

    #[test]
    fn test_register_state_qualified_name() {
        let mut db = StateDb::new();
        let body = db.register_type("RigidBody", 8);
        let info = db.register_state_raw(body, "Info", 32);
        let private = db.register_state_raw(body, "PrivateInfo", 16);

        assert_eq!(db.state_id_by_name("RigidBody::Info"), Some(info));
        assert_eq!(db.state_name(private), Some("RigidBody::PrivateInfo"));
        assert_eq!(db.state_type(info), Some(body));
        assert_eq!(db.element_size(private), Some(16));
        assert_eq!(db.register_state_raw(body, "Info", 32), info);
        assert_eq!(db.type_info(body).unwrap().state_ids, &[info, private]);
    }

    #[test]
    fn test_same_state_name_on_two_types() {
        let mut db = StateDb::new();
        let mesh = db.register_type("Mesh", 8);
        let camera = db.register_type("Camera", 2);
        let mesh_info = db.register_state_raw(mesh, "Info", 36);
        let camera_info = db.register_state_raw(camera, "Info", 24);

        assert_ne!(mesh_info, camera_info);
        assert_eq!(db.state_type(camera_info), Some(camera));
        assert_eq!(db.register_state_raw(camera, "Info", 24), camera_info);
        assert!(matches!(
            db.try_register_state_raw(camera, "Info", 36),
            Err(RegistryError::ElementSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_register_state_rejects_bad_sizes() {
        let mut db = StateDb::new();
        let body = db.register_type("Body", 8);
        assert!(matches!(
            db.try_register_state_raw(body, "Odd", 6),
            Err(RegistryError::InvalidElementSize { size: 6, .. })
        ));
        assert!(matches!(
            db.try_register_state_raw(body, "Zero", 0),
            Err(RegistryError::InvalidElementSize { size: 0, .. })
        ));
        db.register_state_raw(body, "Pos", 8);
        assert!(matches!(
            db.try_register_state_raw(body, "Pos", 12),
            Err(RegistryError::ElementSizeMismatch { registered: 8, requested: 12, .. })
        ));
        assert_eq!(
            db.try_register_state_raw(TypeId(9), "Pos", 8),
            Err(RegistryError::InvalidTypeId(9))
        );
    }

    #[test]
    fn test_register_state_after_objects_fails() {
        let mut db = StateDb::new();
        let body = db.register_type("Body", 8);
        db.register_state_raw(body, "Pos", 8);
        let _ = db.create_object(body).unwrap();
        assert_eq!(
            db.try_register_state_raw(body, "Vel", 8),
            Err(RegistryError::StateAfterObjects {
                type_name: "Body".into(),
                live: 1,
            })
        );
    }

    #[test]
    fn test_state_key_checks_size() {
        let mut db = StateDb::new();
        let body = db.register_type("Body", 8);
        let pos = db.register_state_raw(body, "Pos", 8);
        assert!(db.try_state_key::<[f32; 2]>(pos).is_ok());
        assert!(matches!(
            db.try_state_key::<[f32; 3]>(pos),
            Err(RegistryError::ElementSizeMismatch { .. })
        ));
        assert_eq!(
            db.try_state_key::<u32>(StateId(42)),
            Err(RegistryError::InvalidStateId(42))
        );
    }

    #[test]
    fn test_types_snapshot() {
        let mut db = StateDb::new();
        db.register_type("Mesh", 4);
        db.register_type("Camera", 2);
        let names: Vec<_> = db.types().map(|t| t.name).collect();
        assert_eq!(names, ["Mesh", "Camera"]);
    }
}
