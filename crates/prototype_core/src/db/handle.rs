//! # Object Handles
//!
//! Handles are opaque 64-bit names for objects:
//! - Bits 48..64: type id
//! - Bits 32..48: lifecycle (generation) of the object id
//! - Bits 0..32: object id, stable across compaction

use std::fmt;

/// Numeric id of a registered object type. Id 0 is reserved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeId(pub u16);

impl TypeId {
    /// The reserved, never-valid type id.
    pub const NONE: Self = Self(0);

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }
}

/// Numeric id of a registered state. Id 0 is reserved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StateId(pub u32);

impl StateId {
    /// The reserved, never-valid state id.
    pub const NONE: Self = Self(0);

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Opaque reference to an object, valid until the object is destroyed.
///
/// A handle stays decodable forever; whether it still names a live object
/// is answered by [`StateDb::is_object_handle_valid`](crate::StateDb::is_object_handle_valid).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ObjectHandle(u64);

impl ObjectHandle {
    /// Null handle. Decodes to the reserved type id and is never valid.
    pub const NULL: Self = Self(0);

    /// Packs type id, lifecycle and object id into a handle.
    #[inline]
    #[must_use]
    pub const fn compose(type_id: TypeId, lifecycle: u16, object_id: u32) -> Self {
        Self(((type_id.0 as u64) << 48) | ((lifecycle as u64) << 32) | object_id as u64)
    }

    /// Returns the type id portion.
    #[inline]
    #[must_use]
    pub const fn type_id(self) -> TypeId {
        TypeId((self.0 >> 48) as u16)
    }

    /// Returns the lifecycle portion.
    #[inline]
    #[must_use]
    pub const fn lifecycle(self) -> u16 {
        (self.0 >> 32) as u16
    }

    /// Returns the object id portion.
    #[inline]
    #[must_use]
    pub const fn object_id(self) -> u32 {
        self.0 as u32
    }

    /// Checks if this is the null handle.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Raw bits, for storing a handle inside a state row.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Rebuilds a handle from raw bits.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }
}

impl From<ObjectHandle> for u64 {
    fn from(handle: ObjectHandle) -> Self {
        handle.0
    }
}

impl From<u64> for ObjectHandle {
    fn from(bits: u64) -> Self {
        Self(bits)
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ObjectHandle(t{}:{}v{})",
            self.type_id().0,
            self.object_id(),
            self.lifecycle()
        )
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}:{}v{}", self.type_id().0, self.object_id(), self.lifecycle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_handle_layout() {
        let handle = ObjectHandle::compose(TypeId(0x1234), 0x5678, 0x9abc_def0);
        assert_eq!(handle.to_bits(), 0x1234_5678_9abc_def0);
    }

    #[test]
    fn test_null_handle() {
        assert!(ObjectHandle::NULL.is_null());
        assert_eq!(ObjectHandle::NULL.type_id(), TypeId::NONE);
        assert_eq!(ObjectHandle::default(), ObjectHandle::NULL);
    }

    #[test]
    fn test_display() {
        let handle = ObjectHandle::compose(TypeId(3), 7, 42);
        assert_eq!(handle.to_string(), "t3:42v7");
    }

    proptest! {
        #[test]
        fn prop_handle_roundtrip(type_id in any::<u16>(), lifecycle in any::<u16>(), object_id in any::<u32>()) {
            let handle = ObjectHandle::compose(TypeId(type_id), lifecycle, object_id);
            prop_assert_eq!(handle.type_id(), TypeId(type_id));
            prop_assert_eq!(handle.lifecycle(), lifecycle);
            prop_assert_eq!(handle.object_id(), object_id);
            prop_assert_eq!(ObjectHandle::from_bits(handle.to_bits()), handle);
        }
    }
}
