//! # Store Error Types
//!
//! Two classes of failure:
//! - [`RegistryError`]: startup wiring defects (bad names, mismatched re-registration)
//! - [`ObjectError`]: runtime conditions modules are expected to handle (stale handles, full types)

use thiserror::Error;

use crate::db::ObjectHandle;

/// Errors raised while registering types and states.
///
/// These indicate a defect in module wiring, not a runtime condition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Type or state name was empty.
    #[error("registration name must not be empty")]
    EmptyName,

    /// Type was registered with a zero capacity.
    #[error("type \"{0}\" must have a non-zero maximum object count")]
    ZeroCapacity(String),

    /// Type capacity does not fit the 32-bit object id of a handle.
    #[error("type \"{name}\" capacity {requested} exceeds the handle object id range")]
    CapacityTooLarge {
        /// Type name.
        name: String,
        /// Requested capacity.
        requested: usize,
    },

    /// The 16-bit type id space is used up.
    #[error("cannot register type \"{0}\": type id space exhausted")]
    TypeLimitReached(String),

    /// A type was re-registered with a different capacity.
    #[error("type \"{name}\" already registered with capacity {registered}, requested {requested}")]
    CapacityMismatch {
        /// Type name.
        name: String,
        /// Capacity of the existing registration.
        registered: usize,
        /// Capacity of the rejected registration.
        requested: usize,
    },

    /// The type id does not name a registered type.
    #[error("invalid type id {0}")]
    InvalidTypeId(u16),

    /// The state id does not name a registered state.
    #[error("invalid state id {0}")]
    InvalidStateId(u32),

    /// Element size is zero or not a multiple of 4 bytes.
    #[error("state \"{name}\" element size {size} must be a non-zero multiple of 4")]
    InvalidElementSize {
        /// Qualified state name.
        name: String,
        /// Rejected element size.
        size: usize,
    },

    /// Element type needs a stricter alignment than state columns provide.
    #[error("state \"{name}\" element alignment {align} exceeds column alignment")]
    ElementAlignment {
        /// Qualified state name.
        name: String,
        /// Alignment of the rejected element type.
        align: usize,
    },

    /// A state was added to a type that already has live objects.
    #[error("cannot add state to type \"{type_name}\" while {live} objects are live")]
    StateAfterObjects {
        /// Type name.
        type_name: String,
        /// Live object count at the time of registration.
        live: usize,
    },

    /// A state was re-registered, or bound, with a different element size.
    #[error("state \"{name}\" has element size {registered}, requested {requested}")]
    ElementSizeMismatch {
        /// Qualified state name.
        name: String,
        /// Element size of the existing registration.
        registered: usize,
        /// Element size of the rejected request.
        requested: usize,
    },
}

/// Result type for registration.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors raised by object operations at runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObjectError {
    /// The type id does not name a registered type.
    #[error("invalid type id {0}")]
    InvalidTypeId(u16),

    /// All slots of the type are in use.
    #[error("type \"{type_name}\" is at capacity ({capacity} objects)")]
    CapacityExhausted {
        /// Type name.
        type_name: String,
        /// Maximum object count of the type.
        capacity: usize,
    },

    /// The handle does not refer to a live object.
    #[error("stale or malformed handle {0}")]
    StaleHandle(ObjectHandle),
}

/// Result type for object operations.
pub type ObjectResult<T> = Result<T, ObjectError>;
