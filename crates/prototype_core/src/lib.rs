//! # PROTOTYPE Core
//!
//! The shared object store every module of the prototype attaches its data to.
//!
//! - Modules register named object **types** with a fixed capacity
//! - Each type owns one or more fixed-stride **states** (columns)
//! - Objects are created and destroyed in O(1); states stay tightly packed
//! - Modules exchange **handles**, which survive compaction and go stale on destruction
//!
//! ## Architecture Rules
//!
//! 1. **Register once** - types before states, both before any object exists
//! 2. **Handles, not references** - views into state columns borrow the store and
//!    cannot outlive a create/destroy call
//! 3. **Packed iteration** - live rows of every state are contiguous in `[1..=count]`
//!
//! ## Example
//!
//! ```rust
//! use bytemuck::{Pod, Zeroable};
//! use prototype_core::StateDb;
//!
//! #[derive(Clone, Copy, Default, Pod, Zeroable)]
//! #[repr(C)]
//! struct Pos {
//!     x: f32,
//!     y: f32,
//! }
//!
//! let mut db = StateDb::new();
//! let body = db.register_type("Body", 3);
//! let pos = db.register_state::<Pos>(body, "Pos");
//!
//! let handle = db.create_object(body).expect("capacity available");
//! if let Some(p) = db.state_mut(pos, handle) {
//!     p.x = 1.0;
//! }
//! assert_eq!(db.full_state(pos).len(), 1);
//! ```

#![deny(unsafe_code)]

pub mod db;
pub mod error;

pub use db::{ObjectHandle, StateDb, StateId, StateKey, TypeId, TypeInfo};
pub use error::{ObjectError, ObjectResult, RegistryError, RegistryResult};
