//! # State Database
//!
//! A columnar object store with generational handles.
//!
//! ## Design Philosophy
//!
//! - Capacity is fixed per type at registration; columns never reallocate
//! - Live rows are packed, so systems iterate slices without branching
//! - Object ids are stable; dense slots move on destruction
//! - Handles carry a lifecycle counter so stale references are detected, not followed

mod column;
mod handle;
mod iter;
mod objects;
mod state;
mod store;
mod types;

pub use handle::{ObjectHandle, StateId, TypeId};
pub use state::StateKey;
pub use store::{StateDb, MAX_OBJECT_COUNT};
pub use types::TypeInfo;
