//! # Prototype Shared
//!
//! Math types used by every module.
//!
//! ## Rule
//!
//! Every type here is `Pod` with alignment of at most 8 bytes, so it can be
//! stored directly in a state row of the object store.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod math;

pub use math::{Quaternion, Vec3};
