//! Equality Engine
//!
//! Pure comparison functions used to decide whether a derived value "really"
//! changed.
//!
//! # Policies
//!
//! ## Reference
//!
//! Identity only. Two containers are equal when they share an allocation;
//! primitives compare by value. This is the default everywhere, so any
//! identity change counts as a change.
//!
//! ## Shallow(depth)
//!
//! Containers are opened up to `depth` levels below the compared values.
//! Once the depth budget is spent, children fall back to identity. `"shallow"`
//! in configuration means `Shallow(1)`: arrays and objects are compared
//! elementwise by identity.
//!
//! ## Deep
//!
//! The same recursion with no depth limit.
//!
//! # Implementation Notes
//!
//! Every comparison short-circuits on identity before any structural work.
//! State snapshots are trees, so there is no cycle detection.

mod compare;
mod policy;

pub use compare::{equal, equal_tuples, equal_with, CompareOptions};
pub use policy::EqualityPolicy;

pub use crate::selector::EqualityConfig;
