//! Dispatch Fan-out
//!
//! Several independently mounted render units may each own a local reducer
//! and still want to react to actions dispatched anywhere in the tree. The
//! registry in this module lets them register a [`DispatchTarget`] and have
//! one action reach all of them, followed by the store's own dispatch.
//!
//! # Ownership
//!
//! A registry belongs to one store scope and is shared by reference with all
//! call sites in that scope. Targets are owned by the code that registers
//! them, which must unregister them before they become invalid. The hook
//! layer does this at teardown.
//!
//! # Failure isolation
//!
//! A failing target never stops the fan-out. Failures are logged as they
//! happen and returned together once every target has run.

mod registry;
mod target;

pub use registry::{DispatchRegistry, Dispatcher};
pub use target::DispatchTarget;

pub use crate::error::TargetFailure;
