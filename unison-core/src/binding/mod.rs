//! Store Binding
//!
//! Glue between a [`StateContainer`] and a hook-based render layer.
//!
//! # Key Concepts
//!
//! - **Store scope**: a store plus its dispatch registry, made current with
//!   [`StoreScope::enter`] or [`StoreScope::provide`]. Hooks find it through
//!   [`StoreContext::current`].
//!
//! - **Components**: [`Component`] is the minimal host the hooks run in. It
//!   stores hook slots across renders, commits effects after each render,
//!   and runs their teardowns on unmount.
//!
//! - **Hooks**: [`use_dispatch`] wires local dispatch targets into the
//!   fan-out. [`use_mapped_state`] and [`use_selector`] read state, subscribe
//!   to the store once, and request a re-render only when the value they
//!   returned would change.
//!
//! # Notifications
//!
//! Store notifications re-evaluate the latest map or selector right away.
//! A notification that arrives after teardown is ignored, and so is one that
//! arrives while the same hook is in the middle of a render.

pub mod component;
mod context;
mod hooks;
mod store;

#[cfg(test)]
pub(crate) mod test_store;

pub use component::{Component, HookContext, RenderHandle, Teardown};
pub use context::{StoreContext, StoreScope};
pub use hooks::{
    register_dispatch_target, unregister_dispatch_target, use_dispatch, use_mapped_state,
    use_selector, use_store_dispatch,
};
pub use store::{Listener, StateContainer, StoreRef, Subscription};
