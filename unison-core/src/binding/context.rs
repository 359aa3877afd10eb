//! Store Context
//!
//! The store context tells hooks which store and dispatch registry they
//! belong to.
//!
//! # Implementation
//!
//! A thread-local stack holds the active scopes. Entering a scope pushes it
//! and returns a guard; dropping the guard pops it again. The innermost
//! scope wins, so nested providers shadow outer ones the way nested context
//! providers do in a render tree.

use std::cell::RefCell;

use crate::dispatch::DispatchRegistry;
use crate::error::{Error, Result};

use super::store::StoreRef;

thread_local! {
    static SCOPE_STACK: RefCell<Vec<StoreScope>> = const { RefCell::new(Vec::new()) };
}

/// A store together with the dispatch registry shared by its call sites.
#[derive(Debug, Clone)]
pub struct StoreScope {
    store: StoreRef,
    registry: DispatchRegistry,
}

impl StoreScope {
    /// A scope with a fresh, empty registry.
    pub fn new(store: impl Into<StoreRef>) -> Self {
        Self::with_registry(store, DispatchRegistry::new())
    }

    /// A scope that shares an existing registry.
    pub fn with_registry(store: impl Into<StoreRef>, registry: DispatchRegistry) -> Self {
        Self {
            store: store.into(),
            registry,
        }
    }

    pub fn store(&self) -> &StoreRef {
        &self.store
    }

    pub fn registry(&self) -> &DispatchRegistry {
        &self.registry
    }

    /// Make this scope current until the guard is dropped.
    pub fn enter(&self) -> StoreContext {
        let depth = SCOPE_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            stack.push(self.clone());
            stack.len()
        });
        StoreContext { depth }
    }

    /// Run `f` with this scope current.
    pub fn provide<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.enter();
        f()
    }
}

/// Guard that pops its scope when dropped.
#[must_use = "the scope is exited as soon as the guard is dropped"]
#[derive(Debug)]
pub struct StoreContext {
    depth: usize,
}

impl StoreContext {
    /// The innermost active scope.
    pub fn current() -> Result<StoreScope> {
        SCOPE_STACK
            .with(|stack| stack.borrow().last().cloned())
            .ok_or(Error::MissingStore)
    }

    pub fn is_active() -> bool {
        SCOPE_STACK.with(|stack| !stack.borrow().is_empty())
    }

    /// Number of nested active scopes.
    pub fn depth() -> usize {
        SCOPE_STACK.with(|stack| stack.borrow().len())
    }
}

impl Drop for StoreContext {
    fn drop(&mut self) {
        SCOPE_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            debug_assert_eq!(
                stack.len(),
                self.depth,
                "StoreContext guards dropped out of order"
            );
            stack.pop();
        });
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
