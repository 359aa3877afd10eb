//! The store interface consumed by the hooks.

use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use crate::dispatch::DispatchTarget;
use crate::selector::StateSource;
use crate::value::{Action, Value};

/// Change notification callback.
pub type Listener = Rc<dyn Fn()>;

/// A unidirectional state container.
///
/// Implementations hold the state tree, replace it on every dispatch, and
/// notify listeners afterwards.
pub trait StateContainer {
    /// Register a change listener. Dropping the returned subscription
    /// unregisters it.
    fn subscribe(&self, listener: Listener) -> Subscription;

    /// The current state tree.
    fn state(&self) -> Value;

    /// Reduce an action into a new state tree.
    fn dispatch(&self, action: &Action);
}

/// Handle to a registered listener.
///
/// The listener is removed on [`Subscription::unsubscribe`] or on drop,
/// whichever comes first.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new<F>(unsubscribe: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// A subscription with nothing to remove.
    pub fn empty() -> Self {
        Self { unsubscribe: None }
    }

    pub fn unsubscribe(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

/// Shared reference to a store. Equality is identity.
#[derive(Clone)]
pub struct StoreRef {
    store: Rc<dyn StateContainer>,
}

impl StoreRef {
    pub fn new<S>(store: Rc<S>) -> Self
    where
        S: StateContainer + 'static,
    {
        Self { store }
    }

    pub fn same_store(&self, other: &StoreRef) -> bool {
        Rc::ptr_eq(&self.store, &other.store)
    }

    /// A dispatch target that forwards to this store.
    pub fn dispatch_target(&self) -> DispatchTarget {
        let store = self.store.clone();
        DispatchTarget::new(move |action| store.dispatch(action))
    }
}

impl<S> From<Rc<S>> for StoreRef
where
    S: StateContainer + 'static,
{
    fn from(store: Rc<S>) -> Self {
        Self::new(store)
    }
}

impl Deref for StoreRef {
    type Target = dyn StateContainer;

    fn deref(&self) -> &Self::Target {
        self.store.as_ref()
    }
}

impl PartialEq for StoreRef {
    fn eq(&self, other: &Self) -> bool {
        self.same_store(other)
    }
}

impl StateSource for StoreRef {
    fn current_state(&self) -> Value {
        self.store.state()
    }
}

impl fmt::Debug for StoreRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StoreRef")
            .field(&Rc::as_ptr(&self.store).cast::<()>())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
