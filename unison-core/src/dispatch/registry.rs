//! Dispatch Registry
//!
//! The registry is the coordinator that connects mounted dispatch targets
//! with the store's own dispatch.
//!
//! # How It Works
//!
//! 1. A render unit mounts and registers its targets. Each registration is
//!    appended, so registration order is fan-out order.
//!
//! 2. The hook layer captures the store dispatch on every activation. It is
//!    held apart from the target list and always runs last.
//!
//! 3. On dispatch, the registry takes a snapshot of the target list and
//!    releases its borrow before calling anything. Targets may therefore
//!    register or unregister while a fan-out is running; the change applies
//!    to the next fan-out.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result, TargetFailure};
use crate::value::Action;

use super::DispatchTarget;

#[derive(Default)]
struct RegistryInner {
    targets: Vec<DispatchTarget>,
    store_dispatch: Option<DispatchTarget>,
}

/// Ordered, shared list of dispatch targets for one store scope.
///
/// Cloning the registry yields another handle to the same list.
#[derive(Clone, Default)]
pub struct DispatchRegistry {
    inner: Rc<RefCell<RegistryInner>>,
}

impl DispatchRegistry {
    /// An empty registry with no store dispatch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a target. Returns the new number of registered targets.
    ///
    /// Registering the same target twice keeps two entries.
    pub fn register(&self, target: DispatchTarget) -> usize {
        let mut inner = self.inner.borrow_mut();
        inner.targets.push(target);
        inner.targets.len()
    }

    /// Remove the first entry that is the same target. Returns the new
    /// number of registered targets, unchanged if the target was absent.
    pub fn unregister(&self, target: &DispatchTarget) -> usize {
        let mut inner = self.inner.borrow_mut();
        if let Some(index) = inner.targets.iter().position(|t| t.same_target(target)) {
            inner.targets.remove(index);
        }
        inner.targets.len()
    }

    /// Number of registered targets. The store dispatch is not counted.
    pub fn len(&self) -> usize {
        self.inner.borrow().targets.len()
    }

    /// Whether no targets are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the store dispatch that runs after every registered target.
    pub fn capture_store_dispatch(&self, target: DispatchTarget) {
        self.inner.borrow_mut().store_dispatch = Some(target);
    }

    /// Whether a store dispatch has been captured.
    pub fn has_store_dispatch(&self) -> bool {
        self.inner.borrow().store_dispatch.is_some()
    }

    /// Deliver `action` to every registered target in order, then to the
    /// store dispatch.
    ///
    /// Every target runs even when an earlier one fails. Failures are
    /// returned together as [`Error::Dispatch`].
    pub fn dispatch_all(&self, action: &Action) -> Result<()> {
        let (targets, store_dispatch) = {
            let inner = self.inner.borrow();
            (inner.targets.clone(), inner.store_dispatch.clone())
        };

        let fan_out = targets.iter().chain(store_dispatch.iter());
        let mut attempted = 0;
        let mut failures = Vec::new();

        for (index, target) in fan_out.enumerate() {
            attempted += 1;
            if let Err(source) = target.call(action) {
                tracing::warn!(index, action = %action.kind, error = %source, "dispatch target failed");
                failures.push(TargetFailure { index, source });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Dispatch {
                attempted,
                failures,
            })
        }
    }

    /// A cloneable fan-out dispatcher bound to this registry.
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher {
            registry: self.clone(),
        }
    }

    /// Whether both handles refer to the same registry.
    pub fn same_registry(&self, other: &DispatchRegistry) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for DispatchRegistry {
    fn eq(&self, other: &Self) -> bool {
        self.same_registry(other)
    }
}

impl fmt::Debug for DispatchRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("DispatchRegistry")
            .field("targets", &inner.targets.len())
            .field("store_dispatch", &inner.store_dispatch.is_some())
            .finish()
    }
}

/// The fan-out dispatch function handed to render units.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: DispatchRegistry,
}

impl Dispatcher {
    /// Send `action` to every registered target, then to the store.
    pub fn dispatch(&self, action: &Action) -> Result<()> {
        self.registry.dispatch_all(action)
    }

    /// The registry this dispatcher fans out through.
    pub fn registry(&self) -> &DispatchRegistry {
        &self.registry
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
