//! Dispatch targets.

use std::fmt;
use std::rc::Rc;

use crate::error::TargetError;
use crate::value::Action;

type TargetFn = dyn Fn(&Action) -> Result<(), TargetError>;

/// A callable that receives dispatched actions.
///
/// Identity is the identity of the shared callable: clones of a target are
/// the same target, while two targets built from equal closures are not.
#[derive(Clone)]
pub struct DispatchTarget {
    callback: Rc<TargetFn>,
}

impl DispatchTarget {
    /// Wrap an infallible callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Action) + 'static,
    {
        Self::fallible(move |action| {
            callback(action);
            Ok(())
        })
    }

    /// Wrap a callback that can reject an action.
    pub fn fallible<F>(callback: F) -> Self
    where
        F: Fn(&Action) -> Result<(), TargetError> + 'static,
    {
        Self {
            callback: Rc::new(callback),
        }
    }

    /// Deliver an action to this target.
    pub fn call(&self, action: &Action) -> Result<(), TargetError> {
        (self.callback)(action)
    }

    /// Whether both handles refer to the same target.
    pub fn same_target(&self, other: &DispatchTarget) -> bool {
        Rc::ptr_eq(&self.callback, &other.callback)
    }
}

impl PartialEq for DispatchTarget {
    fn eq(&self, other: &Self) -> bool {
        self.same_target(other)
    }
}

impl Eq for DispatchTarget {}

impl fmt::Debug for DispatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DispatchTarget")
            .field(&Rc::as_ptr(&self.callback).cast::<()>())
            .finish()
    }
}
