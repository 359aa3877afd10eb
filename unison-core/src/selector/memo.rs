//! Result Memoization
//!
//! The last step of an invocation decides whether the combiner runs at all.
//!
//! # How It Works
//!
//! 1. The first feed always computes and caches the result together with
//!    the input tuple that produced it.
//!
//! 2. A later feed is compared element by element against the cached tuple
//!    using identity only. Equality policies have already run by this point
//!    and substituted previous values wherever they considered two values
//!    equal, so identity is the right key here.
//!
//! 3. If any element's identity changed, the combiner runs and the cache is
//!    replaced. Otherwise the cached result is returned as is, keeping its
//!    identity.

use crate::value::Value;

use super::tracker::InputTuple;

/// Lifecycle of one call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemoState {
    /// Never invoked, or reset.
    #[default]
    Uninitialized,

    /// Holds a result and the tuple that produced it.
    Memoized,
}

/// The cached result of one call site, keyed by its last input tuple.
#[derive(Debug, Clone, Default)]
pub(crate) struct ResultMemo {
    cached: Option<(InputTuple, Value)>,
}

impl ResultMemo {
    /// Return the cached result if `inputs` matches the last feed by
    /// identity, otherwise compute and cache a new one. The flag is `true`
    /// when `compute` ran.
    pub(crate) fn get_or_compute<F>(&mut self, inputs: &InputTuple, compute: F) -> (Value, bool)
    where
        F: FnOnce(&[Value]) -> Value,
    {
        if let Some((fed, value)) = &self.cached {
            let unchanged = fed.len() == inputs.len()
                && fed.iter().zip(inputs.iter()).all(|(a, b)| a.same_identity(b));
            if unchanged {
                return (value.clone(), false);
            }
        }

        let value = compute(inputs);
        self.cached = Some((inputs.clone(), value.clone()));
        (value, true)
    }

    pub(crate) fn value(&self) -> Option<&Value> {
        self.cached.as_ref().map(|(_, value)| value)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
