//! Selector Composition
//!
//! A selector turns the state tree into a derived value and skips the work
//! whenever its declared dependencies did not change.
//!
//! # Key Concepts
//!
//! - **Inputs**: literals, state readers, other selectors, or nested lists of
//!   these. Nested lists are flattened once when the selector is built.
//!
//! - **Call sites**: a selector definition holds no memory. Each place it is
//!   invoked from owns a cell in a [`DependencyTracker`], so the same
//!   selector can be used in many places without them trampling each other.
//!
//! - **Equality**: two decision points take an [`EqualityPolicy`]. The
//!   force-update policy of a reader decides whether a fresh reading counts
//!   as new. The recalculate policy decides whether the whole input tuple
//!   counts as new. Both default to reference equality.
//!
//! # Example
//!
//! ```
//! use unison_core::selector::ComposedSelector;
//! use unison_core::Value;
//!
//! let item_count = ComposedSelector::builder()
//!     .reader(|state, _| state.get("items").cloned().unwrap_or_default())
//!     .combine(|inputs| Value::from(inputs[0].len()));
//!
//! let mut site = item_count.instance();
//! let state = Value::object([("items", Value::array([1, 2, 3]))]);
//! assert_eq!(site.select(&state, &[]).as_f64(), Some(3.0));
//! ```
//!
//! [`EqualityPolicy`]: crate::EqualityPolicy

mod composed;
mod input;
mod memo;
mod options;
mod tracker;

pub use composed::{ComposedSelector, SelectorBuilder, SelectorId, SelectorInstance, StateSource};
pub use input::{Combiner, InputSpec, StateReader};
pub use memo::MemoState;
pub use options::{EqualityConfig, SelectorOptions};
pub use tracker::{DependencyTracker, SiteHandle};

/// Build a selector from an input list, a combiner and options.
///
/// Equivalent to [`ComposedSelector::new`].
pub fn create_composed_selector(
    inputs: Vec<InputSpec>,
    combiner: Combiner,
    options: SelectorOptions,
) -> ComposedSelector {
    ComposedSelector::new(inputs, combiner, options)
}
