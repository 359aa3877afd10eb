//! Unison Core
//!
//! This crate binds a unidirectional state store to a hook-based render layer.
//! It implements:
//!
//! - Dispatch fan-out (one action reaches every mounted dispatch target and
//!   the store's own dispatch)
//! - Memoized selector composition with configurable equality
//!   (reference, shallow-N, deep)
//! - Store subscription hooks that decide *when* a render unit must re-render
//!
//! The store and the render framework are external collaborators. The crate
//! only consumes them through the [`binding::StateContainer`] trait and the
//! small set of hook primitives in [`binding::component`].
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `value`: the state tree value model and actions
//! - `equality`: reference / shallow / deep comparison
//! - `dispatch`: dispatch targets and the fan-out registry
//! - `selector`: composed selectors and per-call-site memory
//! - `binding`: store context, host primitives, and hooks
//!
//! # Example
//!
//! ```rust,ignore
//! use unison_core::selector::ComposedSelector;
//! use unison_core::value::Value;
//!
//! let subtotal = ComposedSelector::builder()
//!     .reader(|state, _| state.get("items").cloned().unwrap_or_default())
//!     .combine(|inputs| {
//!         let items = inputs[0].as_array().unwrap_or_default();
//!         Value::from(items.iter().filter_map(Value::as_f64).sum::<f64>())
//!     });
//!
//! let mut site = subtotal.instance();
//! let total = site.select(&state, &[]);
//! // A second read with the same state reuses the memoized result.
//! let again = site.select(&state, &[]);
//! ```

pub mod binding;
pub mod dispatch;
pub mod equality;
pub mod selector;
pub mod value;

mod error;

pub use error::{Error, Result, TargetError, TargetFailure};
pub use equality::EqualityPolicy;
pub use selector::{ComposedSelector, EqualityConfig, SelectorOptions};
pub use value::{Action, Value};
