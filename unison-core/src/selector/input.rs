//! Input declarations and their flattening.

use std::fmt;
use std::rc::Rc;

use crate::value::Value;

use super::ComposedSelector;

type ReaderFn = dyn Fn(&Value, &[Value]) -> Value;
type CombinerFn = dyn Fn(&[Value]) -> Value;

/// Reads one input from the current state tree and the call parameters.
#[derive(Clone)]
pub struct StateReader {
    read: Rc<ReaderFn>,
}

impl StateReader {
    pub fn new<F>(read: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Value + 'static,
    {
        Self { read: Rc::new(read) }
    }

    pub fn read(&self, state: &Value, params: &[Value]) -> Value {
        (self.read)(state, params)
    }
}

impl fmt::Debug for StateReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StateReader")
            .field(&Rc::as_ptr(&self.read).cast::<()>())
            .finish()
    }
}

/// Combines the resolved input tuple into the selector's result.
#[derive(Clone)]
pub struct Combiner {
    combine: Rc<CombinerFn>,
}

impl Combiner {
    pub fn new<F>(combine: F) -> Self
    where
        F: Fn(&[Value]) -> Value + 'static,
    {
        Self {
            combine: Rc::new(combine),
        }
    }

    pub fn call(&self, inputs: &[Value]) -> Value {
        (self.combine)(inputs)
    }
}

impl fmt::Debug for Combiner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Combiner")
            .field(&Rc::as_ptr(&self.combine).cast::<()>())
            .finish()
    }
}

/// One element of a selector's declared input list.
#[derive(Debug, Clone)]
pub enum InputSpec {
    /// Passed to the combiner unchanged.
    Literal(Value),

    /// Evaluated against the current state on every invocation.
    StateReader(StateReader),

    /// Invoked with the same parameters, using its own child memory.
    Composed(ComposedSelector),

    /// A nested list, spliced in place of this element.
    Spread(Vec<InputSpec>),
}

impl InputSpec {
    pub fn literal(value: impl Into<Value>) -> Self {
        InputSpec::Literal(value.into())
    }

    pub fn reader<F>(read: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Value + 'static,
    {
        InputSpec::StateReader(StateReader::new(read))
    }

    pub fn spread(specs: impl IntoIterator<Item = InputSpec>) -> Self {
        InputSpec::Spread(specs.into_iter().collect())
    }
}

impl From<Value> for InputSpec {
    fn from(value: Value) -> Self {
        InputSpec::Literal(value)
    }
}

impl From<StateReader> for InputSpec {
    fn from(reader: StateReader) -> Self {
        InputSpec::StateReader(reader)
    }
}

impl From<ComposedSelector> for InputSpec {
    fn from(selector: ComposedSelector) -> Self {
        InputSpec::Composed(selector)
    }
}

impl From<&ComposedSelector> for InputSpec {
    fn from(selector: &ComposedSelector) -> Self {
        InputSpec::Composed(selector.clone())
    }
}

impl From<Vec<InputSpec>> for InputSpec {
    fn from(specs: Vec<InputSpec>) -> Self {
        InputSpec::Spread(specs)
    }
}

/// A flattened input. Spreads never survive flattening.
#[derive(Debug, Clone)]
pub(crate) enum Input {
    Literal(Value),
    Reader(StateReader),
    Composed(ComposedSelector),
}

/// Splice every spread in place, one level at a time.
///
/// After a splice the same index is scanned again, so the spliced elements
/// are handled before anything that followed the spread.
pub(crate) fn flatten(specs: Vec<InputSpec>) -> Vec<Input> {
    let mut pending = specs;
    let mut flat = Vec::with_capacity(pending.len());
    let mut i = 0;

    while i < pending.len() {
        match std::mem::replace(&mut pending[i], InputSpec::Spread(Vec::new())) {
            InputSpec::Spread(nested) => {
                pending.splice(i..=i, nested);
            }
            InputSpec::Literal(value) => {
                flat.push(Input::Literal(value));
                i += 1;
            }
            InputSpec::StateReader(reader) => {
                flat.push(Input::Reader(reader));
                i += 1;
            }
            InputSpec::Composed(selector) => {
                flat.push(Input::Composed(selector));
                i += 1;
            }
        }
    }

    flat
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
