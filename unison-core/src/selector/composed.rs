//! Composed Selectors
//!
//! A composed selector derives one value from a list of inputs and a
//! combiner. It is an immutable definition; all memory lives in the
//! [`DependencyTracker`] site it is invoked through.
//!
//! # How an Invocation Works
//!
//! 1. Each flattened input is resolved in order. Literals pass through.
//!    Nested selectors run against their own child site. State readers run
//!    on every invocation, and a reading equal to the previous one under the
//!    input's force-update policy is replaced by the previous reading.
//!
//! 2. A selector without inputs derives straight from the state tree: its
//!    tuple is the state itself.
//!
//! 3. The tuple is compared with the previous tuple under the recalculate
//!    policy. If they are equal the previous tuple is used instead.
//!
//! 4. The combiner runs only if some element of the tuple changed identity.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::smallvec;

use crate::equality::EqualityPolicy;
use crate::value::Value;

use super::input::{flatten, Combiner, Input, InputSpec};
use super::memo::MemoState;
use super::options::SelectorOptions;
use super::tracker::{DependencyTracker, InputTuple, SiteHandle};

/// Unique identifier of a selector definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectorId(u64);

impl SelectorId {
    /// Generate a new unique selector ID.
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Anything that can hand out the current state tree.
pub trait StateSource {
    fn current_state(&self) -> Value;
}

impl StateSource for Value {
    fn current_state(&self) -> Value {
        self.clone()
    }
}

struct SelectorDef {
    id: SelectorId,
    inputs: Vec<Input>,
    combiner: Combiner,
    options: SelectorOptions,
}

/// Handle to an immutable selector definition. Clones share the definition.
#[derive(Clone)]
pub struct ComposedSelector {
    def: Rc<SelectorDef>,
}

impl ComposedSelector {
    /// Build a selector. Spread inputs are flattened here, once.
    pub fn new(inputs: Vec<InputSpec>, combiner: Combiner, options: SelectorOptions) -> Self {
        Self {
            def: Rc::new(SelectorDef {
                id: SelectorId::next(),
                inputs: flatten(inputs),
                combiner,
                options,
            }),
        }
    }

    /// Start a selector definition with no inputs.
    pub fn builder() -> SelectorBuilder {
        SelectorBuilder::default()
    }

    /// Identity shared by every clone of this selector.
    pub fn id(&self) -> SelectorId {
        self.def.id
    }

    /// Number of inputs after flattening.
    pub fn input_count(&self) -> usize {
        self.def.inputs.len()
    }

    /// Equality options the selector was built with.
    pub fn options(&self) -> &SelectorOptions {
        &self.def.options
    }

    /// Whether both handles refer to the same definition.
    pub fn same_selector(&self, other: &ComposedSelector) -> bool {
        Rc::ptr_eq(&self.def, &other.def)
    }

    /// Invoke the selector through `site` against the state of `source`.
    pub fn select(
        &self,
        tracker: &mut DependencyTracker,
        site: SiteHandle,
        source: &dyn StateSource,
        params: &[Value],
    ) -> Value {
        let state = source.current_state();
        self.evaluate(tracker, site, &state, params)
    }

    /// A selector bundled with its own tracker and root site.
    pub fn instance(&self) -> SelectorInstance {
        SelectorInstance::new(self.clone())
    }

    fn evaluate(
        &self,
        tracker: &mut DependencyTracker,
        site: SiteHandle,
        state: &Value,
        params: &[Value],
    ) -> Value {
        let def = &*self.def;
        let equality = &def.options.equality;
        tracker.claim(site, def.id);

        let tuple: InputTuple = if def.inputs.is_empty() {
            smallvec![state.clone()]
        } else {
            let mut values = InputTuple::with_capacity(def.inputs.len());
            for (position, input) in def.inputs.iter().enumerate() {
                let value = match input {
                    Input::Literal(value) => value.clone(),
                    Input::Composed(nested) => {
                        let child = tracker.child(site, position);
                        nested.evaluate(tracker, child, state, params)
                    }
                    Input::Reader(reader) => {
                        let fresh = reader.read(state, params);
                        tracker.site_mut(site).settle_reader(
                            position,
                            fresh,
                            equality.force_update_at(position),
                        )
                    }
                };
                values.push(value);
            }
            values
        };

        let memory = tracker.site_mut(site);
        let tuple = memory.settle_inputs(tuple, equality.recalculate);
        let (value, computed) = memory
            .result
            .get_or_compute(&tuple, |inputs| def.combiner.call(inputs));

        if computed {
            memory.mark_computed();
            tracing::debug!(selector = def.id.raw(), site = site.raw(), "selector recomputed");
        } else {
            tracing::trace!(selector = def.id.raw(), site = site.raw(), "selector result reused");
        }

        value
    }
}

impl fmt::Debug for ComposedSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposedSelector")
            .field("id", &self.def.id)
            .field("inputs", &self.def.inputs.len())
            .field("options", &self.def.options)
            .finish()
    }
}

/// Builder for [`ComposedSelector`].
#[derive(Default)]
pub struct SelectorBuilder {
    inputs: Vec<InputSpec>,
    options: SelectorOptions,
}

impl SelectorBuilder {
    /// Append an input of any kind.
    pub fn input(mut self, spec: impl Into<InputSpec>) -> Self {
        self.inputs.push(spec.into());
        self
    }

    /// Append a state reader, called with the state and the call parameters.
    pub fn reader<F>(self, read: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Value + 'static,
    {
        self.input(InputSpec::reader(read))
    }

    /// Append a constant input.
    pub fn literal(self, value: impl Into<Value>) -> Self {
        self.input(InputSpec::literal(value))
    }

    /// Append a nested selector as an input.
    pub fn selector(self, selector: &ComposedSelector) -> Self {
        self.input(selector)
    }

    /// Append a group of inputs that is spliced in place.
    pub fn spread(self, specs: impl IntoIterator<Item = InputSpec>) -> Self {
        self.input(InputSpec::spread(specs))
    }

    /// Replace the equality options.
    pub fn options(mut self, options: SelectorOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the recalculate policy.
    pub fn equality(mut self, policy: EqualityPolicy) -> Self {
        self.options.equality.recalculate = policy;
        self
    }

    /// Set the force-update policy for the reader at flattened `position`.
    pub fn force_update(mut self, position: usize, policy: EqualityPolicy) -> Self {
        let policies = &mut self.options.equality.force_update;
        if policies.len() <= position {
            policies.resize(position + 1, EqualityPolicy::Reference);
        }
        policies[position] = policy;
        self
    }

    /// Finish the definition with the combiner that receives the input tuple.
    pub fn combine<F>(self, combine: F) -> ComposedSelector
    where
        F: Fn(&[Value]) -> Value + 'static,
    {
        ComposedSelector::new(self.inputs, Combiner::new(combine), self.options)
    }
}

/// A selector together with the memory of a single call site.
#[derive(Debug)]
pub struct SelectorInstance {
    selector: ComposedSelector,
    tracker: DependencyTracker,
    site: SiteHandle,
}

impl SelectorInstance {
    /// A selector bound to its own tracker and root call site.
    pub fn new(selector: ComposedSelector) -> Self {
        let mut tracker = DependencyTracker::new();
        let site = tracker.allocate();
        Self {
            selector,
            tracker,
            site,
        }
    }

    /// Invoke the selector at this instance's call site.
    pub fn select(&mut self, source: &dyn StateSource, params: &[Value]) -> Value {
        self.selector
            .select(&mut self.tracker, self.site, source, params)
    }

    pub fn selector(&self) -> &ComposedSelector {
        &self.selector
    }

    pub fn site(&self) -> SiteHandle {
        self.site
    }

    pub fn state(&self) -> MemoState {
        self.tracker.state(self.site)
    }

    /// How many times the root combiner ran.
    pub fn recomputations(&self) -> u64 {
        self.tracker.recomputations(self.site)
    }

    pub fn tracker(&self) -> &DependencyTracker {
        &self.tracker
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    fn approx(value: &Value, expected: f64) -> bool {
        value.as_f64().is_some_and(|v| (v - expected).abs() < 1e-9)
    }

    fn shop_state(tax_percent: i32) -> Value {
        Value::from(json!({
            "shop": {
                "taxPercent": tax_percent,
                "items": [
                    { "name": "apple", "value": 1.20 },
                    { "name": "orange", "value": 0.95 }
                ]
            }
        }))
    }

    fn counter() -> Rc<Cell<u32>> {
        Rc::new(Cell::new(0))
    }

    fn subtotal_selector(runs: &Rc<Cell<u32>>) -> ComposedSelector {
        let runs = runs.clone();
        ComposedSelector::builder()
            .reader(|state, _| state.pointer(["shop", "items"]).cloned().unwrap_or_default())
            .combine(move |inputs| {
                runs.set(runs.get() + 1);
                let items = inputs[0].as_array().unwrap_or_default();
                Value::from(
                    items
                        .iter()
                        .filter_map(|item| item.get("value").and_then(Value::as_f64))
                        .sum::<f64>(),
                )
            })
    }

    #[test]
    fn subtotal_runs_once_for_unchanged_state() {
        let runs = counter();
        let mut subtotal = subtotal_selector(&runs).instance();
        let state = shop_state(8);

        for _ in 0..3 {
            assert!(approx(&subtotal.select(&state, &[]), 2.15));
        }
        assert_eq!(runs.get(), 1);
        assert_eq!(subtotal.recomputations(), 1);
        assert_eq!(subtotal.state(), MemoState::Memoized);
    }

    #[test]
    fn shallow_recalculate_suppresses_fresh_arrays() {
        let build = |policy: EqualityPolicy, runs: &Rc<Cell<u32>>| {
            let runs = runs.clone();
            ComposedSelector::builder()
                .reader(|_, _| Value::array([1, 2, 3]))
                .equality(policy)
                .combine(move |inputs| {
                    runs.set(runs.get() + 1);
                    Value::from(inputs[0].len())
                })
        };
        let state = Value::Null;

        let shallow_runs = counter();
        let mut shallow = build(EqualityPolicy::parse("shallow"), &shallow_runs).instance();
        let first = shallow.select(&state, &[]);
        let second = shallow.select(&state, &[]);
        assert_eq!(shallow_runs.get(), 1);
        assert!(first.same_identity(&second));

        let reference_runs = counter();
        let mut reference = build(EqualityPolicy::Reference, &reference_runs).instance();
        reference.select(&state, &[]);
        reference.select(&state, &[]);
        assert_eq!(reference_runs.get(), 2);
    }

    #[test]
    fn changing_tax_percent_skips_subtotal() {
        let subtotal_runs = counter();
        let tax_runs = counter();
        let total_runs = counter();

        let subtotal = subtotal_selector(&subtotal_runs);

        let tax = {
            let runs = tax_runs.clone();
            ComposedSelector::builder()
                .selector(&subtotal)
                .reader(|state, _| {
                    state
                        .pointer(["shop", "taxPercent"])
                        .cloned()
                        .unwrap_or_default()
                })
                .combine(move |inputs| {
                    runs.set(runs.get() + 1);
                    let subtotal = inputs[0].as_f64().unwrap_or_default();
                    let percent = inputs[1].as_f64().unwrap_or_default();
                    Value::from(subtotal * (percent / 100.0))
                })
        };

        let total = {
            let runs = total_runs.clone();
            ComposedSelector::builder()
                .selector(&subtotal)
                .selector(&tax)
                .combine(move |inputs| {
                    runs.set(runs.get() + 1);
                    let sum = inputs[0].as_f64().unwrap_or_default()
                        + inputs[1].as_f64().unwrap_or_default();
                    Value::object([("total", sum)])
                })
        };

        let mut instance = total.instance();
        let state = shop_state(8);
        let result = instance.select(&state, &[]);
        assert!(approx(result.get("total").unwrap(), 2.322));
        assert_eq!((subtotal_runs.get(), tax_runs.get(), total_runs.get()), (2, 1, 1));

        let shop = state.get("shop").cloned().unwrap_or_default();
        let next = state.with_field("shop", shop.with_field("taxPercent", 10));
        let result = instance.select(&next, &[]);
        assert!(approx(result.get("total").unwrap(), 2.365));
        assert_eq!((subtotal_runs.get(), tax_runs.get(), total_runs.get()), (2, 2, 2));
    }

    #[test]
    fn literals_and_params_reach_the_combiner() {
        let selector = ComposedSelector::builder()
            .literal(10)
            .reader(|_, params| params.first().cloned().unwrap_or_default())
            .combine(|inputs| {
                Value::from(
                    inputs[0].as_f64().unwrap_or_default() * inputs[1].as_f64().unwrap_or_default(),
                )
            });

        let mut instance = selector.instance();
        assert!(approx(&instance.select(&Value::Null, &[Value::from(3)]), 30.0));
        assert!(approx(&instance.select(&Value::Null, &[Value::from(4)]), 40.0));
        assert_eq!(instance.recomputations(), 2);
    }

    #[test]
    fn zero_inputs_derive_from_state_identity() {
        let runs = counter();
        let selector = {
            let runs = runs.clone();
            ComposedSelector::builder().combine(move |inputs| {
                runs.set(runs.get() + 1);
                Value::from(inputs[0].len())
            })
        };
        let mut instance = selector.instance();

        let state = Value::array([1, 2]);
        assert!(approx(&instance.select(&state, &[]), 2.0));
        instance.select(&state, &[]);
        assert_eq!(runs.get(), 1);

        instance.select(&Value::array([1, 2]), &[]);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn zero_inputs_follow_the_recalculate_policy() {
        let runs = counter();
        let selector = {
            let runs = runs.clone();
            ComposedSelector::builder()
                .equality(EqualityPolicy::Deep)
                .combine(move |_| {
                    runs.set(runs.get() + 1);
                    Value::Null
                })
        };
        let mut instance = selector.instance();

        instance.select(&shop_state(8), &[]);
        instance.select(&shop_state(8), &[]);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn force_update_keeps_reader_identity() {
        let runs = counter();
        let selector = {
            let runs = runs.clone();
            ComposedSelector::builder()
                .literal("label")
                .reader(|_, _| Value::array(["a", "b"]))
                .force_update(1, EqualityPolicy::SHALLOW)
                .combine(move |inputs| {
                    runs.set(runs.get() + 1);
                    inputs[1].clone()
                })
        };
        let mut instance = selector.instance();

        let first = instance.select(&Value::Null, &[]);
        let second = instance.select(&Value::Null, &[]);
        assert!(first.same_identity(&second));
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn spread_inputs_are_positional() {
        let selector = ComposedSelector::new(
            vec![
                InputSpec::literal(1),
                InputSpec::spread([InputSpec::literal(2), InputSpec::literal(3)]),
            ],
            Combiner::new(|inputs| Value::from(inputs.len())),
            SelectorOptions::default(),
        );

        assert_eq!(selector.input_count(), 3);
        assert!(approx(&selector.instance().select(&Value::Null, &[]), 3.0));
    }

    #[test]
    fn call_sites_do_not_share_memory() {
        let runs = counter();
        let subtotal = subtotal_selector(&runs);
        let state = shop_state(8);

        let mut tracker = DependencyTracker::new();
        let a = tracker.allocate();
        let b = tracker.allocate();

        subtotal.select(&mut tracker, a, &state, &[]);
        subtotal.select(&mut tracker, b, &state, &[]);
        subtotal.select(&mut tracker, a, &state, &[]);

        assert_eq!(runs.get(), 2);
        assert_eq!(tracker.recomputations(a), 1);
        assert_eq!(tracker.recomputations(b), 1);
        assert!(tracker.last_result(a).is_some());
    }

    #[test]
    fn nested_selector_used_twice_gets_two_child_sites() {
        let runs = counter();
        let subtotal = subtotal_selector(&runs);
        let pair = ComposedSelector::builder()
            .selector(&subtotal)
            .selector(&subtotal)
            .combine(|inputs| Value::array(inputs.iter().cloned()));

        let mut instance = pair.instance();
        let state = shop_state(8);
        instance.select(&state, &[]);
        instance.select(&state, &[]);

        assert_eq!(runs.get(), 2);
        assert_eq!(instance.tracker().len(), 3);
    }

    #[test]
    fn reusing_a_site_for_another_selector_starts_fresh() {
        let runs = counter();
        let subtotal = subtotal_selector(&runs);
        let other = subtotal_selector(&runs);
        let state = shop_state(8);

        let mut tracker = DependencyTracker::new();
        let site = tracker.allocate();
        subtotal.select(&mut tracker, site, &state, &[]);
        other.select(&mut tracker, site, &state, &[]);

        assert_eq!(runs.get(), 2);
        assert_eq!(tracker.recomputations(site), 1);
        assert!(!subtotal.same_selector(&other));
    }
}
