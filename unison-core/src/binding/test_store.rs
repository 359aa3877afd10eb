//! Reducer-backed store used by the unit tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::value::{Action, Value};

use super::store::{Listener, StateContainer, Subscription};

type Reducer = Box<dyn Fn(&Value, &Action) -> Value>;
type Listeners = Rc<RefCell<Vec<(u64, Listener)>>>;

pub(crate) struct TestStore {
    state: RefCell<Value>,
    reducer: Reducer,
    listeners: Listeners,
    next_listener: Cell<u64>,
}

impl TestStore {
    pub(crate) fn new<F>(initial: Value, reducer: F) -> Rc<Self>
    where
        F: Fn(&Value, &Action) -> Value + 'static,
    {
        Rc::new(Self {
            state: RefCell::new(initial),
            reducer: Box::new(reducer),
            listeners: Rc::default(),
            next_listener: Cell::new(0),
        })
    }

    /// `{"count": n}` with `increment` and `touch` actions. `touch` rebuilds
    /// the root without changing any field.
    pub(crate) fn counter() -> Rc<Self> {
        Self::new(Value::object([("count", 0)]), |state, action| {
            let count = state.get("count").and_then(Value::as_f64).unwrap_or_default();
            match action.kind.as_str() {
                "increment" => state.with_field("count", count + 1.0),
                "touch" => state.with_field("count", count),
                _ => state.clone(),
            }
        })
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Clones of the listeners registered right now.
    pub(crate) fn listeners(&self) -> Vec<Listener> {
        self.listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect()
    }

    /// Replace the state without reducing and notify listeners.
    pub(crate) fn replace_state(&self, state: Value) {
        *self.state.borrow_mut() = state;
        self.notify();
    }

    fn notify(&self) {
        for listener in self.listeners() {
            listener();
        }
    }
}

impl StateContainer for TestStore {
    fn subscribe(&self, listener: Listener) -> Subscription {
        let id = self.next_listener.get();
        self.next_listener.set(id + 1);
        self.listeners.borrow_mut().push((id, listener));

        let listeners = self.listeners.clone();
        Subscription::new(move || {
            listeners.borrow_mut().retain(|(other, _)| *other != id);
        })
    }

    fn state(&self) -> Value {
        self.state.borrow().clone()
    }

    fn dispatch(&self, action: &Action) {
        let next = (self.reducer)(&self.state.borrow(), action);
        *self.state.borrow_mut() = next;
        self.notify();
    }
}
