//! Host Primitives
//!
//! A minimal mounted render unit that provides what the hooks need from a
//! render framework: slot storage that survives across renders, memoization
//! keyed by a dependency value, effects with teardown, and a way to request
//! another render.
//!
//! # How It Works
//!
//! 1. [`Component::render`] hands the render closure a [`HookContext`].
//!    Every hook call takes the next slot, so hooks must be called in the
//!    same order on every render.
//!
//! 2. Effects whose dependencies changed are queued during the render and
//!    committed right after it. Committing first runs the previous teardown
//!    of that slot, then the effect, and keeps the new teardown.
//!
//! 3. [`Component::unmount`] runs every remaining teardown in slot order.
//!    Dropping a mounted component unmounts it.
//!
//! 4. A [`RenderHandle`] can outlive the component. Requests made after
//!    unmount are ignored.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Cleanup returned by an effect.
pub type Teardown = Box<dyn FnOnce()>;

type Effect = Box<dyn FnOnce() -> Option<Teardown>>;

#[derive(Default)]
struct ComponentInner {
    slots: RefCell<Vec<Rc<dyn Any>>>,
    pending_effects: RefCell<Vec<(usize, Effect)>>,
    teardowns: RefCell<BTreeMap<usize, Teardown>>,
    unmounted: Cell<bool>,
    render_requested: Cell<bool>,
    render_count: Cell<u64>,
    scheduler: Option<Rc<dyn Fn()>>,
}

/// A mounted render unit.
pub struct Component {
    inner: Rc<ComponentInner>,
}

impl Component {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ComponentInner::default()),
        }
    }

    /// A component that calls `schedule` whenever a render is requested.
    pub fn with_scheduler<F>(schedule: F) -> Self
    where
        F: Fn() + 'static,
    {
        Self {
            inner: Rc::new(ComponentInner {
                scheduler: Some(Rc::new(schedule)),
                ..ComponentInner::default()
            }),
        }
    }

    /// Run one render pass, then commit its effects.
    ///
    /// Rendering an unmounted component still runs `f`, but its effects are
    /// dropped.
    pub fn render<R>(&self, f: impl FnOnce(&mut HookContext<'_>) -> R) -> R {
        let inner = &self.inner;
        inner.render_requested.set(false);
        inner.render_count.set(inner.render_count.get() + 1);

        let mut cx = HookContext {
            component: self,
            cursor: 0,
        };
        let output = f(&mut cx);

        self.commit_effects();
        output
    }

    fn commit_effects(&self) {
        let pending = std::mem::take(&mut *self.inner.pending_effects.borrow_mut());
        if self.inner.unmounted.get() {
            return;
        }

        for (slot, effect) in pending {
            let previous = self.inner.teardowns.borrow_mut().remove(&slot);
            if let Some(teardown) = previous {
                teardown();
            }
            if let Some(teardown) = effect() {
                self.inner.teardowns.borrow_mut().insert(slot, teardown);
            }
        }
    }

    /// Run every teardown in slot order. Later calls do nothing.
    pub fn unmount(&self) {
        if self.inner.unmounted.replace(true) {
            return;
        }
        self.inner.pending_effects.borrow_mut().clear();

        let teardowns = std::mem::take(&mut *self.inner.teardowns.borrow_mut());
        for teardown in teardowns.into_values() {
            teardown();
        }
        tracing::trace!("component unmounted");
    }

    pub fn is_mounted(&self) -> bool {
        !self.inner.unmounted.get()
    }

    /// Whether a render was requested since the last render pass.
    pub fn needs_render(&self) -> bool {
        self.is_mounted() && self.inner.render_requested.get()
    }

    pub fn render_count(&self) -> u64 {
        self.inner.render_count.get()
    }

    pub fn render_handle(&self) -> RenderHandle {
        RenderHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

impl Default for Component {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Component {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("slots", &self.inner.slots.borrow().len())
            .field("mounted", &self.is_mounted())
            .field("render_count", &self.render_count())
            .finish()
    }
}

/// Requests re-renders of a component without keeping it alive.
#[derive(Clone, Debug)]
pub struct RenderHandle {
    inner: Weak<ComponentInner>,
}

impl RenderHandle {
    /// Ask for another render. Returns `false` if the component is gone or
    /// unmounted.
    pub fn request_render(&self) -> bool {
        let Some(inner) = self.inner.upgrade() else {
            tracing::trace!("render requested for a dropped component; ignoring");
            return false;
        };
        if inner.unmounted.get() {
            tracing::trace!("render requested after unmount; ignoring");
            return false;
        }

        inner.render_requested.set(true);
        if let Some(schedule) = &inner.scheduler {
            schedule();
        }
        true
    }
}

/// Per-render access to a component's hook slots.
pub struct HookContext<'a> {
    component: &'a Component,
    cursor: usize,
}

impl HookContext<'_> {
    /// The value in the next slot, created by `init` on first use.
    ///
    /// If the slot holds a value of another type, hooks were called in a
    /// different order than on the previous render. The slot is replaced.
    pub fn use_hook<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Rc<T> {
        let index = self.cursor;
        self.cursor += 1;

        let existing = self.component.inner.slots.borrow().get(index).cloned();
        if let Some(slot) = existing {
            match slot.downcast::<T>() {
                Ok(value) => return value,
                Err(_) => tracing::warn!(slot = index, "hook slot type changed; replacing"),
            }
        }

        let value = Rc::new(init());
        let mut slots = self.component.inner.slots.borrow_mut();
        if index < slots.len() {
            slots[index] = value.clone();
        } else {
            slots.push(value.clone());
        }
        value
    }

    /// A mutable cell that survives across renders.
    pub fn use_ref<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Rc<RefCell<T>> {
        self.use_hook(|| RefCell::new(init()))
    }

    /// `compute(&deps)`, recomputed only when `deps` changes.
    pub fn use_memo<D, T>(&mut self, deps: D, compute: impl FnOnce(&D) -> T) -> T
    where
        D: PartialEq + 'static,
        T: Clone + 'static,
    {
        let slot = self.use_ref(|| None::<(D, T)>);
        let mut cached = slot.borrow_mut();
        if let Some((previous, value)) = cached.as_ref() {
            if *previous == deps {
                return value.clone();
            }
        }

        let value = compute(&deps);
        *cached = Some((deps, value.clone()));
        value
    }

    /// Queue `effect` to run after this render when `deps` changed since the
    /// last render, or on the first render.
    pub fn use_effect<D, F>(&mut self, deps: D, effect: F)
    where
        D: PartialEq + 'static,
        F: FnOnce() -> Option<Teardown> + 'static,
    {
        let index = self.cursor;
        let slot = self.use_ref(|| None::<D>);
        let mut previous = slot.borrow_mut();
        if previous.as_ref() == Some(&deps) {
            return;
        }

        *previous = Some(deps);
        self.component
            .inner
            .pending_effects
            .borrow_mut()
            .push((index, Box::new(effect)));
    }

    pub fn render_handle(&self) -> RenderHandle {
        self.component.render_handle()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
