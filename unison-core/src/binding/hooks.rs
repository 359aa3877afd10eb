//! Store hooks.
//!
//! Every hook looks up the innermost [`StoreScope`] and fails with
//! [`Error::MissingStore`] when there is none.
//!
//! [`StoreScope`]: super::StoreScope
//! [`Error::MissingStore`]: crate::Error::MissingStore

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::dispatch::{DispatchTarget, Dispatcher};
use crate::equality::{self, EqualityPolicy};
use crate::error::Result;
use crate::selector::{ComposedSelector, DependencyTracker, SiteHandle};
use crate::value::Value;

use super::component::{HookContext, RenderHandle, Teardown};
use super::context::StoreContext;
use super::store::{Listener, StoreRef};

type MapFn = Rc<dyn Fn(&Value) -> Value>;

/// Register a dispatch target with the current scope's registry.
/// Returns the new number of registered targets.
pub fn register_dispatch_target(target: DispatchTarget) -> Result<usize> {
    Ok(StoreContext::current()?.registry().register(target))
}

/// Unregister a dispatch target from the current scope's registry.
/// Returns the new number of registered targets.
pub fn unregister_dispatch_target(target: &DispatchTarget) -> Result<usize> {
    Ok(StoreContext::current()?.registry().unregister(target))
}

/// The store's own dispatch, bypassing the fan-out.
///
/// The returned target keeps its identity for as long as the store does.
pub fn use_store_dispatch(cx: &mut HookContext<'_>) -> Result<DispatchTarget> {
    let scope = StoreContext::current()?;
    Ok(cx.use_memo(scope.store().clone(), StoreRef::dispatch_target))
}

/// The fan-out dispatcher of the current scope.
///
/// `targets` are registered after the first render and whenever the list
/// changes, and exactly those targets are unregistered at teardown. The
/// store dispatch is captured on every call.
pub fn use_dispatch(cx: &mut HookContext<'_>, targets: &[DispatchTarget]) -> Result<Dispatcher> {
    let scope = StoreContext::current()?;
    let registry = scope.registry().clone();

    let store_dispatch = use_store_dispatch(cx)?;
    registry.capture_store_dispatch(store_dispatch);
    tracing::debug!(targets = targets.len(), "captured store dispatch");

    let targets = targets.to_vec();
    cx.use_effect((registry.clone(), targets.clone()), move || {
        if targets.is_empty() {
            return None;
        }
        for target in &targets {
            registry.register(target.clone());
        }
        let teardown: Teardown = Box::new(move || {
            for target in &targets {
                registry.unregister(target);
            }
        });
        Some(teardown)
    });

    Ok(scope.registry().dispatcher())
}

struct MappedState {
    map: RefCell<MapFn>,
    equality: Cell<EqualityPolicy>,
    last: RefCell<Option<Value>>,
}

impl MappedState {
    /// Keep the previous value when `fresh` is equal to it.
    fn settle(&self, fresh: Value) -> Value {
        let mut last = self.last.borrow_mut();
        if let Some(previous) = last.as_ref() {
            if equality::equal(previous, &fresh, self.equality.get()) {
                return previous.clone();
            }
        }
        *last = Some(fresh.clone());
        fresh
    }

    fn check_for_updates(&self, store: &StoreRef, handle: &RenderHandle, cancelled: &Cell<bool>) {
        if cancelled.get() {
            tracing::trace!("store notification after teardown; ignoring");
            return;
        }

        let map = self.map.borrow().clone();
        let fresh = map(&store.state());
        let Ok(mut last) = self.last.try_borrow_mut() else {
            tracing::trace!("store notification during render; ignoring");
            return;
        };

        if let Some(previous) = last.as_ref() {
            if equality::equal(previous, &fresh, self.equality.get()) {
                tracing::trace!("mapped state unchanged");
                return;
            }
        }
        *last = Some(fresh);
        drop(last);
        handle.request_render();
    }
}

/// Read state through `map` and re-render when the mapped value changes.
///
/// The latest `map` is always the one applied, also by notifications. A
/// value equal to the last rendered one under `equality` is replaced by the
/// last rendered one, so its identity is stable.
pub fn use_mapped_state<F>(
    cx: &mut HookContext<'_>,
    map: F,
    equality: EqualityPolicy,
) -> Result<Value>
where
    F: Fn(&Value) -> Value + 'static,
{
    let scope = StoreContext::current()?;
    let store = scope.store().clone();
    let map: MapFn = Rc::new(map);

    let slot = cx.use_hook(|| MappedState {
        map: RefCell::new(map.clone()),
        equality: Cell::new(equality),
        last: RefCell::new(None),
    });
    *slot.map.borrow_mut() = map.clone();
    slot.equality.set(equality);

    let value = slot.settle(map(&store.state()));

    let handle = cx.render_handle();
    cx.use_effect(store.clone(), move || {
        let cancelled = Rc::new(Cell::new(false));
        let check = {
            let cancelled = cancelled.clone();
            let store = store.clone();
            move || slot.check_for_updates(&store, &handle, &cancelled)
        };
        let check: Listener = Rc::new(check);

        let subscription = store.subscribe(check.clone());
        // The store may have changed between render and subscribe.
        check();

        let teardown: Teardown = Box::new(move || {
            cancelled.set(true);
            subscription.unsubscribe();
        });
        Some(teardown)
    });

    Ok(value)
}

struct SelectorSlot {
    selector: RefCell<ComposedSelector>,
    tracker: RefCell<DependencyTracker>,
    site: SiteHandle,
    params: RefCell<Vec<Value>>,
    last: RefCell<Option<Value>>,
}

impl SelectorSlot {
    fn new(selector: &ComposedSelector) -> Self {
        let mut tracker = DependencyTracker::new();
        let site = tracker.allocate();
        Self {
            selector: RefCell::new(selector.clone()),
            tracker: RefCell::new(tracker),
            site,
            params: RefCell::new(Vec::new()),
            last: RefCell::new(None),
        }
    }

    fn reselect(&self, store: &StoreRef, handle: &RenderHandle, cancelled: &Cell<bool>) {
        if cancelled.get() {
            tracing::trace!("store notification after teardown; ignoring");
            return;
        }

        let borrows = (self.tracker.try_borrow_mut(), self.last.try_borrow_mut());
        let (Ok(mut tracker), Ok(mut last)) = borrows else {
            tracing::trace!("store notification during render; ignoring");
            return;
        };

        let selector = self.selector.borrow().clone();
        let params = self.params.borrow().clone();
        let value = selector.select(&mut tracker, self.site, store, &params);

        if last.as_ref().is_some_and(|previous| previous.same_identity(&value)) {
            tracing::trace!(selector = selector.id().raw(), "selected value unchanged");
            return;
        }
        *last = Some(value);
        drop(last);
        drop(tracker);
        handle.request_render();
    }
}

/// Evaluate `selector` against the current store through this hook's own
/// call site, and re-render when a store change produces a new result.
pub fn use_selector(
    cx: &mut HookContext<'_>,
    selector: &ComposedSelector,
    params: &[Value],
) -> Result<Value> {
    let scope = StoreContext::current()?;
    let store = scope.store().clone();

    let slot = cx.use_hook(|| SelectorSlot::new(selector));
    *slot.selector.borrow_mut() = selector.clone();
    *slot.params.borrow_mut() = params.to_vec();

    let value = selector.select(&mut slot.tracker.borrow_mut(), slot.site, &store, params);
    *slot.last.borrow_mut() = Some(value.clone());

    let handle = cx.render_handle();
    cx.use_effect(store.clone(), move || {
        let cancelled = Rc::new(Cell::new(false));
        let check = {
            let cancelled = cancelled.clone();
            let store = store.clone();
            move || slot.reselect(&store, &handle, &cancelled)
        };
        let check: Listener = Rc::new(check);

        let subscription = store.subscribe(check.clone());
        check();

        let teardown: Teardown = Box::new(move || {
            cancelled.set(true);
            subscription.unsubscribe();
        });
        Some(teardown)
    });

    Ok(value)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
