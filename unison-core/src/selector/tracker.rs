//! Dependency Tracker
//!
//! Call-site memory for composed selectors, held in an arena.
//!
//! Every place a selector is invoked from owns one memory cell, addressed by
//! a [`SiteHandle`]. The cell remembers the previous input tuple, the
//! previous reading of each state reader, and the last result. Two call
//! sites never share a cell, even when they invoke the same selector.
//!
//! Nested selectors used as inputs get a child cell per input position. The
//! child is allocated the first time that position is evaluated and reused
//! afterwards.
//!
//! # Implementation Notes
//!
//! A cell remembers which selector claimed it. If a different selector is
//! invoked through the same handle, the cell is reset first so no memory
//! leaks from one definition into another.

use smallvec::SmallVec;

use crate::equality::{self, EqualityPolicy};
use crate::value::Value;

use super::composed::SelectorId;
use super::memo::{MemoState, ResultMemo};

/// A resolved input tuple.
pub(crate) type InputTuple = SmallVec<[Value; 4]>;

/// Opaque address of one call-site memory cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SiteHandle(usize);

impl SiteHandle {
    /// Get the raw arena index.
    pub fn raw(&self) -> usize {
        self.0
    }
}

/// Memory of one call site.
#[derive(Debug, Default)]
pub(crate) struct SiteMemory {
    owner: Option<SelectorId>,
    state: MemoState,
    previous_inputs: Option<InputTuple>,
    reader_values: SmallVec<[Option<Value>; 4]>,
    pub(crate) result: ResultMemo,
    children: SmallVec<[Option<SiteHandle>; 4]>,
    recomputations: u64,
}

impl SiteMemory {
    /// Keep the previous reading at `position` if `fresh` is equal to it
    /// under `policy`, otherwise remember `fresh`.
    pub(crate) fn settle_reader(
        &mut self,
        position: usize,
        fresh: Value,
        policy: EqualityPolicy,
    ) -> Value {
        if self.reader_values.len() <= position {
            self.reader_values.resize(position + 1, None);
        }

        if let Some(previous) = &self.reader_values[position] {
            if equality::equal(previous, &fresh, policy) {
                return previous.clone();
            }
        }
        self.reader_values[position] = Some(fresh.clone());
        fresh
    }

    /// Keep the previous tuple if `tuple` is equal to it under `policy`,
    /// otherwise remember `tuple`.
    pub(crate) fn settle_inputs(&mut self, tuple: InputTuple, policy: EqualityPolicy) -> InputTuple {
        if let Some(previous) = &self.previous_inputs {
            if equality::equal_tuples(previous, &tuple, policy) {
                return previous.clone();
            }
        }
        self.previous_inputs = Some(tuple.clone());
        tuple
    }

    /// Record that the combiner ran.
    pub(crate) fn mark_computed(&mut self) {
        self.state = MemoState::Memoized;
        self.recomputations += 1;
    }
}

/// Arena of call-site memory cells.
#[derive(Debug, Default)]
pub struct DependencyTracker {
    sites: Vec<SiteMemory>,
}

impl DependencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh, uninitialized call site.
    pub fn allocate(&mut self) -> SiteHandle {
        self.sites.push(SiteMemory::default());
        SiteHandle(self.sites.len() - 1)
    }

    /// Number of allocated sites, children included.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn state(&self, site: SiteHandle) -> MemoState {
        self.sites
            .get(site.0)
            .map(|memory| memory.state)
            .unwrap_or_default()
    }

    /// How many times the combiner ran for `site`.
    pub fn recomputations(&self, site: SiteHandle) -> u64 {
        self.sites
            .get(site.0)
            .map(|memory| memory.recomputations)
            .unwrap_or(0)
    }

    /// The last result produced at `site`.
    pub fn last_result(&self, site: SiteHandle) -> Option<&Value> {
        self.sites.get(site.0).and_then(|memory| memory.result.value())
    }

    /// Forget everything remembered at `site`. Child sites are reset too.
    pub fn reset(&mut self, site: SiteHandle) {
        let mut pending = vec![site];
        while let Some(next) = pending.pop() {
            if let Some(memory) = self.sites.get_mut(next.0) {
                pending.extend(memory.children.iter().flatten().copied());
                let children = std::mem::take(&mut memory.children);
                *memory = SiteMemory {
                    children,
                    ..SiteMemory::default()
                };
            }
        }
    }

    /// Bind `site` to `owner`, resetting it if another selector used it.
    pub(crate) fn claim(&mut self, site: SiteHandle, owner: SelectorId) {
        let previous = self.site_mut(site).owner;
        if previous.is_some_and(|id| id != owner) {
            tracing::debug!(site = site.0, "call site reused by another selector; resetting");
            self.reset(site);
        }
        self.site_mut(site).owner = Some(owner);
    }

    /// The child site for the nested selector at `position`.
    pub(crate) fn child(&mut self, site: SiteHandle, position: usize) -> SiteHandle {
        let existing = {
            let memory = self.site_mut(site);
            if memory.children.len() <= position {
                memory.children.resize(position + 1, None);
            }
            memory.children[position]
        };

        match existing {
            Some(child) => child,
            None => {
                let child = self.allocate();
                self.site_mut(site).children[position] = Some(child);
                child
            }
        }
    }

    /// Memory for `site`. Handles from elsewhere grow the arena rather than
    /// panic.
    pub(crate) fn site_mut(&mut self, site: SiteHandle) -> &mut SiteMemory {
        if site.0 >= self.sites.len() {
            self.sites.resize_with(site.0 + 1, SiteMemory::default);
        }
        &mut self.sites[site.0]
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
