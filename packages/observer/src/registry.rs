use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::effect::{Dep, Key};
use crate::observe::{Observed, ObservedInner};
use crate::value::TargetId;

// Process-wide (single-threaded) registries. Entries are created on first
// use and never explicitly destroyed; handle entries are weak so a target
// dropped by user code takes its wrapper with it.

thread_local! {
    static DEPS: RefCell<HashMap<TargetId, HashMap<Key, Dep>>> =
        RefCell::new(HashMap::new());
    static MUTABLE: RefCell<HashMap<TargetId, Weak<ObservedInner>>> =
        RefCell::new(HashMap::new());
    static IMMUTABLE: RefCell<HashMap<TargetId, Weak<ObservedInner>>> =
        RefCell::new(HashMap::new());
}

/// The dependency set for (target, key), created on first access.
pub(crate) fn dep_for(target: TargetId, key: Key) -> Dep {
    DEPS.with(|deps| {
        deps.borrow_mut()
            .entry(target)
            .or_default()
            .entry(key)
            .or_insert_with(Dep::new)
            .clone()
    })
}

/// The dependency set for (target, key) if one was ever created.
pub(crate) fn existing_dep(target: TargetId, key: Option<Key>) -> Option<Dep> {
    let key = key?;
    DEPS.with(|deps| deps.borrow().get(&target)?.get(&key).cloned())
}

/// Every dependency set registered for the target, for collection-wide
/// clears.
pub(crate) fn all_deps(target: TargetId) -> Vec<Dep> {
    DEPS.with(|deps| {
        deps.borrow()
            .get(&target)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    })
}

/// The cached handle for a target at the requested mutability, creating and
/// caching one with `make` on first wrap. Wrapping the same target twice
/// yields the reference-identical handle.
pub(crate) fn proxy_for(
    target: TargetId,
    immutable: bool,
    make: impl FnOnce() -> Rc<ObservedInner>,
) -> Observed {
    let registry = if immutable { &IMMUTABLE } else { &MUTABLE };
    registry.with(|map| {
        if let Some(existing) = map.borrow().get(&target).and_then(Weak::upgrade) {
            return Observed::from_inner(existing);
        }
        let inner = make();
        map.borrow_mut().insert(target, Rc::downgrade(&inner));
        Observed::from_inner(inner)
    })
}

/// Whether the target currently has a live handle at the given mutability.
pub(crate) fn has_proxy(target: TargetId, immutable: bool) -> bool {
    let registry = if immutable { &IMMUTABLE } else { &MUTABLE };
    registry.with(|map| {
        map.borrow()
            .get(&target)
            .map(|w| w.strong_count() > 0)
            .unwrap_or(false)
    })
}
