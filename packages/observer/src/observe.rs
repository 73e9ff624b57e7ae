use std::rc::Rc;

use tracing::warn;

use crate::effect::{track, trigger, AccessKind, ChangeKind, Key};
use crate::lock;
use crate::registry;
use crate::value::{Target, Value};

pub(crate) struct ObservedInner {
    target: Target,
    immutable: bool,
}

/// A tracked handle around one [`Target`].
///
/// Every read through the handle records a dependency edge for the
/// innermost active computation; every write notifies the affected
/// computations. Structured read results are wrapped (at the same
/// mutability) before they are returned, so nested access never leaks a
/// raw target. Cloning shares the handle; wrapping the same target twice
/// yields the reference-identical handle.
#[derive(Clone)]
pub struct Observed {
    inner: Rc<ObservedInner>,
}

impl Observed {
    pub(crate) fn from_inner(inner: Rc<ObservedInner>) -> Observed {
        Observed { inner }
    }

    pub fn target(&self) -> Target {
        self.inner.target.clone()
    }

    pub fn is_immutable(&self) -> bool {
        self.inner.immutable
    }

    pub fn ptr_eq(&self, other: &Observed) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn id(&self) -> crate::value::TargetId {
        self.inner.target.id()
    }

    /// Wraps a structured read result at this handle's mutability. A value
    /// marked non-reactive is handed back raw; a value marked immutable
    /// always wraps immutable.
    fn wrap_result(&self, value: Value) -> Value {
        match value {
            Value::Target(t) => {
                if t.non_reactive() {
                    Value::Target(t)
                } else if self.inner.immutable || t.marked_immutable() {
                    Value::Proxy(immutable_target(&t))
                } else {
                    Value::Proxy(observe_target(&t))
                }
            }
            other => other,
        }
    }

    /// True when a write must be absorbed: immutable handle with the lock
    /// engaged. The caller returns the success sentinel so composite
    /// mutations don't fail partway through.
    fn write_blocked(&self, op: &str) -> bool {
        if self.inner.immutable && lock::is_locked() {
            warn!(target_id = self.id(), op, "mutation on immutable value ignored");
            true
        } else {
            false
        }
    }

    // Object traps

    pub fn get(&self, key: &str) -> Value {
        track(self.id(), AccessKind::Get, Key::prop(key));
        let value = self.inner.target.get_raw(key).unwrap_or(Value::Null);
        self.wrap_result(value)
    }

    pub fn set(&self, key: &str, value: Value) -> bool {
        if self.write_blocked("set") {
            return true;
        }
        // The raw store never holds proxies.
        let value = unwrap(value);
        let had = self.inner.target.has_raw(key);
        if had {
            let old = self.inner.target.get_raw(key);
            if old.as_ref().is_some_and(|o| o.same(&value)) {
                return true;
            }
            self.inner.target.set_raw(key, value.clone());
            trigger(
                self.id(),
                ChangeKind::Set,
                Some(Key::prop(key)),
                old,
                Some(value),
            );
        } else {
            self.inner.target.set_raw(key, value.clone());
            trigger(
                self.id(),
                ChangeKind::Add,
                Some(Key::prop(key)),
                None,
                Some(value),
            );
        }
        true
    }

    pub fn delete(&self, key: &str) -> bool {
        if self.write_blocked("delete") {
            return true;
        }
        match self.inner.target.delete_raw(key) {
            Some(old) => {
                trigger(
                    self.id(),
                    ChangeKind::Delete,
                    Some(Key::prop(key)),
                    Some(old),
                    None,
                );
                true
            }
            None => false,
        }
    }

    pub fn has(&self, key: &str) -> bool {
        track(self.id(), AccessKind::Has, Key::prop(key));
        self.inner.target.has_raw(key)
    }

    pub fn keys(&self) -> Vec<String> {
        track(self.id(), AccessKind::Iterate, Key::Iterate);
        self.inner
            .target
            .keys_raw()
            .into_iter()
            .map(|k| k.to_string())
            .collect()
    }

    // Array traps

    pub fn get_index(&self, index: usize) -> Value {
        track(self.id(), AccessKind::Get, Key::Index(index));
        let value = self.inner.target.index_raw(index).unwrap_or(Value::Null);
        self.wrap_result(value)
    }

    pub fn set_index(&self, index: usize, value: Value) -> bool {
        if self.write_blocked("set_index") {
            return true;
        }
        let value = unwrap(value);
        let len = self.inner.target.len_raw();
        if index < len {
            let old = self.inner.target.index_raw(index);
            if old.as_ref().is_some_and(|o| o.same(&value)) {
                return true;
            }
            self.inner.target.set_index_raw(index, value.clone());
            trigger(
                self.id(),
                ChangeKind::Set,
                Some(Key::Index(index)),
                old,
                Some(value),
            );
        } else {
            self.inner.target.set_index_raw(index, value.clone());
            trigger(
                self.id(),
                ChangeKind::Add,
                Some(Key::Index(index)),
                None,
                Some(value),
            );
        }
        true
    }

    pub fn len(&self) -> usize {
        track(self.id(), AccessKind::Get, Key::Length);
        self.inner.target.len_raw()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&self, value: Value) -> bool {
        if self.write_blocked("push") {
            return true;
        }
        let value = unwrap(value);
        let len = self.inner.target.push_raw(value.clone());
        trigger(
            self.id(),
            ChangeKind::Add,
            Some(Key::Index(len - 1)),
            None,
            Some(value),
        );
        true
    }

    pub fn pop(&self) -> Value {
        if self.write_blocked("pop") {
            return Value::Null;
        }
        let len = self.inner.target.len_raw();
        match self.inner.target.pop_raw() {
            Some(old) => {
                trigger(
                    self.id(),
                    ChangeKind::Delete,
                    Some(Key::Index(len - 1)),
                    Some(old.clone()),
                    None,
                );
                self.wrap_result(old)
            }
            None => Value::Null,
        }
    }

    // Collection instrumentation (maps and sets). Mutators read prior
    // state from the raw target so they never recurse through the handle.

    pub fn size(&self) -> usize {
        track(self.id(), AccessKind::Iterate, Key::Iterate);
        self.inner.target.len_raw()
    }

    pub fn map_get(&self, key: &Value) -> Value {
        track(self.id(), AccessKind::Get, Key::map_entry(key));
        let value = self.inner.target.map_get_raw(key).unwrap_or(Value::Null);
        self.wrap_result(value)
    }

    pub fn map_has(&self, key: &Value) -> bool {
        track(self.id(), AccessKind::Has, Key::map_entry(key));
        self.inner.target.map_has_raw(key)
    }

    pub fn map_set(&self, key: Value, value: Value) -> bool {
        if self.write_blocked("map_set") {
            return true;
        }
        let key = unwrap(key);
        let value = unwrap(value);
        let had = self.inner.target.map_has_raw(&key);
        if had {
            let old = self.inner.target.map_get_raw(&key);
            if old.as_ref().is_some_and(|o| o.same(&value)) {
                return true;
            }
            self.inner.target.map_set_raw(key.clone(), value.clone());
            trigger(
                self.id(),
                ChangeKind::Set,
                Some(Key::map_entry(&key)),
                old,
                Some(value),
            );
        } else {
            self.inner.target.map_set_raw(key.clone(), value.clone());
            trigger(
                self.id(),
                ChangeKind::Add,
                Some(Key::map_entry(&key)),
                None,
                Some(value),
            );
        }
        true
    }

    pub fn map_delete(&self, key: &Value) -> bool {
        if self.write_blocked("map_delete") {
            return true;
        }
        match self.inner.target.map_delete_raw(key) {
            Some(old) => {
                trigger(
                    self.id(),
                    ChangeKind::Delete,
                    Some(Key::map_entry(key)),
                    Some(old),
                    None,
                );
                true
            }
            None => false,
        }
    }

    pub fn add(&self, value: Value) -> bool {
        if self.write_blocked("add") {
            return true;
        }
        let value = unwrap(value);
        if self.inner.target.set_add_raw(value.clone()) {
            trigger(
                self.id(),
                ChangeKind::Add,
                Some(Key::map_entry(&value)),
                None,
                Some(value),
            );
        }
        true
    }

    pub fn clear(&self) -> bool {
        if self.write_blocked("clear") {
            return true;
        }
        if self.inner.target.clear_raw() > 0 {
            trigger(self.id(), ChangeKind::Clear, None, None, None);
        }
        true
    }

    pub fn entries(&self) -> Vec<(Value, Value)> {
        track(self.id(), AccessKind::Iterate, Key::Iterate);
        self.inner
            .target
            .entries_raw()
            .into_iter()
            .map(|(k, v)| (self.wrap_result(k), self.wrap_result(v)))
            .collect()
    }

    pub fn values(&self) -> Vec<Value> {
        track(self.id(), AccessKind::Iterate, Key::Iterate);
        self.inner
            .target
            .entries_raw()
            .into_iter()
            .map(|(_, v)| self.wrap_result(v))
            .collect()
    }

    pub fn for_each(&self, mut f: impl FnMut(&Value, &Value)) {
        track(self.id(), AccessKind::Iterate, Key::Iterate);
        for (k, v) in self.inner.target.entries_raw() {
            f(&self.wrap_result(v), &self.wrap_result(k));
        }
    }
}

impl std::fmt::Debug for Observed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Observed(#{}{})",
            self.id(),
            if self.inner.immutable { ", immutable" } else { "" }
        )
    }
}

/// Wraps a target in a mutable tracked handle, idempotently.
pub fn observe_target(target: &Target) -> Observed {
    if target.marked_immutable() {
        return immutable_target(target);
    }
    let t = target.clone();
    registry::proxy_for(target.id(), false, move || {
        Rc::new(ObservedInner {
            target: t,
            immutable: false,
        })
    })
}

/// Wraps a target in an immutable tracked handle, idempotently.
pub fn immutable_target(target: &Target) -> Observed {
    let t = target.clone();
    registry::proxy_for(target.id(), true, move || {
        Rc::new(ObservedInner {
            target: t,
            immutable: true,
        })
    })
}

/// Makes a value observable. Structured values wrap (or re-use) a tracked
/// handle; a value marked immutable wraps immutable even here; a value
/// marked non-reactive and any primitive are returned as-is (primitives
/// with a warning, since call sites wrap unconditionally).
pub fn observe(value: Value) -> Value {
    match value {
        Value::Target(t) => {
            if t.non_reactive() {
                Value::Target(t)
            } else {
                Value::Proxy(observe_target(&t))
            }
        }
        Value::Proxy(p) => {
            // Idempotent, upgrading to immutable when the target was
            // marked immutable after the mutable wrap was handed out.
            if !p.is_immutable() && p.target().marked_immutable() {
                Value::Proxy(immutable_target(&p.target()))
            } else {
                Value::Proxy(p)
            }
        }
        Value::Cell(c) => Value::Cell(c),
        primitive => {
            warn!(value = ?primitive, "primitive value cannot be observed");
            primitive
        }
    }
}

/// Makes a value observable through an immutable handle: reads track as
/// usual, writes are absorbed (with a warning) while the lock is engaged.
pub fn immutable(value: Value) -> Value {
    match value {
        Value::Target(t) => {
            if t.non_reactive() {
                Value::Target(t)
            } else {
                Value::Proxy(immutable_target(&t))
            }
        }
        Value::Proxy(p) => {
            if p.is_immutable() {
                Value::Proxy(p)
            } else {
                Value::Proxy(immutable_target(&p.target()))
            }
        }
        Value::Cell(c) => Value::Cell(c),
        primitive => {
            warn!(value = ?primitive, "primitive value cannot be observed");
            primitive
        }
    }
}

/// Resolves a handle back to its raw target; anything else is itself.
pub fn unwrap(value: Value) -> Value {
    match value {
        Value::Proxy(p) => Value::Target(p.target()),
        other => other,
    }
}

pub fn is_observed(value: &Value) -> bool {
    match value {
        Value::Proxy(_) | Value::Cell(_) => true,
        Value::Target(t) => {
            registry::has_proxy(t.id(), false) || registry::has_proxy(t.id(), true)
        }
        _ => false,
    }
}

pub fn is_immutable(value: &Value) -> bool {
    match value {
        Value::Proxy(p) => p.is_immutable(),
        Value::Target(t) => t.marked_immutable(),
        _ => false,
    }
}

/// Marks a target so future wraps are forced immutable, including nested
/// wraps and mutable-wrap requests.
pub fn mark_immutable(target: &Target) {
    target.set_marked_immutable();
}

/// Marks a target so it is never wrapped, even when reached as a nested
/// property value.
pub fn mark_non_reactive(target: &Target) {
    target.set_non_reactive();
}
