use std::cell::RefCell;
use std::rc::Rc;

use crate::cell::ValueCell;
use crate::observe::Observed;

/// Unique identity for a structured target (or a reactive cell).
pub type TargetId = u64;

thread_local! {
    static NEXT_ID: std::cell::Cell<TargetId> = const { std::cell::Cell::new(1) };
}

pub(crate) fn next_target_id() -> TargetId {
    NEXT_ID.with(|n| {
        let id = n.get();
        n.set(id + 1);
        id
    })
}

/// A dynamically-typed value in the reactive graph.
///
/// Primitives are stored by value. Structured data lives behind a [`Target`]
/// with shared identity; reads through a tracked handle return a
/// [`Value::Proxy`] wrapper instead of the raw target, and writes unwrap
/// proxies back to their target before storing, so raw storage never holds a
/// proxy.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    /// A single-field reactive box nested in the graph.
    Cell(ValueCell),
    /// A raw structured target (object, array, map, or set).
    Target(Target),
    /// A tracked handle around a target.
    Proxy(Observed),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Value {
        Value::Str(Rc::from(s.into().as_str()))
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Value::Target(_) | Value::Proxy(_))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Identity-or-value sameness, the comparison used to decide whether a
    /// write actually changed anything. Primitives compare by value,
    /// targets and proxies by target identity, cells by cell identity.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Cell(a), Value::Cell(b)) => a.id() == b.id(),
            (a, b) => match (a.target_identity(), b.target_identity()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }

    fn target_identity(&self) -> Option<TargetId> {
        match self {
            Value::Target(t) => Some(t.id()),
            Value::Proxy(p) => Some(p.target().id()),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Cell(c) => write!(f, "Cell(#{})", c.id()),
            Value::Target(t) => write!(f, "Target(#{})", t.id()),
            Value::Proxy(p) => write!(f, "Proxy(#{})", p.target().id()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Value {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Value {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Str(Rc::from(s))
    }
}

impl From<Target> for Value {
    fn from(t: Target) -> Value {
        Value::Target(t)
    }
}

impl From<Observed> for Value {
    fn from(p: Observed) -> Value {
        Value::Proxy(p)
    }
}

/// Structural kind of a target.
#[derive(Debug)]
pub enum Shape {
    /// Insertion-ordered string-keyed entries.
    Object(Vec<(Rc<str>, Value)>),
    Array(Vec<Value>),
    /// Insertion-ordered keyed collection; keys compared with [`Value::same`].
    Map(Vec<(Value, Value)>),
    Set(Vec<Value>),
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct TargetFlags {
    pub non_reactive: bool,
    pub marked_immutable: bool,
}

pub(crate) struct RawCell {
    pub id: TargetId,
    pub flags: TargetFlags,
    pub shape: Shape,
}

/// A structured node in the value graph with shared identity.
///
/// Cloning a `Target` clones the handle, not the data: two clones refer to
/// the same underlying shape, and wrapping either yields the same tracked
/// handle. The tracking layer never mutates a target's shape on its own.
#[derive(Clone)]
pub struct Target {
    pub(crate) inner: Rc<RefCell<RawCell>>,
}

impl Target {
    fn with_shape(shape: Shape) -> Target {
        Target {
            inner: Rc::new(RefCell::new(RawCell {
                id: next_target_id(),
                flags: TargetFlags::default(),
                shape,
            })),
        }
    }

    pub fn object() -> Target {
        Target::with_shape(Shape::Object(Vec::new()))
    }

    pub fn object_from(entries: Vec<(&str, Value)>) -> Target {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (Rc::from(k), v))
            .collect();
        Target::with_shape(Shape::Object(entries))
    }

    pub fn array() -> Target {
        Target::with_shape(Shape::Array(Vec::new()))
    }

    pub fn array_from(items: Vec<Value>) -> Target {
        Target::with_shape(Shape::Array(items))
    }

    pub fn map() -> Target {
        Target::with_shape(Shape::Map(Vec::new()))
    }

    pub fn set() -> Target {
        Target::with_shape(Shape::Set(Vec::new()))
    }

    pub fn id(&self) -> TargetId {
        self.inner.borrow().id
    }

    pub fn is_array(&self) -> bool {
        matches!(self.inner.borrow().shape, Shape::Array(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.inner.borrow().shape, Shape::Map(_) | Shape::Set(_))
    }

    pub(crate) fn non_reactive(&self) -> bool {
        self.inner.borrow().flags.non_reactive
    }

    pub(crate) fn marked_immutable(&self) -> bool {
        self.inner.borrow().flags.marked_immutable
    }

    pub(crate) fn set_non_reactive(&self) {
        self.inner.borrow_mut().flags.non_reactive = true;
    }

    pub(crate) fn set_marked_immutable(&self) {
        self.inner.borrow_mut().flags.marked_immutable = true;
    }

    // Raw (untracked) accessors. The handle layer wraps these with
    // track/trigger; collection instrumentation reads prior state through
    // them so a mutation never re-enters its own traps.

    pub fn get_raw(&self, key: &str) -> Option<Value> {
        match &self.inner.borrow().shape {
            Shape::Object(entries) => entries
                .iter()
                .find(|(k, _)| &**k == key)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    pub fn has_raw(&self, key: &str) -> bool {
        match &self.inner.borrow().shape {
            Shape::Object(entries) => entries.iter().any(|(k, _)| &**k == key),
            _ => false,
        }
    }

    /// Returns the previous value, if the key already existed.
    pub fn set_raw(&self, key: &str, value: Value) -> Option<Value> {
        match &mut self.inner.borrow_mut().shape {
            Shape::Object(entries) => {
                if let Some(slot) = entries.iter_mut().find(|(k, _)| &**k == key) {
                    Some(std::mem::replace(&mut slot.1, value))
                } else {
                    entries.push((Rc::from(key), value));
                    None
                }
            }
            _ => None,
        }
    }

    pub fn delete_raw(&self, key: &str) -> Option<Value> {
        match &mut self.inner.borrow_mut().shape {
            Shape::Object(entries) => {
                let idx = entries.iter().position(|(k, _)| &**k == key)?;
                Some(entries.remove(idx).1)
            }
            _ => None,
        }
    }

    pub fn keys_raw(&self) -> Vec<Rc<str>> {
        match &self.inner.borrow().shape {
            Shape::Object(entries) => entries.iter().map(|(k, _)| k.clone()).collect(),
            _ => Vec::new(),
        }
    }

    pub fn index_raw(&self, index: usize) -> Option<Value> {
        match &self.inner.borrow().shape {
            Shape::Array(items) => items.get(index).cloned(),
            _ => None,
        }
    }

    pub fn set_index_raw(&self, index: usize, value: Value) -> Option<Value> {
        match &mut self.inner.borrow_mut().shape {
            Shape::Array(items) => {
                if index < items.len() {
                    Some(std::mem::replace(&mut items[index], value))
                } else {
                    items.resize(index, Value::Null);
                    items.push(value);
                    None
                }
            }
            _ => None,
        }
    }

    pub fn len_raw(&self) -> usize {
        match &self.inner.borrow().shape {
            Shape::Array(items) => items.len(),
            Shape::Map(entries) => entries.len(),
            Shape::Set(items) => items.len(),
            Shape::Object(entries) => entries.len(),
        }
    }

    pub fn push_raw(&self, value: Value) -> usize {
        match &mut self.inner.borrow_mut().shape {
            Shape::Array(items) => {
                items.push(value);
                items.len()
            }
            _ => 0,
        }
    }

    pub fn pop_raw(&self) -> Option<Value> {
        match &mut self.inner.borrow_mut().shape {
            Shape::Array(items) => items.pop(),
            _ => None,
        }
    }

    pub fn map_get_raw(&self, key: &Value) -> Option<Value> {
        match &self.inner.borrow().shape {
            Shape::Map(entries) => entries
                .iter()
                .find(|(k, _)| k.same(key))
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    pub fn map_has_raw(&self, key: &Value) -> bool {
        match &self.inner.borrow().shape {
            Shape::Map(entries) => entries.iter().any(|(k, _)| k.same(key)),
            Shape::Set(items) => items.iter().any(|v| v.same(key)),
            _ => false,
        }
    }

    pub fn map_set_raw(&self, key: Value, value: Value) -> Option<Value> {
        match &mut self.inner.borrow_mut().shape {
            Shape::Map(entries) => {
                if let Some(slot) = entries.iter_mut().find(|(k, _)| k.same(&key)) {
                    Some(std::mem::replace(&mut slot.1, value))
                } else {
                    entries.push((key, value));
                    None
                }
            }
            _ => None,
        }
    }

    pub fn map_delete_raw(&self, key: &Value) -> Option<Value> {
        match &mut self.inner.borrow_mut().shape {
            Shape::Map(entries) => {
                let idx = entries.iter().position(|(k, _)| k.same(key))?;
                Some(entries.remove(idx).1)
            }
            Shape::Set(items) => {
                let idx = items.iter().position(|v| v.same(key))?;
                Some(items.remove(idx))
            }
            _ => None,
        }
    }

    pub fn set_add_raw(&self, value: Value) -> bool {
        match &mut self.inner.borrow_mut().shape {
            Shape::Set(items) => {
                if items.iter().any(|v| v.same(&value)) {
                    false
                } else {
                    items.push(value);
                    true
                }
            }
            _ => false,
        }
    }

    pub fn entries_raw(&self) -> Vec<(Value, Value)> {
        match &self.inner.borrow().shape {
            Shape::Map(entries) => entries.clone(),
            Shape::Set(items) => items.iter().map(|v| (v.clone(), v.clone())).collect(),
            _ => Vec::new(),
        }
    }

    pub fn clear_raw(&self) -> usize {
        match &mut self.inner.borrow_mut().shape {
            Shape::Map(entries) => std::mem::take(entries).len(),
            Shape::Set(items) => std::mem::take(items).len(),
            Shape::Object(entries) => std::mem::take(entries).len(),
            Shape::Array(items) => std::mem::take(items).len(),
        }
    }
}

impl PartialEq for Target {
    fn eq(&self, other: &Target) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cell = self.inner.borrow();
        write!(f, "Target(#{}, {:?})", cell.id, cell.shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_identity() {
        let a = Target::object();
        let b = a.clone();
        let c = Target::object();
        assert_eq!(a, b);
        assert_eq!(a.id(), b.id());
        assert_ne!(a, c);
        assert_ne!(a.id(), c.id());
    }

    #[test]
    fn test_object_raw_ops() {
        let t = Target::object();
        assert!(!t.has_raw("a"));
        assert!(t.set_raw("a", Value::from(1)).is_none());
        assert!(t.has_raw("a"));
        assert_eq!(t.get_raw("a").unwrap().as_number(), Some(1.0));
        let prev = t.set_raw("a", Value::from(2)).unwrap();
        assert_eq!(prev.as_number(), Some(1.0));
        assert!(t.delete_raw("a").is_some());
        assert!(t.delete_raw("a").is_none());
    }

    #[test]
    fn test_object_keys_preserve_insertion_order() {
        let t = Target::object();
        t.set_raw("z", Value::from(1));
        t.set_raw("a", Value::from(2));
        t.set_raw("m", Value::from(3));
        let keys = t.keys_raw();
        let keys: Vec<&str> = keys.iter().map(|k| &**k).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_value_same() {
        assert!(Value::from(1).same(&Value::from(1)));
        assert!(!Value::from(1).same(&Value::from(2)));
        assert!(Value::from("x").same(&Value::from("x")));
        let t = Target::object();
        assert!(Value::Target(t.clone()).same(&Value::Target(t.clone())));
        assert!(!Value::Target(t).same(&Value::Target(Target::object())));
    }

    #[test]
    fn test_map_raw_ops() {
        let m = Target::map();
        let key = Value::from("k");
        assert!(m.map_set_raw(key.clone(), Value::from(1)).is_none());
        assert!(m.map_has_raw(&key));
        assert_eq!(m.map_get_raw(&key).unwrap().as_number(), Some(1.0));
        assert_eq!(m.len_raw(), 1);
        assert_eq!(m.clear_raw(), 1);
        assert_eq!(m.len_raw(), 0);
    }
}
