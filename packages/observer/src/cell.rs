use std::cell::RefCell;
use std::rc::Rc;

use crate::effect::{track, trigger, AccessKind, ChangeKind, Key};
use crate::observe;
use crate::value::{next_target_id, TargetId, Value};

struct CellInner {
    id: TargetId,
    value: RefCell<Value>,
}

/// A single-field reactive box.
///
/// The cell is its own identity in the dependency registry — not a
/// (target, key) pair — and every read and write routes through the one
/// reserved key. Structured values are made observable on the way in, so a
/// cell holding an object behaves like any other tracked nesting. Cloning
/// shares the cell.
#[derive(Clone)]
pub struct ValueCell {
    inner: Rc<CellInner>,
}

impl ValueCell {
    pub fn new(value: Value) -> ValueCell {
        ValueCell {
            inner: Rc::new(CellInner {
                id: next_target_id(),
                value: RefCell::new(convert(value)),
            }),
        }
    }

    pub fn id(&self) -> TargetId {
        self.inner.id
    }

    pub fn get(&self) -> Value {
        track(self.inner.id, AccessKind::Get, Key::cell());
        self.inner.value.borrow().clone()
    }

    pub fn set(&self, value: Value) {
        let value = convert(value);
        let old = self.inner.value.borrow().clone();
        if old.same(&value) {
            return;
        }
        *self.inner.value.borrow_mut() = value.clone();
        trigger(
            self.inner.id,
            ChangeKind::Set,
            Some(Key::cell()),
            Some(old),
            Some(value),
        );
    }
}

fn convert(value: Value) -> Value {
    match value {
        v @ Value::Target(_) => observe::observe(v),
        other => other,
    }
}

impl std::fmt::Debug for ValueCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ValueCell(#{}, {:?})", self.inner.id, self.inner.value.borrow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{effect, EffectOptions};
    use crate::value::Target;
    use std::cell::Cell;

    #[test]
    fn test_cell_tracks_and_triggers() {
        let cell = ValueCell::new(Value::from(1));
        let runs = Rc::new(Cell::new(0));
        let seen = Rc::new(Cell::new(0.0));

        let c = cell.clone();
        let r = runs.clone();
        let s = seen.clone();
        effect(
            move || {
                r.set(r.get() + 1);
                s.set(c.get().as_number().unwrap_or(f64::NAN));
            },
            EffectOptions::default(),
        );
        assert_eq!(runs.get(), 1);
        assert_eq!(seen.get(), 1.0);

        cell.set(Value::from(2));
        assert_eq!(runs.get(), 2);
        assert_eq!(seen.get(), 2.0);
    }

    #[test]
    fn test_cell_no_trigger_on_unchanged_value() {
        let cell = ValueCell::new(Value::from(1));
        let runs = Rc::new(Cell::new(0));

        let c = cell.clone();
        let r = runs.clone();
        effect(
            move || {
                r.set(r.get() + 1);
                let _ = c.get();
            },
            EffectOptions::default(),
        );
        cell.set(Value::from(1));
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_cell_converts_structured_values() {
        let cell = ValueCell::new(Value::Target(Target::object()));
        match cell.get() {
            Value::Proxy(_) => {}
            other => panic!("expected proxy, got {:?}", other),
        }
    }

    #[test]
    fn test_cell_nested_in_tracked_object() {
        let cell = ValueCell::new(Value::from(1));
        let obs = observe::observe_target(&Target::object());
        obs.set("count", Value::Cell(cell.clone()));

        match obs.get("count") {
            Value::Cell(c) => assert_eq!(c.id(), cell.id()),
            other => panic!("expected cell, got {:?}", other),
        }
    }
}
