use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::effect::{effect, Effect, EffectOptions};
use crate::value::Value;

/// A lazily-evaluated cached computation.
///
/// The underlying runner does not execute at creation. When any dependency
/// fires, the scheduler marks the cache dirty without recomputing; the next
/// `value()` read recomputes. After every read, the runner's dependency
/// edges are propagated into the currently-active outer computation, so a
/// computation reading a derived value is transitively subscribed to
/// everything it reads, including through chains of derived values.
#[derive(Clone)]
pub struct Computed {
    result: Rc<RefCell<Value>>,
    dirty: Rc<Cell<bool>>,
    runner: Effect,
}

pub fn computed(getter: impl Fn() -> Value + 'static) -> Computed {
    let result = Rc::new(RefCell::new(Value::Null));
    let dirty = Rc::new(Cell::new(true));

    let slot = result.clone();
    let mark = dirty.clone();
    let runner = effect(
        move || {
            *slot.borrow_mut() = getter();
        },
        EffectOptions {
            lazy: true,
            scheduler: Some(Rc::new(move |_| mark.set(true))),
            ..Default::default()
        },
    );

    Computed {
        result,
        dirty,
        runner,
    }
}

impl Computed {
    pub fn value(&self) -> Value {
        if self.dirty.get() {
            self.runner.run();
            self.dirty.set(false);
        }
        self.runner.propagate_deps();
        self.result.borrow().clone()
    }

    /// The underlying computation, exposed for `stop`.
    pub fn runner(&self) -> &Effect {
        &self.runner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{effect, stop, EffectOptions};
    use crate::observe::observe_target;
    use crate::value::Target;

    #[test]
    fn test_lazy_until_first_read() {
        let calls = Rc::new(Cell::new(0));
        let c = calls.clone();
        let derived = computed(move || {
            c.set(c.get() + 1);
            Value::from(1)
        });
        assert_eq!(calls.get(), 0);
        assert_eq!(derived.value().as_number(), Some(1.0));
        assert_eq!(calls.get(), 1);
        // Cached while clean.
        let _ = derived.value();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_dirty_on_dependency_change_recompute_on_read() {
        let obs = observe_target(&Target::object());
        obs.set("n", Value::from(1));

        let calls = Rc::new(Cell::new(0));
        let c = calls.clone();
        let src = obs.clone();
        let derived = computed(move || {
            c.set(c.get() + 1);
            Value::from(src.get("n").as_number().unwrap_or(0.0) * 2.0)
        });
        assert_eq!(derived.value().as_number(), Some(2.0));
        assert_eq!(calls.get(), 1);

        // The write marks dirty without recomputing.
        obs.set("n", Value::from(5));
        assert_eq!(calls.get(), 1);
        assert_eq!(derived.value().as_number(), Some(10.0));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_outer_effect_inherits_computed_dependencies() {
        let obs = observe_target(&Target::object());
        obs.set("n", Value::from(1));

        let src = obs.clone();
        let derived = computed(move || Value::from(src.get("n").as_number().unwrap_or(0.0) + 1.0));

        let seen = Rc::new(Cell::new(0.0));
        let s = seen.clone();
        let d = derived.clone();
        effect(
            move || {
                s.set(d.value().as_number().unwrap_or(f64::NAN));
            },
            EffectOptions::default(),
        );
        assert_eq!(seen.get(), 2.0);

        obs.set("n", Value::from(9));
        assert_eq!(seen.get(), 10.0);
    }

    #[test]
    fn test_chained_computeds_propagate_transitively() {
        let obs = observe_target(&Target::object());
        obs.set("n", Value::from(1));

        let src = obs.clone();
        let doubled = computed(move || Value::from(src.get("n").as_number().unwrap_or(0.0) * 2.0));
        let d = doubled.clone();
        let plus_one = computed(move || Value::from(d.value().as_number().unwrap_or(0.0) + 1.0));

        let seen = Rc::new(Cell::new(0.0));
        let s = seen.clone();
        let p = plus_one.clone();
        effect(
            move || s.set(p.value().as_number().unwrap_or(f64::NAN)),
            EffectOptions::default(),
        );
        assert_eq!(seen.get(), 3.0);

        obs.set("n", Value::from(10));
        assert_eq!(seen.get(), 21.0);
    }

    #[test]
    fn test_stop_runner_freezes_value() {
        let obs = observe_target(&Target::object());
        obs.set("n", Value::from(1));

        let src = obs.clone();
        let derived = computed(move || Value::from(src.get("n").as_number().unwrap_or(0.0)));
        assert_eq!(derived.value().as_number(), Some(1.0));

        stop(derived.runner());
        obs.set("n", Value::from(2));
        // No dependency left to mark it dirty.
        assert_eq!(derived.value().as_number(), Some(1.0));
    }
}
