use std::cell::Cell;
use std::rc::Rc;

use willow_observer::{
    effect, immutable_target, lock, observe, observe_target, stop, unlock, unwrap, EffectOptions,
    Target, Value,
};

fn counting_effect(f: impl Fn() + 'static) -> Rc<Cell<u32>> {
    let runs = Rc::new(Cell::new(0));
    let r = runs.clone();
    effect(
        move || {
            r.set(r.get() + 1);
            f();
        },
        EffectOptions::default(),
    );
    runs
}

#[test]
fn test_wrap_idempotence() {
    let raw = Target::object();
    let a = observe_target(&raw);
    let b = observe_target(&raw);
    assert!(a.ptr_eq(&b));

    match observe(Value::Proxy(a.clone())) {
        Value::Proxy(p) => assert!(p.ptr_eq(&a)),
        other => panic!("expected proxy, got {:?}", other),
    }
}

#[test]
fn test_unwrap_roundtrip() {
    let raw = Target::object();
    match unwrap(observe(Value::Target(raw.clone()))) {
        Value::Target(t) => assert_eq!(t.id(), raw.id()),
        other => panic!("expected target, got {:?}", other),
    }
    match unwrap(Value::Target(raw.clone())) {
        Value::Target(t) => assert_eq!(t.id(), raw.id()),
        other => panic!("expected target, got {:?}", other),
    }
}

#[test]
fn test_no_trigger_on_unchanged_value() {
    let obs = observe_target(&Target::object());
    obs.set("a", Value::from(1));

    let o = obs.clone();
    let runs = counting_effect(move || {
        let _ = o.get("a");
    });
    assert_eq!(runs.get(), 1);

    obs.set("a", Value::from(1));
    assert_eq!(runs.get(), 1);

    obs.set("a", Value::from(2));
    assert_eq!(runs.get(), 2);
}

#[test]
fn test_structural_trigger_via_iteration_only() {
    let obs = observe_target(&Target::object());

    // Track shape only: enumerate keys, never read individual values.
    let o = obs.clone();
    let runs = counting_effect(move || {
        let _ = o.keys();
    });
    assert_eq!(runs.get(), 1);

    // Adding a key is a structural change: exactly one re-run.
    obs.set("x", Value::from(1));
    assert_eq!(runs.get(), 2);

    // Mutating the existing key's value is not structural, and `x` itself
    // was never individually read, so no re-run.
    obs.set("x", Value::from(2));
    assert_eq!(runs.get(), 2);

    // Deleting is structural again.
    obs.delete("x");
    assert_eq!(runs.get(), 3);
}

#[test]
fn test_branch_narrowing() {
    let obs = observe_target(&Target::object());
    obs.set("run", Value::from(true));
    obs.set("prop", Value::string("value"));

    let o = obs.clone();
    let runs = counting_effect(move || {
        if o.get("run").as_bool().unwrap_or(false) {
            let _ = o.get("prop");
        }
    });
    assert_eq!(runs.get(), 1);

    obs.set("prop", Value::string("other"));
    assert_eq!(runs.get(), 2);

    // Take the branch out: the effect must drop its subscription to `prop`.
    obs.set("run", Value::from(false));
    assert_eq!(runs.get(), 3);

    obs.set("prop", Value::string("unseen"));
    assert_eq!(runs.get(), 3);

    // And rediscover it once the branch is live again.
    obs.set("run", Value::from(true));
    assert_eq!(runs.get(), 4);
    obs.set("prop", Value::string("seen"));
    assert_eq!(runs.get(), 5);
}

#[test]
fn test_immutable_lock() {
    let raw = Target::object();
    raw.set_raw("a", Value::from(1));
    let im = immutable_target(&raw);

    let o = im.clone();
    let runs = counting_effect(move || {
        let _ = o.get("a");
    });
    assert_eq!(runs.get(), 1);

    // Locked: the write is absorbed, reports success, changes nothing,
    // re-runs nothing.
    assert!(im.set("a", Value::from(2)));
    assert_eq!(im.get("a").as_number(), Some(1.0));
    assert_eq!(runs.get(), 1);

    // Unlocked: the write lands and triggers.
    unlock();
    im.set("a", Value::from(2));
    lock();
    assert_eq!(im.get("a").as_number(), Some(2.0));
    assert_eq!(runs.get(), 2);
}

#[test]
fn test_stopped_effect_is_terminal() {
    let obs = observe_target(&Target::object());
    obs.set("a", Value::from(1));

    let runs = Rc::new(Cell::new(0));
    let r = runs.clone();
    let o = obs.clone();
    let e = effect(
        move || {
            r.set(r.get() + 1);
            let _ = o.get("a");
        },
        EffectOptions::default(),
    );
    assert_eq!(runs.get(), 1);

    stop(&e);
    obs.set("a", Value::from(2));
    assert_eq!(runs.get(), 1);

    // Manual invocation still works, untracked.
    e.run();
    assert_eq!(runs.get(), 2);
    obs.set("a", Value::from(3));
    assert_eq!(runs.get(), 2);
}

#[test]
fn test_array_length_tracking() {
    let arr = observe_target(&Target::array_from(vec![Value::from(1)]));

    let a = arr.clone();
    let runs = counting_effect(move || {
        let _ = a.len();
    });
    assert_eq!(runs.get(), 1);

    arr.push(Value::from(2));
    assert_eq!(runs.get(), 2);

    // In-place value change leaves the length dependency alone.
    arr.set_index(0, Value::from(9));
    assert_eq!(runs.get(), 2);
}

#[test]
fn test_nested_object_reactivity() {
    let inner = Target::object();
    inner.set_raw("n", Value::from(1));
    let outer = observe_target(&Target::object());
    outer.set("inner", Value::Target(inner));

    let o = outer.clone();
    let seen = Rc::new(Cell::new(0.0));
    let s = seen.clone();
    effect(
        move || {
            if let Value::Proxy(p) = o.get("inner") {
                s.set(p.get("n").as_number().unwrap_or(f64::NAN));
            }
        },
        EffectOptions::default(),
    );
    assert_eq!(seen.get(), 1.0);

    // Mutating through a fresh wrap of the same nested target re-runs:
    // identical target, identical handle, identical dependency set.
    if let Value::Proxy(p) = outer.get("inner") {
        p.set("n", Value::from(7));
    }
    assert_eq!(seen.get(), 7.0);
}

#[test]
fn test_self_mutating_effect_terminates() {
    let obs = observe_target(&Target::object());
    obs.set("n", Value::from(0.0));

    // Reads and writes the same key: the inline guard must prevent
    // unbounded recursion while letting the mutation land.
    let o = obs.clone();
    let runs = counting_effect(move || {
        let n = o.get("n").as_number().unwrap_or(0.0);
        if n < 3.0 {
            o.set("n", Value::from(n + 1.0));
        }
    });
    assert!(runs.get() >= 1);
    assert!(obs.get("n").as_number().unwrap_or(0.0) >= 1.0);
}
