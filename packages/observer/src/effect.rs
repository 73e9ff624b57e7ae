use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::registry;
use crate::value::TargetId;

/// Dependency key within a target: a concrete property, an array index, the
/// array length, or the reserved iteration sentinel that stands for "shape
/// changed" (`keys()`, collection size, `for..in`-style reads).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Prop(Rc<str>),
    Index(usize),
    Length,
    Iterate,
}

impl Key {
    pub fn prop(name: &str) -> Key {
        Key::Prop(Rc::from(name))
    }

    /// The reserved key a reactive box routes all its reads/writes through.
    pub fn cell() -> Key {
        Key::Prop(Rc::from(""))
    }

    /// Encodes a collection key for the dependency registry. Primitive keys
    /// encode by value, structured keys by target identity.
    pub fn map_entry(key: &crate::value::Value) -> Key {
        use crate::value::Value;
        let encoded = match key {
            Value::Null => "null:".to_string(),
            Value::Bool(b) => format!("bool:{}", b),
            Value::Number(n) => format!("num:{}", n),
            Value::Str(s) => format!("str:{}", s),
            Value::Cell(c) => format!("cell:{}", c.id()),
            Value::Target(t) => format!("target:{}", t.id()),
            Value::Proxy(p) => format!("target:{}", p.target().id()),
        };
        Key::Prop(Rc::from(encoded.as_str()))
    }
}

/// How a read was observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessKind {
    Get,
    Has,
    Iterate,
}

/// How a write changed the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Set,
    Add,
    Delete,
    Clear,
}

/// Structured event handed to the `on_track` debug hook.
#[derive(Clone, Debug)]
pub struct TrackEvent {
    pub effect_id: u64,
    pub target: TargetId,
    pub kind: AccessKind,
    pub key: Key,
}

/// Structured event handed to the `on_trigger` debug hook.
#[derive(Clone, Debug)]
pub struct TriggerEvent {
    pub effect_id: u64,
    pub target: TargetId,
    pub kind: ChangeKind,
    pub key: Option<Key>,
    pub old_value: Option<crate::value::Value>,
    pub new_value: Option<crate::value::Value>,
}

type EffectFn = Rc<dyn Fn()>;
pub type Scheduler = Rc<dyn Fn(&Effect)>;
pub type TrackHook = Rc<dyn Fn(&TrackEvent)>;
pub type TriggerHook = Rc<dyn Fn(&TriggerEvent)>;

/// One dependency set: the computations subscribed to a single
/// (target, key) pair.
#[derive(Clone)]
pub struct Dep {
    inner: Rc<RefCell<Vec<Effect>>>,
}

impl Dep {
    pub(crate) fn new() -> Dep {
        Dep {
            inner: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Adds the effect unless already subscribed. Returns whether a new
    /// edge was created.
    fn add(&self, effect: &Effect) -> bool {
        let mut subs = self.inner.borrow_mut();
        if subs.iter().any(|e| e.id() == effect.id()) {
            return false;
        }
        subs.push(effect.clone());
        true
    }

    fn remove(&self, effect_id: u64) {
        self.inner.borrow_mut().retain(|e| e.id() != effect_id);
    }

    fn subscribers(&self) -> Vec<Effect> {
        self.inner.borrow().clone()
    }

    fn ptr_eq(&self, other: &Dep) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Optional knobs for [`effect`].
#[derive(Default)]
pub struct EffectOptions {
    /// Do not run on creation; the caller invokes `run` when needed.
    pub lazy: bool,
    /// Receives the effect instead of an inline re-run when a dependency
    /// fires. The tracker itself never batches; that is the host's seam.
    pub scheduler: Option<Scheduler>,
    pub on_track: Option<TrackHook>,
    pub on_trigger: Option<TriggerHook>,
}

struct EffectInner {
    id: u64,
    func: EffectFn,
    active: Cell<bool>,
    deps: RefCell<Vec<Dep>>,
    scheduler: Option<Scheduler>,
    on_track: Option<TrackHook>,
    on_trigger: Option<TriggerHook>,
}

/// A tracked computation.
///
/// Lifecycle: created (inactive until first run) → active with zero or more
/// dependency edges, rebuilt from scratch on every run → stopped. Stopped is
/// terminal: the function can still be invoked manually but nothing is
/// tracked and no trigger will schedule it again.
#[derive(Clone)]
pub struct Effect {
    inner: Rc<EffectInner>,
}

thread_local! {
    static ACTIVE_STACK: RefCell<Vec<Effect>> = const { RefCell::new(Vec::new()) };
    static NEXT_EFFECT_ID: Cell<u64> = const { Cell::new(1) };
}

impl Effect {
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    pub(crate) fn dep_count(&self) -> usize {
        self.inner.deps.borrow().len()
    }

    /// Runs the computation. An active effect first drops every previous
    /// dependency edge, then rebuilds its edges from the reads the function
    /// performs this time; branches no longer taken stop being tracked. A
    /// stopped effect runs untracked.
    pub fn run(&self) {
        if !self.inner.active.get() {
            (self.inner.func)();
            return;
        }
        if on_stack(self.id()) {
            return;
        }
        self.cleanup();
        ACTIVE_STACK.with(|s| s.borrow_mut().push(self.clone()));
        let guard = StackGuard;
        (self.inner.func)();
        drop(guard);
    }

    /// Removes this effect from every dependency set it belongs to.
    fn cleanup(&self) {
        let deps = std::mem::take(&mut *self.inner.deps.borrow_mut());
        for dep in deps {
            dep.remove(self.id());
        }
    }

    /// Propagates this effect's dependency edges into the currently-active
    /// outer computation, deduplicated. Used by derived values so a reader
    /// inherits their transitive dependencies.
    pub(crate) fn propagate_deps(&self) {
        let Some(outer) = active_effect() else { return };
        if outer.id() == self.id() {
            return;
        }
        for dep in self.inner.deps.borrow().iter() {
            if dep.add(&outer) {
                let mut outer_deps = outer.inner.deps.borrow_mut();
                if !outer_deps.iter().any(|d| d.ptr_eq(dep)) {
                    outer_deps.push(dep.clone());
                }
            }
        }
    }
}

struct StackGuard;

impl Drop for StackGuard {
    fn drop(&mut self) {
        ACTIVE_STACK.with(|s| {
            s.borrow_mut().pop();
        });
    }
}

fn active_effect() -> Option<Effect> {
    ACTIVE_STACK.with(|s| s.borrow().last().cloned())
}

fn on_stack(id: u64) -> bool {
    ACTIVE_STACK.with(|s| s.borrow().iter().any(|e| e.id() == id))
}

/// Creates a tracked computation and, unless `lazy`, runs it once to
/// establish its initial dependency edges.
pub fn effect(f: impl Fn() + 'static, options: EffectOptions) -> Effect {
    let id = NEXT_EFFECT_ID.with(|n| {
        let id = n.get();
        n.set(id + 1);
        id
    });
    let e = Effect {
        inner: Rc::new(EffectInner {
            id,
            func: Rc::new(f),
            active: Cell::new(true),
            deps: RefCell::new(Vec::new()),
            scheduler: options.scheduler,
            on_track: options.on_track,
            on_trigger: options.on_trigger,
        }),
    };
    if !options.lazy {
        e.run();
    }
    e
}

/// Deactivates an effect: its edges are removed and it will never be
/// tracked or scheduled again. In-flight invocations are not interrupted.
pub fn stop(e: &Effect) {
    if e.inner.active.get() {
        e.cleanup();
        e.inner.active.set(false);
    }
}

/// Records a read access as a dependency edge from (target, key) to the
/// innermost active computation. Re-registering an existing edge is a
/// no-op. `Iterate` accesses record the sentinel key regardless of `key`.
pub fn track(target: TargetId, kind: AccessKind, key: Key) {
    let Some(effect) = active_effect() else { return };
    let key = if kind == AccessKind::Iterate {
        Key::Iterate
    } else {
        key
    };
    let dep = registry::dep_for(target, key.clone());
    if dep.add(&effect) {
        effect.inner.deps.borrow_mut().push(dep);
        if let Some(hook) = &effect.inner.on_track {
            hook(&TrackEvent {
                effect_id: effect.id(),
                target,
                kind,
                key,
            });
        }
    }
}

/// Notifies the computations affected by a write.
///
/// `Set` reaches only the concrete-key subscribers. `Add`/`Delete` reach
/// those plus the iteration-sentinel subscribers (and, for arrays, the
/// length subscribers). `Clear` reaches every subscriber of the target.
/// Each affected computation runs exactly once per call, inline unless it
/// carries a scheduler; a computation currently on the active stack is not
/// re-entered.
pub fn trigger(
    target: TargetId,
    kind: ChangeKind,
    key: Option<Key>,
    old_value: Option<crate::value::Value>,
    new_value: Option<crate::value::Value>,
) {
    let mut affected: Vec<Effect> = Vec::new();
    let mut collect = |dep: Option<Dep>| {
        if let Some(dep) = dep {
            for e in dep.subscribers() {
                if !affected.iter().any(|a| a.id() == e.id()) {
                    affected.push(e);
                }
            }
        }
    };

    match kind {
        ChangeKind::Clear => {
            for dep in registry::all_deps(target) {
                collect(Some(dep));
            }
        }
        ChangeKind::Set => {
            collect(registry::existing_dep(target, key.clone()));
        }
        ChangeKind::Add | ChangeKind::Delete => {
            collect(registry::existing_dep(target, key.clone()));
            collect(registry::existing_dep(target, Some(Key::Iterate)));
            collect(registry::existing_dep(target, Some(Key::Length)));
        }
    }

    for e in affected {
        // Inline re-entry into a computation already running is excluded;
        // a scheduler still hears about the change and may queue the run
        // for after the outer call completes.
        if e.inner.scheduler.is_none() && on_stack(e.id()) {
            continue;
        }
        if let Some(hook) = &e.inner.on_trigger {
            hook(&TriggerEvent {
                effect_id: e.id(),
                target,
                kind,
                key: key.clone(),
                old_value: old_value.clone(),
                new_value: new_value.clone(),
            });
        }
        match &e.inner.scheduler {
            Some(scheduler) => scheduler(&e),
            None => e.run(),
        }
    }
}
