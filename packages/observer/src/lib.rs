//! # Willow Observer
//!
//! Fine-grained reactive dependency tracking for the Willow runtime.
//!
//! The observer wraps structured values ([`Target`]) in tracked handles
//! ([`Observed`]): reads through a handle record dependency edges for the
//! innermost running computation ([`Effect`]), writes notify exactly the
//! computations whose edges they touch. Derived values ([`Computed`]) cache
//! lazily and re-expose their edges; [`ValueCell`] is a one-field box;
//! an immutability lock turns writes through immutable handles into warned
//! no-ops until explicitly unlocked.
//!
//! ## Invariants
//!
//! - Wrapping the same target twice yields the reference-identical handle;
//!   wrapping a handle is idempotent.
//! - Raw storage never holds a handle; reads never leak a raw target.
//! - A write that does not change the value triggers nothing.
//! - Structural changes (add/delete) notify both the concrete-key
//!   subscribers and the iteration-sentinel subscribers; plain value
//!   changes notify only the concrete key.
//! - Each computation's edges are torn down before every re-run, so
//!   branches no longer taken stop being tracked.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use willow_observer::{observe_target, effect, EffectOptions, Target, Value};
//!
//! let state = observe_target(&Target::object());
//! state.set("count", Value::from(0));
//!
//! let s = state.clone();
//! effect(move || {
//!     println!("count = {:?}", s.get("count"));
//! }, EffectOptions::default());
//!
//! state.set("count", Value::from(1)); // effect re-runs
//! ```

pub mod cell;
pub mod computed;
pub mod effect;
pub mod lock;
pub mod observe;
mod registry;
pub mod value;

pub use cell::ValueCell;
pub use computed::{computed, Computed};
pub use effect::{
    effect, stop, track, trigger, AccessKind, ChangeKind, Effect, EffectOptions, Key, Scheduler,
    TrackEvent, TriggerEvent,
};
pub use lock::{lock, unlock};
pub use observe::{
    immutable, immutable_target, is_immutable, is_observed, mark_immutable, mark_non_reactive,
    observe, observe_target, unwrap, Observed,
};
pub use value::{Shape, Target, TargetId, Value};
