use std::cell::Cell;

// The lock is one process-wide flag, not a per-object or scoped guard.
// Nested unlock()/lock() pairs across interleaved logical operations are
// not reentrancy-safe: every unlock() must be paired with a lock() in the
// same synchronous extent. This is a documented sharp edge of the
// contract, kept as-is.

thread_local! {
    static LOCKED: Cell<bool> = const { Cell::new(true) };
}

/// Re-engages the gate: writes through immutable handles become warned
/// no-ops again.
pub fn lock() {
    LOCKED.with(|l| l.set(true));
}

/// Disengages the gate so trusted internal code can write through
/// immutable handles; such writes trigger normally.
pub fn unlock() {
    LOCKED.with(|l| l.set(false));
}

pub(crate) fn is_locked() -> bool {
    LOCKED.with(|l| l.get())
}
