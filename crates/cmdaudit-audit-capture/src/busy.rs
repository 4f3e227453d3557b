//! Per-thread marker for code running inside the engine.
//!
//! The engine's own file and socket calls may be intercepted and routed
//! back into [`Auditor::record`](crate::Auditor::record) on the same thread.
//! While the marker is set such calls are dropped instead of taking the
//! session lock a second time.

use std::cell::Cell;
use std::marker::PhantomData;

thread_local! {
    static DEPTH: Cell<u32> = const { Cell::new(0) };
}

/// Whether the current thread is inside the engine. A thread whose locals
/// are already torn down counts as inside.
pub(crate) fn is_inside() -> bool {
    DEPTH.try_with(|d| d.get() > 0).unwrap_or(true)
}

pub(crate) fn enter_raw() {
    let _ = DEPTH.try_with(|d| d.set(d.get() + 1));
}

pub(crate) fn leave_raw() {
    let _ = DEPTH.try_with(|d| d.set(d.get().saturating_sub(1)));
}

/// Holds the marker until dropped. Bound to the thread that made it.
#[derive(Debug)]
pub(crate) struct EngineScope {
    _thread_bound: PhantomData<*const ()>,
}

impl EngineScope {
    pub(crate) fn enter() -> Self {
        enter_raw();
        Self {
            _thread_bound: PhantomData,
        }
    }
}

impl Drop for EngineScope {
    fn drop(&mut self) {
        leave_raw();
    }
}
