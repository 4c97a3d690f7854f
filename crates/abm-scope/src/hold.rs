//! The pause / hold gate shared between a running simulation and its host.
//!
//! This is the only blocking point in the runtime.  The gate lives behind an
//! `Arc<(Mutex<_>, Condvar)>`; the scope owns one end and hands out
//! [`HoldController`] clones to whoever drives interactive stepping.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use tracing::debug;

#[derive(Debug, Default)]
struct GateState {
    held:            bool,
    abort_requested: bool,
}

type Shared = Arc<(Mutex<GateState>, Condvar)>;

fn lock(shared: &Shared) -> MutexGuard<'_, GateState> {
    // A poisoned gate only means a controller thread panicked mid-update;
    // the two flags are still meaningful.
    shared.0.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scope-side end of the gate.
#[derive(Debug, Clone, Default)]
pub struct HoldGate {
    shared: Shared,
}

/// Why [`HoldGate::wait`] returned.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Wake {
    Released,
    AbortRequested,
}

impl HoldGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn controller(&self) -> HoldController {
        HoldController { shared: Arc::clone(&self.shared) }
    }

    pub fn hold(&self) {
        lock(&self.shared).held = true;
    }

    pub fn is_held(&self) -> bool {
        lock(&self.shared).held
    }

    pub fn abort_requested(&self) -> bool {
        lock(&self.shared).abort_requested
    }

    /// Block while the gate is held.  Returns immediately when it is not.
    pub fn wait(&self) -> Wake {
        let (_, cv) = &*self.shared;
        let mut state = lock(&self.shared);
        if state.held {
            debug!("hold gate: suspended");
        }
        while state.held && !state.abort_requested {
            state = cv.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
        if state.abort_requested {
            Wake::AbortRequested
        } else {
            Wake::Released
        }
    }

    /// Forget a consumed abort request.
    pub fn reset(&self) {
        let mut state = lock(&self.shared);
        state.abort_requested = false;
        state.held = false;
    }
}

/// Host-side handle: hold, release or abort a running simulation from any
/// thread.
#[derive(Debug, Clone)]
pub struct HoldController {
    shared: Shared,
}

impl HoldController {
    pub fn hold(&self) {
        lock(&self.shared).held = true;
    }

    pub fn release(&self) {
        lock(&self.shared).held = false;
        self.shared.1.notify_all();
    }

    pub fn request_abort(&self) {
        lock(&self.shared).abort_requested = true;
        self.shared.1.notify_all();
    }

    pub fn is_held(&self) -> bool {
        lock(&self.shared).held
    }
}
