//! One-shot latch used to hold a handler mid-execution.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct Gate {
    state: Mutex<GateState>,
    changed: Condvar,
}

#[derive(Debug, Default)]
struct GateState {
    entered: bool,
    released: bool,
}

impl Gate {
    /// Blocks the caller until [`Gate::release`] is called.
    pub fn hold(&self) {
        let mut state = self.state.lock().expect("gate mutex poisoned");
        state.entered = true;
        self.changed.notify_all();
        while !state.released {
            state = self.changed.wait(state).expect("gate mutex poisoned");
        }
    }

    /// Waits until a caller is blocked in [`Gate::hold`].
    pub fn wait_entered(&self, timeout: Duration) -> bool {
        let state = self.state.lock().expect("gate mutex poisoned");
        let (state, _) = self
            .changed
            .wait_timeout_while(state, timeout, |state| !state.entered)
            .expect("gate mutex poisoned");
        state.entered
    }

    pub fn release(&self) {
        self.state.lock().expect("gate mutex poisoned").released = true;
        self.changed.notify_all();
    }
}
