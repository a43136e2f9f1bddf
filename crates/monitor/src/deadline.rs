// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A single future wall-clock instant, checked by polling rather than a
//! background timer. The Orchestrator calls `check` at every phase
//! boundary, so there is no need for the original's timer thread.

use parking_lot::Mutex;
use rn_core::Clock;
use std::sync::Arc;

type TimeoutCallback = Box<dyn FnMut() + Send>;

struct State {
    start_ms: Option<u64>,
    timed_out: bool,
    callback: Option<TimeoutCallback>,
}

/// Tracks elapsed vs. a fixed timeout and fires an optional callback
/// exactly once on expiry.
pub struct Deadline {
    clock: Arc<dyn Clock>,
    timeout_ms: u64,
    state: Mutex<State>,
}

impl Deadline {
    pub fn new(clock: Arc<dyn Clock>, timeout_ms: u64) -> Self {
        Self {
            clock,
            timeout_ms,
            state: Mutex::new(State {
                start_ms: None,
                timed_out: false,
                callback: None,
            }),
        }
    }

    /// Starts (or restarts) the deadline, clearing any prior timeout state.
    pub fn start(&self, callback: Option<TimeoutCallback>) {
        let mut state = self.state.lock();
        state.start_ms = Some(self.clock.epoch_ms());
        state.timed_out = false;
        state.callback = callback;
    }

    /// No timer to cancel; present for lifecycle symmetry with the other
    /// monitor sub-services.
    pub fn stop(&self) {}

    /// Re-evaluates elapsed time against the timeout. Returns `true` if
    /// timed out (whether newly so or already). Invokes the callback
    /// exactly once, on the transition into the timed-out state.
    pub fn check(&self) -> bool {
        let mut state = self.state.lock();
        if state.timed_out {
            return true;
        }
        let Some(start_ms) = state.start_ms else {
            return false;
        };
        let elapsed = self.clock.epoch_ms().saturating_sub(start_ms);
        if elapsed >= self.timeout_ms {
            state.timed_out = true;
            if let Some(callback) = state.callback.as_mut() {
                callback();
            }
            true
        } else {
            false
        }
    }

    pub fn is_timed_out(&self) -> bool {
        self.state.lock().timed_out
    }

    pub fn get_elapsed_ms(&self) -> u64 {
        let state = self.state.lock();
        match state.start_ms {
            Some(start_ms) => self.clock.epoch_ms().saturating_sub(start_ms),
            None => 0,
        }
    }

    pub fn get_remaining_ms(&self) -> u64 {
        if self.state.lock().timed_out {
            return 0;
        }
        self.timeout_ms.saturating_sub(self.get_elapsed_ms())
    }
}

#[cfg(test)]
#[path = "deadline_tests.rs"]
mod tests;
