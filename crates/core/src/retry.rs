// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exponential backoff retry policy shared by the network-class ladder
//! (LLM calls, git push) and the task-class ladder (dispatcher-driven
//! retries via `RetryInfo`). Both are the same `delay(n) = min(initial *
//! base^n, max_delay)` formula with different defaults.

use std::time::Duration;

/// Exponential backoff schedule bounded by a maximum delay and attempt count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub exponential_base: f64,
}

impl RetryPolicy {
    pub fn new(
        max_retries: u32,
        initial_delay: Duration,
        max_delay: Duration,
        exponential_base: f64,
    ) -> Self {
        Self {
            max_retries,
            initial_delay,
            max_delay,
            exponential_base,
        }
    }

    /// Network-class default: `{initial: 1s, base: 2, max: 60s, max_retries: 3}`.
    /// Used for LLM calls and git push.
    pub fn network_default() -> Self {
        Self::new(3, Duration::from_secs(1), Duration::from_secs(60), 2.0)
    }

    /// Task-class default: `{initial: 1s, base: 2, max: 300s, max_attempts: 3}`.
    /// Used by the dispatcher-driven `RetryInfo` ladder.
    pub fn task_default() -> Self {
        Self::new(3, Duration::from_secs(1), Duration::from_secs(300), 2.0)
    }

    /// `delay(n) = min(initial * base^n, max_delay)`.
    ///
    /// `attempt` is zero-based (the delay before the *first* retry is
    /// `delay(0)`).
    pub fn delay(&self, attempt: u32) -> Duration {
        let initial_secs = self.initial_delay.as_secs_f64();
        let scaled = initial_secs * self.exponential_base.powi(attempt as i32);
        let capped = scaled.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped.max(0.0))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::network_default()
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
