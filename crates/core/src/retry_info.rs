// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `RetryInfo`: task-level retry bookkeeping for the dispatcher-driven
//! retry ladder. Distinct from the network-class retries `rn-vcs`/
//! `rn-llm` perform internally inside a single run.

use crate::id::TaskId;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryInfo {
    pub task_id: TaskId,
    pub retry_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_eligible_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_failure_reason: Option<String>,
}

impl RetryInfo {
    pub fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            retry_count: 0,
            last_attempt_at: None,
            next_eligible_at: None,
            last_failure_reason: None,
        }
    }

    /// A task whose `retry_count >= policy.max_retries` is permanently
    /// Failed (spec.md §5, task-class ladder).
    pub fn exhausted(&self, policy: &RetryPolicy) -> bool {
        self.retry_count >= policy.max_retries
    }

    /// Record a failed attempt at `now_ms` and, unless exhausted, compute
    /// `next_eligible_at` via `min(initial * base^(retry_count-1),
    /// max_delay)` using the now-incremented `retry_count`.
    pub fn record_failure(&mut self, reason: impl Into<String>, now_ms: u64, policy: &RetryPolicy) {
        self.last_attempt_at = Some(now_ms);
        self.last_failure_reason = Some(reason.into());
        self.retry_count += 1;
        if self.exhausted(policy) {
            self.next_eligible_at = None;
        } else {
            let delay = policy.delay(self.retry_count.saturating_sub(1));
            self.next_eligible_at = Some(now_ms + delay.as_millis() as u64);
        }
    }
}

#[cfg(test)]
#[path = "retry_info_tests.rs"]
mod tests;
