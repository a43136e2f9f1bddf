// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `CoordinationGuard`: the coordination context spec.md §4.6 describes —
//! auto-heartbeats at a configured interval and guarantees `unregister`
//! on scope exit, even on abnormal termination within the process.

use crate::coordinator::Coordinator;
use rn_core::RunnerId;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Default auto-heartbeat interval, per spec.md §4.6.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

pub struct CoordinationGuard {
    coordinator: Arc<Coordinator>,
    runner_id: RunnerId,
    heartbeat_task: Option<JoinHandle<()>>,
}

impl CoordinationGuard {
    /// Spawn the background heartbeat task. `runner_id` must already be
    /// registered with `coordinator`.
    pub fn new(coordinator: Arc<Coordinator>, runner_id: RunnerId) -> Self {
        Self::with_interval(coordinator, runner_id, DEFAULT_HEARTBEAT_INTERVAL)
    }

    pub fn with_interval(
        coordinator: Arc<Coordinator>,
        runner_id: RunnerId,
        interval: Duration,
    ) -> Self {
        let task_coordinator = coordinator.clone();
        let task_runner_id = runner_id.clone();
        let heartbeat_task = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                task_coordinator.heartbeat(&task_runner_id);
            }
        });
        Self {
            coordinator,
            runner_id,
            heartbeat_task: Some(heartbeat_task),
        }
    }
}

impl Drop for CoordinationGuard {
    fn drop(&mut self) {
        if let Some(task) = self.heartbeat_task.take() {
            task.abort();
        }
        self.coordinator.unregister(&self.runner_id);
    }
}

#[cfg(test)]
#[path = "guard_tests.rs"]
mod tests;
