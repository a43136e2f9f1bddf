// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `RunnerInstance`: the Parallel Coordinator's record of one live runner,
//! one JSON file per runner in a shared coordination directory.

use crate::id::{RunnerId, TaskId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerInstance {
    pub runner_id: RunnerId,
    pub task_id: TaskId,
    pub spec_name: String,
    pub workspace_path: String,
    pub start_time: u64,
    pub last_heartbeat: u64,
    #[serde(default)]
    pub files_locked: BTreeSet<String>,
    #[serde(default)]
    pub branches_used: BTreeSet<String>,
}

impl RunnerInstance {
    pub fn new(
        runner_id: RunnerId,
        task_id: TaskId,
        spec_name: impl Into<String>,
        workspace_path: impl Into<String>,
        now_ms: u64,
    ) -> Self {
        Self {
            runner_id,
            task_id,
            spec_name: spec_name.into(),
            workspace_path: workspace_path.into(),
            start_time: now_ms,
            last_heartbeat: now_ms,
            files_locked: BTreeSet::new(),
            branches_used: BTreeSet::new(),
        }
    }

    /// A record is stale once its heartbeat has not been refreshed within
    /// `heartbeat_timeout_ms` of `now_ms` (spec.md §8 property 6).
    pub fn is_stale(&self, now_ms: u64, heartbeat_timeout_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_heartbeat) > heartbeat_timeout_ms
    }

    pub fn heartbeat(&mut self, now_ms: u64) {
        self.last_heartbeat = now_ms;
    }

    /// Human-readable conflict descriptions against another live record's
    /// locked sets, used by `Coordinator::detect_conflicts`.
    pub fn conflicts_with(&self, other: &RunnerInstance) -> Vec<String> {
        let mut conflicts = Vec::new();
        for f in self.files_locked.intersection(&other.files_locked) {
            conflicts.push(format!(
                "file {f} also locked by runner {}",
                other.runner_id
            ));
        }
        for b in self.branches_used.intersection(&other.branches_used) {
            conflicts.push(format!(
                "branch {b} also in use by runner {}",
                other.runner_id
            ));
        }
        conflicts
    }
}

#[cfg(test)]
#[path = "runner_instance_tests.rs"]
mod tests;
