// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Coordinator`: a file-backed, stateless-in-memory registry of live
//! Runner instances. All state lives in one JSON file per runner under a
//! coordination directory, so arbitrary numbers of cooperating processes
//! on one filesystem can register, heartbeat, and detect conflicts
//! without a shared in-process data structure. An in-process mutex
//! serializes this process's own filesystem IO; cross-process safety
//! rests on atomic per-file writes (`rn_core::snapshot`).

use parking_lot::Mutex;
use rn_core::snapshot::{read_if_exists, write_atomic};
use rn_core::{Clock, RunnerId, RunnerInstance, SystemClock, TaskId};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, warn};

/// Default heartbeat staleness threshold, per spec.md §4.6.
pub const DEFAULT_HEARTBEAT_TIMEOUT_MS: u64 = 300_000;
/// Wait-time heuristic's default assumed average task duration.
const DEFAULT_ESTIMATED_TASK_SECONDS: u64 = 1_800;

pub struct Coordinator {
    coordination_dir: PathBuf,
    max_parallel_runners: Option<u32>,
    heartbeat_timeout_ms: u64,
    estimated_task_ms: u64,
    clock: Arc<dyn Clock>,
    io_lock: Mutex<()>,
}

impl Coordinator {
    pub fn new(coordination_dir: impl Into<PathBuf>) -> Self {
        Self::with_clock(coordination_dir, Arc::new(SystemClock))
    }

    pub fn with_clock(coordination_dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            coordination_dir: coordination_dir.into(),
            max_parallel_runners: None,
            heartbeat_timeout_ms: DEFAULT_HEARTBEAT_TIMEOUT_MS,
            estimated_task_ms: DEFAULT_ESTIMATED_TASK_SECONDS * 1_000,
            clock,
            io_lock: Mutex::new(()),
        }
    }

    pub fn with_max_parallel_runners(mut self, max: Option<u32>) -> Self {
        self.max_parallel_runners = max;
        self
    }

    pub fn with_heartbeat_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.heartbeat_timeout_ms = timeout_ms;
        self
    }

    /// Overrides the wait-time heuristic's assumed average task duration
    /// (default 1800s), so callers whose tasks run much shorter or longer
    /// than that can tune admission waits without forking the crate.
    pub fn with_estimated_task_seconds(mut self, seconds: u64) -> Self {
        self.estimated_task_ms = seconds * 1_000;
        self
    }

    fn record_path(&self, runner_id: &RunnerId) -> PathBuf {
        self.coordination_dir.join(format!("{runner_id}.json"))
    }

    fn load(&self, runner_id: &RunnerId) -> Option<RunnerInstance> {
        match read_if_exists(&self.record_path(runner_id)) {
            Ok(instance) => instance,
            Err(e) => {
                error!(%runner_id, error = %e, "failed to read coordination record");
                None
            }
        }
    }

    fn save(&self, instance: &RunnerInstance) {
        if let Err(e) = write_atomic(&self.record_path(&instance.runner_id), instance) {
            error!(runner_id = %instance.runner_id, error = %e, "failed to write coordination record");
        }
    }

    /// Remove every record whose heartbeat is older than the configured
    /// timeout. Must be called under `io_lock`.
    fn sweep_stale(&self) {
        let now = self.clock.epoch_ms();
        let entries = match std::fs::read_dir(&self.coordination_dir) {
            Ok(entries) => entries,
            Err(_) => return,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Ok(Some(instance)) = read_if_exists::<RunnerInstance>(&path) {
                if instance.is_stale(now, self.heartbeat_timeout_ms) {
                    let _ = std::fs::remove_file(&path);
                }
            }
        }
    }

    /// All non-stale records currently on disk.
    fn active_runners(&self) -> Vec<RunnerInstance> {
        let entries = match std::fs::read_dir(&self.coordination_dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };
        entries
            .flatten()
            .filter(|entry| entry.path().extension().and_then(|e| e.to_str()) == Some("json"))
            .filter_map(|entry| read_if_exists::<RunnerInstance>(&entry.path()).ok().flatten())
            .collect()
    }

    /// Register a new runner instance after sweeping stale records.
    /// Rejects if at capacity or if another live record already claims
    /// `workspace_path`.
    pub fn register(
        &self,
        runner_id: RunnerId,
        task_id: TaskId,
        spec_name: impl Into<String>,
        workspace_path: impl Into<String>,
    ) -> bool {
        let _guard = self.io_lock.lock();
        std::fs::create_dir_all(&self.coordination_dir).ok();
        self.sweep_stale();

        let workspace_path = workspace_path.into();
        let active = self.active_runners();

        if let Some(max) = self.max_parallel_runners {
            if active.len() as u32 >= max {
                warn!(active = active.len(), max, "parallel runner cap reached");
                return false;
            }
        }

        if active.iter().any(|r| r.workspace_path == workspace_path) {
            warn!(%workspace_path, "workspace already claimed by another runner");
            return false;
        }

        let now = self.clock.epoch_ms();
        let instance = RunnerInstance::new(runner_id, task_id, spec_name, workspace_path, now);
        self.save(&instance);
        true
    }

    pub fn unregister(&self, runner_id: &RunnerId) {
        let _guard = self.io_lock.lock();
        let path = self.record_path(runner_id);
        if path.exists() {
            if let Err(e) = std::fs::remove_file(&path) {
                error!(%runner_id, error = %e, "failed to unregister runner");
            }
        }
    }

    pub fn heartbeat(&self, runner_id: &RunnerId) {
        let _guard = self.io_lock.lock();
        let Some(mut instance) = self.load(runner_id) else {
            warn!(%runner_id, "heartbeat for unknown runner, ignoring");
            return;
        };
        instance.heartbeat(self.clock.epoch_ms());
        self.save(&instance);
    }

    pub fn update_resources(
        &self,
        runner_id: &RunnerId,
        files: Option<Vec<String>>,
        branches: Option<Vec<String>>,
    ) {
        let _guard = self.io_lock.lock();
        let Some(mut instance) = self.load(runner_id) else {
            warn!(%runner_id, "resource update for unknown runner, ignoring");
            return;
        };
        if let Some(files) = files {
            instance.files_locked = files.into_iter().collect();
        }
        if let Some(branches) = branches {
            instance.branches_used = branches.into_iter().collect();
        }
        instance.heartbeat(self.clock.epoch_ms());
        self.save(&instance);
    }

    /// Conflict descriptions against every other live record's locked
    /// sets. Point-in-time and advisory: callers decide whether to
    /// proceed.
    pub fn detect_conflicts(
        &self,
        runner_id: &RunnerId,
        files: &[String],
        branches: &[String],
    ) -> Vec<String> {
        let _guard = self.io_lock.lock();
        self.sweep_stale();

        let mut probe = RunnerInstance::new(
            runner_id.clone(),
            TaskId::default(),
            String::new(),
            String::new(),
            self.clock.epoch_ms(),
        );
        probe.files_locked = files.iter().cloned().collect();
        probe.branches_used = branches.iter().cloned().collect();

        self.active_runners()
            .into_iter()
            .filter(|other| &other.runner_id != runner_id)
            .flat_map(|other| probe.conflicts_with(&other))
            .collect()
    }

    pub fn concurrent_count(&self) -> u32 {
        let _guard = self.io_lock.lock();
        self.sweep_stale();
        self.active_runners().len() as u32
    }

    /// `max(0, estimated_task_ms - elapsed)` of the oldest active runner,
    /// or 0 when unbounded or under capacity.
    pub fn wait_time_ms(&self) -> u64 {
        let _guard = self.io_lock.lock();
        self.sweep_stale();
        let active = self.active_runners();

        let Some(max) = self.max_parallel_runners else {
            return 0;
        };
        if (active.len() as u32) < max {
            return 0;
        }
        let now = self.clock.epoch_ms();
        let Some(oldest) = active.iter().min_by_key(|r| r.start_time) else {
            return 0;
        };
        let elapsed = now.saturating_sub(oldest.start_time);
        self.estimated_task_ms.saturating_sub(elapsed)
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
