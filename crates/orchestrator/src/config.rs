// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tunables for a single [`crate::Orchestrator`] instance.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for an [`crate::Orchestrator`], separate from the
/// per-task fields that live on `TaskContext`.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Branch workspace prep diffs and rebases against. spec.md fixes this
    /// at `"main"`; kept configurable for repos that use a different trunk.
    pub base_branch: String,
    pub max_memory_mb: Option<f64>,
    pub max_cpu_percent: Option<f64>,
    /// Directory for `RunnerStateSnapshot` persistence. `None` disables
    /// persistence entirely (snapshot lives only in memory).
    pub state_dir: Option<PathBuf>,
    pub max_llm_tokens: Option<u32>,
    /// How many directory levels deep the workspace tree in the
    /// implementation prompt descends.
    pub workspace_tree_max_depth: usize,
    /// Per-file truncation limit for `related_files` content embedded in
    /// the implementation prompt.
    pub related_file_max_bytes: usize,
    /// Upper bound on how long a task will sleep waiting for parallel
    /// admission before registering anyway.
    pub admission_wait_cap: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            base_branch: "main".to_string(),
            max_memory_mb: None,
            max_cpu_percent: None,
            state_dir: None,
            max_llm_tokens: None,
            workspace_tree_max_depth: 4,
            related_file_max_bytes: 100_000,
            admission_wait_cap: Duration::from_secs(60),
        }
    }
}
