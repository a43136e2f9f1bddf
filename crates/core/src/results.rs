// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output types produced by each phase, and the final `RunnerResult`
//! reported back to the dispatcher. Every result type carries a numeric
//! `duration_seconds` and a `success` flag.

use crate::id::TaskId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;

/// One file-level edit the LLM asked to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOperation {
    Create,
    Modify,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeChange {
    pub file_path: PathBuf,
    pub operation: ChangeOperation,
    pub content: String,
}

/// Output of the Implement phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplementationResult {
    pub success: bool,
    pub duration_seconds: f64,
    pub files_changed: Vec<PathBuf>,
    pub explanation: String,
    pub model: String,
    pub tokens_used: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleTestResult {
    pub name: String,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Output of the Test phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub success: bool,
    pub duration_seconds: f64,
    pub results: Vec<SingleTestResult>,
    pub exit_code: i32,
}

impl TestResult {
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }
}

/// Output of the Commit & push phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushResult {
    pub success: bool,
    pub duration_seconds: f64,
    pub branch: String,
    pub commit_hash: String,
    pub retry_count: u32,
}

/// Artifact type, matching the Artifact Store's `type ∈ {diff, log, test}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Diff,
    Log,
    Test,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    /// Opaque URI returned by the Artifact Store.
    pub uri: String,
    pub size_bytes: u64,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    pub created_at_ms: u64,
}

/// The terminal report a Runner hands back from `Run`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerResult {
    pub task_id: TaskId,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_seconds: f64,
    pub implementation: Option<ImplementationResult>,
    pub tests: Option<TestResult>,
    pub push: Option<PushResult>,
    pub artifacts: Vec<Artifact>,
    /// Observed at start, per spec.md §3.
    pub concurrent_runners: u32,
    pub workspace_path: PathBuf,
}

#[cfg(test)]
#[path = "results_tests.rs"]
mod tests;
