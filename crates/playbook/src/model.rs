// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Playbook`/`PlaybookStep` data model and execution results.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    300
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybookStep {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default = "default_true")]
    pub fail_fast: bool,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub retry_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playbook {
    pub name: String,
    pub steps: Vec<PlaybookStep>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

/// Outcome of running a single step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step_name: String,
    pub command: String,
    pub success: bool,
    pub skipped: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration_seconds: f64,
    pub retry_count: u32,
}

/// Aggregate outcome of running every step in a `Playbook`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybookResult {
    pub playbook_name: String,
    pub success: bool,
    pub step_results: Vec<StepResult>,
    pub total_duration_seconds: f64,
}
