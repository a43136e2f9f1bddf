// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `TaskContext`: the immutable input a dispatcher hands to a Runner.

use crate::error::RunnerError;
use crate::id::{SlotId, TaskId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;

/// Coarse sizing hint for a task, used to shape the LLM prompt's technical
/// context block and nothing else — the core does not branch its own
/// control flow on this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Trivial,
    Small,
    Medium,
    Large,
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Complexity::Trivial => "trivial",
            Complexity::Small => "small",
            Complexity::Medium => "medium",
            Complexity::Large => "large",
        };
        write!(f, "{s}")
    }
}

/// Immutable input for one task execution. Received once by the
/// Orchestrator and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskContext {
    pub task_id: TaskId,
    pub spec_name: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub branch_name: String,
    pub slot_path: PathBuf,
    pub slot_id: SlotId,
    #[serde(default)]
    pub playbook_path: Option<PathBuf>,
    #[serde(default)]
    pub test_commands: Option<Vec<String>>,
    #[serde(default)]
    pub fail_fast: bool,
    pub timeout_seconds: u64,
    #[serde(default)]
    pub complexity: Option<Complexity>,
    #[serde(default)]
    pub require_review: bool,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    /// Paths (relative to `slot_path`) whose content is inlined into the
    /// LLM prompt.
    #[serde(default)]
    pub related_files: Vec<PathBuf>,
    /// Skill tag surfaced in the LLM prompt's technical-context block.
    #[serde(default)]
    pub required_skill: Option<String>,
}

impl TaskContext {
    /// Validate the invariants spec.md §3 requires. Raises
    /// [`RunnerError::ContextInvalid`] without any side effect or state
    /// transition — this runs before the Orchestrator transitions to
    /// `Running`.
    pub fn validate(&self) -> Result<(), RunnerError> {
        if self.task_id.as_str().is_empty() {
            return Err(RunnerError::context_invalid("task_id must not be empty"));
        }
        if self.spec_name.is_empty() {
            return Err(RunnerError::context_invalid("spec_name must not be empty"));
        }
        if self.title.is_empty() {
            return Err(RunnerError::context_invalid("title must not be empty"));
        }
        if self.description.is_empty() {
            return Err(RunnerError::context_invalid(
                "description must not be empty",
            ));
        }
        if self.slot_id.as_str().is_empty() {
            return Err(RunnerError::context_invalid("slot_id must not be empty"));
        }
        if self.branch_name.is_empty() {
            return Err(RunnerError::context_invalid(
                "branch_name must not be empty",
            ));
        }
        if !self.slot_path.is_dir() {
            return Err(RunnerError::context_invalid(format!(
                "slot_path does not exist or is not a directory: {}",
                self.slot_path.display()
            )));
        }
        if self.timeout_seconds == 0 {
            return Err(RunnerError::context_invalid(
                "timeout_seconds must be greater than zero",
            ));
        }
        // branch_name prefix convention is enforced by the Permission Gate
        // at push time, not here (spec.md §3 invariant note).
        Ok(())
    }
}

#[cfg(test)]
#[path = "task_context_tests.rs"]
mod tests;
