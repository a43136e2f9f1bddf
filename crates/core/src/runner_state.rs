// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Orchestrator's top-level state machine and its on-disk snapshot.
//!
//! `{Idle, Running, Completed, Failed}`, with `Idle -> Running`,
//! `Running -> {Completed, Failed}`, and `{Completed, Failed} -> Idle`
//! (reset) the only legal transitions. Every other pair is rejected
//! without mutating state.

use crate::error::RunnerError;
use crate::id::RunnerId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerState {
    Idle,
    Running,
    Completed,
    Failed,
}

impl RunnerState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunnerState::Completed | RunnerState::Failed)
    }

    /// Whether `self -> next` is one of the five allowed edges in the DAG.
    pub fn can_transition(self, next: RunnerState) -> bool {
        use RunnerState::*;
        matches!(
            (self, next),
            (Idle, Running) | (Running, Completed) | (Running, Failed) | (Completed, Idle) | (Failed, Idle)
        )
    }

    /// Validate `self -> next`, raising [`RunnerError::ContextInvalid`] on
    /// any edge not in the allowed set (property 1: state unchanged on
    /// rejection — callers must not mutate state until this returns `Ok`).
    pub fn validate_transition(self, next: RunnerState) -> Result<(), RunnerError> {
        if self.can_transition(next) {
            Ok(())
        } else {
            Err(RunnerError::context_invalid(format!(
                "illegal transition {self:?} -> {next:?}"
            )))
        }
    }
}

impl std::fmt::Display for RunnerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Persistable snapshot written to a per-runner file on every state
/// transition. Readable by any process knowing the path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerStateSnapshot {
    pub runner_id: RunnerId,
    pub state: RunnerState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<u64>,
    pub last_updated: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_path: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl RunnerStateSnapshot {
    pub fn new(runner_id: RunnerId, now_ms: u64) -> Self {
        Self {
            runner_id,
            state: RunnerState::Idle,
            task_id: None,
            spec_name: None,
            start_time: None,
            last_updated: now_ms,
            workspace_path: None,
            metadata: HashMap::new(),
        }
    }

    /// Apply a validated transition, stamping `last_updated`. Returns the
    /// transition error unmutated (property 1) on an illegal edge.
    pub fn advance(&mut self, next: RunnerState, now_ms: u64) -> Result<(), RunnerError> {
        self.state.validate_transition(next)?;
        self.state = next;
        self.last_updated = now_ms;
        Ok(())
    }
}

#[cfg(test)]
#[path = "runner_state_tests.rs"]
mod tests;
