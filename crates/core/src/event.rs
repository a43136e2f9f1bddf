// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events a Runner emits as it moves through its phases. These are the
//! payloads `rn-registry` ships to `POST /tasks/{id}/events`, and are
//! also what gets logged at `tracing::info!` level.

use crate::id::TaskId;
use crate::results::{Artifact, RunnerResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TaskStarted {
        task_id: TaskId,
        at_ms: u64,
    },
    /// `phase` names the Run-protocol step just entered, e.g.
    /// `"prepare_workspace"`, `"implement"`, `"test"`.
    TaskAdvanced {
        task_id: TaskId,
        phase: String,
        at_ms: u64,
    },
    TaskCompleted {
        task_id: TaskId,
        result: Box<RunnerResult>,
        at_ms: u64,
    },
    TaskFailed {
        task_id: TaskId,
        error_kind: String,
        message: String,
        at_ms: u64,
    },
    ArtifactUploaded {
        task_id: TaskId,
        artifact: Artifact,
        at_ms: u64,
    },
}

impl Event {
    pub fn task_id(&self) -> &TaskId {
        match self {
            Event::TaskStarted { task_id, .. }
            | Event::TaskAdvanced { task_id, .. }
            | Event::TaskCompleted { task_id, .. }
            | Event::TaskFailed { task_id, .. }
            | Event::ArtifactUploaded { task_id, .. } => task_id,
        }
    }

    pub fn at_ms(&self) -> u64 {
        match self {
            Event::TaskStarted { at_ms, .. }
            | Event::TaskAdvanced { at_ms, .. }
            | Event::TaskCompleted { at_ms, .. }
            | Event::TaskFailed { at_ms, .. }
            | Event::ArtifactUploaded { at_ms, .. } => *at_ms,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
