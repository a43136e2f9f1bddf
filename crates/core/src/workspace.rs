// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The git workspace a task runs in: a prepared checkout on a fresh
//! branch. `rn-vcs` does the actual checkout work; this module only
//! describes the resulting shape. Owned by the Orchestrator for the
//! task's lifetime; never shared across Runner instances.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub path: PathBuf,
    pub branch_name: String,
    pub base_branch: String,
}

impl Workspace {
    pub fn new(
        path: PathBuf,
        branch_name: impl Into<String>,
        base_branch: impl Into<String>,
    ) -> Self {
        Self {
            path,
            branch_name: branch_name.into(),
            base_branch: base_branch.into(),
        }
    }

    /// Path to a file or directory inside the workspace, rejecting any
    /// `relative` that would escape `self.path` via `..` segments.
    pub fn resolve(&self, relative: &std::path::Path) -> Option<PathBuf> {
        if relative
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return None;
        }
        Some(self.path.join(relative))
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
