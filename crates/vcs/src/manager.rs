// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace Manager: a state-free helper that drives the VCS binary
//! through a fixed sequence of operations per task — prepare a branch,
//! stage and commit changes, push with retry, compute a diff, and roll
//! back on failure. Every operation is gated by [`PermissionGate`]
//! before the subprocess runs.

use rn_core::{RetryPolicy, RunnerError, Workspace};
use rn_security::{GitOperation, PermissionGate};
use rn_shell::{run_with_timeout, GIT_TIMEOUT};
use std::path::Path;
use tracing::warn;

/// Drives `git` for one task's workspace. Holds no task state of its own;
/// every method takes the `Workspace` it operates on.
pub struct WorkspaceManager {
    retry_policy: RetryPolicy,
}

impl Default for WorkspaceManager {
    fn default() -> Self {
        Self::new(RetryPolicy::network_default())
    }
}

impl WorkspaceManager {
    pub fn new(retry_policy: RetryPolicy) -> Self {
        Self { retry_policy }
    }

    async fn git(&self, cwd: &Path, args: &[&str], description: &str) -> Result<String, String> {
        let out = run_with_timeout("git", args, cwd, GIT_TIMEOUT, description).await?;
        if !out.success() {
            return Err(format!(
                "{description} exited {:?}: {}",
                out.status_code,
                out.stderr.trim()
            ));
        }
        Ok(out.stdout)
    }

    /// Checkout `base_branch`, fetch the remote, rebase onto
    /// `origin/<base_branch>`, then create and check out `branch_name`.
    /// Any step failure raises [`RunnerError::WorkspacePrep`] — the caller
    /// must invoke [`Self::rollback`] to restore the slot.
    pub async fn prepare(
        &self,
        slot_path: &Path,
        branch_name: &str,
        base_branch: &str,
        gate: &PermissionGate,
    ) -> Result<Workspace, RunnerError> {
        gate.validate_git_op(&GitOperation::Checkout)
            .map_err(|e| RunnerError::workspace_prep(e.to_string()))?;
        self.git(slot_path, &["checkout", base_branch], "checkout base")
            .await
            .map_err(RunnerError::workspace_prep)?;

        gate.validate_git_op(&GitOperation::Fetch)
            .map_err(|e| RunnerError::workspace_prep(e.to_string()))?;
        self.git(slot_path, &["fetch", "origin"], "fetch origin")
            .await
            .map_err(RunnerError::workspace_prep)?;

        gate.validate_git_op(&GitOperation::Rebase)
            .map_err(|e| RunnerError::workspace_prep(e.to_string()))?;
        let upstream = format!("origin/{base_branch}");
        self.git(slot_path, &["rebase", &upstream], "rebase onto origin")
            .await
            .map_err(RunnerError::workspace_prep)?;

        gate.validate_git_op(&GitOperation::Branch {
            name: branch_name.to_string(),
            delete: false,
        })
        .map_err(|e| RunnerError::workspace_prep(e.to_string()))?;
        self.git(
            slot_path,
            &["checkout", "-b", branch_name],
            "create task branch",
        )
        .await
        .map_err(RunnerError::workspace_prep)?;

        Ok(Workspace::new(
            slot_path.to_path_buf(),
            branch_name,
            base_branch,
        ))
    }

    /// Stage every change and commit. Empty change sets are not an error
    /// at this layer; the caller decides what an empty commit means.
    pub async fn commit_changes(
        &self,
        workspace: &Workspace,
        message: &str,
        gate: &PermissionGate,
    ) -> Result<String, RunnerError> {
        gate.validate_git_op(&GitOperation::Commit)
            .map_err(|e| RunnerError::workspace_prep(e.to_string()))?;
        self.git(&workspace.path, &["add", "."], "stage changes")
            .await
            .map_err(RunnerError::workspace_prep)?;
        self.git(&workspace.path, &["commit", "-m", message], "commit")
            .await
            .map_err(RunnerError::workspace_prep)?;
        let hash = self
            .git(&workspace.path, &["rev-parse", "HEAD"], "read HEAD")
            .await
            .map_err(RunnerError::workspace_prep)?;
        Ok(hash.trim().to_string())
    }

    /// Unified diff between `HEAD` and `origin/<base_branch>`.
    pub async fn get_diff(&self, workspace: &Workspace) -> Result<String, RunnerError> {
        let range = format!("origin/{}...HEAD", workspace.base_branch);
        self.git(&workspace.path, &["diff", &range], "diff against base")
            .await
            .map_err(|message| RunnerError::WorkspacePrep {
                message,
                source: None,
            })
    }

    /// Push `branch_name` with upstream tracking, retrying transient
    /// failures under `RetryPolicy` with exponential backoff. Raises
    /// [`RunnerError::PushFailed`] with the last remote message after
    /// exhausting all attempts.
    pub async fn push_branch(
        &self,
        workspace: &Workspace,
        branch_name: &str,
        gate: &PermissionGate,
    ) -> Result<rn_core::PushResult, RunnerError> {
        gate.validate_git_op(&GitOperation::Push {
            branch_name: branch_name.to_string(),
            force: false,
        })
        .map_err(|e| RunnerError::push_failed(e.to_string(), 0))?;

        let started = std::time::Instant::now();
        let mut last_error = String::new();
        for attempt in 0..=self.retry_policy.max_retries {
            if attempt > 0 {
                warn!(attempt, branch = branch_name, "retrying push");
                tokio::time::sleep(self.retry_policy.delay(attempt - 1)).await;
            }
            match self
                .git(
                    &workspace.path,
                    &["push", "-u", "origin", branch_name],
                    "push branch",
                )
                .await
            {
                Ok(_) => {
                    let hash = self
                        .git(&workspace.path, &["rev-parse", "HEAD"], "read HEAD")
                        .await
                        .map_err(|e| RunnerError::push_failed(e, attempt))?;
                    return Ok(rn_core::PushResult {
                        success: true,
                        duration_seconds: started.elapsed().as_secs_f64(),
                        branch: branch_name.to_string(),
                        commit_hash: hash.trim().to_string(),
                        retry_count: attempt,
                    });
                }
                Err(message) => last_error = message,
            }
        }
        Err(RunnerError::push_failed(last_error, self.retry_policy.max_retries))
    }

    /// Hard reset to `origin/<base_branch>`, then clean untracked files.
    pub async fn rollback(&self, workspace: &Workspace) -> Result<(), RunnerError> {
        let upstream = format!("origin/{}", workspace.base_branch);
        self.git(
            &workspace.path,
            &["reset", "--hard", &upstream],
            "rollback reset",
        )
        .await
        .map_err(RunnerError::workspace_prep)?;
        self.git(&workspace.path, &["clean", "-fd"], "rollback clean")
            .await
            .map_err(RunnerError::workspace_prep)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
