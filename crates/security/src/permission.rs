// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `PermissionGate`: scoped to a single workspace root, validates every
//! filesystem path, VCS operation, and shell command a Runner attempts.
//! Rejections always raise `SecurityFailure`; never downgraded to a
//! warning.

use regex::Regex;
use rn_core::RunnerError;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use tracing::warn;

/// Deny patterns for `validate_command`, compiled once.
static COMMAND_DENY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"\brm\s+(-[a-zA-Z]*\s+)*-?[a-zA-Z]*r[a-zA-Z]*f[a-zA-Z]*\s+/(\s|$)")
            .expect("valid regex"),
        Regex::new(r"\bsudo\b").expect("valid regex"),
        Regex::new(r"\bdoas\b").expect("valid regex"),
        Regex::new(r"\bsu\s+-").expect("valid regex"),
        Regex::new(r"\bchmod\s+(-R\s+)?(0?777|a\+rwx|ugo\+rwx|o\+w)\b").expect("valid regex"),
        Regex::new(r"(curl|wget)\b[^|]*\|\s*(sudo\s+)?(sh|bash|zsh)\b").expect("valid regex"),
        Regex::new(r"\beval\s*[\(\x60]").expect("valid regex"),
        Regex::new(r"\bpython[0-9.]*\s+-c\b").expect("valid regex"),
        Regex::new(r"\bperl\s+-e\b").expect("valid regex"),
        Regex::new(r"/etc/(passwd|shadow|sudoers)\b").expect("valid regex"),
    ]
});

const ALLOWED_GIT_OPS: &[&str] = &[
    "checkout", "fetch", "pull", "rebase", "branch", "commit", "push", "diff", "status",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathOperation {
    Read,
    Write,
    Execute,
}

/// One VCS invocation a caller wants to perform, carrying the data needed
/// to apply the per-operation rules (`push` force/branch-prefix,
/// `branch` delete).
#[derive(Debug, Clone)]
pub enum GitOperation {
    Checkout,
    Fetch,
    Pull,
    Rebase,
    Branch { name: String, delete: bool },
    Commit,
    Push { branch_name: String, force: bool },
    Diff,
    Status,
}

impl GitOperation {
    fn name(&self) -> &'static str {
        match self {
            GitOperation::Checkout => "checkout",
            GitOperation::Fetch => "fetch",
            GitOperation::Pull => "pull",
            GitOperation::Rebase => "rebase",
            GitOperation::Branch { .. } => "branch",
            GitOperation::Commit => "commit",
            GitOperation::Push { .. } => "push",
            GitOperation::Diff => "diff",
            GitOperation::Status => "status",
        }
    }
}

fn is_feature_or_task_branch(name: &str) -> bool {
    name.starts_with("feature/") || name.starts_with("task/")
}

/// Collapse `.`/`..` components lexically, without touching the
/// filesystem — `validate_path` must work for paths that do not exist yet
/// (a `create` change writes a path that isn't there until it's written).
fn lexical_clean(path: &Path) -> PathBuf {
    let mut stack: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                stack.pop();
            }
            Component::CurDir => {}
            other => stack.push(other),
        }
    }
    stack.into_iter().collect()
}

pub struct PermissionGate {
    workspace_root: PathBuf,
}

impl PermissionGate {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: lexical_clean(&workspace_root.into()),
        }
    }

    /// Resolve `path` against the workspace root and reject it if it
    /// escapes the root, or if a `Write`/`Execute` operation targets
    /// anything inside a `.git` segment.
    pub fn validate_path(&self, path: &Path, op: PathOperation) -> Result<PathBuf, RunnerError> {
        let candidate = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        };
        let resolved = lexical_clean(&candidate);

        if !resolved.starts_with(&self.workspace_root) {
            return Err(RunnerError::security(format!(
                "path escapes workspace root: {}",
                path.display()
            )));
        }

        if op != PathOperation::Read
            && resolved
                .components()
                .any(|c| c.as_os_str() == ".git")
        {
            return Err(RunnerError::security(format!(
                "refusing to {op:?} inside .git: {}",
                path.display()
            )));
        }

        Ok(resolved)
    }

    /// Validate a VCS operation against the allow-list and per-operation
    /// rules (`push`: no force, branch must be `feature/`/`task/`-prefixed;
    /// `branch`: no delete).
    pub fn validate_git_op(&self, op: &GitOperation) -> Result<(), RunnerError> {
        let name = op.name();
        if !ALLOWED_GIT_OPS.contains(&name) {
            return Err(RunnerError::security(format!(
                "VCS operation not allow-listed: {name}"
            )));
        }

        match op {
            GitOperation::Push { branch_name, force } => {
                if *force {
                    return Err(RunnerError::security("refusing to force-push"));
                }
                if !is_feature_or_task_branch(branch_name) {
                    return Err(RunnerError::security(format!(
                        "refusing to push to non-feature/task branch: {branch_name}"
                    )));
                }
                Ok(())
            }
            GitOperation::Branch { name, delete } => {
                if *delete {
                    return Err(RunnerError::security("refusing to delete a branch"));
                }
                if !is_feature_or_task_branch(name) {
                    warn!(branch = %name, "branch name does not follow feature/task convention");
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Reject a shell command matching any deny pattern.
    pub fn validate_command(&self, command: &str) -> Result<(), RunnerError> {
        for pattern in COMMAND_DENY_PATTERNS.iter() {
            if pattern.is_match(command) {
                return Err(RunnerError::security(format!(
                    "command matches a denied pattern: {command}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "permission_tests.rs"]
mod tests;
