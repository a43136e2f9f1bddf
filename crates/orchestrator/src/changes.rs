// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Applies the `CodeChange` list an LLM returns: create/modify write the
//! file, delete removes it if present. Every path is resolved through the
//! `PermissionGate` first.

use rn_core::{ChangeOperation, CodeChange, RunnerError};
use rn_security::{PathOperation, PermissionGate};
use std::path::{Path, PathBuf};

/// Applies every change in order and returns the (unresolved,
/// workspace-relative) paths touched. Fails the whole batch on the first
/// rejected path or I/O error; an empty change set is itself an error.
pub fn apply_code_changes(
    changes: &[CodeChange],
    gate: &PermissionGate,
) -> Result<Vec<PathBuf>, RunnerError> {
    if changes.is_empty() {
        return Err(RunnerError::ImplementationFailed {
            message: "generator returned no code changes".to_string(),
        });
    }

    let mut touched = Vec::with_capacity(changes.len());
    for change in changes {
        apply_one(change, gate)?;
        touched.push(change.file_path.clone());
    }
    Ok(touched)
}

fn apply_one(change: &CodeChange, gate: &PermissionGate) -> Result<(), RunnerError> {
    let op = match change.operation {
        ChangeOperation::Delete => PathOperation::Write,
        ChangeOperation::Create | ChangeOperation::Modify => PathOperation::Write,
    };
    let resolved = gate
        .validate_path(&change.file_path, op)
        .map_err(|e| RunnerError::ImplementationFailed {
            message: e.to_string(),
        })?;

    match change.operation {
        ChangeOperation::Create | ChangeOperation::Modify => {
            write_file(&resolved, &change.content)?;
            if !resolved.is_file() {
                return Err(RunnerError::ImplementationFailed {
                    message: format!(
                        "change applied but file missing afterward: {}",
                        resolved.display()
                    ),
                });
            }
        }
        ChangeOperation::Delete => {
            if resolved.exists() {
                std::fs::remove_file(&resolved).map_err(|e| RunnerError::ImplementationFailed {
                    message: format!("failed to delete {}: {e}", resolved.display()),
                })?;
            }
        }
    }
    Ok(())
}

fn write_file(path: &Path, content: &str) -> Result<(), RunnerError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| RunnerError::ImplementationFailed {
            message: format!("failed to create {}: {e}", parent.display()),
        })?;
    }
    std::fs::write(path, content).map_err(|e| RunnerError::ImplementationFailed {
        message: format!("failed to write {}: {e}", path.display()),
    })
}

#[cfg(test)]
#[path = "changes_tests.rs"]
mod tests;
